use common::storage::{BatchListingStore, DirectoryStore, StorageClient, StoreError};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ReclaimError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unsupported S3 client: {0}")]
    UnsupportedClient(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ReclaimError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReclaimError::NotFound(_))
    }
}

impl From<StoreError> for ReclaimError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(what) => ReclaimError::NotFound(what),
            other => ReclaimError::Store(other),
        }
    }
}

/// What one reclaim call removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimSummary {
    pub prefix: String,
    pub removed: usize,
    /// Listing pages walked; zero for directory-style clients.
    pub pages: usize,
}

/// Delete everything stored below `prefix`.
///
/// The prefix is normalised to end with `/`. Prefixes shorter than two
/// characters are rejected so a bucket root is never wiped. Missing
/// prefixes are not an error.
pub async fn reclaim(
    client: &dyn StorageClient,
    prefix: &str,
) -> Result<ReclaimSummary, ReclaimError> {
    if prefix.chars().count() < 2 {
        return Err(ReclaimError::InvalidPath(prefix.to_string()));
    }
    let prefix = if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    };

    if let Some(store) = client.as_batch_listing() {
        reclaim_pages(store, prefix).await
    } else if let Some(store) = client.as_directory() {
        reclaim_directory(store, prefix).await
    } else {
        Err(ReclaimError::UnsupportedClient(client.name().to_string()))
    }
}

async fn reclaim_pages(
    store: &dyn BatchListingStore,
    prefix: String,
) -> Result<ReclaimSummary, ReclaimError> {
    info!("Batch {}/{prefix}", store.bucket());

    let mut summary = ReclaimSummary {
        prefix,
        ..ReclaimSummary::default()
    };
    let mut continuation: Option<String> = None;

    loop {
        let page = store
            .list_page(&summary.prefix, continuation.as_deref())
            .await?;
        summary.pages += 1;

        if !page.keys.is_empty() {
            let removed = store.delete_keys(&page.keys).await?;
            info!("Deleted {removed} objects in {}", summary.prefix);
            summary.removed += removed;
        }

        match page.continuation {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    debug!(prefix = %summary.prefix, pages = summary.pages, "Listing exhausted");
    Ok(summary)
}

async fn reclaim_directory(
    store: &dyn DirectoryStore,
    prefix: String,
) -> Result<ReclaimSummary, ReclaimError> {
    info!("Directory {}/{prefix}", store.bucket());

    let removed = store.delete_dir(&prefix).await?;
    Ok(ReclaimSummary {
        prefix,
        removed,
        pages: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::InMemoryBatchStore;

    struct Opaque;

    impl StorageClient for Opaque {
        fn name(&self) -> &str {
            "opaque"
        }
    }

    #[tokio::test]
    async fn test_short_prefix_is_rejected() {
        let store = InMemoryBatchStore::new("analytics", 10);
        for prefix in ["", "/", "a"] {
            let err = reclaim(&store, prefix).await.unwrap_err();
            assert!(matches!(err, ReclaimError::InvalidPath(_)), "{prefix:?}");
        }
    }

    #[tokio::test]
    async fn test_prefix_gets_trailing_separator() {
        let store = InMemoryBatchStore::new("analytics", 10);
        store
            .seed(["ab/1.parquet", "abc/2.parquet"])
            .await;

        let summary = reclaim(&store, "ab").await.unwrap();

        assert_eq!(summary.prefix, "ab/");
        assert_eq!(summary.removed, 1);
        assert_eq!(store.keys().await, vec!["abc/2.parquet"]);
    }

    #[tokio::test]
    async fn test_unsupported_client() {
        let err = reclaim(&Opaque, "trino/warehouse/unittest_0a1b2c3d")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported S3 client: opaque");
    }

    #[test]
    fn test_store_not_found_is_kept_distinct() {
        let err = ReclaimError::from(StoreError::NotFound("analytics".to_string()));
        assert!(err.is_not_found());

        let err = ReclaimError::from(StoreError::backend("DeleteObjects", "AccessDenied"));
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "DeleteObjects failed: AccessDenied");
    }
}
