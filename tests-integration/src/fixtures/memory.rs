//! In-memory batch-listing store for exercising pagination without S3.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::storage::{BatchListingStore, ListPage, StorageClient, StoreError};
use tokio::sync::Mutex;

/// Keys held in sorted order; continuation tokens are the last key returned.
pub struct InMemoryBatchStore {
    bucket: String,
    page_size: usize,
    keys: Mutex<BTreeSet<String>>,
    missing: bool,
    delete_calls: AtomicUsize,
}

impl InMemoryBatchStore {
    pub fn new(bucket: impl Into<String>, page_size: usize) -> Self {
        Self {
            bucket: bucket.into(),
            page_size: page_size.max(1),
            keys: Mutex::new(BTreeSet::new()),
            missing: false,
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// A store whose bucket does not exist; every call reports not found.
    pub fn missing(bucket: impl Into<String>) -> Self {
        Self {
            missing: true,
            ..Self::new(bucket, 1)
        }
    }

    pub async fn seed<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keys.lock().await.extend(keys.into_iter().map(Into::into));
    }

    pub async fn keys(&self) -> Vec<String> {
        self.keys.lock().await.iter().cloned().collect()
    }

    /// Number of `delete_keys` calls so far.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check_bucket(&self) -> Result<(), StoreError> {
        if self.missing {
            Err(StoreError::NotFound(self.bucket.clone()))
        } else {
            Ok(())
        }
    }
}

impl StorageClient for InMemoryBatchStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn as_batch_listing(&self) -> Option<&dyn BatchListingStore> {
        Some(self)
    }
}

#[async_trait]
impl BatchListingStore for InMemoryBatchStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        self.check_bucket()?;

        let keys = self.keys.lock().await;
        let mut matching = keys
            .iter()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| continuation.is_none_or(|after| key.as_str() > after));

        let page: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let continuation = match (matching.next(), page.last()) {
            (Some(_), Some(last)) => Some(last.clone()),
            _ => None,
        };

        Ok(ListPage {
            keys: page,
            continuation,
        })
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<usize, StoreError> {
        self.check_bucket()?;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        let mut stored = self.keys.lock().await;
        Ok(keys.iter().filter(|key| stored.remove(key.as_str())).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_resume_after_token() {
        let store = InMemoryBatchStore::new("analytics", 2);
        store.seed(["p/a", "p/b", "p/c", "q/d"]).await;

        let first = store.list_page("p/", None).await.unwrap();
        assert_eq!(first.keys, vec!["p/a", "p/b"]);
        assert_eq!(first.continuation.as_deref(), Some("p/b"));

        let second = store.list_page("p/", first.continuation.as_deref()).await.unwrap();
        assert_eq!(second.keys, vec!["p/c"]);
        assert!(second.continuation.is_none());
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let store = InMemoryBatchStore::missing("gone");
        assert!(store.list_page("p/", None).await.unwrap_err().is_not_found());
    }
}
