//! Object-storage clients used to reclaim a schema's data after a run.
//!
//! The two supported SDK shapes share no interface, so each is exposed as a
//! capability: [`BatchListingStore`] pages through keys and deletes them in
//! bulk, [`DirectoryStore`] removes a whole prefix in one call. A
//! [`StorageClient`] advertises which capabilities it has.

mod batch;
mod directory;
mod transport;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageClientKind, StorageCredentials, StorageSettings};

pub use batch::S3BatchClient;
pub use directory::ObjectStoreDirectoryClient;

/// Region handed to S3-compatible endpoints that do not care about it.
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("Object store error: {0}")]
    ObjectStore(object_store::Error),
}

impl StoreError {
    pub fn backend(operation: &'static str, error: impl std::fmt::Display) -> Self {
        StoreError::Backend {
            operation,
            message: error.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<object_store::Error> for StoreError {
    fn from(error: object_store::Error) -> Self {
        match error {
            object_store::Error::NotFound { path, .. } => StoreError::NotFound(path),
            other => StoreError::ObjectStore(other),
        }
    }
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Token for the next page; `None` when the listing is exhausted.
    pub continuation: Option<String>,
}

/// Paginated listing plus bulk deletion by key.
#[async_trait]
pub trait BatchListingStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, StoreError>;

    /// Deletes the given keys, returning how many were removed.
    async fn delete_keys(&self, keys: &[String]) -> Result<usize, StoreError>;
}

/// Recursive deletion of a directory-like prefix.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// Deletes everything below `path`, returning how many objects were removed.
    async fn delete_dir(&self, path: &str) -> Result<usize, StoreError>;
}

/// A storage client and the capabilities it offers.
pub trait StorageClient: Send + Sync {
    fn name(&self) -> &str;

    fn as_batch_listing(&self) -> Option<&dyn BatchListingStore> {
        None
    }

    fn as_directory(&self) -> Option<&dyn DirectoryStore> {
        None
    }
}

/// Builds the storage client selected by `storage.client`.
pub async fn connect_storage(
    storage: &StorageSettings,
    credentials: &StorageCredentials,
) -> Result<Arc<dyn StorageClient>, StoreError> {
    match storage.client {
        StorageClientKind::Batch => {
            let client = S3BatchClient::connect(credentials, &storage.bucket, &storage.tls).await?;
            Ok(Arc::new(client))
        }
        StorageClientKind::Directory => {
            let client = ObjectStoreDirectoryClient::connect(storage, credentials)?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsVerification;

    #[test]
    fn test_not_found_is_mapped_from_object_store() {
        let error = object_store::Error::NotFound {
            path: "trino/warehouse/unittest_0a1b2c3d".to_string(),
            source: "missing".into(),
        };
        let error = StoreError::from(error);
        assert!(error.is_not_found());
        assert_eq!(
            error.to_string(),
            "Not found: trino/warehouse/unittest_0a1b2c3d"
        );
    }

    #[test]
    fn test_other_object_store_errors_are_kept() {
        let error = object_store::Error::NotImplemented;
        assert!(!StoreError::from(error).is_not_found());
    }

    #[tokio::test]
    async fn test_connect_batch_client_honours_ca_setting() {
        let mut storage = StorageSettings::new("analytics")
            .with_credentials("key", "secret", "s3.example.org")
            .with_client(StorageClientKind::Batch);
        let credentials = storage.credentials().unwrap();

        storage.tls = TlsVerification::Disabled;
        let client = connect_storage(&storage, &credentials).await.unwrap();
        assert_eq!(client.name(), "aws-sdk-s3");
        assert!(client.as_batch_listing().is_some());

        storage.tls = TlsVerification::CaBundle("/nonexistent/bundle.pem".into());
        assert!(connect_storage(&storage, &credentials).await.is_err());
    }

    #[tokio::test]
    async fn test_connect_directory_client() {
        let storage = StorageSettings::new("analytics")
            .with_credentials("key", "secret", "s3.example.org")
            .with_client(StorageClientKind::Directory);
        let credentials = storage.credentials().unwrap();

        let client = connect_storage(&storage, &credentials).await.unwrap();
        assert!(client.as_directory().is_some());
        assert!(client.as_batch_listing().is_none());
        assert_eq!(client.as_directory().unwrap().bucket(), "analytics");
    }
}
