use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Certificate, ClientOptions, ObjectStore};

use super::{DEFAULT_REGION, DirectoryStore, StorageClient, StoreError};
use crate::config::{StorageCredentials, StorageSettings, TlsVerification};

/// object_store client that deletes whole prefixes.
pub struct ObjectStoreDirectoryClient {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStoreDirectoryClient {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// In-memory store for tests
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket)
    }

    pub fn connect(
        storage: &StorageSettings,
        credentials: &StorageCredentials,
    ) -> Result<Self, StoreError> {
        let store = AmazonS3Builder::new()
            .with_bucket_name(&storage.bucket)
            .with_region(DEFAULT_REGION)
            .with_access_key_id(&credentials.access_key)
            .with_secret_access_key(&credentials.secret_key)
            .with_endpoint(credentials.endpoint_url())
            .with_virtual_hosted_style_request(false)
            .with_client_options(client_options(&storage.tls)?)
            .build()?;

        Ok(Self::new(Arc::new(store), &storage.bucket))
    }

    /// Underlying store, e.g. for seeding test data.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

fn client_options(tls: &TlsVerification) -> Result<ClientOptions, StoreError> {
    let options = ClientOptions::new();
    match tls {
        TlsVerification::Enabled => Ok(options),
        TlsVerification::Disabled => Ok(options.with_allow_invalid_certificates(true)),
        TlsVerification::CaBundle(path) => {
            let pem = std::fs::read(path).map_err(|e| {
                StoreError::backend("read CA bundle", format!("{}: {e}", path.display()))
            })?;
            Ok(Certificate::from_pem_bundle(&pem)?
                .into_iter()
                .fold(options, ClientOptions::with_root_certificate))
        }
    }
}

impl StorageClient for ObjectStoreDirectoryClient {
    fn name(&self) -> &str {
        "object_store"
    }

    fn as_directory(&self) -> Option<&dyn DirectoryStore> {
        Some(self)
    }
}

#[async_trait]
impl DirectoryStore for ObjectStoreDirectoryClient {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn delete_dir(&self, path: &str) -> Result<usize, StoreError> {
        let prefix = Path::from(path);
        let locations = self
            .store
            .list(Some(&prefix))
            .map_ok(|meta| meta.location)
            .boxed();

        let deleted = self
            .store
            .delete_stream(locations)
            .try_collect::<Vec<Path>>()
            .await?;

        Ok(deleted.len())
    }
}
