use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use super::transport::ReqwestHttpClient;
use super::{BatchListingStore, DEFAULT_REGION, ListPage, StorageClient, StoreError};
use crate::config::{StorageCredentials, TlsVerification};

/// aws-sdk-s3 client scoped to one bucket.
pub struct S3BatchClient {
    client: Client,
    bucket: String,
}

impl S3BatchClient {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Creates a path-style client for an S3-compatible endpoint, trusting
    /// certificates as `tls` says.
    pub async fn connect(
        credentials: &StorageCredentials,
        bucket: &str,
        tls: &TlsVerification,
    ) -> Result<Self, StoreError> {
        let http = ReqwestHttpClient::from_tls(tls)?;
        let client = s3_client(&credentials.endpoint_url(), credentials, http).await;
        Ok(Self::new(client, bucket))
    }
}

async fn s3_client(
    endpoint_url: &str,
    credentials: &StorageCredentials,
    http: ReqwestHttpClient,
) -> Client {
    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(endpoint_url)
        .credentials_provider(Credentials::new(
            &credentials.access_key,
            &credentials.secret_key,
            None,
            None,
            "trino-fixture",
        ))
        .region(Region::new(DEFAULT_REGION))
        .http_client(http)
        .load()
        .await;

    let config = aws_sdk_s3::config::Builder::from(&shared_config)
        .force_path_style(true)
        .build();
    Client::from_conf(config)
}

impl StorageClient for S3BatchClient {
    fn name(&self) -> &str {
        "aws-sdk-s3"
    }

    fn as_batch_listing(&self) -> Option<&dyn BatchListingStore> {
        Some(self)
    }
}

#[async_trait]
impl BatchListingStore for S3BatchClient {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(continuation.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                let error = e.into_service_error();
                if error.is_no_such_bucket() {
                    StoreError::NotFound(self.bucket.clone())
                } else {
                    StoreError::backend("ListObjectsV2", DisplayErrorContext(&error))
                }
            })?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        let continuation = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage { keys, continuation })
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<usize, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::backend("DeleteObjects", e))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| StoreError::backend("DeleteObjects", e))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                StoreError::backend("DeleteObjects", DisplayErrorContext(&e.into_service_error()))
            })?;

        if let Some(error) = output.errors().first() {
            return Err(StoreError::Backend {
                operation: "DeleteObjects",
                message: format!(
                    "{} of {} keys not deleted, first {}: {}",
                    output.errors().len(),
                    keys.len(),
                    error.key().unwrap_or_default(),
                    error.message().unwrap_or_default()
                ),
            });
        }

        Ok(keys.len())
    }
}
