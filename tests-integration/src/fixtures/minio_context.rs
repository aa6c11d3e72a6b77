//! MinIO container for exercising both storage clients against a real S3 API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use common::storage::{DEFAULT_REGION, ObjectStoreDirectoryClient, S3BatchClient};
use object_store::aws::AmazonS3Builder;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};
use tokio::time::sleep;

const MINIO_USER: &str = "minioadmin";
const MINIO_PASSWORD: &str = "minioadmin";

/// Test context for MinIO container
pub struct MinioTestContext {
    #[allow(dead_code)] // Keeps the container alive for the test
    container: ContainerAsync<MinIO>,
    pub endpoint: String,
    pub bucket: String,
    client: Client,
}

impl MinioTestContext {
    pub async fn new(bucket: &str) -> Result<Self> {
        let container = MinIO::default().start().await?;
        let host_port = container.get_host_port_ipv4(9000).await?;
        let endpoint = format!("http://127.0.0.1:{host_port}");

        let client = s3_client(&endpoint).await;
        create_bucket(&client, bucket).await?;

        Ok(Self {
            container,
            endpoint,
            bucket: bucket.to_string(),
            client,
        })
    }

    pub async fn put(&self, key: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from_static(b"PAR1"))
            .send()
            .await?;
        Ok(())
    }

    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            keys.extend(
                page?
                    .contents()
                    .iter()
                    .filter_map(|o| o.key().map(str::to_string)),
            );
        }
        Ok(keys)
    }

    /// Path-style aws-sdk-s3 client for the container.
    pub fn raw_client(&self) -> Client {
        self.client.clone()
    }

    /// Batch-listing client talking plain http to the container.
    pub fn batch_client(&self) -> S3BatchClient {
        S3BatchClient::new(self.raw_client(), &self.bucket)
    }

    /// Directory-style client talking plain http to the container.
    pub fn directory_client(&self) -> Result<ObjectStoreDirectoryClient> {
        let store = AmazonS3Builder::new()
            .with_bucket_name(&self.bucket)
            .with_region(DEFAULT_REGION)
            .with_access_key_id(MINIO_USER)
            .with_secret_access_key(MINIO_PASSWORD)
            .with_endpoint(&self.endpoint)
            .with_allow_http(true)
            .with_virtual_hosted_style_request(false)
            .build()?;
        Ok(ObjectStoreDirectoryClient::new(Arc::new(store), &self.bucket))
    }
}

async fn s3_client(endpoint: &str) -> Client {
    let credentials = Credentials::new(MINIO_USER, MINIO_PASSWORD, None, None, "test");
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .endpoint_url(endpoint)
        .credentials_provider(credentials)
        .region(Region::new(DEFAULT_REGION))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .force_path_style(true)
        .build();
    Client::from_conf(s3_config)
}

async fn create_bucket(client: &Client, bucket: &str) -> Result<()> {
    // Wait for MinIO to be ready with retry logic
    let mut attempts = 0;
    const MAX_ATTEMPTS: u32 = 30;

    loop {
        match client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                tracing::debug!("Created bucket '{bucket}' after {attempts} attempts");
                return Ok(());
            }
            Err(e) => {
                attempts += 1;
                if attempts >= MAX_ATTEMPTS {
                    return Err(anyhow::anyhow!(
                        "Failed to create bucket '{bucket}' after {MAX_ATTEMPTS} attempts: {e}"
                    ));
                }
                tracing::debug!("Waiting for MinIO (attempt {attempts}/{MAX_ATTEMPTS}): {e}");
                sleep(Duration::from_millis(500)).await;
            }
        }
    }
}
