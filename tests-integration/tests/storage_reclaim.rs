//! Storage reclamation against in-memory stores
//!
//! Covers pagination, idempotence and capability dispatch without an S3
//! endpoint.

use anyhow::Result;
use bytes::Bytes;
use common::storage::{ObjectStoreDirectoryClient, StorageClient};
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use tests_integration::fixtures::{InMemoryBatchStore, ReclaimError, reclaim};

const DATA_PREFIX: &str = "trino/data/unittest/unittest_0a1b2c3d";

struct UnknownClient;

impl StorageClient for UnknownClient {
    fn name(&self) -> &str {
        "ftp"
    }
}

fn data_keys(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{DATA_PREFIX}/parquet/table_1/c17=2024-07-01/{i:04}.parquet"))
        .collect()
}

/// Test: Every page of a large listing is deleted
#[tokio::test]
async fn test_batch_reclaim_walks_all_pages() -> Result<()> {
    tests_integration::init_test_logging();

    let store = InMemoryBatchStore::new("analytics", 2);
    store.seed(data_keys(5)).await;
    store.seed(["trino/data/unittest/unittest_ffffffff/keep.parquet"]).await;

    let summary = reclaim(&store, DATA_PREFIX).await?;

    assert_eq!(summary.prefix, format!("{DATA_PREFIX}/"));
    assert_eq!(summary.removed, 5);
    assert_eq!(summary.pages, 3);
    assert_eq!(store.delete_calls(), 3);
    assert_eq!(
        store.keys().await,
        vec!["trino/data/unittest/unittest_ffffffff/keep.parquet"]
    );
    Ok(())
}

/// Test: Reclaiming the same prefix twice is a no-op the second time
#[tokio::test]
async fn test_batch_reclaim_is_idempotent() -> Result<()> {
    let store = InMemoryBatchStore::new("analytics", 100);
    store.seed(data_keys(3)).await;

    assert_eq!(reclaim(&store, DATA_PREFIX).await?.removed, 3);

    let second = reclaim(&store, DATA_PREFIX).await?;
    assert_eq!(second.removed, 0);
    assert_eq!(second.pages, 1);
    assert_eq!(store.delete_calls(), 1);
    Ok(())
}

/// Test: A missing bucket surfaces as not found, not as a store failure
#[tokio::test]
async fn test_missing_bucket_is_not_found() {
    let store = InMemoryBatchStore::missing("gone");

    let err = reclaim(&store, DATA_PREFIX).await.unwrap_err();

    assert!(err.is_not_found());
}

/// Test: Unknown client shapes are rejected before anything is deleted
#[tokio::test]
async fn test_unsupported_client_is_rejected() {
    let err = reclaim(&UnknownClient, DATA_PREFIX).await.unwrap_err();

    assert!(matches!(err, ReclaimError::UnsupportedClient(ref name) if name == "ftp"));
    assert!(!err.is_not_found());
}

/// Test: Directory-style clients remove the whole prefix in one call
#[tokio::test]
async fn test_directory_reclaim() -> Result<()> {
    let client = ObjectStoreDirectoryClient::in_memory("analytics");
    for key in data_keys(4) {
        client
            .store()
            .put(&ObjectPath::from(key.as_str()), Bytes::from("PAR1").into())
            .await?;
    }
    client
        .store()
        .put(
            &ObjectPath::from("trino/warehouse/unittest_0a1b2c3d/metadata/v1.json"),
            Bytes::from("{}").into(),
        )
        .await?;

    let summary = reclaim(&client, DATA_PREFIX).await?;
    assert_eq!(summary.removed, 4);
    assert_eq!(summary.pages, 0);

    let left: Vec<_> = client.store().list(None).try_collect().await?;
    assert_eq!(left.len(), 1);
    assert_eq!(
        left[0].location.as_ref(),
        "trino/warehouse/unittest_0a1b2c3d/metadata/v1.json"
    );

    assert_eq!(reclaim(&client, DATA_PREFIX).await?.removed, 0);
    Ok(())
}

/// Test: Prefixes that could address a bucket root are refused
#[tokio::test]
async fn test_root_prefix_is_refused() -> Result<()> {
    let store = InMemoryBatchStore::new("analytics", 10);
    store.seed(data_keys(1)).await;

    for prefix in ["", "t"] {
        assert!(matches!(
            reclaim(&store, prefix).await,
            Err(ReclaimError::InvalidPath(_))
        ));
    }
    assert_eq!(store.keys().await.len(), 1);
    Ok(())
}
