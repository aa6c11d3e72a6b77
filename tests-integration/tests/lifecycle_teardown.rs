//! Fixture lifecycle tests against a mocked engine
//!
//! Teardown must drop the schema, reclaim both storage areas and never fail,
//! whatever happened before it.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use common::config::{ConfigResolver, EngineSettings, Settings, StorageSettings};
use common::storage::StorageClient;
use figment::providers::{Format, Serialized, Toml};
use futures::FutureExt;
use tests_integration::fixtures::{
    Fixture, FixtureError, InMemoryBatchStore, LifecycleState, SchemaDrop, SchemaSession,
    StorageCleanup,
};
use tests_integration::scenario::CatalogKind;
use trino_client::{MockQueryEngine, QueryResult, TrinoError};

const SCHEMA: &str = "unittest_0a1b2c3d";

type Statements = Arc<Mutex<Vec<String>>>;

/// Engine recording every statement; `DROP` fails when `fail_drop` is set.
fn recording_engine(fail_drop: bool) -> (MockQueryEngine, Statements) {
    let statements = Statements::default();
    let log = statements.clone();

    let mut engine = MockQueryEngine::new();
    engine.expect_execute().returning(move |sql: &str| {
        log.lock().unwrap().push(sql.to_string());
        if fail_drop && sql.starts_with("DROP") {
            Err(TrinoError::Status {
                status: 503,
                message: "coordinator shutting down".to_string(),
            })
        } else {
            Ok(QueryResult::default())
        }
    });
    engine.expect_close().times(1).returning(|| Ok(()));
    (engine, statements)
}

fn storage(with_credentials: bool) -> StorageSettings {
    let storage = StorageSettings::new("analytics");
    if with_credentials {
        storage.with_credentials("key", "secret", "s3.example.org")
    } else {
        storage
    }
}

fn fixture(engine: MockQueryEngine, storage: StorageSettings) -> Fixture {
    let settings = Settings::new(EngineSettings::default(), storage);
    let session = SchemaSession::with_engine(Box::new(engine), "iceberg", SCHEMA, settings);
    Fixture::from_session(session)
}

async fn seeded_store() -> Arc<InMemoryBatchStore> {
    let store = Arc::new(InMemoryBatchStore::new("analytics", 2));
    store
        .seed([
            format!("trino/data/unittest/{SCHEMA}/parquet/table_1/a.parquet"),
            format!("trino/data/unittest/{SCHEMA}/parquet/table_1/b.parquet"),
            format!("trino/data/unittest/{SCHEMA}/parquet/table_1/c.parquet"),
            format!("trino/warehouse/{SCHEMA}/metadata/v1.json"),
            "trino/warehouse/unittest_ffffffff/metadata/v1.json".to_string(),
        ])
        .await;
    store
}

/// Test: Teardown drops the schema and reclaims both areas
#[tokio::test]
async fn test_teardown_drops_schema_and_reclaims_storage() -> Result<()> {
    tests_integration::init_test_logging();

    let (engine, statements) = recording_engine(false);
    let store = seeded_store().await;
    let fixture = fixture(engine, storage(true)).with_storage(store.clone());
    assert_eq!(fixture.state(), LifecycleState::Connected);

    let report = fixture.teardown().await;

    assert_eq!(
        *statements.lock().unwrap(),
        vec![format!("DROP SCHEMA IF EXISTS iceberg.{SCHEMA} CASCADE")]
    );
    assert_eq!(report.schema, format!("iceberg.{SCHEMA}"));
    assert_eq!(report.schema_drop, SchemaDrop::Dropped);
    assert_eq!(
        report.storage,
        StorageCleanup::Attempted {
            removed: 4,
            warnings: Vec::new()
        }
    );
    assert!(report.is_clean());
    assert_eq!(
        store.keys().await,
        vec!["trino/warehouse/unittest_ffffffff/metadata/v1.json"]
    );
    Ok(())
}

/// Test: A failed drop is recorded and storage is still reclaimed
#[tokio::test]
async fn test_failed_drop_does_not_block_storage_cleanup() {
    let (engine, _) = recording_engine(true);
    let store = seeded_store().await;

    let report = fixture(engine, storage(true))
        .with_storage(store.clone())
        .teardown()
        .await;

    assert!(matches!(report.schema_drop, SchemaDrop::Failed(ref e) if e.contains("503")));
    assert!(matches!(report.storage, StorageCleanup::Attempted { removed: 4, .. }));
    assert!(!report.is_clean());
}

/// Test: Incomplete credentials skip storage cleanup without error
#[tokio::test]
async fn test_missing_credentials_skip_storage() {
    let (engine, _) = recording_engine(false);
    let store = seeded_store().await;

    let report = fixture(engine, storage(false))
        .with_storage(store.clone())
        .teardown()
        .await;

    assert_eq!(report.storage, StorageCleanup::Skipped);
    assert_eq!(store.keys().await.len(), 5);
    assert!(report.is_clean());
}

/// Test: Sentinel-valued credentials count as missing
#[tokio::test]
async fn test_sentinel_credentials_skip_storage() {
    let (engine, _) = recording_engine(false);
    let storage = StorageSettings::new("analytics").with_credentials("key", "CHANGE.ME", "s3");

    let report = fixture(engine, storage).teardown().await;

    assert_eq!(report.storage, StorageCleanup::Skipped);
}

/// Test: A bucket that no longer exists is ignored silently
#[tokio::test]
async fn test_missing_bucket_is_ignored() {
    let (engine, _) = recording_engine(false);

    let report = fixture(engine, storage(true))
        .with_storage(Arc::new(InMemoryBatchStore::missing("analytics")))
        .teardown()
        .await;

    assert_eq!(
        report.storage,
        StorageCleanup::Attempted {
            removed: 0,
            warnings: Vec::new()
        }
    );
}

struct UnknownClient;

impl StorageClient for UnknownClient {
    fn name(&self) -> &str {
        "ftp"
    }
}

/// Test: An unsupported storage client becomes a warning per area
#[tokio::test]
async fn test_unsupported_client_is_downgraded_to_warning() {
    let (engine, _) = recording_engine(false);

    let report = fixture(engine, storage(true))
        .with_storage(Arc::new(UnknownClient))
        .teardown()
        .await;

    assert_eq!(report.schema_drop, SchemaDrop::Dropped);
    match report.storage {
        StorageCleanup::Attempted { removed, warnings } => {
            assert_eq!(removed, 0);
            assert_eq!(warnings.len(), 2);
            assert!(warnings[0].contains("Unsupported S3 client: ftp"));
        }
        other => panic!("unexpected cleanup: {other:?}"),
    }
}

/// Test: The scoped body's result is returned after teardown
#[tokio::test]
async fn test_within_returns_body_result() {
    let (engine, statements) = recording_engine(false);
    let fixture = fixture(engine, storage(false));

    let (schema, report) = fixture
        .within(|session| {
            async move {
                session.execute("SHOW CATALOGS").await.map(drop)?;
                Ok::<_, TrinoError>(session.schema().to_string())
            }
            .boxed()
        })
        .await;

    assert_eq!(schema.unwrap(), SCHEMA);
    assert_eq!(report.schema_drop, SchemaDrop::Dropped);
    let statements = statements.lock().unwrap();
    assert_eq!(statements.len(), 2);
    assert!(statements[1].starts_with("DROP SCHEMA IF EXISTS"));
}

/// Test: Teardown runs before a panic in the scoped body propagates
#[tokio::test]
async fn test_within_tears_down_after_panic() {
    let (engine, statements) = recording_engine(false);
    let fixture = fixture(engine, storage(false));

    let outcome = AssertUnwindSafe(fixture.within::<(), _>(|_session| {
        async move { panic!("assertion failed in step 0070_select_from_table") }.boxed()
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert_eq!(
        *statements.lock().unwrap(),
        vec![format!("DROP SCHEMA IF EXISTS iceberg.{SCHEMA} CASCADE")]
    );
}

/// Test: A missing bucket aborts setup before any connection is made
#[tokio::test]
async fn test_setup_without_bucket_fails_before_connecting() {
    let file = Toml::string(
        r#"
        [default]
        host = "trino.invalid"
        bucket = "CHANGE.ME"
        "#,
    );
    let resolver = ConfigResolver::with_providers(
        file,
        Serialized::defaults(BTreeMap::<String, String>::new()),
    );

    let err = Fixture::setup(CatalogKind::Iceberg, &resolver).err().unwrap();

    assert!(matches!(err, FixtureError::Configuration(_)));
    assert_eq!(err.to_string(), "S3 bucket not set");
}
