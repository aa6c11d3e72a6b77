//! End-to-end catalog scenarios against a running Trino
//!
//! Configure the target with `private/config.toml` or the `TRINO_*` and
//! `AWS_*` environment variables, then run with `--ignored`.

use anyhow::{Context, Result};
use common::config::ConfigResolver;
use futures::FutureExt;
use tests_integration::fixtures::{Fixture, SchemaDrop, SchemaSession};
use tests_integration::scenario::{CatalogKind, Step};

async fn schema_is_gone(resolver: &ConfigResolver, kind: CatalogKind, schema: &str) -> Result<bool> {
    let session = SchemaSession::attach(kind.catalog(), schema, resolver)?;
    let exists = session.schema_exists().await?;
    session.engine().close().await?;
    Ok(!exists)
}

async fn run_scenario(kind: CatalogKind) -> Result<()> {
    tests_integration::init_test_logging();
    let resolver = ConfigResolver::load();
    let scenario = kind.scenario();

    let ((schema, outcome), report) = Fixture::scoped(kind, &resolver, move |session| {
        async move {
            let outcome = scenario.run(session).await;
            (session.schema().to_string(), outcome)
        }
        .boxed()
    })
    .await?;

    outcome.with_context(|| format!("{kind} scenario failed"))?;
    assert_eq!(report.schema_drop, SchemaDrop::Dropped);
    assert!(schema_is_gone(&resolver, kind, &schema).await?);
    Ok(())
}

/// Test: Iceberg round trip of the 16-column type set
#[tokio::test]
#[ignore] // Requires a running Trino
async fn test_iceberg_catalog_round_trip() -> Result<()> {
    run_scenario(CatalogKind::Iceberg).await
}

/// Test: Hive/S3 round trip of the 17-column type set
#[tokio::test]
#[ignore] // Requires a running Trino
async fn test_hive_catalog_round_trip() -> Result<()> {
    run_scenario(CatalogKind::Hive).await
}

/// Test: A scenario stopped half way still leaves no schema behind
#[tokio::test]
#[ignore] // Requires a running Trino
async fn test_teardown_after_partial_scenario() -> Result<()> {
    tests_integration::init_test_logging();
    let resolver = ConfigResolver::load();
    let kind = CatalogKind::Iceberg;
    let scenario = kind.scenario();

    let (schema, _report) = Fixture::scoped(kind, &resolver, move |session| {
        async move {
            for step in &Step::ALL[..4] {
                scenario
                    .run_step(*step, session)
                    .await
                    .expect("setup steps succeed");
            }
            session.schema().to_string()
        }
        .boxed()
    })
    .await?;

    assert!(schema_is_gone(&resolver, kind, &schema).await?);
    Ok(())
}
