use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use common::config::{ConfigResolver, ConfigurationError};
use common::storage::{StorageClient, connect_storage};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{error, info, warn};
use trino_client::TrinoError;

use super::reclaim::reclaim;
use super::session::SchemaSession;
use crate::scenario::CatalogKind;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to connect to Trino: {0}")]
    Connection(TrinoError),

    #[error("Refusing to manage schema outside the unittest_ namespace: {0}")]
    ForeignSchema(String),
}

/// Where a fixture is in its lifecycle. Before setup succeeds there is no
/// fixture at all, so nothing ever needs reclaiming in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Connected,
    Running,
    Cleaning,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDrop {
    Dropped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCleanup {
    /// Storage credentials were incomplete.
    Skipped,
    Attempted {
        removed: usize,
        warnings: Vec<String>,
    },
}

/// Outcome of a teardown. Teardown itself never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub schema: String,
    pub schema_drop: SchemaDrop,
    pub storage: StorageCleanup,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.schema_drop == SchemaDrop::Dropped
            && match &self.storage {
                StorageCleanup::Skipped => true,
                StorageCleanup::Attempted { warnings, .. } => warnings.is_empty(),
            }
    }
}

/// A connected schema session that is reclaimed exactly once.
///
/// Obtain one with [`Fixture::setup`] and hand a body to
/// [`Fixture::within`], or call [`Fixture::scoped`] to do both. Teardown
/// runs even when the body panics.
pub struct Fixture {
    session: SchemaSession,
    state: LifecycleState,
    storage: Option<Arc<dyn StorageClient>>,
}

impl Fixture {
    /// Resolve configuration and connect. Nothing needs reclaiming when
    /// this fails.
    pub fn setup(kind: CatalogKind, resolver: &ConfigResolver) -> Result<Self, FixtureError> {
        let session = SchemaSession::open(kind.catalog(), resolver)?;
        Ok(Self::from_session(session))
    }

    /// Take over an existing `unittest_` schema, e.g. one a crashed run left behind.
    pub fn attach(
        kind: CatalogKind,
        resolver: &ConfigResolver,
        schema: &str,
    ) -> Result<Self, FixtureError> {
        let session = SchemaSession::attach(kind.catalog(), schema, resolver)?;
        Ok(Self::from_session(session))
    }

    pub fn from_session(session: SchemaSession) -> Self {
        Self {
            session,
            state: LifecycleState::Connected,
            storage: None,
        }
    }

    /// Use `client` for storage cleanup instead of building one from settings.
    ///
    /// Cleanup still only happens when the settings carry complete storage
    /// credentials; without them teardown skips storage either way.
    pub fn with_storage(mut self, client: Arc<dyn StorageClient>) -> Self {
        self.storage = Some(client);
        self
    }

    pub fn session(&self) -> &SchemaSession {
        &self.session
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Set up, run `body` and tear down, in that order.
    pub async fn scoped<T, F>(
        kind: CatalogKind,
        resolver: &ConfigResolver,
        body: F,
    ) -> Result<(T, TeardownReport), FixtureError>
    where
        F: for<'a> FnOnce(&'a SchemaSession) -> BoxFuture<'a, T>,
    {
        let fixture = Self::setup(kind, resolver)?;
        Ok(fixture.within(body).await)
    }

    /// Run `body` against the session, then tear down. A panic in `body`
    /// is resumed once teardown has finished.
    pub async fn within<T, F>(mut self, body: F) -> (T, TeardownReport)
    where
        F: for<'a> FnOnce(&'a SchemaSession) -> BoxFuture<'a, T>,
    {
        self.state = LifecycleState::Running;
        let outcome = AssertUnwindSafe(body(&self.session)).catch_unwind().await;
        let report = self.finish().await;

        match outcome {
            Ok(value) => (value, report),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Drop the schema, close the connection and reclaim storage.
    pub async fn teardown(mut self) -> TeardownReport {
        self.finish().await
    }

    async fn finish(&mut self) -> TeardownReport {
        self.state = LifecycleState::Cleaning;
        let schema = self.session.qualified();

        info!(nl = true, "Drop schema: {schema}");
        let schema_drop = match self
            .session
            .execute(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
            .await
        {
            Ok(_) => SchemaDrop::Dropped,
            Err(e) => {
                error!("Drop schema {schema} failed: {e}");
                SchemaDrop::Failed(e.to_string())
            }
        };
        if let Err(e) = self.session.engine().close().await {
            warn!("Close connection: {e}");
        }

        let storage = self.reclaim_storage().await;

        info!("Done");
        self.state = LifecycleState::Done;

        TeardownReport {
            schema,
            schema_drop,
            storage,
        }
    }

    async fn reclaim_storage(&self) -> StorageCleanup {
        let settings = &self.session.settings().storage;
        let data = self.session.data_location();

        let Some(credentials) = settings.credentials() else {
            warn!("Skip S3 cleanup at location {data}");
            return StorageCleanup::Skipped;
        };

        info!("Delete {data}");
        let mut removed = 0;
        let mut warnings = Vec::new();

        let client = match &self.storage {
            Some(client) => Arc::clone(client),
            None => match connect_storage(settings, &credentials).await {
                Ok(client) => client,
                Err(e) => {
                    warn!("S3 Cleanup {e}");
                    warnings.push(e.to_string());
                    return StorageCleanup::Attempted { removed, warnings };
                }
            },
        };

        for location in [data, self.session.warehouse_location()] {
            match reclaim(client.as_ref(), &location.prefix).await {
                Ok(summary) => removed += summary.removed,
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!("S3 Cleanup {e}");
                    warnings.push(e.to_string());
                }
            }
        }

        StorageCleanup::Attempted { removed, warnings }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if self.state != LifecycleState::Done {
            error!(
                "Fixture dropped without teardown, schema {} left behind",
                self.session.qualified()
            );
        }
    }
}
