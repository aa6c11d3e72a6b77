use std::fmt;

use common::config::{ConfigResolver, Settings};
use tracing::info;
use trino_client::{ConnectOptions, QueryEngine, QueryResult, TrinoClient, TrinoError};
use uuid::Uuid;

use super::FixtureError;

/// Namespace every generated schema lives in.
pub const SCHEMA_PREFIX: &str = "unittest_";

/// Bucket plus key prefix, rendered as an `s3a://` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub bucket: String,
    pub prefix: String,
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3a://{}/{}", self.bucket, self.prefix)
    }
}

/// `unittest_` followed by eight random hex digits.
pub fn generate_schema_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{SCHEMA_PREFIX}{}", &id[..8])
}

/// One engine connection and the schema it owns.
pub struct SchemaSession {
    engine: Box<dyn QueryEngine>,
    catalog: String,
    schema: String,
    settings: Settings,
}

impl SchemaSession {
    /// Resolve settings, pick a fresh schema name and connect.
    ///
    /// Configuration errors are raised before any connection is made.
    pub fn open(catalog: &str, resolver: &ConfigResolver) -> Result<Self, FixtureError> {
        let settings = resolver.resolve()?;
        Self::connect(catalog, generate_schema_name(), settings)
    }

    /// Connect to an existing schema.
    pub fn attach(
        catalog: &str,
        schema: &str,
        resolver: &ConfigResolver,
    ) -> Result<Self, FixtureError> {
        if !schema.starts_with(SCHEMA_PREFIX) {
            return Err(FixtureError::ForeignSchema(schema.to_string()));
        }
        let settings = resolver.resolve()?;
        Self::connect(catalog, schema.to_string(), settings)
    }

    fn connect(catalog: &str, schema: String, settings: Settings) -> Result<Self, FixtureError> {
        let options = ConnectOptions::default().with_user(&settings.engine.user);
        let client = TrinoClient::connect(&settings.engine.base_url(), options)
            .map_err(FixtureError::Connection)?;
        Ok(Self::with_engine(Box::new(client), catalog, schema, settings))
    }

    /// Session over an already constructed engine.
    pub fn with_engine(
        engine: Box<dyn QueryEngine>,
        catalog: impl Into<String>,
        schema: impl Into<String>,
        settings: Settings,
    ) -> Self {
        let session = Self {
            engine,
            catalog: catalog.into(),
            schema: schema.into(),
            settings,
        };
        session.announce();
        session
    }

    fn announce(&self) {
        info!("Schema: {}", self.qualified());
        info!("S3 locations: {}", self.data_location());
        info!("CA: {}", self.settings.storage.tls);
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// `catalog.schema`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.catalog, self.schema)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &dyn QueryEngine {
        self.engine.as_ref()
    }

    pub async fn execute(&self, sql: &str) -> Result<QueryResult, TrinoError> {
        self.engine.execute(sql).await
    }

    /// Where table data of this schema is written.
    pub fn data_location(&self) -> StorageLocation {
        StorageLocation {
            bucket: self.settings.storage.bucket.clone(),
            prefix: format!("trino/data/unittest/{}", self.schema),
        }
    }

    /// Where catalog metadata of this schema is written.
    pub fn warehouse_location(&self) -> StorageLocation {
        StorageLocation {
            bucket: self.settings.storage.bucket.clone(),
            prefix: format!("trino/warehouse/{}", self.schema),
        }
    }

    pub fn table_location(&self, table: &str) -> String {
        format!("{}/parquet/{table}", self.data_location())
    }

    pub async fn schema_exists(&self) -> Result<bool, TrinoError> {
        let schemas = self
            .execute(&format!("SHOW SCHEMAS FROM {}", self.catalog))
            .await?;
        Ok(schemas.contains(&self.schema.to_lowercase()))
    }
}
