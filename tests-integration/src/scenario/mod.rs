//! Catalog round-trip scenarios.
//!
//! A scenario creates a schema and one table holding the widest type set the
//! catalog supports, inserts a minimum-boundary and a maximum-boundary row,
//! then reads both back and compares every cell. Steps depend on each other
//! and run in ascending order, stopping at the first failure.

mod expect;
pub mod hive;
pub mod iceberg;

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};
use trino_client::{QueryResult, TrinoError};

pub use expect::{Expected, Mismatch, UUID_PATTERN};

use crate::fixtures::SchemaSession;
use crate::fixtures::values::BINARY_PAYLOAD;

/// Catalog a scenario targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Iceberg,
    /// Hive connector over external S3 locations
    Hive,
}

impl CatalogKind {
    /// Catalog name as configured in Trino.
    pub fn catalog(&self) -> &'static str {
        match self {
            CatalogKind::Iceberg => "iceberg",
            CatalogKind::Hive => "s3",
        }
    }

    pub fn scenario(&self) -> CatalogScenario {
        match self {
            CatalogKind::Iceberg => iceberg::scenario(),
            CatalogKind::Hive => hive::scenario(),
        }
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iceberg" => Ok(CatalogKind::Iceberg),
            "hive" | "s3" => Ok(CatalogKind::Hive),
            other => Err(format!("unknown catalog '{other}', expected iceberg or hive")),
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Iceberg => f.write_str("iceberg"),
            CatalogKind::Hive => f.write_str("hive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ListCatalogs,
    CreateSchema,
    ListSchemas,
    CreateTable,
    ShowTables,
    InsertIntoTable,
    SelectFromTable,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::ListCatalogs,
        Step::CreateSchema,
        Step::ListSchemas,
        Step::CreateTable,
        Step::ShowTables,
        Step::InsertIntoTable,
        Step::SelectFromTable,
    ];

    pub fn ordinal(&self) -> u32 {
        match self {
            Step::ListCatalogs => 10,
            Step::CreateSchema => 20,
            Step::ListSchemas => 30,
            Step::CreateTable => 40,
            Step::ShowTables => 50,
            Step::InsertIntoTable => 60,
            Step::SelectFromTable => 70,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::ListCatalogs => "list_catalogs",
            Step::CreateSchema => "create_schema",
            Step::ListSchemas => "list_schemas",
            Step::CreateTable => "create_table",
            Step::ShowTables => "show_tables",
            Step::InsertIntoTable => "insert_into_table",
            Step::SelectFromTable => "select_from_table",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}_{}", self.ordinal(), self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StepFailure {
    #[error(transparent)]
    Query(#[from] TrinoError),

    #[error("{what} {name} not found")]
    Missing { what: &'static str, name: String },

    #[error("expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("row {row}: expected {expected} columns, got {actual}")]
    ColumnCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {row}, column {column}: {mismatch}")]
    Cell {
        row: usize,
        column: String,
        mismatch: Mismatch,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("{step}: {failure}")]
pub struct ScenarioError {
    pub step: Step,
    pub failure: StepFailure,
}

/// Quote `value` as a SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: &'static str,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: &'static str) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// Columns `c1..cN` with the given types.
pub fn numbered_columns(types: &[&'static str]) -> Vec<ColumnDef> {
    types
        .iter()
        .enumerate()
        .map(|(i, sql_type)| ColumnDef::new(format!("c{}", i + 1), sql_type))
        .collect()
}

/// SQL literal to insert plus what reading it back must yield.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub literal: String,
    pub expected: Expected,
}

impl Cell {
    pub fn new(literal: impl Into<String>, expected: Expected) -> Self {
        Self {
            literal: literal.into(),
            expected,
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::new(value.to_string(), Expected::Integer(value))
    }

    pub fn boolean(literal: &str, value: bool) -> Self {
        Self::new(literal, Expected::Boolean(value))
    }

    pub fn decimal(value: &'static str, scale: u32) -> Self {
        Self::new(value, Expected::Decimal { value, scale })
    }

    pub fn varchar(value: &str) -> Self {
        Self::new(quote_literal(value), Expected::Varchar(value.to_string()))
    }

    pub fn char(value: &str, length: usize) -> Self {
        Self::new(
            format!("CHAR {}", quote_literal(value)),
            Expected::Char {
                value: value.to_string(),
                length,
            },
        )
    }

    /// The binary payload, written via `from_utf8` and a cast.
    pub fn varbinary() -> Self {
        Self::new(
            format!(
                "CAST(from_utf8(x'{}') AS VARBINARY)",
                hex::encode_upper(BINARY_PAYLOAD)
            ),
            Expected::Varbinary(BINARY_PAYLOAD.to_vec()),
        )
    }

    pub fn integer_array() -> Self {
        Self::new("ARRAY[1, 2, 3]", Expected::IntegerArray(vec![1, 2, 3]))
    }

    pub fn integer_map() -> Self {
        Self::new(
            "MAP(ARRAY['foo', 'bar'], ARRAY[1, 2])",
            Expected::IntegerMap([("foo".to_string(), 1), ("bar".to_string(), 2)].into()),
        )
    }

    /// `ROW(a VARCHAR, b INT)` value; `b_literal` may be any integer literal.
    pub fn row(a: &str, b_literal: &str, b: i64) -> Self {
        Self::new(
            format!("ROW({}, {b_literal})", quote_literal(a)),
            Expected::Row(vec![
                ("a", Expected::Varchar(a.to_string())),
                ("b", Expected::Integer(b)),
            ]),
        )
    }

    /// `TYPE 'value'` literal, e.g. `DATE '2024-07-01'`.
    pub fn typed(sql_type: &str, value: &'static str, expected: Expected) -> Self {
        Self::new(format!("{sql_type} '{value}'"), expected)
    }
}

/// Table property in the `WITH (...)` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableProperty {
    /// Property set to the table's `s3a://` location
    Location(&'static str),
    /// Property set to a raw SQL expression
    Value(&'static str, String),
}

/// Ordered steps against one catalog.
#[derive(Debug, Clone)]
pub struct CatalogScenario {
    pub kind: CatalogKind,
    pub table: String,
    pub columns: Vec<ColumnDef>,
    /// Minimum-boundary row first, maximum-boundary row second
    pub rows: [Vec<Cell>; 2],
    pub properties: Vec<TableProperty>,
}

impl CatalogScenario {
    pub async fn run(&self, session: &SchemaSession) -> Result<(), ScenarioError> {
        for step in Step::ALL {
            self.run_step(step, session).await?;
        }
        Ok(())
    }

    pub async fn run_step(&self, step: Step, session: &SchemaSession) -> Result<(), ScenarioError> {
        info!("{} {step}", self.kind);
        let outcome = match step {
            Step::ListCatalogs => self.list_catalogs(session).await,
            Step::CreateSchema => session
                .execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", session.qualified()))
                .await
                .map(drop)
                .map_err(StepFailure::from),
            Step::ListSchemas => self.list_schemas(session).await,
            Step::CreateTable => session
                .execute(&self.create_table_sql(session))
                .await
                .map(drop)
                .map_err(StepFailure::from),
            Step::ShowTables => self.show_tables(session).await,
            Step::InsertIntoTable => session
                .execute(&self.insert_sql(session))
                .await
                .map(drop)
                .map_err(StepFailure::from),
            Step::SelectFromTable => self.select_from_table(session).await,
        };
        outcome.map_err(|failure| ScenarioError { step, failure })
    }

    fn qualified_table(&self, session: &SchemaSession) -> String {
        format!("{}.{}", session.qualified(), self.table)
    }

    pub fn create_table_sql(&self, session: &SchemaSession) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("  {} {}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(",\n");
        let properties = self
            .properties
            .iter()
            .map(|p| match p {
                TableProperty::Location(key) => {
                    format!("  {key}={}", quote_literal(&session.table_location(&self.table)))
                }
                TableProperty::Value(key, value) => format!("  {key}={value}"),
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE IF NOT EXISTS {}(\n{columns}\n) WITH (\n{properties}\n)",
            self.qualified_table(session)
        )
    }

    pub fn insert_sql(&self, session: &SchemaSession) -> String {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let literals = row
                    .iter()
                    .map(|cell| cell.literal.as_str())
                    .collect::<Vec<_>>()
                    .join(",\n    ");
                format!("(   {literals})")
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!("INSERT INTO {} VALUES\n{rows}", self.qualified_table(session))
    }

    /// Ordered by the first column so the minimum-boundary row comes first.
    pub fn select_sql(&self, session: &SchemaSession) -> String {
        let order = self.columns.first().map_or("1", |c| c.name.as_str());
        format!(
            "SELECT * FROM {} ORDER BY {order}",
            self.qualified_table(session)
        )
    }

    async fn list_catalogs(&self, session: &SchemaSession) -> Result<(), StepFailure> {
        let catalogs = session.execute("SHOW CATALOGS").await?;
        for name in ["system", session.catalog()] {
            require(&catalogs, "Catalog", name)?;
        }
        Ok(())
    }

    async fn list_schemas(&self, session: &SchemaSession) -> Result<(), StepFailure> {
        let schemas = session
            .execute(&format!("SHOW SCHEMAS FROM {}", session.catalog()))
            .await?;
        require(&schemas, "Schema", &session.schema().to_lowercase())
    }

    async fn show_tables(&self, session: &SchemaSession) -> Result<(), StepFailure> {
        let tables = session
            .execute(&format!("SHOW TABLES FROM {}", session.qualified()))
            .await?;
        require(&tables, "Table", &self.table)
    }

    async fn select_from_table(&self, session: &SchemaSession) -> Result<(), StepFailure> {
        let result = session.execute(&self.select_sql(session)).await?;

        debug!(nl = true, "{}", Step::SelectFromTable);
        for (i, row) in result.rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                debug!("[{:02},{:02}]> {value}", i + 1, j + 1);
            }
        }

        self.verify_rows(&result)
    }

    /// Compare a result set with the inserted rows.
    pub fn verify_rows(&self, result: &QueryResult) -> Result<(), StepFailure> {
        if result.rows.len() != self.rows.len() {
            return Err(StepFailure::RowCount {
                expected: self.rows.len(),
                actual: result.rows.len(),
            });
        }

        for (i, (actual, expected)) in result.rows.iter().zip(&self.rows).enumerate() {
            if actual.len() != self.columns.len() {
                return Err(StepFailure::ColumnCount {
                    row: i + 1,
                    expected: self.columns.len(),
                    actual: actual.len(),
                });
            }
            for ((value, cell), column) in actual.iter().zip(expected).zip(&self.columns) {
                cell.expected
                    .verify(value)
                    .map_err(|mismatch| StepFailure::Cell {
                        row: i + 1,
                        column: column.name.clone(),
                        mismatch,
                    })?;
            }
        }
        Ok(())
    }
}

fn require(result: &QueryResult, what: &'static str, name: &str) -> Result<(), StepFailure> {
    if result.contains(name) {
        Ok(())
    } else {
        Err(StepFailure::Missing {
            what,
            name: name.to_string(),
        })
    }
}
