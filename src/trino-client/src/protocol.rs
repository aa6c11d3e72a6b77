use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One response document of the statement protocol.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatementResponse {
    pub id: String,
    #[serde(default)]
    pub next_uri: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<Column>>,
    #[serde(default)]
    pub data: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    pub error: Option<QueryFailure>,
    #[serde(default)]
    pub update_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryFailure {
    pub message: String,
    #[serde(default)]
    pub error_name: Option<String>,
}

/// Result column as reported by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Full type signature, e.g. `decimal(3,2)` or `array(integer)`
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Column {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Everything a finished statement returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub query_id: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
    /// Set for DDL/DML, e.g. `CREATE TABLE` or `INSERT`
    pub update_type: Option<String>,
}

impl QueryResult {
    /// String values of the first column, as returned by the `SHOW` statements.
    pub fn first_column(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.first().and_then(Value::as_str))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.first_column().contains(&name)
    }
}
