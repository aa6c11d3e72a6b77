/// Errors from the Trino connection
#[derive(Debug, thiserror::Error)]
pub enum TrinoError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Coordinator answered with a non-success status
    #[error("Coordinator error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// The query ran and failed
    #[error("Query {query_id} failed ({name}): {message}")]
    Query {
        query_id: String,
        /// Trino error name, e.g. `SCHEMA_NOT_FOUND`
        name: String,
        message: String,
    },
    /// JSON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    /// Statement issued after `close`
    #[error("Connection is closed")]
    Closed,
}

impl TrinoError {
    /// Trino error name of a failed query, if this is one.
    pub fn query_error_name(&self) -> Option<&str> {
        match self {
            TrinoError::Query { name, .. } => Some(name),
            _ => None,
        }
    }
}
