use async_trait::async_trait;

use crate::{QueryResult, TrinoClient, TrinoError};

/// Statement execution as seen by the fixture.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<QueryResult, TrinoError>;

    async fn close(&self) -> Result<(), TrinoError>;
}

#[async_trait]
impl QueryEngine for TrinoClient {
    async fn execute(&self, sql: &str) -> Result<QueryResult, TrinoError> {
        TrinoClient::execute(self, sql).await
    }

    async fn close(&self) -> Result<(), TrinoError> {
        TrinoClient::close(self);
        Ok(())
    }
}
