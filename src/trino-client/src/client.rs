use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::TrinoError;
use crate::protocol::{QueryResult, StatementResponse};

const STATEMENT_PATH: &str = "/v1/statement";
const USER_HEADER: &str = "X-Trino-User";

/// Statuses the coordinator uses to ask the client to come back later.
const RETRYABLE: [StatusCode; 4] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Connection parameters beyond the coordinator address
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub user: String,
    /// Skip certificate verification for `https` coordinators
    pub accept_invalid_certs: bool,
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            user: "test".to_string(),
            accept_invalid_certs: true,
            max_attempts: 5,
            base_backoff: Duration::from_millis(100),
            timeout: Duration::from_secs(300),
        }
    }
}

impl ConnectOptions {
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_backoff(mut self, max_attempts: usize, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.base_backoff = base_backoff;
        self
    }
}

/// One connection to a Trino coordinator
pub struct TrinoClient {
    base_url: String,
    user: String,
    http: reqwest::Client,
    max_attempts: usize,
    base_backoff: Duration,
    closed: AtomicBool,
}

impl TrinoClient {
    /// Create a client for the coordinator at `base_url`, e.g. `https://trino.example.org:443`
    pub fn connect(base_url: &str, options: ConnectOptions) -> Result<Self, TrinoError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user: options.user,
            http,
            max_attempts: options.max_attempts.max(1),
            base_backoff: options.base_backoff,
            closed: AtomicBool::new(false),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run one statement to completion and collect all of its rows.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult, TrinoError> {
        if self.is_closed() {
            return Err(TrinoError::Closed);
        }

        debug!(sql, "Submitting statement");
        let submit = self
            .http
            .post(format!("{}{STATEMENT_PATH}", self.base_url))
            .header(USER_HEADER, &self.user)
            .body(sql.to_string());
        let mut page = self.fetch(submit).await?;

        let mut result = QueryResult {
            query_id: page.id.clone(),
            ..QueryResult::default()
        };

        loop {
            if let Some(error) = page.error.take() {
                return Err(TrinoError::Query {
                    query_id: page.id,
                    name: error.error_name.unwrap_or_default(),
                    message: error.message,
                });
            }
            if let Some(columns) = page.columns.take() {
                result.columns = columns;
            }
            if let Some(data) = page.data.take() {
                result.rows.extend(data);
            }
            if page.update_type.is_some() {
                result.update_type = page.update_type.take();
            }

            let Some(next_uri) = page.next_uri.take() else {
                break;
            };
            if self.is_closed() {
                return Err(TrinoError::Closed);
            }
            let next = self.http.get(&next_uri).header(USER_HEADER, &self.user);
            page = self.fetch(next).await?;
        }

        debug!(query_id = %result.query_id, rows = result.rows.len(), "Statement finished");
        Ok(result)
    }

    /// Mark the connection closed. Further statements fail with [`TrinoError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    async fn fetch(&self, builder: RequestBuilder) -> Result<StatementResponse, TrinoError> {
        let response = self.send(builder).await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(TrinoError::Status {
                status: status.as_u16(),
                message: body,
            })
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, TrinoError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = builder
                .try_clone()
                .ok_or_else(|| TrinoError::Status {
                    status: 0,
                    message: "request body cannot be retried".to_string(),
                })?
                .build()?;
            let url = request.url().clone();

            match self.http.execute(request).await {
                Ok(response) if RETRYABLE.contains(&response.status()) && attempt < self.max_attempts => {
                    debug!(attempt, %url, status = %response.status(), "Coordinator busy, retrying");
                }
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.max_attempts && (err.is_connect() || err.is_timeout()) => {
                    debug!(attempt, %url, error = %err, "Request failed, retrying");
                }
                Err(err) => return Err(err.into()),
            }

            tokio::time::sleep(self.backoff_delay(attempt)).await;
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }
}
