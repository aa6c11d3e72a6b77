//! Minimal Trino connection speaking the HTTP statement protocol.

mod client;
mod engine;
mod error;
mod protocol;

pub use client::{ConnectOptions, TrinoClient};
#[cfg(any(test, feature = "testing"))]
pub use engine::MockQueryEngine;
pub use engine::QueryEngine;
pub use error::TrinoError;
pub use protocol::{Column, QueryResult};

pub use serde_json::Value;
