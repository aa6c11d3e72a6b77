pub mod cli;
pub mod config;
pub mod logging;
pub mod storage;

pub use config::{ConfigResolver, ConfigurationError, Settings};
