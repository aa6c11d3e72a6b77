//! Ephemeral-schema fixture for exercising Trino catalogs end to end.
//!
//! A [`fixtures::Fixture`] opens a connection, creates nothing until a
//! scenario runs, and on teardown drops the `unittest_` schema and reclaims
//! its object-storage prefixes. The [`scenario`] module holds the Iceberg
//! and Hive/S3 step sequences.

pub mod fixtures;
pub mod scenario;

pub use common::logging::init_test_logging;
