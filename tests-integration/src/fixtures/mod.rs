//! Schema fixture: value literals, session setup, storage reclamation and
//! the setup/teardown lifecycle.

mod lifecycle;
mod memory;
mod minio_context;
mod reclaim;
mod session;
pub mod values;

pub use lifecycle::{
    Fixture, FixtureError, LifecycleState, SchemaDrop, StorageCleanup, TeardownReport,
};
pub use memory::InMemoryBatchStore;
pub use minio_context::MinioTestContext;
pub use reclaim::{ReclaimError, ReclaimSummary, reclaim};
pub use session::{SCHEMA_PREFIX, SchemaSession, StorageLocation, generate_schema_name};
