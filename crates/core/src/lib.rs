//! # SPCF Core
//!
//! Domain types, traits, and error definitions for the prompt & context
//! factory. This crate has no storage or filesystem logic of its own; it
//! defines the model every other crate implements against.
//!
//! The audit store is a trait here so the orchestrator can run against
//! SQLite in production and an in-memory log in tests.

pub mod audit;
pub mod error;
pub mod seed;
pub mod user;
pub mod workspace;

// Re-export key types at crate root for ergonomics
pub use audit::{AuditLog, NewOperation, OperationRecord, OperationStatus, ops};
pub use error::{Error, ErrorKind, Result};
pub use seed::{AreaStats, FormulationArea, GraphMetrics, SeedGraph, SeedNode};
pub use user::{User, UserId};
pub use workspace::{WorkspaceArea, WorkspacePaths};
