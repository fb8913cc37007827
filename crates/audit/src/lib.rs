//! Audit log stores for SPCF.
//!
//! Every pipeline step appends one immutable record. Two stores implement
//! [`spcf_core::AuditLog`]:
//! - [`SqliteAuditLog`]: durable, one SQLite file
//! - [`InMemoryAuditLog`]: ephemeral, for tests and dry runs

pub mod in_memory;
pub mod sqlite;
pub mod summary;

pub use in_memory::InMemoryAuditLog;
pub use sqlite::SqliteAuditLog;
pub use summary::{UserSummary, summarize};
