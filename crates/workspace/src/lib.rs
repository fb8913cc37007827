//! User workspaces for SPCF: id generation, the per-user directory tree, and
//! context document aggregation.

pub mod context;
pub mod identity;
pub mod manager;

pub use context::{AggregatedContext, ContextAggregator};
pub use identity::{IdGenerator, SaltSource, generate_hash};
pub use manager::{USER_RECORD_FILE, WorkspaceManager};
