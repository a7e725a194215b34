//! Tabflow Workflows
//!
//! - A workflow is a named, ordered set of tabs
//! - The store auto-saves on any mutation
//! - Each workflow maps to at most one host tab group, kept in sync by
//!   [`GroupSynchronizer`]

mod error;
mod store;
mod sync;
mod workflow;

pub use error::WorkflowError;
pub use store::{Assignment, WorkflowStore, DEFAULT_STORAGE_KEY};
pub use sync::{GroupSynchronizer, ReleaseReport, SyncOutcome};
pub use workflow::Workflow;

pub type Result<T> = std::result::Result<T, WorkflowError>;
