//! Workflow error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("A workflow named {0:?} already exists")]
    AlreadyExists(String),

    #[error("Workflow name cannot be empty")]
    EmptyName,

    #[error("Workflow {0:?} has no tabs that can be grouped")]
    NoValidTabs(String),

    #[error("Host error: {0}")]
    Host(#[from] tabflow_tabs::HostError),

    #[error("Storage error: {0}")]
    Storage(#[from] tabflow_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Conflicts the user has to resolve, as opposed to host or storage faults
    pub fn is_user_conflict(&self) -> bool {
        matches!(self, WorkflowError::AlreadyExists(_))
    }
}
