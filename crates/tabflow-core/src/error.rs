//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] tabflow_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] tabflow_tabs::TabError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] tabflow_workflows::WorkflowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Errors the popup should show to the user instead of just logging
    pub fn is_user_conflict(&self) -> bool {
        matches!(self, CoreError::Workflow(e) if e.is_user_conflict())
    }
}
