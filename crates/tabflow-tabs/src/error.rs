//! Tab error types

use thiserror::Error;

use crate::host::{GroupId, TabId};

/// Failure reported by the host browser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("No tab with id {0}")]
    TabNotFound(TabId),

    #[error("No tab group with id {0}")]
    GroupNotFound(GroupId),

    #[error("Host call {operation} failed: {message}")]
    Call { operation: String, message: String },
}

impl HostError {
    pub fn call(operation: impl Into<String>, message: impl Into<String>) -> Self {
        HostError::Call {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(TabId),

    #[error("Tab {tab_id} has restricted URL: {url:?}")]
    Restricted { tab_id: TabId, url: String },

    #[error("Host error: {0}")]
    Host(HostError),
}

impl From<HostError> for TabError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::TabNotFound(id) => TabError::NotFound(id),
            other => TabError::Host(other),
        }
    }
}
