//! Tabflow Core
//!
//! Central coordination layer: every popup action and host event is
//! handled by [`Extension`], which owns all workflow and suspension state.

mod config;
mod error;
mod event;
mod extension;

pub use config::Config;
pub use error::CoreError;
pub use event::HostEvent;
pub use extension::Extension;

// Re-export core components
pub use tabflow_storage::{Database, StorageError};
pub use tabflow_tabs::{
    BrowserHost, GroupId, HostError, IdleState, RestrictedUrls, SuspendOutcome, SuspendReport,
    SuspendedTab, SuspensionMonitor, TabError, TabGroup, TabId, TabQuery, TabRecord,
    TabValidator, Validation,
};
pub use tabflow_workflows::{
    GroupSynchronizer, ReleaseReport, SyncOutcome, Workflow, WorkflowError, WorkflowStore,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
