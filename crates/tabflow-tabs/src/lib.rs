//! Tabflow Tab Layer
//!
//! The host browser is reached only through [`BrowserHost`]. This crate
//! decides which tabs may be touched ([`RestrictedUrls`], [`TabValidator`])
//! and suspends inactive tabs when the user goes idle ([`SuspensionMonitor`]).

mod error;
mod host;
mod idle;
mod restricted;
mod suspend;
mod validator;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{HostError, TabError};
pub use host::{BrowserHost, GroupId, TabGroup, TabId, TabQuery, TabRecord};
pub use idle::IdleState;
pub use restricted::{RestrictedUrls, DEFAULT_RESTRICTED_SCHEMES};
pub use suspend::{SuspendOutcome, SuspendReport, SuspendedTab, SuspensionMonitor};
pub use validator::{TabValidator, Validation};

pub type Result<T> = std::result::Result<T, TabError>;
