//! Host notifications delivered to the extension

use serde::{Deserialize, Serialize};

use tabflow_tabs::{IdleState, TabId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HostEvent {
    /// The machine went idle, became active, or locked
    IdleStateChanged(IdleState),
    /// A tab was focused
    TabActivated(TabId),
    /// A tab was closed; its id may be reused by the host
    TabRemoved(TabId),
}
