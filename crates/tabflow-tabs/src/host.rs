//! Host browser abstraction
//!
//! Ids are assigned by the host and reused once a tab closes, so they are
//! only meaningful for the lifetime of the browser session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a host tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    pub id: TabId,
    pub window_id: i32,
    /// Current URL, empty while the host has not committed a navigation
    pub url: String,
    pub title: String,
    pub favicon_url: Option<String>,
    /// Group the tab belongs to, if any
    pub group_id: Option<GroupId>,
    /// Whether this is the focused tab of its window
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGroup {
    pub id: GroupId,
    pub title: String,
    pub color: String,
}

/// Filter for [`BrowserHost::query_tabs`]. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabQuery {
    pub active: Option<bool>,
    pub group_id: Option<GroupId>,
    pub window_id: Option<i32>,
}

impl TabQuery {
    pub fn inactive() -> Self {
        Self {
            active: Some(false),
            ..Self::default()
        }
    }

    pub fn in_group(group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, tab: &TabRecord) -> bool {
        self.active.map_or(true, |active| tab.active == active)
            && self.group_id.map_or(true, |group| tab.group_id == Some(group))
            && self.window_id.map_or(true, |window| tab.window_id == window)
    }
}

/// Tab, tab-group and navigation capabilities of the host browser.
///
/// Every call is a round trip to the host and may fail independently.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabRecord, HostError>;

    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabRecord>, HostError>;

    /// Navigate a tab to `url`
    async fn update_tab_url(&self, tab_id: TabId, url: &str) -> Result<(), HostError>;

    /// Move `tab_ids` into `group`, or into a new group when `group` is `None`.
    /// Returns the group that now holds the tabs.
    async fn group_tabs(
        &self,
        tab_ids: &[TabId],
        group: Option<GroupId>,
    ) -> Result<GroupId, HostError>;

    async fn ungroup_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn get_group(&self, group: GroupId) -> Result<TabGroup, HostError>;

    /// Change only the title of a group; color and collapse state are kept
    async fn set_group_title(&self, group: GroupId, title: &str) -> Result<(), HostError>;
}
