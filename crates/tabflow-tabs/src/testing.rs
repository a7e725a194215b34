//! In-memory host for tests
//!
//! Mirrors the host's grouping rules: moving a tab into a group removes it
//! from its previous group, and a group disappears once its last tab leaves.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::HostError;
use crate::host::{BrowserHost, GroupId, TabGroup, TabId, TabQuery, TabRecord};

const FIRST_GROUP_ID: i32 = 100;

/// A host call as observed by [`FakeHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    GetTab(TabId),
    QueryTabs(TabQuery),
    UpdateTabUrl(TabId, String),
    GroupTabs(Vec<TabId>, Option<GroupId>),
    UngroupTab(TabId),
    GetGroup(GroupId),
    SetGroupTitle(GroupId, String),
}

/// A call that should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Fault {
    Query,
    Navigate(TabId),
    Group,
    Ungroup(TabId),
    SetTitle,
}

#[derive(Default)]
struct FakeState {
    tabs: BTreeMap<TabId, TabRecord>,
    groups: BTreeMap<GroupId, TabGroup>,
    next_group: i32,
    faults: BTreeSet<Fault>,
    calls: Vec<HostCall>,
}

impl FakeState {
    fn check(&self, fault: Fault, operation: &str) -> Result<(), HostError> {
        if self.faults.contains(&fault) {
            Err(HostError::call(operation, "injected failure"))
        } else {
            Ok(())
        }
    }

    fn drop_empty_groups(&mut self) {
        let occupied: BTreeSet<GroupId> =
            self.tabs.values().filter_map(|tab| tab.group_id).collect();
        self.groups.retain(|id, _| occupied.contains(id));
    }
}

pub struct FakeHost {
    state: Mutex<FakeState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_group: FIRST_GROUP_ID,
                ..FakeState::default()
            }),
        }
    }

    /// Add a background tab in window 1
    pub fn add_tab(&self, id: i32, url: &str) -> TabRecord {
        self.insert_tab(id, url, false)
    }

    /// Add the focused tab of window 1
    pub fn add_active_tab(&self, id: i32, url: &str) -> TabRecord {
        self.insert_tab(id, url, true)
    }

    fn insert_tab(&self, id: i32, url: &str, active: bool) -> TabRecord {
        let tab = TabRecord {
            id: TabId(id),
            window_id: 1,
            url: url.to_string(),
            title: format!("Tab {}", id),
            favicon_url: None,
            group_id: None,
            active,
        };
        self.state.lock().tabs.insert(tab.id, tab.clone());
        tab
    }

    /// Create a group holding `members`
    pub fn add_group(&self, id: i32, title: &str, color: &str, members: &[i32]) -> GroupId {
        let group_id = GroupId(id);
        let mut state = self.state.lock();
        state.groups.insert(
            group_id,
            TabGroup {
                id: group_id,
                title: title.to_string(),
                color: color.to_string(),
            },
        );
        for member in members {
            if let Some(tab) = state.tabs.get_mut(&TabId(*member)) {
                tab.group_id = Some(group_id);
            }
        }
        state.drop_empty_groups();
        group_id
    }

    /// Close a tab
    pub fn remove_tab(&self, id: i32) {
        let mut state = self.state.lock();
        state.tabs.remove(&TabId(id));
        state.drop_empty_groups();
    }

    pub fn inject(&self, fault: Fault) {
        self.state.lock().faults.insert(fault);
    }

    pub fn heal(&self) {
        self.state.lock().faults.clear();
    }

    pub fn tab(&self, id: i32) -> Option<TabRecord> {
        self.state.lock().tabs.get(&TabId(id)).cloned()
    }

    pub fn group(&self, id: GroupId) -> Option<TabGroup> {
        self.state.lock().groups.get(&id).cloned()
    }

    pub fn groups(&self) -> Vec<TabGroup> {
        self.state.lock().groups.values().cloned().collect()
    }

    pub fn members(&self, id: GroupId) -> Vec<TabId> {
        self.state
            .lock()
            .tabs
            .values()
            .filter(|tab| tab.group_id == Some(id))
            .map(|tab| tab.id)
            .collect()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserHost for FakeHost {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabRecord, HostError> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::GetTab(tab_id));
        state
            .tabs
            .get(&tab_id)
            .cloned()
            .ok_or(HostError::TabNotFound(tab_id))
    }

    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabRecord>, HostError> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::QueryTabs(query.clone()));
        state.check(Fault::Query, "tabs.query")?;
        Ok(state
            .tabs
            .values()
            .filter(|tab| query.matches(tab))
            .cloned()
            .collect())
    }

    async fn update_tab_url(&self, tab_id: TabId, url: &str) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(HostCall::UpdateTabUrl(tab_id, url.to_string()));
        state.check(Fault::Navigate(tab_id), "tabs.update")?;
        let tab = state
            .tabs
            .get_mut(&tab_id)
            .ok_or(HostError::TabNotFound(tab_id))?;
        tab.url = url.to_string();
        Ok(())
    }

    async fn group_tabs(
        &self,
        tab_ids: &[TabId],
        group: Option<GroupId>,
    ) -> Result<GroupId, HostError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(HostCall::GroupTabs(tab_ids.to_vec(), group));
        state.check(Fault::Group, "tabs.group")?;

        if tab_ids.is_empty() {
            return Err(HostError::call("tabs.group", "no tabs specified"));
        }
        if let Some(missing) = tab_ids.iter().find(|id| !state.tabs.contains_key(*id)) {
            return Err(HostError::TabNotFound(*missing));
        }

        let target = match group {
            Some(id) if state.groups.contains_key(&id) => id,
            Some(id) => return Err(HostError::GroupNotFound(id)),
            None => {
                let id = GroupId(state.next_group);
                state.next_group += 1;
                state.groups.insert(
                    id,
                    TabGroup {
                        id,
                        title: String::new(),
                        color: "grey".to_string(),
                    },
                );
                id
            }
        };

        for id in tab_ids {
            if let Some(tab) = state.tabs.get_mut(id) {
                tab.group_id = Some(target);
            }
        }
        state.drop_empty_groups();

        Ok(target)
    }

    async fn ungroup_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::UngroupTab(tab_id));
        state.check(Fault::Ungroup(tab_id), "tabs.ungroup")?;
        let tab = state
            .tabs
            .get_mut(&tab_id)
            .ok_or(HostError::TabNotFound(tab_id))?;
        tab.group_id = None;
        state.drop_empty_groups();
        Ok(())
    }

    async fn get_group(&self, group: GroupId) -> Result<TabGroup, HostError> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::GetGroup(group));
        state
            .groups
            .get(&group)
            .cloned()
            .ok_or(HostError::GroupNotFound(group))
    }

    async fn set_group_title(&self, group: GroupId, title: &str) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(HostCall::SetGroupTitle(group, title.to_string()));
        state.check(Fault::SetTitle, "tabGroups.update")?;
        let entry = state
            .groups
            .get_mut(&group)
            .ok_or(HostError::GroupNotFound(group))?;
        entry.title = title.to_string();
        Ok(())
    }
}
