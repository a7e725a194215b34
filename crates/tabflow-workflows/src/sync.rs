//! Tab Group Synchronizer
//!
//! Keeps a host tab group in step with a workflow: the group holds exactly
//! the workflow's usable tabs and carries the workflow's name as its title.

use std::collections::HashSet;

use tabflow_tabs::{
    BrowserHost, GroupId, HostError, SuspensionMonitor, TabError, TabId, TabQuery, TabRecord,
    TabValidator,
};

use crate::error::WorkflowError;
use crate::Result;

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub group_id: GroupId,
    /// A new host group was created
    pub created: bool,
    /// Tabs now in the group, in workflow order
    pub grouped: Vec<TabId>,
    /// Workflow tabs left out of the group
    pub skipped: Vec<(TabId, TabError)>,
    /// Foreign tabs taken out of the group
    pub released: Vec<TabId>,
}

#[derive(Debug, Clone, Default)]
pub struct ReleaseReport {
    pub ungrouped: Vec<TabId>,
    pub failed: Vec<(TabId, HostError)>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupSynchronizer {
    validator: TabValidator,
    /// Tabs parked on the placeholder page stay group members
    suspended: Option<SuspensionMonitor>,
}

impl GroupSynchronizer {
    pub fn new(validator: TabValidator) -> Self {
        Self {
            validator,
            suspended: None,
        }
    }

    pub fn with_suspension(mut self, monitor: SuspensionMonitor) -> Self {
        self.suspended = Some(monitor);
        self
    }

    pub fn validator(&self) -> &TabValidator {
        &self.validator
    }

    /// Group the usable subset of `tab_ids` under a group titled `name`.
    ///
    /// `bound` is the group this workflow was last synchronized with; it is
    /// reused while it still exists on the host.
    pub async fn sync(
        &self,
        host: &dyn BrowserHost,
        name: &str,
        tab_ids: &[TabId],
        bound: Option<GroupId>,
    ) -> Result<SyncOutcome> {
        let mut validation = self.validator.validate(host, tab_ids).await;

        // A suspended tab shows a restricted placeholder but still belongs
        let mut members: HashSet<TabId> = validation.ids().into_iter().collect();
        validation.rejected.retain(|(tab_id, err)| {
            let parked = matches!(err, TabError::Restricted { .. }) && self.is_suspended(*tab_id);
            if parked {
                members.insert(*tab_id);
            }
            !parked
        });

        let mut grouped = Vec::with_capacity(members.len());
        for tab_id in tab_ids {
            if members.remove(tab_id) {
                grouped.push(*tab_id);
            }
        }

        if grouped.is_empty() {
            tracing::warn!(workflow = %name, "No valid tabs to group");
            return Err(WorkflowError::NoValidTabs(name.to_string()));
        }

        let target = match self.live_binding(host, bound).await {
            Some(group_id) => Some(group_id),
            None => discover_group(name, &validation.accepted),
        };

        let group_id = host.group_tabs(&grouped, target).await?;
        host.set_group_title(group_id, name).await?;

        let released = self.trim_group(host, group_id, &grouped).await;

        tracing::info!(
            workflow = %name,
            group_id = %group_id,
            created = target.is_none(),
            tabs = grouped.len(),
            skipped = validation.rejected.len(),
            "Synchronized tab group"
        );

        Ok(SyncOutcome {
            group_id,
            created: target.is_none(),
            grouped,
            skipped: validation.rejected,
            released,
        })
    }

    /// Retitle the group of an existing workflow without touching membership.
    /// Returns `None` when none of the tabs is grouped.
    pub async fn retitle(
        &self,
        host: &dyn BrowserHost,
        name: &str,
        tab_ids: &[TabId],
        bound: Option<GroupId>,
    ) -> Result<Option<GroupId>> {
        let group_id = match self.live_binding(host, bound).await {
            Some(group_id) => Some(group_id),
            None => scan_for_group(host, tab_ids).await,
        };

        let Some(group_id) = group_id else {
            tracing::debug!(workflow = %name, "No tab group to retitle");
            return Ok(None);
        };

        host.set_group_title(group_id, name).await?;

        tracing::info!(workflow = %name, group_id = %group_id, "Retitled tab group");

        Ok(Some(group_id))
    }

    /// Ungroup every tab. Individual failures are collected, never fatal.
    pub async fn release(&self, host: &dyn BrowserHost, tab_ids: &[TabId]) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        for &tab_id in tab_ids {
            match host.ungroup_tab(tab_id).await {
                Ok(()) => report.ungrouped.push(tab_id),
                Err(e) => {
                    tracing::warn!(tab_id = %tab_id, error = %e, "Failed to ungroup tab");
                    report.failed.push((tab_id, e));
                }
            }
        }

        report
    }

    fn is_suspended(&self, tab_id: TabId) -> bool {
        self.suspended
            .as_ref()
            .is_some_and(|monitor| monitor.is_suspended(tab_id))
    }

    async fn live_binding(
        &self,
        host: &dyn BrowserHost,
        bound: Option<GroupId>,
    ) -> Option<GroupId> {
        let group_id = bound?;
        match host.get_group(group_id).await {
            Ok(group) => Some(group.id),
            Err(e) => {
                tracing::debug!(group_id = %group_id, error = %e, "Bound tab group is gone");
                None
            }
        }
    }

    /// Take tabs that are not part of the workflow out of its group
    async fn trim_group(
        &self,
        host: &dyn BrowserHost,
        group_id: GroupId,
        members: &[TabId],
    ) -> Vec<TabId> {
        let current = match host.query_tabs(&TabQuery::in_group(group_id)).await {
            Ok(tabs) => tabs,
            Err(e) => {
                tracing::warn!(group_id = %group_id, error = %e, "Could not list group members");
                return Vec::new();
            }
        };

        let members: HashSet<TabId> = members.iter().copied().collect();
        let strays: Vec<TabId> = current
            .into_iter()
            .map(|tab| tab.id)
            .filter(|id| !members.contains(id))
            .collect();

        self.release(host, &strays).await.ungrouped
    }
}

/// First validated tab that already sits in a group decides the target
fn discover_group(name: &str, tabs: &[TabRecord]) -> Option<GroupId> {
    let mut groups = tabs.iter().filter_map(|tab| tab.group_id);
    let first = groups.next()?;

    if groups.any(|other| other != first) {
        tracing::warn!(
            workflow = %name,
            group_id = %first,
            "Workflow tabs span several groups; using the first"
        );
    }

    Some(first)
}

async fn scan_for_group(host: &dyn BrowserHost, tab_ids: &[TabId]) -> Option<GroupId> {
    for &tab_id in tab_ids {
        match host.get_tab(tab_id).await {
            Ok(TabRecord {
                group_id: Some(group_id),
                ..
            }) => return Some(group_id),
            Ok(_) => {}
            Err(e) => tracing::debug!(tab_id = %tab_id, error = %e, "Skipping tab"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabflow_tabs::testing::{Fault, FakeHost, HostCall};
    use tabflow_tabs::RestrictedUrls;

    fn ids(raw: &[i32]) -> Vec<TabId> {
        raw.iter().copied().map(TabId).collect()
    }

    fn host_with_tabs(raw: &[i32]) -> FakeHost {
        let host = FakeHost::new();
        for id in raw {
            host.add_tab(*id, &format!("https://example.com/{}", id));
        }
        host
    }

    #[tokio::test]
    async fn test_creates_group_when_none_exists() {
        let host = host_with_tabs(&[42]);
        let outcome = GroupSynchronizer::default()
            .sync(&host, "Research", &ids(&[42]), None)
            .await
            .unwrap();

        assert!(outcome.created);
        assert_eq!(host.members(outcome.group_id), ids(&[42]));
        assert_eq!(host.group(outcome.group_id).unwrap().title, "Research");
    }

    #[tokio::test]
    async fn test_adopts_group_of_first_grouped_tab() {
        let host = host_with_tabs(&[5, 7, 9]);
        let existing = host.add_group(3, "old", "blue", &[7]);

        let outcome = GroupSynchronizer::default()
            .sync(&host, "Reading", &ids(&[5, 7, 9]), None)
            .await
            .unwrap();

        assert_eq!(outcome.group_id, existing);
        assert!(!outcome.created);
        assert_eq!(host.members(existing), ids(&[5, 7, 9]));

        let group = host.group(existing).unwrap();
        assert_eq!(group.title, "Reading");
        assert_eq!(group.color, "blue");
        assert_eq!(host.groups().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let host = host_with_tabs(&[1, 2]);
        let sync = GroupSynchronizer::default();

        let first = sync.sync(&host, "Work", &ids(&[1, 2]), None).await.unwrap();
        let second = sync
            .sync(&host, "Work", &ids(&[1, 2]), Some(first.group_id))
            .await
            .unwrap();
        let unbound = sync.sync(&host, "Work", &ids(&[1, 2]), None).await.unwrap();

        assert_eq!(first.group_id, second.group_id);
        assert_eq!(first.group_id, unbound.group_id);
        assert!(!second.created);
        assert_eq!(host.groups().len(), 1);
        assert_eq!(host.members(first.group_id), ids(&[1, 2]));
        assert_eq!(host.group(first.group_id).unwrap().title, "Work");
    }

    #[tokio::test]
    async fn test_binding_wins_over_scan() {
        let host = host_with_tabs(&[1, 2, 3]);
        let other = host.add_group(10, "other", "red", &[1]);
        let bound = host.add_group(20, "Work", "green", &[3]);

        let outcome = GroupSynchronizer::default()
            .sync(&host, "Work", &ids(&[1, 2]), Some(bound))
            .await
            .unwrap();

        assert_eq!(outcome.group_id, bound);
        // Tab 3 is no longer part of the workflow
        assert_eq!(outcome.released, ids(&[3]));
        assert_eq!(host.members(bound), ids(&[1, 2]));
        assert!(host.group(other).is_none());
    }

    #[tokio::test]
    async fn test_stale_binding_falls_back_to_creation() {
        let host = host_with_tabs(&[1]);

        let outcome = GroupSynchronizer::default()
            .sync(&host, "Work", &ids(&[1]), Some(GroupId(999)))
            .await
            .unwrap();

        assert!(outcome.created);
        assert_ne!(outcome.group_id, GroupId(999));
    }

    #[tokio::test]
    async fn test_invalid_tabs_are_skipped() {
        let host = host_with_tabs(&[1, 3]);
        host.add_tab(2, "chrome://settings");

        let outcome = GroupSynchronizer::default()
            .sync(&host, "Mixed", &ids(&[1, 2, 404, 3]), None)
            .await
            .unwrap();

        assert_eq!(outcome.grouped, ids(&[1, 3]));
        let skipped: Vec<TabId> = outcome.skipped.iter().map(|(id, _)| *id).collect();
        assert_eq!(skipped, ids(&[2, 404]));
        assert!(host.tab(2).unwrap().group_id.is_none());
    }

    #[tokio::test]
    async fn test_no_valid_tabs_touches_no_groups() {
        let host = FakeHost::new();
        host.add_tab(1, "chrome://newtab");

        let err = GroupSynchronizer::default()
            .sync(&host, "Empty", &ids(&[1, 2]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::NoValidTabs(_)));
        assert!(host.groups().is_empty());
        assert!(!host
            .calls()
            .iter()
            .any(|call| matches!(call, HostCall::GroupTabs(..))));
    }

    #[tokio::test]
    async fn test_host_failure_is_returned() {
        let host = host_with_tabs(&[1]);
        host.inject(Fault::Group);

        let err = GroupSynchronizer::default()
            .sync(&host, "Work", &ids(&[1]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Host(_)));
    }

    #[tokio::test]
    async fn test_title_failure_is_returned() {
        let host = host_with_tabs(&[1]);
        host.inject(Fault::SetTitle);

        let err = GroupSynchronizer::default()
            .sync(&host, "Work", &ids(&[1]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Host(HostError::Call { .. })));
    }

    #[tokio::test]
    async fn test_suspended_tabs_stay_in_group() {
        let host = host_with_tabs(&[1, 2, 3]);
        host.add_tab(4, "chrome://settings");
        let monitor = SuspensionMonitor::new(
            "chrome-extension://tabflow/suspended.html",
            RestrictedUrls::default(),
        );
        let sync = GroupSynchronizer::default().with_suspension(monitor.clone());

        let first = sync.sync(&host, "Work", &ids(&[1, 2, 4]), None).await.unwrap();
        monitor.suspend_tab(&host, TabId(2)).await.unwrap();

        let second = sync
            .sync(&host, "Work", &ids(&[1, 2, 4, 3]), Some(first.group_id))
            .await
            .unwrap();

        assert_eq!(second.group_id, first.group_id);
        assert_eq!(second.grouped, ids(&[1, 2, 3]));
        assert!(second.released.is_empty());
        assert_eq!(host.members(first.group_id), ids(&[1, 2, 3]));

        // Only the genuinely restricted tab is reported as skipped
        let skipped: Vec<TabId> = second.skipped.iter().map(|(id, _)| *id).collect();
        assert_eq!(skipped, ids(&[4]));
    }

    #[tokio::test]
    async fn test_only_suspended_tabs_still_group() {
        let host = host_with_tabs(&[1]);
        let monitor = SuspensionMonitor::new(
            "chrome-extension://tabflow/suspended.html",
            RestrictedUrls::default(),
        );
        monitor.suspend_tab(&host, TabId(1)).await.unwrap();

        let outcome = GroupSynchronizer::default()
            .with_suspension(monitor)
            .sync(&host, "Parked", &ids(&[1]), None)
            .await
            .unwrap();

        assert!(outcome.created);
        assert_eq!(host.members(outcome.group_id), ids(&[1]));
    }

    #[tokio::test]
    async fn test_retitle_uses_first_grouped_tab() {
        let host = host_with_tabs(&[1, 2]);
        let group = host.add_group(4, "Before", "pink", &[2]);

        let retitled = GroupSynchronizer::default()
            .retitle(&host, "After", &ids(&[404, 1, 2]), None)
            .await
            .unwrap();

        assert_eq!(retitled, Some(group));
        assert_eq!(host.group(group).unwrap().title, "After");
        assert_eq!(host.group(group).unwrap().color, "pink");
        assert_eq!(host.members(group), ids(&[2]));
    }

    #[tokio::test]
    async fn test_retitle_without_group() {
        let host = host_with_tabs(&[1]);
        let retitled = GroupSynchronizer::default()
            .retitle(&host, "After", &ids(&[1]), None)
            .await
            .unwrap();
        assert!(retitled.is_none());
    }

    #[tokio::test]
    async fn test_release_continues_past_failures() {
        let host = host_with_tabs(&[1, 2, 3]);
        host.add_group(4, "Work", "grey", &[1, 2, 3]);
        host.inject(Fault::Ungroup(TabId(2)));

        let report = GroupSynchronizer::default()
            .release(&host, &ids(&[1, 2, 3]))
            .await;

        assert_eq!(report.ungrouped, ids(&[1, 3]));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, TabId(2));

        let ungroup_calls = host
            .calls()
            .into_iter()
            .filter(|call| matches!(call, HostCall::UngroupTab(_)))
            .count();
        assert_eq!(ungroup_calls, 3);
    }
}
