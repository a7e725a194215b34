//! Idle tab suspension
//!
//! A suspended tab is navigated to a bundled placeholder page. The original
//! URL is remembered so the tab can be restored when it is activated again.
//! Bookkeeping lives in memory only and starts empty on every launch.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TabError;
use crate::host::{BrowserHost, TabId, TabQuery};
use crate::idle::IdleState;
use crate::restricted::RestrictedUrls;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspendedTab {
    pub tab_id: TabId,
    /// URL to restore on unsuspend
    pub original_url: String,
    pub suspended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspendOutcome {
    /// Tab was navigated to the placeholder
    Suspended,
    /// Tab already shows the placeholder
    AlreadySuspended,
    /// Tab URL is empty or restricted
    Skipped { url: String },
}

#[derive(Debug, Clone, Default)]
pub struct SuspendReport {
    pub suspended: Vec<TabId>,
    pub skipped: Vec<TabId>,
    pub failed: Vec<(TabId, TabError)>,
}

#[derive(Debug)]
pub struct SuspensionMonitor {
    placeholder_url: String,
    restricted: RestrictedUrls,
    suspended: Arc<RwLock<HashMap<TabId, SuspendedTab>>>,
}

impl SuspensionMonitor {
    pub fn new(placeholder_url: impl Into<String>, restricted: RestrictedUrls) -> Self {
        Self {
            placeholder_url: placeholder_url.into(),
            restricted,
            suspended: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn placeholder_url(&self) -> &str {
        &self.placeholder_url
    }

    /// React to a host idle-state transition
    pub async fn on_idle_state(
        &self,
        host: &dyn BrowserHost,
        state: IdleState,
    ) -> Result<SuspendReport> {
        if !state.should_suspend() {
            tracing::debug!(state = %state, "Idle state change ignored");
            return Ok(SuspendReport::default());
        }

        self.suspend_inactive(host).await
    }

    /// Suspend every tab that is not the focused tab of its window.
    /// Tabs are handled independently; one failure does not stop the pass.
    pub async fn suspend_inactive(&self, host: &dyn BrowserHost) -> Result<SuspendReport> {
        let tabs = host.query_tabs(&TabQuery::inactive()).await?;
        let mut report = SuspendReport::default();

        for tab in tabs {
            match self.suspend_tab(host, tab.id).await {
                Ok(SuspendOutcome::Suspended) => report.suspended.push(tab.id),
                Ok(_) => report.skipped.push(tab.id),
                Err(e) => {
                    tracing::warn!(tab_id = %tab.id, error = %e, "Failed to suspend tab");
                    report.failed.push((tab.id, e));
                }
            }
        }

        tracing::info!(
            suspended = report.suspended.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Suspended inactive tabs"
        );

        Ok(report)
    }

    pub async fn suspend_tab(
        &self,
        host: &dyn BrowserHost,
        tab_id: TabId,
    ) -> Result<SuspendOutcome> {
        let tab = host.get_tab(tab_id).await?;

        if tab.url == self.placeholder_url && self.is_suspended(tab_id) {
            return Ok(SuspendOutcome::AlreadySuspended);
        }

        if self.restricted.is_restricted(&tab.url) {
            tracing::debug!(tab_id = %tab_id, url = %tab.url, "Cannot suspend restricted tab");
            return Ok(SuspendOutcome::Skipped { url: tab.url });
        }

        host.update_tab_url(tab_id, &self.placeholder_url).await?;

        self.suspended.write().insert(
            tab_id,
            SuspendedTab {
                tab_id,
                original_url: tab.url,
                suspended_at: Utc::now(),
            },
        );

        tracing::info!(tab_id = %tab_id, "Suspended tab");

        Ok(SuspendOutcome::Suspended)
    }

    /// Restore a suspended tab to its original URL. Returns `false` if the
    /// tab was not suspended.
    pub async fn unsuspend_tab(&self, host: &dyn BrowserHost, tab_id: TabId) -> Result<bool> {
        let entry = self.suspended.write().remove(&tab_id);
        let Some(entry) = entry else {
            return Ok(false);
        };

        host.update_tab_url(tab_id, &entry.original_url).await?;

        tracing::info!(tab_id = %tab_id, url = %entry.original_url, "Unsuspended tab");

        Ok(true)
    }

    /// Drop bookkeeping for a tab that no longer exists
    pub fn forget(&self, tab_id: TabId) -> bool {
        self.suspended.write().remove(&tab_id).is_some()
    }

    pub fn is_suspended(&self, tab_id: TabId) -> bool {
        self.suspended.read().contains_key(&tab_id)
    }

    pub fn suspended_tabs(&self) -> Vec<SuspendedTab> {
        let mut tabs: Vec<SuspendedTab> = self.suspended.read().values().cloned().collect();
        tabs.sort_by_key(|entry| entry.tab_id);
        tabs
    }
}

impl Clone for SuspensionMonitor {
    fn clone(&self) -> Self {
        Self {
            placeholder_url: self.placeholder_url.clone(),
            restricted: self.restricted.clone(),
            suspended: Arc::clone(&self.suspended),
        }
    }
}
