//! Main extension state container
//!
//! Handlers for popup actions and host events. Workflow handlers run one at
//! a time: each holds the workflow gate across its host calls, so two quick
//! drops cannot interleave their read-modify-write of the same workflow.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use tabflow_storage::Database;
use tabflow_tabs::{
    BrowserHost, IdleState, SuspendReport, SuspendedTab, SuspensionMonitor, TabId, TabValidator,
};
use tabflow_workflows::{GroupSynchronizer, ReleaseReport, SyncOutcome, Workflow, WorkflowStore};

use crate::config::Config;
use crate::event::HostEvent;
use crate::Result;

pub struct Extension {
    /// Configuration
    config: Config,
    /// Database
    db: Database,
    /// Workflows and their persisted record
    store: WorkflowStore,
    /// Keeps host tab groups in step with workflows
    synchronizer: GroupSynchronizer,
    /// Idle tab suspension bookkeeping
    monitor: SuspensionMonitor,
    /// Host browser
    host: Arc<dyn BrowserHost>,
    /// Serializes workflow handlers
    gate: Arc<Mutex<()>>,
}

impl Extension {
    /// Open the configured database and build the extension around `host`
    pub fn new(config: Config, host: Arc<dyn BrowserHost>) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;

        Ok(Self::with_database(config, db, host))
    }

    pub fn with_database(config: Config, db: Database, host: Arc<dyn BrowserHost>) -> Self {
        let restricted = config.restricted_urls();
        let monitor = SuspensionMonitor::new(config.placeholder_url(), restricted.clone());
        let synchronizer =
            GroupSynchronizer::new(TabValidator::new(restricted)).with_suspension(monitor.clone());

        Self {
            store: WorkflowStore::new(db.clone(), config.storage_key.clone()),
            synchronizer,
            monitor,
            config,
            db,
            host,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Load persisted workflows. Returns how many were restored.
    pub fn initialize(&self) -> Result<usize> {
        if self.config.reset_on_start {
            self.db.clear()?;
        }

        let count = self.store.load()?;

        tracing::info!(workflows = count, "Extension initialized");

        Ok(count)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    pub fn monitor(&self) -> &SuspensionMonitor {
        &self.monitor
    }

    // === Workflow operations ===

    pub async fn create_workflow(&self, name: &str) -> Result<Workflow> {
        let _gate = self.gate.lock().await;
        Ok(self.store.create(name)?)
    }

    pub fn list_workflows(&self) -> Vec<Workflow> {
        self.store.list()
    }

    pub fn export_workflows(&self) -> Result<String> {
        Ok(self.store.export_json()?)
    }

    /// Drop a tab onto a workflow. The assignment is persisted before the
    /// host group is touched; a failed synchronization is logged and leaves
    /// the stored workflow as it is.
    pub async fn drop_tab(&self, name: &str, tab_id: TabId) -> Result<Workflow> {
        let _gate = self.gate.lock().await;

        let assignment = self.store.assign_tab(name, tab_id)?;

        // Leave the previous workflow's group first, or discovery would
        // adopt that group for this workflow
        if let Some(previous) = &assignment.moved_from {
            if let Err(e) = self.host.ungroup_tab(tab_id).await {
                tracing::warn!(
                    tab_id = %tab_id,
                    workflow = %previous,
                    error = %e,
                    "Failed to take tab out of previous group"
                );
            }
        }

        self.sync_logged(name).await;

        Ok(self.store.get(name)?)
    }

    /// Take a tab out of a workflow and out of its group
    pub async fn remove_tab(&self, name: &str, tab_id: TabId) -> Result<Workflow> {
        let _gate = self.gate.lock().await;

        if self.store.remove_tab(name, tab_id)? {
            if let Err(e) = self.host.ungroup_tab(tab_id).await {
                tracing::warn!(tab_id = %tab_id, error = %e, "Failed to ungroup removed tab");
            }
        }

        Ok(self.store.get(name)?)
    }

    /// Change a tab's position inside its workflow
    pub async fn reorder_tab(
        &self,
        name: &str,
        tab_id: TabId,
        new_index: usize,
    ) -> Result<Workflow> {
        let _gate = self.gate.lock().await;
        Ok(self.store.move_tab(name, tab_id, new_index)?)
    }

    /// Synchronize a workflow's tab group, reporting any failure to the caller
    pub async fn sync_workflow(&self, name: &str) -> Result<SyncOutcome> {
        let _gate = self.gate.lock().await;
        self.sync_locked(name).await
    }

    async fn sync_locked(&self, name: &str) -> Result<SyncOutcome> {
        let workflow = self.store.get(name)?;

        let outcome = self
            .synchronizer
            .sync(
                self.host.as_ref(),
                &workflow.name,
                &workflow.tab_ids,
                workflow.group_id,
            )
            .await?;

        self.store.bind_group(name, Some(outcome.group_id))?;

        Ok(outcome)
    }

    async fn sync_logged(&self, name: &str) -> Option<SyncOutcome> {
        match self.sync_locked(name).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(workflow = %name, error = %e, "Tab group synchronization failed");
                None
            }
        }
    }

    /// Rename a workflow and retitle its group. A taken name is reported to
    /// the caller; a failed retitle is only logged.
    pub async fn rename_workflow(&self, old_name: &str, new_name: &str) -> Result<Workflow> {
        let _gate = self.gate.lock().await;

        let workflow = self.store.rename(old_name, new_name)?;

        match self
            .synchronizer
            .retitle(
                self.host.as_ref(),
                &workflow.name,
                &workflow.tab_ids,
                workflow.group_id,
            )
            .await
        {
            Ok(Some(group_id)) => self.store.bind_group(&workflow.name, Some(group_id))?,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(workflow = %workflow.name, error = %e, "Failed to retitle tab group")
            }
        }

        Ok(self.store.get(&workflow.name)?)
    }

    /// Delete a workflow and ungroup all of its tabs
    pub async fn delete_workflow(&self, name: &str) -> Result<ReleaseReport> {
        let _gate = self.gate.lock().await;

        let workflow = self.store.delete(name)?;
        let report = self
            .synchronizer
            .release(self.host.as_ref(), &workflow.tab_ids)
            .await;

        if !report.failed.is_empty() {
            tracing::warn!(
                workflow = %name,
                failed = report.failed.len(),
                "Some tabs could not be ungrouped"
            );
        }

        Ok(report)
    }

    // === Suspension ===

    pub async fn on_idle_state(&self, state: IdleState) -> Result<SuspendReport> {
        Ok(self
            .monitor
            .on_idle_state(self.host.as_ref(), state)
            .await?)
    }

    pub async fn unsuspend_tab(&self, tab_id: TabId) -> Result<bool> {
        Ok(self.monitor.unsuspend_tab(self.host.as_ref(), tab_id).await?)
    }

    pub fn suspended_tabs(&self) -> Vec<SuspendedTab> {
        self.monitor.suspended_tabs()
    }

    // === Host events ===

    pub async fn handle_event(&self, event: HostEvent) -> Result<()> {
        tracing::debug!(?event, "Host event");

        match event {
            HostEvent::IdleStateChanged(state) => {
                self.on_idle_state(state).await?;
            }
            HostEvent::TabActivated(tab_id) => {
                if self.monitor.is_suspended(tab_id) {
                    self.unsuspend_tab(tab_id).await?;

                    // Put the restored tab back with its workflow's group
                    let _gate = self.gate.lock().await;
                    if let Some(name) = self.store.workflow_for_tab(tab_id) {
                        self.sync_logged(&name).await;
                    }
                }
            }
            HostEvent::TabRemoved(tab_id) => {
                self.monitor.forget(tab_id);

                let _gate = self.gate.lock().await;
                let affected = self.store.forget_tab(tab_id)?;
                if !affected.is_empty() {
                    tracing::info!(tab_id = %tab_id, workflows = ?affected, "Pruned closed tab");
                }
            }
        }

        Ok(())
    }

    /// Process host events until the sender side is dropped.
    /// Failures are logged; no event stops the loop.
    pub async fn run(&self, mut events: mpsc::Receiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                tracing::warn!(?event, error = %e, "Failed to handle host event");
            }
        }

        tracing::info!("Host event channel closed");
    }
}

impl Clone for Extension {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            store: self.store.clone(),
            synchronizer: self.synchronizer.clone(),
            monitor: self.monitor.clone(),
            host: Arc::clone(&self.host),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("config", &self.config)
            .field("workflows", &self.store.list().len())
            .field("suspended", &self.monitor.suspended_tabs().len())
            .finish()
    }
}
