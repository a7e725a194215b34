//! Workflow Store
//!
//! In-memory working copy of all workflows, persisted as one record:
//! `{ "<name>": [tabId, ...] }`. Every mutation is applied to a copy,
//! written to storage, and only then becomes visible.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use tabflow_storage::Database;
use tabflow_tabs::{GroupId, TabId};

use crate::error::WorkflowError;
use crate::workflow::Workflow;
use crate::Result;

pub const DEFAULT_STORAGE_KEY: &str = "workflows";

type Record = BTreeMap<String, Vec<TabId>>;

/// Result of dropping a tab onto a workflow
#[derive(Debug, Clone)]
pub struct Assignment {
    pub workflow: Workflow,
    /// Workflow that held the tab before, if any
    pub moved_from: Option<String>,
}

pub struct WorkflowStore {
    workflows: Arc<RwLock<BTreeMap<String, Workflow>>>,
    db: Database,
    key: String,
}

impl WorkflowStore {
    pub fn new(db: Database, key: impl Into<String>) -> Self {
        Self {
            workflows: Arc::new(RwLock::new(BTreeMap::new())),
            db,
            key: key.into(),
        }
    }

    /// Replace the working copy with the persisted record
    pub fn load(&self) -> Result<usize> {
        let record: Record = self.db.get_json(&self.key)?.unwrap_or_default();

        let workflows: BTreeMap<String, Workflow> = record
            .into_iter()
            .map(|(name, tab_ids)| (name.clone(), Workflow::with_tabs(name, tab_ids)))
            .collect();
        let count = workflows.len();

        *self.workflows.write() = workflows;

        tracing::info!(key = %self.key, workflows = count, "Loaded workflows");

        Ok(count)
    }

    /// Write the working copy to storage
    pub fn save(&self) -> Result<()> {
        let record = Self::record_of(&self.workflows.read());
        self.db.set_json(&self.key, &record)?;
        Ok(())
    }

    fn record_of(workflows: &BTreeMap<String, Workflow>) -> Record {
        workflows
            .iter()
            .map(|(name, workflow)| (name.clone(), workflow.tab_ids.clone()))
            .collect()
    }

    /// Apply `f` to a copy of the workflows, persist it, then publish it.
    /// Nothing changes if `f` or the write fails.
    fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BTreeMap<String, Workflow>) -> Result<T>,
    {
        let mut current = self.workflows.write();
        let mut next = current.clone();
        let out = f(&mut next)?;
        self.db.set_json(&self.key, &Self::record_of(&next))?;
        *current = next;
        Ok(out)
    }

    pub fn create(&self, name: &str) -> Result<Workflow> {
        let name = validate_name(name)?;

        let workflow = self.mutate(|workflows| {
            if workflows.contains_key(&name) {
                return Err(WorkflowError::AlreadyExists(name.clone()));
            }
            let workflow = Workflow::new(name.clone());
            workflows.insert(name.clone(), workflow.clone());
            Ok(workflow)
        })?;

        tracing::info!(workflow = %workflow.name, "Created workflow");

        Ok(workflow)
    }

    pub fn get(&self, name: &str) -> Result<Workflow> {
        self.workflows
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(name.to_string()))
    }

    /// All workflows, ordered by name
    pub fn list(&self) -> Vec<Workflow> {
        self.workflows.read().values().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workflows.read().contains_key(name)
    }

    pub fn workflow_for_tab(&self, tab_id: TabId) -> Option<String> {
        self.workflows
            .read()
            .values()
            .find(|workflow| workflow.contains(tab_id))
            .map(|workflow| workflow.name.clone())
    }

    /// Add a tab to a workflow, taking it out of whichever workflow held it
    pub fn assign_tab(&self, name: &str, tab_id: TabId) -> Result<Assignment> {
        let assignment = self.mutate(|workflows| {
            if !workflows.contains_key(name) {
                return Err(WorkflowError::NotFound(name.to_string()));
            }

            let mut moved_from = None;
            for (other_name, other) in workflows.iter_mut() {
                if other_name != name && other.remove_tab(tab_id) {
                    moved_from = Some(other_name.clone());
                }
            }

            let workflow = workflows
                .get_mut(name)
                .ok_or_else(|| WorkflowError::NotFound(name.to_string()))?;
            workflow.add_tab(tab_id);

            Ok(Assignment {
                workflow: workflow.clone(),
                moved_from,
            })
        })?;

        tracing::info!(
            workflow = %name,
            tab_id = %tab_id,
            moved_from = ?assignment.moved_from,
            "Assigned tab to workflow"
        );

        Ok(assignment)
    }

    /// Take a tab out of a workflow. Returns false if it was not a member.
    pub fn remove_tab(&self, name: &str, tab_id: TabId) -> Result<bool> {
        self.mutate(|workflows| {
            let workflow = workflows
                .get_mut(name)
                .ok_or_else(|| WorkflowError::NotFound(name.to_string()))?;
            Ok(workflow.remove_tab(tab_id))
        })
    }

    pub fn move_tab(&self, name: &str, tab_id: TabId, new_index: usize) -> Result<Workflow> {
        self.mutate(|workflows| {
            let workflow = workflows
                .get_mut(name)
                .ok_or_else(|| WorkflowError::NotFound(name.to_string()))?;
            workflow.move_tab(tab_id, new_index);
            Ok(workflow.clone())
        })
    }

    /// Move a workflow to a new name. Fails without changes if the new name
    /// is taken.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<Workflow> {
        let new_name = validate_name(new_name)?;

        let workflow = self.mutate(|workflows| {
            if !workflows.contains_key(old_name) {
                return Err(WorkflowError::NotFound(old_name.to_string()));
            }
            if workflows.contains_key(&new_name) {
                return Err(WorkflowError::AlreadyExists(new_name.clone()));
            }

            let mut workflow = workflows
                .remove(old_name)
                .ok_or_else(|| WorkflowError::NotFound(old_name.to_string()))?;
            workflow.rename(new_name.clone());
            workflows.insert(new_name.clone(), workflow.clone());
            Ok(workflow)
        })?;

        tracing::info!(from = %old_name, to = %workflow.name, "Renamed workflow");

        Ok(workflow)
    }

    pub fn delete(&self, name: &str) -> Result<Workflow> {
        let workflow = self.mutate(|workflows| {
            workflows
                .remove(name)
                .ok_or_else(|| WorkflowError::NotFound(name.to_string()))
        })?;

        tracing::info!(workflow = %name, tabs = workflow.tab_count(), "Deleted workflow");

        Ok(workflow)
    }

    /// Record which host group a workflow is synchronized with.
    /// Bindings are session state and are not persisted.
    pub fn bind_group(&self, name: &str, group_id: Option<GroupId>) -> Result<()> {
        let mut workflows = self.workflows.write();
        let workflow = workflows
            .get_mut(name)
            .ok_or_else(|| WorkflowError::NotFound(name.to_string()))?;
        workflow.group_id = group_id;
        Ok(())
    }

    /// Drop a closed tab from every workflow. Returns the affected workflows.
    pub fn forget_tab(&self, tab_id: TabId) -> Result<Vec<String>> {
        if self.workflow_for_tab(tab_id).is_none() {
            return Ok(Vec::new());
        }

        self.mutate(|workflows| {
            Ok(workflows
                .values_mut()
                .filter_map(|workflow| {
                    workflow
                        .remove_tab(tab_id)
                        .then(|| workflow.name.clone())
                })
                .collect())
        })
    }

    /// Remove every workflow, in memory and in storage
    pub fn clear(&self) -> Result<()> {
        let mut workflows = self.workflows.write();
        self.db.remove_value(&self.key)?;
        workflows.clear();
        Ok(())
    }

    /// Persisted layout as pretty-printed JSON, for export
    pub fn export_json(&self) -> Result<String> {
        let record = Self::record_of(&self.workflows.read());
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

impl Clone for WorkflowStore {
    fn clone(&self) -> Self {
        Self {
            workflows: Arc::clone(&self.workflows),
            db: self.db.clone(),
            key: self.key.clone(),
        }
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkflowError::EmptyName);
    }
    Ok(name.to_string())
}
