//! Workflow data structure

use chrono::{DateTime, Utc};
use serde::Serialize;

use tabflow_tabs::{GroupId, TabId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    /// Display name, unique within the store
    pub name: String,
    /// Ordered tab ids, without duplicates
    pub tab_ids: Vec<TabId>,
    /// Host group last synchronized with this workflow.
    /// Group ids only live as long as the browser session, so this is never persisted.
    pub group_id: Option<GroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(name: String) -> Self {
        Self::with_tabs(name, Vec::new())
    }

    pub fn with_tabs(name: String, tab_ids: Vec<TabId>) -> Self {
        let now = Utc::now();
        let mut workflow = Self {
            name,
            tab_ids: Vec::with_capacity(tab_ids.len()),
            group_id: None,
            created_at: now,
            updated_at: now,
        };
        for tab_id in tab_ids {
            workflow.add_tab(tab_id);
        }
        workflow
    }

    /// Append a tab. Returns false if it was already present.
    pub fn add_tab(&mut self, tab_id: TabId) -> bool {
        if self.tab_ids.contains(&tab_id) {
            return false;
        }
        self.tab_ids.push(tab_id);
        self.updated_at = Utc::now();
        true
    }

    pub fn remove_tab(&mut self, tab_id: TabId) -> bool {
        let before = self.tab_ids.len();
        self.tab_ids.retain(|id| *id != tab_id);
        let removed = self.tab_ids.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Move a tab to a new position
    pub fn move_tab(&mut self, tab_id: TabId, new_index: usize) -> bool {
        match self.tab_ids.iter().position(|id| *id == tab_id) {
            Some(current_index) => {
                let tab_id = self.tab_ids.remove(current_index);
                let insert_index = new_index.min(self.tab_ids.len());
                self.tab_ids.insert(insert_index, tab_id);
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.tab_ids.contains(&tab_id)
    }

    pub fn tab_count(&self) -> usize {
        self.tab_ids.len()
    }
}
