// ABOUTME: Ordered collection of named tabs, each owning its own split tree.
// ABOUTME: Keeps at least one tab alive and a valid selection at all times.

use std::collections::HashSet;

use numby_core::TabId;
use serde::{Deserialize, Serialize};

use crate::{LayoutError, SplitTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub name: String,
    pub tree: SplitTree,
}

impl Tab {
    /// A tab with a fresh id and a single-pane tree
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TabId::new(),
            name: name.into(),
            tree: SplitTree::new(),
        }
    }
}

fn default_tab_name() -> String {
    "Calculator".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabCollection {
    tabs: Vec<Tab>,
    selected_tab_id: TabId,
    #[serde(default = "default_tab_name")]
    default_name: String,
}

impl TabCollection {
    /// One default tab, selected
    pub fn new(default_name: impl Into<String>) -> Self {
        let default_name = default_name.into();
        let tab = Tab::new(default_name.clone());
        Self {
            selected_tab_id: tab.id,
            tabs: vec![tab],
            default_name,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Never true for a collection built through this API
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn selected_tab_id(&self) -> TabId {
        self.selected_tab_id
    }

    pub fn selected_tab(&self) -> &Tab {
        let idx = self.selected_index();
        &self.tabs[idx]
    }

    pub fn selected_index(&self) -> usize {
        self.position(self.selected_tab_id).unwrap_or(0)
    }

    /// Append a default tab and select it
    pub fn add_tab(&mut self) -> TabId {
        let tab = Tab::new(self.default_name.clone());
        let id = tab.id;
        self.tabs.push(tab);
        self.selected_tab_id = id;
        id
    }

    /// Close a tab and return it.
    ///
    /// The last remaining tab is swapped for a brand-new default tab instead of
    /// being removed. When the selected tab closes, the tab that slides into its
    /// index is selected, or the last tab if it was at the end.
    pub fn close_tab(&mut self, id: TabId) -> Option<Tab> {
        let idx = self.position(id)?;

        if self.tabs.len() == 1 {
            let replacement = Tab::new(self.default_name.clone());
            self.selected_tab_id = replacement.id;
            return Some(std::mem::replace(&mut self.tabs[idx], replacement));
        }

        let removed = self.tabs.remove(idx);
        if self.selected_tab_id == id {
            let new_idx = idx.min(self.tabs.len() - 1);
            self.selected_tab_id = self.tabs[new_idx].id;
        }
        Some(removed)
    }

    pub fn select_tab(&mut self, id: TabId) {
        if self.get(id).is_some() {
            self.selected_tab_id = id;
        }
    }

    /// Select by position; out-of-range indices are ignored
    pub fn select_index(&mut self, index: usize) {
        if let Some(tab) = self.tabs.get(index) {
            self.selected_tab_id = tab.id;
        }
    }

    /// Replace the tree of the selected tab only
    pub fn update_selected_tab_tree(&mut self, tree: SplitTree) {
        let selected = self.selected_tab_id;
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == selected) {
            tab.tree = tree;
        }
    }

    pub fn rename_tab(&mut self, id: TabId, name: impl Into<String>) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            tab.name = name.into();
        }
    }

    /// Check the collection and every tree in it after decoding
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.tabs.is_empty() {
            return Err(LayoutError::NoTabs);
        }
        let mut seen = HashSet::new();
        for tab in &self.tabs {
            if !seen.insert(tab.id) {
                return Err(LayoutError::DuplicateTab(tab.id));
            }
            tab.tree.validate()?;
        }
        if self.get(self.selected_tab_id).is_none() {
            return Err(LayoutError::SelectedTabMissing(self.selected_tab_id));
        }
        Ok(())
    }
}

impl Default for TabCollection {
    fn default() -> Self {
        Self::new(default_tab_name())
    }
}
