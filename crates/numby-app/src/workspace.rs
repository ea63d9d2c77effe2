// ABOUTME: Tabs of split trees plus the live sessions of every pane in them.
// ABOUTME: Applies commands and reconciles sessions before the caller redraws.

use std::collections::HashMap;

use numby_core::{LayoutSettings, LeafId, TabId};
use numby_layout::{SplitTree, TabCollection};
use numby_pane::{ContentSession, PaneInstanceManager, SessionFactory, SyncReport};

use crate::command::{Command, PaneTarget, TabTarget};
use crate::snapshot::{PaneSnapshot, WorkspaceSnapshot};

/// All tabs of a window, each with its own pane registry
pub struct Workspace<F: SessionFactory + Clone> {
    tabs: TabCollection,
    panes: HashMap<TabId, PaneInstanceManager<F>>,
    factory: F,
    layout: LayoutSettings,
    /// Restored contents of panes whose session could not be built yet
    pending: HashMap<LeafId, String>,
}

impl<F: SessionFactory + Clone> Workspace<F> {
    /// A single tab with a single pane
    pub fn new(factory: F, layout: LayoutSettings) -> Self {
        let tabs = TabCollection::new(layout.default_tab_name.clone());
        Self::with_tabs(factory, layout, tabs)
    }

    /// Rebuild a workspace from a snapshot, handing each pane its persisted contents
    pub fn restore(factory: F, layout: LayoutSettings, snapshot: WorkspaceSnapshot) -> Self {
        let mut workspace = Self::with_tabs(factory, layout, snapshot.tabs);
        let mut restored = 0;
        for pane in snapshot.panes {
            if let Some(session) = workspace.find_session_mut(pane.leaf_id) {
                session.restore_contents(pane.contents);
                restored += 1;
            } else if workspace.contains_leaf(pane.leaf_id) {
                workspace.pending.insert(pane.leaf_id, pane.contents);
            }
        }
        tracing::info!(
            "Restored {} tabs with {} pane contents, {} waiting for a session",
            workspace.tabs.len(),
            restored,
            workspace.pending.len()
        );
        workspace
    }

    fn with_tabs(factory: F, layout: LayoutSettings, tabs: TabCollection) -> Self {
        let mut workspace = Self {
            tabs,
            panes: HashMap::new(),
            factory,
            layout,
            pending: HashMap::new(),
        };
        let ids: Vec<TabId> = workspace.tabs.tabs().iter().map(|t| t.id).collect();
        for id in ids {
            workspace.sync_tab(id);
        }
        workspace
    }

    pub fn tabs(&self) -> &TabCollection {
        &self.tabs
    }

    pub fn selected_tree(&self) -> &SplitTree {
        &self.tabs.selected_tab().tree
    }

    /// Pane registry of the selected tab
    pub fn panes(&self) -> Option<&PaneInstanceManager<F>> {
        self.panes.get(&self.tabs.selected_tab_id())
    }

    /// Session of a pane in the selected tab
    pub fn session(&self, leaf: LeafId) -> Option<&F::Session> {
        self.panes()?.get(leaf)
    }

    pub fn session_mut(&mut self, leaf: LeafId) -> Option<&mut F::Session> {
        self.panes.get_mut(&self.tabs.selected_tab_id())?.get_mut(leaf)
    }

    pub fn focused_session_mut(&mut self) -> Option<&mut F::Session> {
        let leaf = self.selected_tree().focused_leaf()?;
        self.session_mut(leaf)
    }

    fn contains_leaf(&self, leaf: LeafId) -> bool {
        self.tabs.tabs().iter().any(|t| t.tree.contains_leaf(leaf))
    }

    fn find_session_mut(&mut self, leaf: LeafId) -> Option<&mut F::Session> {
        self.panes
            .values_mut()
            .find_map(|manager| manager.get_mut(leaf))
    }

    /// Persistable state of every tab and pane
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let mut panes = Vec::new();
        for tab in self.tabs.tabs() {
            let Some(manager) = self.panes.get(&tab.id) else {
                continue;
            };
            for leaf_id in tab.tree.leaf_ids() {
                let contents = match manager.get(leaf_id) {
                    Some(session) => session.contents(),
                    None => match self.pending.get(&leaf_id) {
                        Some(contents) => contents.clone(),
                        None => continue,
                    },
                };
                panes.push(PaneSnapshot { leaf_id, contents });
            }
        }
        WorkspaceSnapshot::new(self.tabs.clone(), panes)
    }

    /// Apply one command, then bring the affected pane registries up to date
    pub fn apply(&mut self, command: Command) -> SyncReport {
        match command {
            Command::Split { pane, direction } => {
                let Some(leaf) = self.resolve_pane(pane) else {
                    return SyncReport::default();
                };
                let (tree, new_leaf) =
                    self.selected_tree()
                        .split_pane(leaf, direction, self.layout.clamped_ratio());
                let Some(new_leaf) = new_leaf else {
                    return SyncReport::default();
                };
                tracing::info!("Split pane {} {:?}, new pane {}", leaf, direction, new_leaf);
                self.replace_selected_tree(tree.with_focus(new_leaf))
            }
            Command::ClosePane(pane) => {
                let Some(leaf) = self.resolve_pane(pane) else {
                    return SyncReport::default();
                };
                let tree = self.selected_tree().close_leaf(leaf);
                tracing::info!(
                    "Closed pane {}, remaining panes: {}",
                    leaf,
                    tree.leaf_count()
                );
                self.replace_selected_tree(tree)
            }
            Command::UpdateRatio { split, ratio } => {
                let tree = self.selected_tree().update_ratio(split, ratio);
                self.replace_selected_tree(tree)
            }
            Command::FocusPane(pane) => {
                let Some(leaf) = self.resolve_pane(pane) else {
                    return SyncReport::default();
                };
                let tree = self.selected_tree().with_focus(leaf);
                self.replace_selected_tree(tree)
            }
            Command::FocusNext => {
                let tree = self.selected_tree().focus_next();
                self.replace_selected_tree(tree)
            }
            Command::FocusPrevious => {
                let tree = self.selected_tree().focus_previous();
                self.replace_selected_tree(tree)
            }
            Command::NewTab => {
                let id = self.tabs.add_tab();
                tracing::info!("Opened tab {}, total tabs: {}", id, self.tabs.len());
                self.sync_tab(id)
            }
            Command::CloseTab(tab) => match self.resolve_tab(tab) {
                Some(id) => self.close_tab(id),
                None => SyncReport::default(),
            },
            Command::SelectTab(tab) => {
                if let Some(id) = self.resolve_tab(tab) {
                    self.tabs.select_tab(id);
                }
                SyncReport::default()
            }
            Command::RenameTab { tab, name } => {
                if let Some(id) = self.resolve_tab(tab) {
                    self.tabs.rename_tab(id, name);
                }
                SyncReport::default()
            }
        }
    }

    fn resolve_pane(&self, target: PaneTarget) -> Option<LeafId> {
        let tree = self.selected_tree();
        match target {
            PaneTarget::Focused => tree.focused_leaf(),
            PaneTarget::Id(id) => tree.contains_leaf(id).then_some(id),
            PaneTarget::Index(index) => tree.leaf_ids().get(index).copied(),
        }
    }

    fn resolve_tab(&self, target: TabTarget) -> Option<TabId> {
        match target {
            TabTarget::Selected => Some(self.tabs.selected_tab_id()),
            TabTarget::Id(id) => self.tabs.get(id).map(|t| t.id),
            TabTarget::Index(index) => self.tabs.tabs().get(index).map(|t| t.id),
        }
    }

    fn replace_selected_tree(&mut self, tree: SplitTree) -> SyncReport {
        self.tabs.update_selected_tab_tree(tree);
        self.sync_tab(self.tabs.selected_tab_id())
    }

    fn sync_tab(&mut self, id: TabId) -> SyncReport {
        let Some(tab) = self.tabs.get(id) else {
            return SyncReport::default();
        };
        let factory = &self.factory;
        let manager = self
            .panes
            .entry(id)
            .or_insert_with(|| PaneInstanceManager::new(factory.clone()));
        let report = manager.sync(&tab.tree);

        if !self.pending.is_empty() {
            for leaf in &report.created {
                if let (Some(contents), Some(session)) =
                    (self.pending.remove(leaf), manager.get_mut(*leaf))
                {
                    session.restore_contents(contents);
                }
            }
            let tabs = &self.tabs;
            self.pending
                .retain(|leaf, _| tabs.tabs().iter().any(|t| t.tree.contains_leaf(*leaf)));
        }
        report
    }

    fn close_tab(&mut self, id: TabId) -> SyncReport {
        let Some(removed) = self.tabs.close_tab(id) else {
            return SyncReport::default();
        };

        let mut report = SyncReport::default();
        if let Some(mut manager) = self.panes.remove(&removed.id) {
            report.disposed = removed
                .tree
                .leaf_ids()
                .into_iter()
                .filter(|leaf| manager.contains(*leaf))
                .collect();
            manager.clear();
        }
        tracing::info!(
            "Closed tab {} ({}), remaining tabs: {}",
            removed.id,
            removed.name,
            self.tabs.len()
        );

        // The collection may have swapped in a fresh tab that has no sessions yet
        let selected = self.sync_tab(self.tabs.selected_tab_id());
        report.created = selected.created;
        report.failed = selected.failed;
        report
    }
}
