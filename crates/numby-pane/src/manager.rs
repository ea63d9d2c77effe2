// ABOUTME: Registry of live pane sessions kept in lockstep with a split tree.
// ABOUTME: Creates sessions for new leaves and disposes sessions of vanished leaves.

use std::collections::{HashMap, HashSet};

use numby_core::LeafId;
use numby_layout::SplitTree;

use crate::{ContentSession, SessionFactory};

/// What one `sync` call changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<LeafId>,
    pub disposed: Vec<LeafId>,
    /// Leaves whose session could not be built; they stay unmapped
    pub failed: Vec<LeafId>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.disposed.is_empty() && self.failed.is_empty()
    }
}

/// Owns one session per leaf of the tree it was last synced with.
pub struct PaneInstanceManager<F: SessionFactory> {
    factory: F,
    sessions: HashMap<LeafId, F::Session>,
}

impl<F: SessionFactory> PaneInstanceManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            sessions: HashMap::new(),
        }
    }

    /// Reconcile the registry with the leaves of `tree`.
    ///
    /// Sessions whose leaf survives are left alone. Vanished leaves are
    /// disposed before new leaves get sessions. A failed construction leaves
    /// that leaf unmapped and is retried on the next sync.
    pub fn sync(&mut self, tree: &SplitTree) -> SyncReport {
        let leaf_ids = tree.leaf_ids();
        let wanted: HashSet<LeafId> = leaf_ids.iter().copied().collect();
        let mut report = SyncReport::default();

        let mut stale: Vec<LeafId> = self
            .sessions
            .keys()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect();
        stale.sort();

        for leaf in stale {
            if let Some(mut session) = self.sessions.remove(&leaf) {
                if let Err(e) = session.dispose() {
                    tracing::warn!("Failed to dispose session for pane {}: {}", leaf, e);
                }
            }
            report.disposed.push(leaf);
        }

        for leaf in leaf_ids {
            if self.sessions.contains_key(&leaf) {
                continue;
            }
            match self.factory.create(leaf) {
                Ok(session) => {
                    self.sessions.insert(leaf, session);
                    report.created.push(leaf);
                }
                Err(e) => {
                    tracing::warn!("Failed to create session for pane {}: {}", leaf, e);
                    report.failed.push(leaf);
                }
            }
        }

        if !report.is_noop() {
            tracing::debug!(
                "Synced panes: {} created, {} disposed, {} failed, {} live",
                report.created.len(),
                report.disposed.len(),
                report.failed.len(),
                self.sessions.len()
            );
        }
        report
    }

    pub fn get(&self, leaf: LeafId) -> Option<&F::Session> {
        self.sessions.get(&leaf)
    }

    pub fn get_mut(&mut self, leaf: LeafId) -> Option<&mut F::Session> {
        self.sessions.get_mut(&leaf)
    }

    pub fn contains(&self, leaf: LeafId) -> bool {
        self.sessions.contains_key(&leaf)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registered leaves in no particular order
    pub fn leaf_ids(&self) -> impl Iterator<Item = LeafId> + '_ {
        self.sessions.keys().copied()
    }

    /// Dispose every session and empty the registry
    pub fn clear(&mut self) {
        for (leaf, mut session) in self.sessions.drain() {
            if let Err(e) = session.dispose() {
                tracing::warn!("Failed to dispose session for pane {}: {}", leaf, e);
            }
        }
    }
}

impl<F: SessionFactory> Drop for PaneInstanceManager<F> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;
    use numby_layout::Direction;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        next_serial: usize,
        created: Vec<LeafId>,
        disposed: Vec<LeafId>,
        fail_create: HashSet<LeafId>,
        fail_dispose: bool,
    }

    struct FakeSession {
        leaf: LeafId,
        serial: usize,
        inert: bool,
        contents: String,
        log: Rc<RefCell<Log>>,
    }

    impl ContentSession for FakeSession {
        fn dispose(&mut self) -> Result<(), SessionError> {
            self.inert = true;
            let mut log = self.log.borrow_mut();
            log.disposed.push(self.leaf);
            if log.fail_dispose {
                return Err(SessionError::Backend("stuck".to_string()));
            }
            Ok(())
        }

        fn is_inert(&self) -> bool {
            self.inert
        }

        fn contents(&self) -> String {
            self.contents.clone()
        }

        fn restore_contents(&mut self, contents: String) {
            self.contents = contents;
        }
    }

    struct FakeFactory {
        log: Rc<RefCell<Log>>,
    }

    impl SessionFactory for FakeFactory {
        type Session = FakeSession;

        fn create(&mut self, leaf: LeafId) -> Result<FakeSession, SessionError> {
            let mut log = self.log.borrow_mut();
            if log.fail_create.contains(&leaf) {
                return Err(SessionError::Backend("out of resources".to_string()));
            }
            log.created.push(leaf);
            log.next_serial += 1;
            Ok(FakeSession {
                leaf,
                serial: log.next_serial,
                inert: false,
                contents: String::new(),
                log: Rc::clone(&self.log),
            })
        }
    }

    fn manager() -> (PaneInstanceManager<FakeFactory>, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let manager = PaneInstanceManager::new(FakeFactory {
            log: Rc::clone(&log),
        });
        (manager, log)
    }

    fn serial(manager: &PaneInstanceManager<FakeFactory>, leaf: LeafId) -> usize {
        manager.get(leaf).map(|s| s.serial).unwrap()
    }

    fn assert_matches_tree(manager: &PaneInstanceManager<FakeFactory>, tree: &SplitTree) {
        let mut registered: Vec<_> = manager.leaf_ids().collect();
        let mut expected = tree.leaf_ids();
        registered.sort();
        expected.sort();
        assert_eq!(registered, expected);
    }

    #[test]
    fn split_creates_session_for_new_leaf_only() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let l0 = tree.first_leaf();
        manager.sync(&tree);
        let l0_serial = serial(&manager, l0);

        let (tree, l1) = tree.split_pane(l0, Direction::Horizontal, 0.5);
        let l1 = l1.unwrap();
        let report = manager.sync(&tree);

        assert_eq!(report.created, vec![l1]);
        assert!(report.disposed.is_empty());
        assert_eq!(serial(&manager, l0), l0_serial);
        assert_eq!(log.borrow().created, vec![l0, l1]);
        assert_matches_tree(&manager, &tree);
    }

    #[test]
    fn close_disposes_only_removed_leaf() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let l0 = tree.first_leaf();
        let (tree, l1a) = tree.split_pane(l0, Direction::Horizontal, 0.5);
        let (tree, l1b) = tree.split_pane(l1a.unwrap(), Direction::Vertical, 0.5);
        let (l1a, l1b) = (l1a.unwrap(), l1b.unwrap());
        manager.sync(&tree);
        let serials = (serial(&manager, l0), serial(&manager, l1b));

        let tree = tree.close_leaf(l1a);
        let report = manager.sync(&tree);

        assert_eq!(report.disposed, vec![l1a]);
        assert!(report.created.is_empty());
        assert_eq!(log.borrow().disposed, vec![l1a]);
        assert_eq!((serial(&manager, l0), serial(&manager, l1b)), serials);
        assert!(!manager.get(l0).unwrap().is_inert());
        assert_matches_tree(&manager, &tree);
    }

    #[test]
    fn sync_is_idempotent() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let tree = tree.split(tree.first_leaf(), Direction::Vertical, 0.5);

        manager.sync(&tree);
        let created = log.borrow().created.len();
        let report = manager.sync(&tree);

        assert!(report.is_noop());
        assert_eq!(log.borrow().created.len(), created);
        assert!(log.borrow().disposed.is_empty());
    }

    #[test]
    fn ratio_changes_do_not_touch_sessions() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let tree = tree.split(tree.first_leaf(), Direction::Horizontal, 0.5);
        manager.sync(&tree);

        let split = tree.split_ids()[0];
        for step in 1..=8 {
            let tree = tree.update_ratio(split, step as f32 / 10.0);
            assert!(manager.sync(&tree).is_noop());
        }
        assert_eq!(log.borrow().created.len(), 2);
    }

    #[test]
    fn construction_failure_is_isolated() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let l0 = tree.first_leaf();
        manager.sync(&tree);

        let (tree, l1) = tree.split_pane(l0, Direction::Horizontal, 0.5);
        let l1 = l1.unwrap();
        let (tree, l2) = tree.split_pane(l1, Direction::Vertical, 0.5);
        let l2 = l2.unwrap();
        log.borrow_mut().fail_create.insert(l1);

        let report = manager.sync(&tree);
        assert_eq!(report.failed, vec![l1]);
        assert_eq!(report.created, vec![l2]);
        assert!(!manager.contains(l1));
        assert!(manager.contains(l2));

        // Retried once the backend recovers
        log.borrow_mut().fail_create.clear();
        let report = manager.sync(&tree);
        assert_eq!(report.created, vec![l1]);
        assert_matches_tree(&manager, &tree);
    }

    #[test]
    fn disposal_failure_still_removes_entry() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let l0 = tree.first_leaf();
        let (tree, l1) = tree.split_pane(l0, Direction::Horizontal, 0.5);
        manager.sync(&tree);

        log.borrow_mut().fail_dispose = true;
        let tree = tree.close_leaf(l1.unwrap());
        let report = manager.sync(&tree);

        assert_eq!(report.disposed, l1.into_iter().collect::<Vec<_>>());
        assert_eq!(manager.len(), 1);
        assert_matches_tree(&manager, &tree);
    }

    #[test]
    fn replacing_the_whole_tree_swaps_every_session() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let old = tree.first_leaf();
        manager.sync(&tree);

        let healed = tree.close_leaf(old);
        let report = manager.sync(&healed);

        assert_eq!(report.disposed, vec![old]);
        assert_eq!(report.created, vec![healed.first_leaf()]);
        assert_eq!(log.borrow().disposed, vec![old]);
    }

    #[test]
    fn clear_and_drop_dispose_everything() {
        let (mut manager, log) = manager();
        let tree = SplitTree::new();
        let tree = tree.split(tree.first_leaf(), Direction::Horizontal, 0.5);
        manager.sync(&tree);

        manager.clear();
        assert!(manager.is_empty());
        assert_eq!(log.borrow().disposed.len(), 2);

        manager.sync(&tree);
        drop(manager);
        assert_eq!(log.borrow().disposed.len(), 4);
    }
}
