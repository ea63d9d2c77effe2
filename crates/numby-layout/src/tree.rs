// ABOUTME: Immutable binary tree describing how a window is divided into panes.
// ABOUTME: Supports splitting, closing, resizing, focus cycling, and JSON round-trips.

use std::collections::HashSet;

use numby_core::{LeafId, SplitId, MAX_RATIO, MIN_RATIO};
use serde::{Deserialize, Serialize};

use crate::LayoutError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Children side by side, first on the left
    Horizontal,
    /// Children stacked, first on top
    Vertical,
}

/// A node of the split tree, tagged as `{"type": "leaf" | "split", ...}` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Leaf {
        id: LeafId,
    },
    Split {
        id: SplitId,
        direction: Direction,
        ratio: f32,
        first: Box<Node>,
        second: Box<Node>,
    },
}

impl Node {
    pub fn leaf(id: LeafId) -> Self {
        Node::Leaf { id }
    }

    /// Build a split with a fresh id; the ratio is clamped into the allowed range
    pub fn split(direction: Direction, ratio: f32, first: Node, second: Node) -> Self {
        Node::Split {
            id: SplitId::new(),
            direction,
            ratio: clamp_ratio(ratio).unwrap_or(0.5),
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    fn collect_leaves(&self, out: &mut Vec<LeafId>) {
        match self {
            Node::Leaf { id } => out.push(*id),
            Node::Split { first, second, .. } => {
                first.collect_leaves(out);
                second.collect_leaves(out);
            }
        }
    }

    fn collect_splits(&self, out: &mut Vec<SplitId>) {
        if let Node::Split {
            id, first, second, ..
        } = self
        {
            out.push(*id);
            first.collect_splits(out);
            second.collect_splits(out);
        }
    }

    fn first_leaf(&self) -> LeafId {
        match self {
            Node::Leaf { id } => *id,
            Node::Split { first, .. } => first.first_leaf(),
        }
    }
}

/// Rectangle in whatever units the caller passes in (normalized by default)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Unit square (0.0 to 1.0)
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// Pane layout for one tab.
///
/// Every mutating operation returns a new tree and leaves `self` untouched.
/// Operations that name an id missing from the tree return an unchanged copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTree {
    root: Node,
    #[serde(rename = "focusedLeafId", default)]
    focused_leaf_id: Option<LeafId>,
}

impl SplitTree {
    /// A tree holding a single, focused leaf with a fresh id
    pub fn new() -> Self {
        let id = LeafId::new();
        Self {
            root: Node::leaf(id),
            focused_leaf_id: Some(id),
        }
    }

    /// Wrap an existing node; nothing is focused
    pub fn with_root(root: Node) -> Self {
        Self {
            root,
            focused_leaf_id: None,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn focused_leaf(&self) -> Option<LeafId> {
        self.focused_leaf_id
    }

    /// Split the target leaf. The original leaf becomes the first child.
    pub fn split(&self, target: LeafId, direction: Direction, ratio: f32) -> SplitTree {
        self.split_pane(target, direction, ratio).0
    }

    /// Like [`split`](Self::split), also returning the id of the new leaf
    pub fn split_pane(
        &self,
        target: LeafId,
        direction: Direction,
        ratio: f32,
    ) -> (SplitTree, Option<LeafId>) {
        let new_id = LeafId::new();
        let ratio = clamp_ratio(ratio).unwrap_or(0.5);
        match split_node(&self.root, target, direction, ratio, new_id) {
            Some(root) => (
                Self {
                    root,
                    focused_leaf_id: self.focused_leaf_id,
                },
                Some(new_id),
            ),
            None => (self.clone(), None),
        }
    }

    /// Remove a leaf, promoting its sibling into the parent's place.
    ///
    /// Closing the last leaf yields a fresh single-leaf tree instead of an
    /// empty one. If the closed leaf held focus, focus moves to the first
    /// remaining leaf.
    pub fn close_leaf(&self, target: LeafId) -> SplitTree {
        match remove_leaf(&self.root, target) {
            Removal::NotFound => self.clone(),
            Removal::Emptied => Self::new(),
            Removal::Replaced(root) => {
                let focused_leaf_id = match self.focused_leaf_id {
                    Some(id) if id == target => Some(root.first_leaf()),
                    other => other,
                };
                Self {
                    root,
                    focused_leaf_id,
                }
            }
        }
    }

    /// Set the ratio of one split, clamped into [`MIN_RATIO`, `MAX_RATIO`].
    /// NaN is ignored.
    pub fn update_ratio(&self, target: SplitId, ratio: f32) -> SplitTree {
        let Some(ratio) = clamp_ratio(ratio) else {
            return self.clone();
        };
        match set_ratio(&self.root, target, ratio) {
            Some(root) => Self {
                root,
                focused_leaf_id: self.focused_leaf_id,
            },
            None => self.clone(),
        }
    }

    /// All leaf ids, first child before second
    pub fn leaf_ids(&self) -> Vec<LeafId> {
        let mut result = Vec::new();
        self.root.collect_leaves(&mut result);
        result
    }

    /// All split ids in pre-order
    pub fn split_ids(&self) -> Vec<SplitId> {
        let mut result = Vec::new();
        self.root.collect_splits(&mut result);
        result
    }

    pub fn is_single_pane(&self) -> bool {
        matches!(self.root, Node::Leaf { .. })
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_ids().len()
    }

    pub fn contains_leaf(&self, leaf: LeafId) -> bool {
        self.leaf_ids().contains(&leaf)
    }

    pub fn first_leaf(&self) -> LeafId {
        self.root.first_leaf()
    }

    /// Ratio of the given split, if present
    pub fn ratio_of(&self, split: SplitId) -> Option<f32> {
        find_ratio(&self.root, split)
    }

    /// Focus a leaf; unknown leaves leave focus unchanged
    pub fn with_focus(&self, leaf: LeafId) -> SplitTree {
        if !self.contains_leaf(leaf) {
            return self.clone();
        }
        Self {
            root: self.root.clone(),
            focused_leaf_id: Some(leaf),
        }
    }

    /// Move focus to the next leaf in order, wrapping around
    pub fn focus_next(&self) -> SplitTree {
        self.cycle_focus(true)
    }

    /// Move focus to the previous leaf in order, wrapping around
    pub fn focus_previous(&self) -> SplitTree {
        self.cycle_focus(false)
    }

    fn cycle_focus(&self, forward: bool) -> SplitTree {
        let ids = self.leaf_ids();
        let Some(&first) = ids.first() else {
            return self.clone();
        };
        let current = self
            .focused_leaf_id
            .and_then(|focused| ids.iter().position(|id| *id == focused));
        let next = match current {
            Some(idx) if forward => ids[(idx + 1) % ids.len()],
            Some(idx) => ids[(idx + ids.len() - 1) % ids.len()],
            None => first,
        };
        Self {
            root: self.root.clone(),
            focused_leaf_id: Some(next),
        }
    }

    /// Layout rectangle for every leaf, in leaf order
    pub fn pane_rects(&self, area: Rect) -> Vec<(LeafId, Rect)> {
        let mut result = Vec::new();
        collect_rects(&self.root, area, &mut result);
        result
    }

    /// Check the structural invariants of a tree that came from outside
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        for leaf in self.leaf_ids() {
            if !seen.insert(*leaf.as_uuid()) {
                return Err(LayoutError::DuplicateLeaf(leaf));
            }
        }
        for split in self.split_ids() {
            if !seen.insert(*split.as_uuid()) {
                return Err(LayoutError::DuplicateSplit(split));
            }
            if let Some(ratio) = self.ratio_of(split) {
                if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
                    return Err(LayoutError::RatioOutOfRange { split, ratio });
                }
            }
        }
        if let Some(focused) = self.focused_leaf_id {
            if !self.contains_leaf(focused) {
                return Err(LayoutError::FocusNotFound(focused));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a tree, keeping its ids, and reject it if invariants do not hold
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let tree: SplitTree = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }
}

impl Default for SplitTree {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_ratio(ratio: f32) -> Option<f32> {
    if ratio.is_nan() {
        None
    } else {
        Some(ratio.clamp(MIN_RATIO, MAX_RATIO))
    }
}

fn split_node(
    node: &Node,
    target: LeafId,
    direction: Direction,
    ratio: f32,
    new_id: LeafId,
) -> Option<Node> {
    match node {
        Node::Leaf { id } if *id == target => Some(Node::Split {
            id: SplitId::new(),
            direction,
            ratio,
            first: Box::new(node.clone()),
            second: Box::new(Node::leaf(new_id)),
        }),
        Node::Leaf { .. } => None,
        Node::Split {
            id,
            direction: dir,
            ratio: r,
            first,
            second,
        } => {
            if let Some(new_first) = split_node(first, target, direction, ratio, new_id) {
                return Some(Node::Split {
                    id: *id,
                    direction: *dir,
                    ratio: *r,
                    first: Box::new(new_first),
                    second: second.clone(),
                });
            }
            split_node(second, target, direction, ratio, new_id).map(|new_second| Node::Split {
                id: *id,
                direction: *dir,
                ratio: *r,
                first: first.clone(),
                second: Box::new(new_second),
            })
        }
    }
}

/// Outcome of removing a leaf from a subtree
enum Removal {
    /// Target not in this subtree
    NotFound,
    /// The whole subtree went away
    Emptied,
    /// The subtree survives in a new shape
    Replaced(Node),
}

impl Removal {
    fn into_node(self, original: &Node) -> Option<Node> {
        match self {
            Removal::NotFound => Some(original.clone()),
            Removal::Emptied => None,
            Removal::Replaced(node) => Some(node),
        }
    }
}

fn remove_leaf(node: &Node, target: LeafId) -> Removal {
    match node {
        Node::Leaf { id } if *id == target => Removal::Emptied,
        Node::Leaf { .. } => Removal::NotFound,
        Node::Split {
            id,
            direction,
            ratio,
            first,
            second,
        } => {
            let first_result = remove_leaf(first, target);
            let second_result = remove_leaf(second, target);
            if matches!(first_result, Removal::NotFound) && matches!(second_result, Removal::NotFound)
            {
                return Removal::NotFound;
            }
            match (
                first_result.into_node(first),
                second_result.into_node(second),
            ) {
                (None, None) => Removal::Emptied,
                (None, Some(survivor)) | (Some(survivor), None) => Removal::Replaced(survivor),
                (Some(new_first), Some(new_second)) => Removal::Replaced(Node::Split {
                    id: *id,
                    direction: *direction,
                    ratio: *ratio,
                    first: Box::new(new_first),
                    second: Box::new(new_second),
                }),
            }
        }
    }
}

fn set_ratio(node: &Node, target: SplitId, new_ratio: f32) -> Option<Node> {
    match node {
        Node::Leaf { .. } => None,
        Node::Split {
            id,
            direction,
            ratio,
            first,
            second,
        } => {
            if *id == target {
                return Some(Node::Split {
                    id: *id,
                    direction: *direction,
                    ratio: new_ratio,
                    first: first.clone(),
                    second: second.clone(),
                });
            }
            if let Some(new_first) = set_ratio(first, target, new_ratio) {
                return Some(Node::Split {
                    id: *id,
                    direction: *direction,
                    ratio: *ratio,
                    first: Box::new(new_first),
                    second: second.clone(),
                });
            }
            set_ratio(second, target, new_ratio).map(|new_second| Node::Split {
                id: *id,
                direction: *direction,
                ratio: *ratio,
                first: first.clone(),
                second: Box::new(new_second),
            })
        }
    }
}

fn find_ratio(node: &Node, target: SplitId) -> Option<f32> {
    match node {
        Node::Leaf { .. } => None,
        Node::Split {
            id,
            ratio,
            first,
            second,
            ..
        } => {
            if *id == target {
                Some(*ratio)
            } else {
                find_ratio(first, target).or_else(|| find_ratio(second, target))
            }
        }
    }
}

fn collect_rects(node: &Node, rect: Rect, out: &mut Vec<(LeafId, Rect)>) {
    match node {
        Node::Leaf { id } => out.push((*id, rect)),
        Node::Split {
            direction,
            ratio,
            first,
            second,
            ..
        } => {
            let (first_rect, second_rect) = match direction {
                Direction::Horizontal => {
                    let first_width = rect.width * ratio;
                    (
                        Rect::new(rect.x, rect.y, first_width, rect.height),
                        Rect::new(
                            rect.x + first_width,
                            rect.y,
                            rect.width - first_width,
                            rect.height,
                        ),
                    )
                }
                Direction::Vertical => {
                    let first_height = rect.height * ratio;
                    (
                        Rect::new(rect.x, rect.y, rect.width, first_height),
                        Rect::new(
                            rect.x,
                            rect.y + first_height,
                            rect.width,
                            rect.height - first_height,
                        ),
                    )
                }
            };
            collect_rects(first, first_rect, out);
            collect_rects(second, second_rect, out);
        }
    }
}
