// ABOUTME: Pane layout management for numby.
// ABOUTME: Immutable split trees grouped into an ordered tab collection.

mod tabs;
mod tree;

use numby_core::{LeafId, SplitId, TabId};

pub use tabs::{Tab, TabCollection};
pub use tree::{Direction, Node, Rect, SplitTree};

/// Reasons a decoded tree or tab collection is rejected
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Leaf {0} appears more than once")]
    DuplicateLeaf(LeafId),

    #[error("Split {0} appears more than once or shares an id with a leaf")]
    DuplicateSplit(SplitId),

    #[error("Split {split} has ratio {ratio} outside the allowed range")]
    RatioOutOfRange { split: SplitId, ratio: f32 },

    #[error("Focused leaf {0} is not in the tree")]
    FocusNotFound(LeafId),

    #[error("Tab collection is empty")]
    NoTabs,

    #[error("Tab {0} appears more than once")]
    DuplicateTab(TabId),

    #[error("Selected tab {0} is not in the collection")]
    SelectedTabMissing(TabId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
