// ABOUTME: Workspace persistence for restoring tabs and panes across launches.
// ABOUTME: Stores the tab collection plus per-pane contents as zstd-compressed JSON.

use numby_core::LeafId;
use numby_layout::{LayoutError, TabCollection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted contents of one pane, matched back to its session by leaf id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneSnapshot {
    pub leaf_id: LeafId,
    pub contents: String,
}

/// Everything needed to rebuild a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub version: u32,
    pub tabs: TabCollection,
    pub panes: Vec<PaneSnapshot>,
}

impl WorkspaceSnapshot {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(tabs: TabCollection, panes: Vec<PaneSnapshot>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            tabs,
            panes,
        }
    }

    /// Get the default snapshot file path (~/.local/state/numby/workspace.bin)
    pub fn default_path() -> Option<PathBuf> {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|p| p.join("numby").join("workspace.bin"))
    }

    pub fn save(&self, path: &std::path::Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(&json[..], 3)?;
        std::fs::write(path, compressed)?;
        Ok(())
    }

    pub fn save_to_default(&self) -> Result<PathBuf, SnapshotError> {
        let path = Self::default_path().ok_or(SnapshotError::NoStatePath)?;
        self.save(&path)?;
        Ok(path)
    }

    /// Load and validate a snapshot; ids are kept exactly as persisted
    pub fn load(path: &std::path::Path) -> Result<Self, SnapshotError> {
        let compressed = std::fs::read(path)?;
        let json = zstd::decode_all(&compressed[..])?;
        let snapshot: WorkspaceSnapshot = serde_json::from_slice(&json)?;

        if snapshot.version > Self::CURRENT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        snapshot.tabs.validate()?;

        Ok(snapshot)
    }

    /// Load from the default path; a missing or unreadable file yields None
    pub fn load_from_default() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load(&path) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::error!("Failed to load workspace snapshot: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not determine state directory")]
    NoStatePath,

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot layout is invalid: {0}")]
    Invalid(#[from] LayoutError),
}
