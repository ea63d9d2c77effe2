// ABOUTME: Application configuration handling.
// ABOUTME: Loads and saves pane layout and session settings from TOML config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest share of a split that either child may occupy
pub const MIN_RATIO: f32 = 0.1;

/// Largest share of a split that the first child may occupy
pub const MAX_RATIO: f32 = 0.9;

/// Split and tab defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Share of the space given to the original pane when splitting
    pub default_ratio: f32,

    /// Name given to newly created tabs
    pub default_tab_name: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            default_ratio: 0.5,
            default_tab_name: "Calculator".to_string(),
        }
    }
}

impl LayoutSettings {
    /// Default ratio clamped into the range splits accept
    pub fn clamped_ratio(&self) -> f32 {
        if self.default_ratio.is_nan() {
            return 0.5;
        }
        self.default_ratio.clamp(MIN_RATIO, MAX_RATIO)
    }
}

/// Per-pane content session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Quiet period after the last edit before a pane recomputes (milliseconds)
    pub debounce_ms: u64,

    /// Upper bound on live sessions across all tabs (0 = unlimited)
    pub max_sessions: usize,

    /// Restore the previous workspace snapshot on launch and save it on exit
    pub restore_on_launch: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            max_sessions: 16,
            restore_on_launch: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Split and tab defaults
    pub layout: LayoutSettings,

    /// Content session settings
    pub session: SessionSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

impl Config {
    /// Get the default config file path (~/.config/numby/panes.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("numby").join("panes.toml"))
    }

    /// Load config from a path
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default path, or return default config if not found
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default_at(&path),
            None => Self::default(),
        }
    }

    /// Load config from a path, falling back to defaults when it is missing or broken
    pub fn load_or_default_at(path: &std::path::Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Ignoring config at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save config to a path
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[session]\ndebounce_ms = 250\n").unwrap();
        assert_eq!(config.session.debounce_ms, 250);
        assert_eq!(config.session.max_sessions, 16);
        assert_eq!(config.layout, LayoutSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("panes.toml");

        let mut config = Config::default();
        config.layout.default_tab_name = "Scratch".to_string();
        config.session.restore_on_launch = false;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn out_of_range_ratio_is_clamped() {
        let layout = LayoutSettings {
            default_ratio: 1.5,
            ..Default::default()
        };
        assert_eq!(layout.clamped_ratio(), MAX_RATIO);

        let layout = LayoutSettings {
            default_ratio: f32::NAN,
            ..Default::default()
        };
        assert_eq!(layout.clamped_ratio(), 0.5);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panes.toml");
        std::fs::write(&path, "layout = 3").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn broken_or_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panes.toml");
        assert_eq!(Config::load_or_default_at(&path), Config::default());

        std::fs::write(&path, "[session]\ndebounce_ms = \"soon\"\n").unwrap();
        assert_eq!(Config::load_or_default_at(&path), Config::default());

        std::fs::write(&path, "[session]\nmax_sessions = 4\n").unwrap();
        assert_eq!(Config::load_or_default_at(&path).session.max_sessions, 4);
    }
}
