// ABOUTME: Shared types and configuration for numby split panes.
// ABOUTME: Defines leaf/split/tab identifiers and config file handling.

pub mod config;
pub mod ids;

pub use config::{Config, ConfigError, LayoutSettings, SessionSettings, MAX_RATIO, MIN_RATIO};
pub use ids::{LeafId, SplitId, TabId};
