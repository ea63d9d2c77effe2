// ABOUTME: Per-pane content sessions and their lifecycle.
// ABOUTME: Keeps one live session per visible leaf of a split tree.

pub mod calculator;
pub mod manager;
pub mod session;

pub use calculator::{CalculatorFactory, CalculatorSession, Engine, NoopEngine};
pub use manager::{PaneInstanceManager, SyncReport};
pub use session::{ContentSession, SessionError, SessionFactory};
