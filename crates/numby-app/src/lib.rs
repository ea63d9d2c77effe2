// ABOUTME: Workspace glue binding tabs, split trees and pane sessions together.
// ABOUTME: Exposes the command surface and snapshot persistence used by the driver.

pub mod command;
pub mod snapshot;
pub mod workspace;

pub use command::{Command, CommandError, PaneTarget, TabTarget};
pub use snapshot::{PaneSnapshot, SnapshotError, WorkspaceSnapshot};
pub use workspace::Workspace;
