// ABOUTME: Contract between the pane manager and per-pane content sessions.
// ABOUTME: Sessions are created by a factory and disposed when their leaf disappears.

use numby_core::LeafId;

/// Stateful content living inside one pane.
pub trait ContentSession {
    /// Stop accepting work immediately and release resources in the background.
    /// After this returns, no result produced by the session may become visible.
    fn dispose(&mut self) -> Result<(), SessionError>;

    /// Whether `dispose` has been called
    fn is_inert(&self) -> bool;

    /// Text the user entered, for persistence
    fn contents(&self) -> String;

    /// Replace the entered text with previously persisted contents
    fn restore_contents(&mut self, contents: String);
}

/// Builds sessions for newly visible leaves. `create` must not block.
pub trait SessionFactory {
    type Session: ContentSession;

    fn create(&mut self, leaf: LeafId) -> Result<Self::Session, SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session limit ({0}) reached")]
    LimitReached(usize),

    #[error("Session was already disposed")]
    AlreadyDisposed,

    #[error("Session backend failed: {0}")]
    Backend(String),
}
