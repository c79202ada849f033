//! Application layer errors.

use p2paste_core::SessionError;
use thiserror::Error;

/// Errors from [`crate::Lifecycle::handle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Operation needs a running session and none is active.
    #[error("no active session for {operation}")]
    NotActive {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// The session rejected the operation.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Why a clipboard backend could not take the text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No such mechanism on this platform.
    #[error("clipboard unavailable")]
    Unavailable,

    /// The mechanism exists but refused the write.
    #[error("clipboard write failed: {reason}")]
    Failed {
        /// Description from the backend
        reason: String,
    },
}

/// Rejection of a hand-typed room link.
///
/// There is a single variant on purpose: the form never says which check
/// failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    /// The words and code do not name a room.
    #[error("That doesn't look like a valid room. Check the two words and the code.")]
    Rejected,
}
