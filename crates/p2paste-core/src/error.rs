//! Error types for the p2paste core.
//!
//! Errors are split by who caused them. [`SlugError`] and [`SessionError`]
//! report caller mistakes and are returned. [`ReplicaError`] is returned by
//! the document engine; when the offending input came from a peer the session
//! logs and drops it instead of propagating.

use thiserror::Error;

use crate::session::SessionState;

/// Errors from parsing or validating a room slug.
///
/// The display text is deliberately identical for every rejection reason that
/// involves the vocabulary or the checksum, so it can be shown to a user
/// without revealing which check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Input is not shaped like `<word>-<word>-<code>`
    #[error("not a room link")]
    Malformed,

    /// Shape is right but the words or the code do not check out
    #[error("not a room link")]
    Rejected,
}

/// Errors reported by a [`crate::Replica`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplicaError {
    /// Encoded delta or snapshot could not be decoded
    #[error("malformed update: {reason}")]
    Malformed {
        /// Description from the engine
        reason: String,
    },

    /// Local edit addresses text outside the document
    #[error("edit out of range: {index}+{delete} exceeds length {len}")]
    OutOfRange {
        /// Edit start (characters)
        index: usize,
        /// Characters to delete
        delete: usize,
        /// Current document length (characters)
        len: usize,
    },

    /// Engine failed for a reason not attributable to the input
    #[error("engine error: {reason}")]
    Engine {
        /// Description from the engine
        reason: String,
    },
}

/// Errors from [`crate::RoomSession`] operations requested by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Operation is not valid in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when the error occurred
        state: SessionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Local document engine rejected an operation
    #[error("replica error: {0}")]
    Replica(#[from] ReplicaError),
}

impl SessionError {
    /// Returns true if the session is unusable after this error.
    ///
    /// Only misuse of a closed session is terminal; a rejected edit leaves the
    /// document untouched and the session live.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InvalidState { state: SessionState::Closed, .. })
    }
}
