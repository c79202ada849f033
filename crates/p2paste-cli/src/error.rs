//! CLI errors.

use p2paste_app::JoinError;
use thiserror::Error;

/// Errors surfaced to the user by the `p2paste` binary.
#[derive(Error, Debug)]
pub enum CliError {
    /// The typed room link was rejected.
    #[error(transparent)]
    Join(#[from] JoinError),

    /// The simulated room did not reach a consistent state.
    #[error("demo room failed: {reason}")]
    Demo {
        /// What went wrong
        reason: String,
    },

    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}
