//! Protocol error types.

use thiserror::Error;

/// Result alias for frame codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding or encoding peer-link frames.
///
/// Every variant describes input received from a peer (or a payload we
/// refused to send). None of them are fatal to a session: the caller drops
/// the offending frame and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer shorter than a frame header
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Payload shorter than the header claims
    #[error("frame truncated: header claims {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload size claimed by the header
        expected: usize,
        /// Payload bytes actually present
        actual: usize,
    },

    /// Magic number mismatch
    #[error("invalid magic number")]
    InvalidMagic,

    /// Frame produced by an incompatible protocol revision
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Channel byte does not name a known channel
    #[error("unknown channel: {0:#04x}")]
    UnknownChannel(u8),

    /// Channel name does not name a known channel
    #[error("unknown channel name: {0}")]
    UnknownChannelName(String),

    /// Payload exceeds the frame size limit
    #[error("payload too large: {size} bytes exceeds maximum of {max}")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },
}
