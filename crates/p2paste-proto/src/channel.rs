//! Logical channels of a room.

use std::{fmt, str::FromStr};

use crate::errors::ProtocolError;

/// The three named channels every room participant registers.
///
/// | channel | payload | delivery |
/// |---|---|---|
/// | `update` | incremental delta | broadcast, no reply |
/// | `full-state` | full snapshot | to the requester when possible, else broadcast |
/// | `request-full` | empty | broadcast, every listener replies on `full-state` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Incremental CRDT deltas from local edits.
    Update,
    /// Full CRDT snapshots answering a [`Channel::RequestFull`].
    FullState,
    /// "Please send me your state", sent by every joiner.
    RequestFull,
}

impl Channel {
    /// All channels, in registration order.
    pub const ALL: [Channel; 3] = [Channel::Update, Channel::FullState, Channel::RequestFull];

    /// Channel name as registered with the transport.
    pub fn name(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::FullState => "full-state",
            Self::RequestFull => "request-full",
        }
    }

    /// Wire tag used in [`crate::FrameHeader`].
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Update => 0x01,
            Self::FullState => 0x02,
            Self::RequestFull => 0x03,
        }
    }

    /// Parse a wire tag. `None` for unknown tags.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Update),
            0x02 => Some(Self::FullState),
            0x03 => Some(Self::RequestFull),
            _ => None,
        }
    }

    /// Whether payloads on this channel are expected to be empty.
    pub fn is_signal(self) -> bool {
        matches!(self, Self::RequestFull)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.name() == s)
            .ok_or_else(|| ProtocolError::UnknownChannelName(s.to_string()))
    }
}
