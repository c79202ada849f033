//! Frame header with zero-copy parsing.
//!
//! The `FrameHeader` is a fixed 20-byte structure serialized as raw binary
//! (Big Endian). A receiver learns the channel, the addressing mode and the
//! payload size without touching the payload.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    Channel,
    errors::{ProtocolError, Result},
};

/// Header flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// Frame is addressed to a single peer (see [`FrameHeader::target`]).
    pub const TARGETED: u8 = 0b0000_0001;

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw flag bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Construct from raw bits. Unknown bits are preserved.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Check whether the targeted bit is set.
    pub const fn is_targeted(self) -> bool {
        self.0 & Self::TARGETED != 0
    }
}

/// Fixed 20-byte frame header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays so the struct has alignment 1 and every
/// 20-byte pattern is a valid value. Semantic validation (magic, version,
/// channel) happens in [`FrameHeader::from_bytes`].
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 4],   // 0x50325053 ("P2PS" in ASCII)
    version: u8,      // 0x01
    channel: u8,      // Channel wire tag
    flags: u8,        // FrameFlags bitfield
    reserved: u8,     // must be zero on send, ignored on receive
    target: [u8; 8],  // u64 peer id, meaningful only with TARGETED
    pub(crate) payload_size: [u8; 4], // u32 payload length
}

impl FrameHeader {
    /// Size of the serialized header (20 bytes)
    pub const SIZE: usize = 20;

    /// Magic number: "P2PS" in ASCII (0x50325053)
    pub const MAGIC: u32 = 0x5032_5053;

    /// Current protocol version
    pub const VERSION: u8 = 0x01;

    /// Maximum payload size (8 MB). Snapshots of a pasted document stay far
    /// below this.
    pub const MAX_PAYLOAD_SIZE: u32 = 8 * 1024 * 1024;

    /// Create a broadcast header for the given channel.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            channel: channel.to_u8(),
            flags: FrameFlags::empty().bits(),
            reserved: 0,
            target: [0; 8],
            payload_size: [0; 4],
        }
    }

    /// Create a header addressed to a single peer.
    #[must_use]
    pub fn targeted(channel: Channel, target: u64) -> Self {
        let mut header = Self::new(channel);
        header.set_target(Some(target));
        header
    }

    /// Parse header from network bytes (zero-copy)
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if buffer is shorter than
    ///   [`FrameHeader::SIZE`]
    /// - `ProtocolError::InvalidMagic` if the magic number is wrong
    /// - `ProtocolError::UnsupportedVersion` if the version is not ours
    /// - `ProtocolError::UnknownChannel` if the channel tag is unknown
    /// - `ProtocolError::PayloadTooLarge` if the claimed size exceeds the limit
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::FrameTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0;

        if u32::from_be_bytes(header.magic) != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        if Channel::from_u8(header.channel).is_none() {
            return Err(ProtocolError::UnknownChannel(header.channel));
        }

        if header.payload_size() > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: header.payload_size() as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize header to its 20-byte wire form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// Channel this frame belongs to.
    ///
    /// Headers obtained from [`FrameHeader::from_bytes`] always carry a known
    /// channel; `None` only for headers built by hand with a bad tag.
    pub fn channel(&self) -> Option<Channel> {
        Channel::from_u8(self.channel)
    }

    /// Header flags.
    pub fn flags(&self) -> FrameFlags {
        FrameFlags::from_bits(self.flags)
    }

    /// Addressed peer. `None` for broadcast frames.
    pub fn target(&self) -> Option<u64> {
        self.flags().is_targeted().then(|| u64::from_be_bytes(self.target))
    }

    /// Address the frame to a single peer, or make it a broadcast with `None`.
    pub fn set_target(&mut self, target: Option<u64>) {
        match target {
            Some(peer) => {
                self.flags |= FrameFlags::TARGETED;
                self.target = peer.to_be_bytes();
            },
            None => {
                self.flags &= !FrameFlags::TARGETED;
                self.target = [0; 8];
            },
        }
    }

    /// Payload length in bytes.
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for FrameHeader {}

impl fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameHeader")
            .field("channel", &self.channel())
            .field("target", &self.target())
            .field("payload_size", &self.payload_size())
            .finish()
    }
}
