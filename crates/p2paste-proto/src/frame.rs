//! Frame type combining header and payload.
//!
//! A `Frame` is what travels over a single peer link when the transport does
//! not multiplex named channels itself:
//! - 20-byte raw binary header (Big Endian)
//! - variable-length opaque payload (CRDT delta, snapshot, or nothing)

use bytes::{BufMut, Bytes};

use crate::{
    Channel, FrameHeader,
    errors::{ProtocolError, Result},
};

/// Complete peer-link frame
///
/// Layout on the wire:
/// `[FrameHeader: 20 bytes] + [payload: variable bytes]`
///
/// # Invariants
///
/// - Size Consistency: `payload.len()` MUST match `header.payload_size()`.
///   Enforced by [`Frame::new`] and verified by [`Frame::decode`].
/// - Size Limit: `payload.len()` MUST NOT exceed
///   [`FrameHeader::MAX_PAYLOAD_SIZE`]. Enforced by [`Frame::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header
    pub header: FrameHeader,

    /// Opaque payload bytes
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame, setting the header's payload size from `payload`.
    ///
    /// Payloads longer than `u32::MAX` saturate the size field and are then
    /// rejected by [`Frame::encode`].
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let payload_len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        header.payload_size = payload_len.to_be_bytes();

        Self { header, payload }
    }

    /// Broadcast frame on `channel`.
    #[must_use]
    pub fn broadcast(channel: Channel, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameHeader::new(channel), payload)
    }

    /// Frame on `channel` addressed to peer `target`.
    #[must_use]
    pub fn to_peer(channel: Channel, target: u64, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameHeader::targeted(channel, target), payload)
    }

    /// Channel this frame belongs to.
    pub fn channel(&self) -> Option<Channel> {
        self.header.channel()
    }

    /// Encode frame into buffer
    ///
    /// Writes: `[header (20 bytes)] + [payload (variable)]`
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds
    ///   [`FrameHeader::MAX_PAYLOAD_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.payload.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        debug_assert_eq!(self.payload.len(), self.header.payload_size() as usize);

        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Encode into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Same as [`Frame::encode`].
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut wire = Vec::with_capacity(FrameHeader::SIZE + self.payload.len());
        self.encode(&mut wire)?;
        Ok(wire)
    }

    /// Decode frame from wire format
    ///
    /// Trailing bytes after the claimed payload are ignored.
    ///
    /// # Errors
    ///
    /// - any header error from [`FrameHeader::from_bytes`]
    /// - `ProtocolError::FrameTruncated` if fewer payload bytes are present
    ///   than the header claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;

        let payload_size = header.payload_size() as usize;
        let body = &bytes[FrameHeader::SIZE..];

        let Some(payload) = body.get(..payload_size) else {
            return Err(ProtocolError::FrameTruncated {
                expected: payload_size,
                actual: body.len(),
            });
        };

        Ok(Self { header: *header, payload: Bytes::copy_from_slice(payload) })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn any_channel() -> impl Strategy<Value = Channel> {
        prop_oneof![Just(Channel::Update), Just(Channel::FullState), Just(Channel::RequestFull)]
    }

    proptest! {
        #[test]
        fn frame_round_trip(
            channel in any_channel(),
            target in proptest::option::of(any::<u64>()),
            payload in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let frame = match target {
                Some(peer) => Frame::to_peer(channel, peer, payload),
                None => Frame::broadcast(channel, payload),
            };
            let wire = frame.to_vec().expect("should encode");

            let parsed = Frame::decode(&wire).expect("should decode");
            prop_assert_eq!(parsed, frame);
        }
    }

    #[test]
    fn frame_sets_payload_size() {
        let frame = Frame::broadcast(Channel::Update, vec![1, 2, 3, 4]);
        assert_eq!(frame.header.payload_size(), 4);
        assert_eq!(frame.channel(), Some(Channel::Update));
    }

    #[test]
    fn empty_request_full_is_header_only() {
        let frame = Frame::broadcast(Channel::RequestFull, Bytes::new());
        let wire = frame.to_vec().unwrap();
        assert_eq!(wire.len(), FrameHeader::SIZE);
    }

    #[test]
    fn reject_truncated_frame() {
        let frame = Frame::broadcast(Channel::FullState, vec![7u8; 100]);
        let wire = frame.to_vec().unwrap();

        let result = Frame::decode(&wire[..FrameHeader::SIZE + 10]);
        assert_eq!(result, Err(ProtocolError::FrameTruncated { expected: 100, actual: 10 }));
    }

    #[test]
    fn trailing_bytes_ignored() {
        let frame = Frame::to_peer(Channel::FullState, 3, vec![9u8; 5]);
        let mut wire = frame.to_vec().unwrap();
        wire.extend_from_slice(b"garbage");

        assert_eq!(Frame::decode(&wire).unwrap(), frame);
    }
}
