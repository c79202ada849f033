//! Wire contract for p2paste rooms.
//!
//! A room speaks over three logical channels ([`Channel`]). Transports that
//! expose named channels natively carry payloads as-is; transports that only
//! offer a single byte stream per peer link wrap each payload in a [`Frame`].
//!
//! Payloads are opaque to this crate: CRDT deltas and snapshots are produced
//! and consumed by the document engine, never inspected here.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
pub mod errors;
mod frame;
mod header;

pub use channel::Channel;
pub use errors::ProtocolError;
pub use frame::Frame;
pub use header::{FrameFlags, FrameHeader};
