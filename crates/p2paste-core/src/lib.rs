//! Core of p2paste: room naming and the session synchronization protocol.
//!
//! # Architecture
//!
//! Everything in this crate is Sans-IO. State machines receive events carrying
//! the current time, mutate their state, and return actions for the caller to
//! execute against a real peer transport. Nothing here opens sockets, sleeps,
//! or spawns tasks.
//!
//! # Components
//!
//! - [`slug`]: three-token room names with a checksum (generate, validate)
//! - [`RoomId`]: transport room identifier derived from a slug
//! - [`Replica`]: contract for the CRDT engine, with [`AutomergeReplica`] as
//!   the production engine
//! - [`Document`]: origin-tagged mutation funnel around a replica
//! - [`PeerSet`]: local, eventually consistent peer accounting
//! - [`RoomSession`]: join / full-state / update exchange for one room
//! - [`env::Environment`]: time and randomness, injected for deterministic
//!   simulation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod automerge_replica;
pub mod env;
mod error;
mod peers;
mod replica;
mod room;
mod session;
pub mod slug;

pub use automerge_replica::AutomergeReplica;
pub use error::{ReplicaError, SessionError, SlugError};
pub use p2paste_proto::Channel;
pub use peers::{PeerId, PeerSet};
pub use replica::{Document, Origin, Replica, TextEdit, Update};
pub use room::{DEFAULT_ROOM_PREFIX, RoomId};
pub use session::{
    DEFAULT_REQUEST_FULL_DELAY, RoomSession, SessionAction, SessionConfig, SessionEvent,
    SessionState, TransportEvent,
};
pub use slug::Slug;
