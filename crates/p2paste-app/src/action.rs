//! Lifecycle side-effects.

use bytes::Bytes;
use p2paste_core::{Channel, PeerId, RoomId};

use crate::event::StartTicket;

/// Operations on the peer transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Join a room through the given rendezvous endpoints.
    OpenRoom {
        /// Room to join.
        room: RoomId,
        /// Rendezvous endpoints.
        signaling: Vec<String>,
    },

    /// Start delivering a channel.
    Subscribe {
        /// Channel to listen on.
        channel: Channel,
    },

    /// Stop delivering a channel.
    Unsubscribe {
        /// Channel to stop listening on.
        channel: Channel,
    },

    /// Send to every peer.
    Broadcast {
        /// Target channel.
        channel: Channel,
        /// Raw payload.
        payload: Bytes,
    },

    /// Send to one peer.
    SendTo {
        /// Recipient.
        peer: PeerId,
        /// Target channel.
        channel: Channel,
        /// Raw payload.
        payload: Bytes,
    },

    /// Leave the room.
    LeaveRoom {
        /// Room to leave.
        room: RoomId,
    },

    /// Close any rendezvous sockets still open for the room.
    CloseSignaling {
        /// Room whose sockets to close.
        room: RoomId,
    },
}

/// Actions produced by the lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Ask the host for an idle slot, answered with
    /// [`crate::LifecycleEvent::HostIdle`].
    RequestIdle {
        /// Ticket to echo back.
        ticket: StartTicket,
    },

    /// Execute a transport operation.
    Transport(TransportCommand),

    /// Re-render the view.
    Render,
}
