//! Room session state machine.
//!
//! A [`RoomSession`] owns one document replica and one transport room for the
//! lifetime of a page view. It exchanges three kinds of messages with peers:
//!
//! - `request-full`: sent once after joining, asks every peer for its state
//! - `full-state`: a snapshot, sent in answer to `request-full`
//! - `update`: an incremental delta, sent after every local edit
//!
//! # State machine
//!
//! ```text
//! Idle ──join──► Joining ──request-full timer──► Syncing
//!                   │                               │
//!                   └─────────first peer-join───────┴──► Live
//!
//! any state ──leave──► Closed
//! ```
//!
//! The session performs no I/O. Transport commands come back as
//! [`SessionAction`]s and the pending `request-full` delay is a deadline
//! checked on every [`SessionEvent::Tick`].

use std::time::Duration;

use bytes::Bytes;
use p2paste_proto::Channel;

use crate::{
    env::Environment,
    error::SessionError,
    peers::{PeerId, PeerSet},
    replica::{Document, Origin, Replica, TextEdit},
    room::RoomId,
};

/// Delay between joining and broadcasting `request-full`, giving the
/// transport time to reach the peers already in the room.
pub const DEFAULT_REQUEST_FULL_DELAY: Duration = Duration::from_millis(250);

/// Tunables for a [`RoomSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delay before the join-time `request-full` broadcast.
    pub request_full_delay: Duration,

    /// Answer `request-full` with a message addressed to the requester.
    ///
    /// When false, or for transports without point-to-point delivery,
    /// snapshots are broadcast instead. Peers merge rather than replace, so
    /// an unsolicited snapshot is harmless.
    pub targeted_send: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { request_full_delay: DEFAULT_REQUEST_FULL_DELAY, targeted_send: true }
    }
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, nothing opened yet.
    Idle,
    /// Room opened, waiting to ask peers for state.
    Joining,
    /// `request-full` sent, no peer seen yet.
    Syncing,
    /// At least one peer has been seen.
    Live,
    /// Torn down. Terminal.
    Closed,
}

impl SessionState {
    /// Whether the session holds a document and an open room.
    pub fn is_joined(self) -> bool {
        matches!(self, Self::Joining | Self::Syncing | Self::Live)
    }
}

/// Notifications from the peer transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A peer connected to the room.
    PeerJoined {
        /// Connected peer.
        peer: PeerId,
    },

    /// A peer disconnected from the room.
    PeerLeft {
        /// Disconnected peer.
        peer: PeerId,
    },

    /// A peer sent a message on a channel.
    Received {
        /// Sender.
        from: PeerId,
        /// Channel the message arrived on.
        channel: Channel,
        /// Raw payload.
        payload: Bytes,
    },
}

/// Inputs to [`RoomSession::handle`].
///
/// Generic over `I` (Instant type) to support both production and simulated
/// clocks.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// Open the room and start synchronizing.
    Join {
        /// Current time.
        now: I,
    },

    /// Time passed; fire due timers.
    Tick {
        /// Current time.
        now: I,
    },

    /// Local participant edited the text.
    Edit(TextEdit),

    /// Something happened on the transport.
    Transport(TransportEvent),

    /// Tear everything down.
    Leave,
}

/// Commands for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Join the transport room.
    OpenRoom {
        /// Room to join.
        room: RoomId,
    },

    /// Start delivering messages on a channel.
    Subscribe {
        /// Channel to listen on.
        channel: Channel,
    },

    /// Stop delivering messages on a channel.
    Unsubscribe {
        /// Channel to stop listening on.
        channel: Channel,
    },

    /// Send a payload to every peer in the room.
    Broadcast {
        /// Target channel.
        channel: Channel,
        /// Raw payload.
        payload: Bytes,
    },

    /// Send a payload to a single peer.
    SendTo {
        /// Recipient.
        peer: PeerId,
        /// Target channel.
        channel: Channel,
        /// Raw payload.
        payload: Bytes,
    },

    /// Leave the transport room.
    LeaveRoom {
        /// Room to leave.
        room: RoomId,
    },

    /// Document text changed; re-render.
    DocumentChanged,

    /// State or peer count changed; re-render status.
    StatusChanged,
}

/// Resource acquired during join, released in reverse on leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subscription {
    DocumentUpdates,
    Channel(Channel),
    RequestFullTimer,
}

/// Synchronization state machine for one room.
pub struct RoomSession<E: Environment, R: Replica> {
    env: E,
    room: RoomId,
    config: SessionConfig,
    state: SessionState,
    document: Option<Document<R>>,
    peers: PeerSet,
    subscriptions: Vec<Subscription>,
    request_full_at: Option<E::Instant>,
}

impl<E: Environment, R: Replica> RoomSession<E, R> {
    /// Session for `room`, not yet joined.
    pub fn new(env: E, room: RoomId, config: SessionConfig) -> Self {
        Self {
            env,
            room,
            config,
            state: SessionState::Idle,
            document: None,
            peers: PeerSet::new(),
            subscriptions: Vec::new(),
            request_full_at: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Room this session belongs to.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Local view of connected peers.
    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    /// Remote peers currently believed connected.
    pub fn peer_count(&self) -> usize {
        self.peers.count()
    }

    /// Whether at least one remote peer is connected.
    pub fn is_connected(&self) -> bool {
        self.peers.is_connected()
    }

    /// The document, while joined.
    pub fn document(&self) -> Option<&Document<R>> {
        self.document.as_ref()
    }

    /// Current text, empty when not joined.
    pub fn text(&self) -> String {
        self.document.as_ref().map(Document::text).unwrap_or_default()
    }

    /// Deadline of the pending `request-full` broadcast.
    pub fn request_full_deadline(&self) -> Option<E::Instant> {
        self.request_full_at
    }

    /// Number of resources that leave would release.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidState` for a join outside `Idle` or an edit
    ///   while not joined
    /// - `SessionError::Replica` if a local edit is out of range
    ///
    /// Bad input from peers is logged and dropped, never returned.
    pub fn handle(
        &mut self,
        event: SessionEvent<E::Instant>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Join { now } => self.handle_join(now),
            SessionEvent::Tick { now } => Ok(self.handle_tick(now)),
            SessionEvent::Edit(edit) => self.handle_edit(&edit),
            SessionEvent::Transport(event) => Ok(self.handle_transport(event)),
            SessionEvent::Leave => Ok(self.handle_leave()),
        }
    }

    fn handle_join(&mut self, now: E::Instant) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState { state: self.state, operation: "join" });
        }

        let mut document = Document::new(R::empty(self.env.random_u128())?);
        document.attach_listener();
        self.document = Some(document);
        self.subscriptions.push(Subscription::DocumentUpdates);

        let mut actions = vec![SessionAction::OpenRoom { room: self.room.clone() }];
        for channel in Channel::ALL {
            self.subscriptions.push(Subscription::Channel(channel));
            actions.push(SessionAction::Subscribe { channel });
        }

        self.request_full_at = Some(now + self.config.request_full_delay);
        self.subscriptions.push(Subscription::RequestFullTimer);

        tracing::info!(room = %self.room, "joining room");
        self.transition(SessionState::Joining);
        actions.push(SessionAction::StatusChanged);
        Ok(actions)
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<SessionAction> {
        let Some(deadline) = self.request_full_at else {
            return Vec::new();
        };
        if now < deadline {
            return Vec::new();
        }

        self.request_full_at = None;
        self.subscriptions.retain(|s| *s != Subscription::RequestFullTimer);

        tracing::debug!(room = %self.room, "requesting full state");
        let mut actions =
            vec![SessionAction::Broadcast { channel: Channel::RequestFull, payload: Bytes::new() }];

        if self.state == SessionState::Joining {
            self.transition(SessionState::Syncing);
            actions.push(SessionAction::StatusChanged);
        }
        actions
    }

    fn handle_edit(&mut self, edit: &TextEdit) -> Result<Vec<SessionAction>, SessionError> {
        let state = self.state;
        let document = match self.document.as_mut() {
            Some(document) if state.is_joined() => document,
            _ => return Err(SessionError::InvalidState { state, operation: "edit" }),
        };

        if edit.is_noop() {
            return Ok(Vec::new());
        }

        let update = document.edit(edit)?;

        let mut actions = Vec::with_capacity(2);
        if let Some(update) = update
            && update.origin == Origin::Local
        {
            actions.push(SessionAction::Broadcast { channel: Channel::Update, payload: update.delta });
        }
        actions.push(SessionAction::DocumentChanged);
        Ok(actions)
    }

    fn handle_transport(&mut self, event: TransportEvent) -> Vec<SessionAction> {
        if !self.state.is_joined() {
            tracing::debug!(state = ?self.state, ?event, "ignoring transport event");
            return Vec::new();
        }

        match event {
            TransportEvent::PeerJoined { peer } => {
                if !self.peers.joined(peer) {
                    tracing::debug!(room = %self.room, %peer, "duplicate peer join");
                    return Vec::new();
                }
                tracing::info!(room = %self.room, %peer, peers = self.peers.count(), "peer joined");
                if matches!(self.state, SessionState::Joining | SessionState::Syncing) {
                    self.transition(SessionState::Live);
                }
                vec![SessionAction::StatusChanged]
            },
            TransportEvent::PeerLeft { peer } => {
                if !self.peers.left(peer) {
                    tracing::debug!(room = %self.room, %peer, "leave from unknown peer");
                    return Vec::new();
                }
                tracing::info!(room = %self.room, %peer, peers = self.peers.count(), "peer left");
                vec![SessionAction::StatusChanged]
            },
            TransportEvent::Received { from, channel, payload } => {
                self.handle_message(from, channel, &payload)
            },
        }
    }

    fn handle_message(
        &mut self,
        from: PeerId,
        channel: Channel,
        payload: &[u8],
    ) -> Vec<SessionAction> {
        let Some(document) = self.document.as_mut() else {
            return Vec::new();
        };

        match channel {
            Channel::RequestFull => {
                // Answered even when empty: the reply is also a liveness signal.
                let snapshot = document.snapshot();
                tracing::debug!(%from, bytes = snapshot.len(), "answering full-state request");
                if self.config.targeted_send {
                    vec![SessionAction::SendTo {
                        peer: from,
                        channel: Channel::FullState,
                        payload: snapshot,
                    }]
                } else {
                    vec![SessionAction::Broadcast { channel: Channel::FullState, payload: snapshot }]
                }
            },
            Channel::FullState | Channel::Update => match document.merge(payload) {
                Ok(Some(update)) => {
                    debug_assert_eq!(update.origin, Origin::Remote);
                    vec![SessionAction::DocumentChanged]
                },
                Ok(None) => Vec::new(),
                Err(error) => {
                    tracing::warn!(%from, %channel, %error, "dropping malformed payload");
                    Vec::new()
                },
            },
        }
    }

    fn handle_leave(&mut self) -> Vec<SessionAction> {
        match self.state {
            SessionState::Closed => return Vec::new(),
            SessionState::Idle => {
                self.transition(SessionState::Closed);
                return Vec::new();
            },
            SessionState::Joining | SessionState::Syncing | SessionState::Live => {},
        }

        let mut actions = Vec::new();
        while let Some(subscription) = self.subscriptions.pop() {
            match subscription {
                Subscription::RequestFullTimer => self.request_full_at = None,
                Subscription::Channel(channel) => {
                    actions.push(SessionAction::Unsubscribe { channel });
                },
                Subscription::DocumentUpdates => {
                    if let Some(document) = self.document.as_mut() {
                        document.detach_listener();
                    }
                },
            }
        }
        self.request_full_at = None;

        actions.push(SessionAction::LeaveRoom { room: self.room.clone() });
        self.document = None;
        self.peers.clear();

        tracing::info!(room = %self.room, "left room");
        self.transition(SessionState::Closed);
        actions.push(SessionAction::StatusChanged);
        actions
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(room = %self.room, from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }
}
