//! In-memory rendezvous network with chaos injection.
//!
//! Stands in for the peer transport: peers join rooms by identifier, receive
//! join/leave notices for the other members, and exchange channel messages.
//! Messages travel as encoded [`Frame`]s so the receiving side exercises the
//! same decoding path as a real multiplexed peer link.
//!
//! Chaos never loses a message. It duplicates, reorders, and injects
//! corrupted extra copies, which is exactly the delivery model the session
//! protocol must tolerate without a retransmission layer.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use p2paste_core::{Channel, PeerId, RoomId, TransportEvent};
use p2paste_proto::{Frame, ProtocolError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Delivery faults to inject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chaos {
    /// Probability a message is delivered twice.
    pub duplicate: f64,
    /// Probability a message is queued at a random position instead of the
    /// back of the inbox.
    pub reorder: f64,
    /// Probability a corrupted copy is delivered alongside the message.
    pub corrupt: f64,
}

impl Chaos {
    /// Perfect in-order delivery.
    pub const NONE: Self = Self { duplicate: 0.0, reorder: 0.0, corrupt: 0.0 };

    /// Fault rates used by the chaos tests.
    pub const fn heavy() -> Self {
        Self { duplicate: 0.3, reorder: 0.5, corrupt: 0.2 }
    }
}

impl Default for Chaos {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone)]
enum Delivery {
    Notice(TransportEvent),
    Frame { from: PeerId, bytes: Vec<u8> },
}

/// Counters for what the network did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    /// Frames handed to inboxes, including duplicates and corrupted copies.
    pub frames_delivered: usize,
    /// Frames dropped at the receiver because they failed to decode.
    pub frames_rejected: usize,
    /// Frames dropped because the receiver was not subscribed.
    pub frames_unsubscribed: usize,
}

struct NetworkState {
    rng: ChaCha8Rng,
    chaos: Chaos,
    next_peer: u64,
    rooms: BTreeMap<RoomId, BTreeSet<PeerId>>,
    membership: HashMap<PeerId, RoomId>,
    subscriptions: HashMap<PeerId, HashSet<Channel>>,
    inboxes: HashMap<PeerId, VecDeque<Delivery>>,
    signaling: HashMap<PeerId, Vec<String>>,
    stats: NetworkStats,
}

impl NetworkState {
    fn enqueue(&mut self, to: PeerId, delivery: Delivery) {
        let chaos = self.chaos;
        let mut copies = Vec::with_capacity(3);

        if let Delivery::Frame { from, bytes } = &delivery {
            // Flipping a magic byte guarantees the copy is rejected on decode.
            if self.rng.gen_bool(chaos.corrupt) && !bytes.is_empty() {
                let mut garbage = bytes.clone();
                let at = self.rng.gen_range(0..garbage.len().min(4));
                garbage[at] ^= 0xFF;
                copies.push(Delivery::Frame { from: *from, bytes: garbage });
            }
            if self.rng.gen_bool(chaos.duplicate) {
                copies.push(delivery.clone());
            }
        }
        copies.insert(0, delivery);

        for copy in copies {
            if matches!(copy, Delivery::Frame { .. }) {
                self.stats.frames_delivered += 1;
            }
            let reorder = matches!(copy, Delivery::Frame { .. }) && self.rng.gen_bool(chaos.reorder);
            let inbox = self.inboxes.entry(to).or_default();
            if reorder && !inbox.is_empty() {
                let at = self.rng.gen_range(0..=inbox.len());
                inbox.insert(at, copy);
            } else {
                inbox.push_back(copy);
            }
        }
    }

    fn room_of(&self, peer: PeerId) -> Option<RoomId> {
        self.membership.get(&peer).cloned()
    }

    fn others(&self, peer: PeerId) -> Vec<PeerId> {
        self.room_of(peer)
            .and_then(|room| self.rooms.get(&room))
            .map(|members| members.iter().copied().filter(|p| *p != peer).collect())
            .unwrap_or_default()
    }
}

/// Shared handle to a simulated rendezvous network.
#[derive(Clone)]
pub struct SimNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl SimNetwork {
    /// Network with perfect delivery.
    pub fn new(seed: u64) -> Self {
        Self::with_chaos(seed, Chaos::NONE)
    }

    /// Network injecting `chaos`, with faults drawn from `seed`.
    pub fn with_chaos(seed: u64, chaos: Chaos) -> Self {
        let state = NetworkState {
            rng: ChaCha8Rng::seed_from_u64(seed),
            chaos,
            next_peer: 0,
            rooms: BTreeMap::new(),
            membership: HashMap::new(),
            subscriptions: HashMap::new(),
            inboxes: HashMap::new(),
            signaling: HashMap::new(),
            stats: NetworkStats::default(),
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate an identifier for a new participant.
    pub fn register(&self) -> PeerId {
        let mut state = self.lock();
        state.next_peer += 1;
        PeerId(state.next_peer)
    }

    /// Join `room`, announcing `peer` to current members and them to `peer`.
    ///
    /// A peer is in at most one room; joining another leaves the first.
    pub fn join(&self, peer: PeerId, room: RoomId, signaling: Vec<String>) {
        self.leave(peer);

        let mut state = self.lock();
        let members: Vec<PeerId> =
            state.rooms.get(&room).map(|m| m.iter().copied().collect()).unwrap_or_default();

        for member in &members {
            state.enqueue(*member, Delivery::Notice(TransportEvent::PeerJoined { peer }));
            state.enqueue(peer, Delivery::Notice(TransportEvent::PeerJoined { peer: *member }));
        }

        tracing::debug!(%peer, %room, members = members.len(), "sim peer joined");
        state.rooms.entry(room.clone()).or_default().insert(peer);
        state.membership.insert(peer, room);
        state.signaling.insert(peer, signaling);
    }

    /// Leave the current room, if any, announcing it to remaining members.
    pub fn leave(&self, peer: PeerId) {
        let mut state = self.lock();
        let Some(room) = state.membership.remove(&peer) else {
            return;
        };

        let remaining: Vec<PeerId> = match state.rooms.get_mut(&room) {
            Some(members) => {
                members.remove(&peer);
                members.iter().copied().collect()
            },
            None => Vec::new(),
        };
        if remaining.is_empty() {
            state.rooms.remove(&room);
        }

        for member in remaining {
            state.enqueue(member, Delivery::Notice(TransportEvent::PeerLeft { peer }));
        }
        state.subscriptions.remove(&peer);
        state.inboxes.remove(&peer);
        tracing::debug!(%peer, %room, "sim peer left");
    }

    /// Drop the rendezvous endpoints `peer` registered.
    pub fn close_signaling(&self, peer: PeerId) {
        self.lock().signaling.remove(&peer);
    }

    /// Whether `peer` still holds rendezvous endpoints.
    pub fn has_signaling(&self, peer: PeerId) -> bool {
        self.lock().signaling.contains_key(&peer)
    }

    /// Start delivering `channel` to `peer`.
    pub fn subscribe(&self, peer: PeerId, channel: Channel) {
        self.lock().subscriptions.entry(peer).or_default().insert(channel);
    }

    /// Stop delivering `channel` to `peer`.
    pub fn unsubscribe(&self, peer: PeerId, channel: Channel) {
        if let Some(channels) = self.lock().subscriptions.get_mut(&peer) {
            channels.remove(&channel);
        }
    }

    /// Send to every other member of the sender's room.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::PayloadTooLarge` if the payload cannot be
    /// framed.
    pub fn broadcast(
        &self,
        from: PeerId,
        channel: Channel,
        payload: Bytes,
    ) -> Result<(), ProtocolError> {
        let bytes = Frame::broadcast(channel, payload).to_vec()?;
        let mut state = self.lock();
        for to in state.others(from) {
            state.enqueue(to, Delivery::Frame { from, bytes: bytes.clone() });
        }
        Ok(())
    }

    /// Send to one member of the sender's room. Silently dropped if the
    /// recipient is elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::PayloadTooLarge` if the payload cannot be
    /// framed.
    pub fn send_to(
        &self,
        from: PeerId,
        to: PeerId,
        channel: Channel,
        payload: Bytes,
    ) -> Result<(), ProtocolError> {
        let bytes = Frame::to_peer(channel, to.0, payload).to_vec()?;
        let mut state = self.lock();
        if state.others(from).contains(&to) {
            state.enqueue(to, Delivery::Frame { from, bytes });
        }
        Ok(())
    }

    /// Next transport event for `peer`.
    ///
    /// Frames that fail to decode, are addressed to someone else, or arrive
    /// on an unsubscribed channel are dropped here.
    pub fn poll(&self, peer: PeerId) -> Option<TransportEvent> {
        let mut state = self.lock();
        loop {
            let delivery = state.inboxes.get_mut(&peer)?.pop_front()?;
            let (from, bytes) = match delivery {
                Delivery::Notice(event) => return Some(event),
                Delivery::Frame { from, bytes } => (from, bytes),
            };

            let frame = match Frame::decode(&bytes) {
                Ok(frame) => frame,
                Err(error) => {
                    tracing::warn!(%peer, %from, %error, "dropping undecodable frame");
                    state.stats.frames_rejected += 1;
                    continue;
                },
            };
            let Some(channel) = frame.channel() else {
                state.stats.frames_rejected += 1;
                continue;
            };
            if frame.header.target().is_some_and(|target| target != peer.0) {
                state.stats.frames_rejected += 1;
                continue;
            }
            let subscribed =
                state.subscriptions.get(&peer).is_some_and(|channels| channels.contains(&channel));
            if !subscribed {
                state.stats.frames_unsubscribed += 1;
                continue;
            }

            return Some(TransportEvent::Received { from, channel, payload: frame.payload });
        }
    }

    /// Whether `peer` has undelivered traffic.
    pub fn has_pending(&self, peer: PeerId) -> bool {
        self.lock().inboxes.get(&peer).is_some_and(|inbox| !inbox.is_empty())
    }

    /// Whether any inbox holds undelivered traffic.
    pub fn is_quiet(&self) -> bool {
        self.lock().inboxes.values().all(VecDeque::is_empty)
    }

    /// Members of `room`.
    pub fn members(&self, room: &RoomId) -> Vec<PeerId> {
        self.lock().rooms.get(room).map(|m| m.iter().copied().collect()).unwrap_or_default()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Delivery counters so far.
    pub fn stats(&self) -> NetworkStats {
        self.lock().stats
    }
}
