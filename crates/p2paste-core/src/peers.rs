//! Local peer accounting.
//!
//! Each participant keeps its own set of remote peers from the transport's
//! join/leave notifications. There is no global agreement on the number; two
//! participants may briefly disagree.

use std::{collections::BTreeSet, fmt};

/// Transport-assigned identifier of a remote participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{:x}", self.0)
    }
}

/// Remote peers currently believed connected.
///
/// Keyed by peer identity, so a re-announced join counts once and a leave
/// for a peer never seen is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerSet {
    peers: BTreeSet<PeerId>,
}

impl PeerSet {
    /// Empty peer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join notification. Returns whether `peer` was new.
    pub fn joined(&mut self, peer: PeerId) -> bool {
        self.peers.insert(peer)
    }

    /// Record a leave notification. Returns whether `peer` was known.
    pub fn left(&mut self, peer: PeerId) -> bool {
        self.peers.remove(&peer)
    }

    /// Whether `peer` is currently believed connected.
    pub fn contains(&self, peer: PeerId) -> bool {
        self.peers.contains(&peer)
    }

    /// Remote peers currently believed connected.
    pub fn count(&self) -> usize {
        self.peers.len()
    }

    /// Participants to display, including ourselves.
    pub fn participants(&self) -> usize {
        self.count() + 1
    }

    /// Whether at least one remote peer is connected.
    pub fn is_connected(&self) -> bool {
        !self.peers.is_empty()
    }

    /// Connected peers in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.peers.iter().copied()
    }

    /// Forget all peers.
    pub fn clear(&mut self) {
        self.peers.clear();
    }
}
