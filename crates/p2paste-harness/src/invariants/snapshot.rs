//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a simulated room at a point in
//! time. Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::BTreeMap;

use p2paste_app::ConnectionStatus;
use p2paste_core::{PeerId, RoomId, SessionState};

/// Snapshot of every simulated participant.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    /// Per-participant state.
    pub peers: Vec<PeerSnapshot>,
    /// Transport membership per room, as the network sees it.
    pub members: BTreeMap<RoomId, usize>,
    /// No traffic in flight and no timer or start outstanding.
    pub quiescent: bool,
}

impl ClusterSnapshot {
    /// Create an empty snapshot (no participants).
    pub fn empty() -> Self {
        Self { quiescent: true, ..Self::default() }
    }

    /// Add a participant snapshot.
    pub fn add_peer(&mut self, peer: PeerSnapshot) {
        self.peers.push(peer);
    }

    /// Participants with a running session.
    pub fn active(&self) -> impl Iterator<Item = &PeerSnapshot> {
        self.peers.iter().filter(|peer| peer.state.is_some_and(SessionState::is_joined))
    }
}

/// Snapshot of a single participant's observable state.
#[derive(Debug, Clone)]
pub struct PeerSnapshot {
    /// Transport identity.
    pub id: PeerId,
    /// Room being started or running.
    pub room: Option<RoomId>,
    /// Session state. `None` while no session exists.
    pub state: Option<SessionState>,
    /// Contents of the shared document.
    pub document: String,
    /// Contents of the text control.
    pub shown: String,
    /// Remote peers the session believes are connected.
    pub peer_count: usize,
    /// Badge shown to the user.
    pub status: ConnectionStatus,
}

impl PeerSnapshot {
    /// Participant with nothing mounted.
    pub fn idle(id: PeerId) -> Self {
        Self {
            id,
            room: None,
            state: None,
            document: String::new(),
            shown: String::new(),
            peer_count: 0,
            status: ConnectionStatus::Offline,
        }
    }
}
