//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::BTreeMap;

use p2paste_app::ConnectionStatus;
use p2paste_core::RoomId;

use super::{ClusterSnapshot, Invariant, InvariantResult, PeerSnapshot, Violation};

/// Participants of a quiet room show the same text.
///
/// Once every update has been delivered, all joined sessions of a room must
/// hold identical documents, and every text control must show its document.
pub struct TextConvergence;

impl Invariant for TextConvergence {
    fn name(&self) -> &'static str {
        "text_convergence"
    }

    fn check(&self, state: &ClusterSnapshot) -> InvariantResult {
        if !state.quiescent {
            return Ok(());
        }

        let mut by_room: BTreeMap<&RoomId, &PeerSnapshot> = BTreeMap::new();
        for peer in state.active() {
            if peer.shown != peer.document {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "peer {}: control shows {:?}, document holds {:?}",
                        peer.id, peer.shown, peer.document
                    ),
                });
            }

            let Some(room) = &peer.room else { continue };
            match by_room.get(room) {
                Some(first) if first.document != peer.document => {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "room {room}: peer {} has {:?}, peer {} has {:?}",
                            first.id, first.document, peer.id, peer.document
                        ),
                    });
                },
                Some(_) => {},
                None => {
                    by_room.insert(room, peer);
                },
            }
        }
        Ok(())
    }
}

/// Local peer counts match the room's membership.
///
/// Counting is local and eventually consistent, so this only holds once all
/// join and leave notices have been delivered.
pub struct PeerCountMatchesRoom;

impl Invariant for PeerCountMatchesRoom {
    fn name(&self) -> &'static str {
        "peer_count_matches_room"
    }

    fn check(&self, state: &ClusterSnapshot) -> InvariantResult {
        if !state.quiescent {
            return Ok(());
        }

        for peer in state.active() {
            let Some(room) = &peer.room else { continue };
            let members = state.members.get(room).copied().unwrap_or(0);
            let expected = members.saturating_sub(1);
            if peer.peer_count != expected {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "peer {} in {room}: counts {} peers, room has {members} members",
                        peer.id, peer.peer_count
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The badge reads Connected exactly when another participant is known.
///
/// Holds at every step, not just when quiet.
pub struct ConnectedIffPeers;

impl Invariant for ConnectedIffPeers {
    fn name(&self) -> &'static str {
        "connected_iff_peers"
    }

    fn check(&self, state: &ClusterSnapshot) -> InvariantResult {
        for peer in &state.peers {
            let expected = match peer.state {
                Some(session) if session.is_joined() => {
                    if peer.peer_count > 0 {
                        ConnectionStatus::Connected
                    } else {
                        ConnectionStatus::Connecting
                    }
                },
                _ if peer.room.is_some() => ConnectionStatus::Connecting,
                _ => ConnectionStatus::Offline,
            };
            if peer.status != expected {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "peer {}: badge {:?} with {} peers, expected {expected:?}",
                        peer.id, peer.status, peer.peer_count
                    ),
                });
            }
        }
        Ok(())
    }
}
