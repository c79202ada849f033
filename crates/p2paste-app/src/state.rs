//! Observable room state for rendering.

use p2paste_core::{PeerSet, RoomId, Slug};

/// Connection badge shown next to the room name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No session running.
    Offline,
    /// Session running, no peer seen.
    Connecting,
    /// At least one peer connected.
    Connected,
}

impl ConnectionStatus {
    /// Status for a running session with `peers`.
    ///
    /// Connected means "another participant is reachable", not "the
    /// rendezvous server answered".
    pub fn for_peers(peers: &PeerSet) -> Self {
        if peers.is_connected() { Self::Connected } else { Self::Connecting }
    }

    /// Label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Self::Offline => "Offline",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
        }
    }
}

/// Everything needed to draw the room page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    /// Slug in the address bar, once mounted.
    pub slug: Option<Slug>,
    /// Transport room, once mounted.
    pub room: Option<RoomId>,
    /// Connection badge.
    pub status: ConnectionStatus,
    /// Participants including ourselves.
    pub participants: usize,
    /// Text shown in the control.
    pub text: String,
}

impl RoomView {
    /// Nothing mounted.
    pub fn empty() -> Self {
        Self {
            slug: None,
            room: None,
            status: ConnectionStatus::Offline,
            participants: 1,
            text: String::new(),
        }
    }

    /// One-line status summary.
    pub fn status_line(&self) -> String {
        format!("{} | Peers: {}", self.status.label(), self.participants)
    }
}

impl Default for RoomView {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use p2paste_core::PeerId;

    use super::*;

    #[test]
    fn connected_only_with_peers() {
        let mut peers = PeerSet::new();
        assert_eq!(ConnectionStatus::for_peers(&peers), ConnectionStatus::Connecting);

        peers.joined(PeerId(4));
        assert_eq!(ConnectionStatus::for_peers(&peers), ConnectionStatus::Connected);
    }

    #[test]
    fn status_line_counts_self() {
        let view = RoomView::empty();
        assert_eq!(view.status_line(), "Offline | Peers: 1");
    }
}
