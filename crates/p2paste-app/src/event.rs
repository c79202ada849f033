//! Lifecycle inputs.

use std::fmt;

use p2paste_core::{Slug, TransportEvent};

/// Identifies one idle-callback request.
///
/// Every mount issues a fresh ticket. A callback carrying an older ticket
/// belongs to a start that has since been cancelled and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StartTicket(pub u64);

impl fmt::Display for StartTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events the host page feeds into the lifecycle.
///
/// Generic over `I` (Instant type) to support both production and simulated
/// clocks.
#[derive(Debug, Clone)]
pub enum LifecycleEvent<I = std::time::Instant> {
    /// The room view mounted for `slug`.
    Mount {
        /// Room to show.
        slug: Slug,
        /// Current time.
        now: I,
    },

    /// The host granted an idle slot requested with `ticket`.
    HostIdle {
        /// Ticket from the matching [`crate::LifecycleAction::RequestIdle`].
        ticket: StartTicket,
        /// Current time.
        now: I,
    },

    /// Time passed.
    Tick {
        /// Current time.
        now: I,
    },

    /// The user changed the text control to `text`.
    Input {
        /// Full contents of the control.
        text: String,
    },

    /// Notification from the peer transport.
    Transport(TransportEvent),

    /// The tab was hidden or is being closed.
    PageHide,

    /// The room view unmounted.
    Unmount,
}
