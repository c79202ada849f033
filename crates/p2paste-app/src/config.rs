//! Lifecycle configuration.

use std::time::Duration;

use p2paste_core::{DEFAULT_ROOM_PREFIX, SessionConfig};

/// Public rendezvous endpoints handed to the transport when a room opens.
pub const DEFAULT_SIGNALING: [&str; 3] = [
    "wss://signaling.yjs.dev",
    "wss://y-webrtc-signaling-eu.herokuapp.com",
    "wss://y-webrtc-signaling-us.herokuapp.com",
];

/// Extra start delay used by [`LifecycleConfig::development`].
///
/// Long enough to cover a component mounting, unmounting and mounting again
/// in one burst.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Configuration for a [`crate::Lifecycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Settings for every session this lifecycle starts.
    pub session: SessionConfig,

    /// Prefix for transport room identifiers.
    pub room_prefix: String,

    /// Minimum time between a mount and the session start. `None` starts as
    /// soon as the host reports idle.
    pub settle_delay: Option<Duration>,

    /// Rendezvous endpoints for the transport.
    pub signaling: Vec<String>,
}

impl LifecycleConfig {
    /// Production settings plus [`DEFAULT_SETTLE_DELAY`] to absorb double
    /// mounts.
    pub fn development() -> Self {
        Self { settle_delay: Some(DEFAULT_SETTLE_DELAY), ..Self::default() }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            room_prefix: DEFAULT_ROOM_PREFIX.to_string(),
            settle_delay: None,
            signaling: DEFAULT_SIGNALING.iter().map(ToString::to_string).collect(),
        }
    }
}
