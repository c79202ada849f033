//! Fuzz target for the RoomSession state machine
//!
//! # Strategy
//!
//! Arbitrary interleavings of joins, ticks, local edits, peer notices and
//! raw payloads on every channel, including garbage.
//!
//! # Invariants
//!
//! - The session never panics
//! - Peer count never underflows and Connected means a peer is known
//! - After Leave nothing is subscribed and the state is Closed

#![no_main]

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use p2paste_core::{
    AutomergeReplica, Channel, PeerId, RoomId, RoomSession, SessionConfig, SessionEvent,
    SessionState, Slug, TextEdit, TransportEvent, env::Environment,
};

#[derive(Clone, Default)]
struct FuzzEnv(Arc<AtomicU64>);

impl Environment for FuzzEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let next = self.0.fetch_add(1, Ordering::Relaxed);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = next.to_be_bytes()[i % 8] ^ (i as u8);
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Join,
    Tick { millis: u16 },
    Insert { index: u8, text: String },
    Delete { index: u8, count: u8 },
    PeerJoined { peer: u8 },
    PeerLeft { peer: u8 },
    Received { from: u8, channel: u8, payload: Vec<u8> },
    Leave,
}

fuzz_target!(|ops: Vec<Op>| {
    let slug = Slug::parse("blue-otter-degk").expect("fixed slug is valid");
    let mut session = RoomSession::<FuzzEnv, AutomergeReplica>::new(
        FuzzEnv::default(),
        RoomId::for_slug(&slug),
        SessionConfig::default(),
    );
    let mut now = Duration::ZERO;

    for op in ops {
        let event = match op {
            Op::Join => SessionEvent::Join { now },
            Op::Tick { millis } => {
                now += Duration::from_millis(u64::from(millis));
                SessionEvent::Tick { now }
            },
            Op::Insert { index, text } => SessionEvent::Edit(TextEdit::insert(index.into(), text)),
            Op::Delete { index, count } => {
                SessionEvent::Edit(TextEdit::delete(index.into(), count.into()))
            },
            Op::PeerJoined { peer } => {
                SessionEvent::Transport(TransportEvent::PeerJoined { peer: PeerId(peer.into()) })
            },
            Op::PeerLeft { peer } => {
                SessionEvent::Transport(TransportEvent::PeerLeft { peer: PeerId(peer.into()) })
            },
            Op::Received { from, channel, payload } => {
                let Some(channel) = Channel::from_u8(channel % 4) else { continue };
                SessionEvent::Transport(TransportEvent::Received {
                    from: PeerId(from.into()),
                    channel,
                    payload: Bytes::from(payload),
                })
            },
            Op::Leave => SessionEvent::Leave,
        };

        let _ = session.handle(event);
        assert_eq!(session.is_connected(), session.peer_count() > 0);
    }

    let _ = session.handle(SessionEvent::Leave);
    assert_eq!(session.subscription_count(), 0);
    assert_eq!(session.state(), SessionState::Closed);
});
