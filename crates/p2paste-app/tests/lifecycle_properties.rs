//! Property-based tests for the Lifecycle state machine.
//!
//! Tests verify that invariants hold under arbitrary page-lifecycle event
//! sequences:
//! - At most one room is open at any time
//! - Every opened room is left, and its rendezvous sockets closed, exactly once
//! - Teardown always returns to `Inactive`

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use p2paste_app::{
    Lifecycle, LifecycleAction, LifecycleConfig, LifecycleEvent, Phase, StartTicket,
    TransportCommand,
};
use p2paste_core::{AutomergeReplica, PeerId, Slug, TransportEvent, env::Environment};
use proptest::prelude::*;

#[derive(Clone, Default)]
struct TestEnv(Arc<AtomicU64>);

impl Environment for TestEnv {
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

const SLUGS: [&str; 3] = ["blue-otter-degk", "otter-blue-vubo", "golden-fox-cewu"];

#[derive(Debug, Clone)]
enum Step {
    Mount(usize),
    Idle { latest: bool },
    Advance(u64),
    Input(String),
    PeerJoined,
    PeerLeft,
    PageHide,
    Unmount,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..SLUGS.len()).prop_map(Step::Mount),
        3 => any::<bool>().prop_map(|latest| Step::Idle { latest }),
        2 => (0u64..400).prop_map(Step::Advance),
        2 => "[a-z ]{0,8}".prop_map(Step::Input),
        1 => Just(Step::PeerJoined),
        1 => Just(Step::PeerLeft),
        1 => Just(Step::PageHide),
        1 => Just(Step::Unmount),
    ]
}

/// Count of rooms opened minus rooms left, with close-signaling checks.
#[derive(Default)]
struct Ledger {
    open_rooms: usize,
    open_signaling: usize,
    tickets: Vec<StartTicket>,
}

impl Ledger {
    fn record(&mut self, actions: &[LifecycleAction]) -> Result<(), TestCaseError> {
        for action in actions {
            match action {
                LifecycleAction::RequestIdle { ticket } => self.tickets.push(*ticket),
                LifecycleAction::Transport(TransportCommand::OpenRoom { .. }) => {
                    self.open_rooms += 1;
                    self.open_signaling += 1;
                },
                LifecycleAction::Transport(TransportCommand::LeaveRoom { .. }) => {
                    prop_assert!(self.open_rooms > 0, "left a room that was never opened");
                    self.open_rooms -= 1;
                },
                LifecycleAction::Transport(TransportCommand::CloseSignaling { .. }) => {
                    prop_assert!(self.open_signaling > 0, "closed signaling twice");
                    self.open_signaling -= 1;
                },
                LifecycleAction::Transport(_) | LifecycleAction::Render => {},
            }
        }
        prop_assert!(self.open_rooms <= 1, "more than one room open");
        Ok(())
    }
}

fn run(config: LifecycleConfig, steps: Vec<Step>) -> Result<(), TestCaseError> {
    let mut lifecycle: Lifecycle<TestEnv, AutomergeReplica> =
        Lifecycle::new(TestEnv::default(), config);
    let mut ledger = Ledger::default();
    let mut now = Duration::ZERO;

    for step in steps {
        let event = match step {
            Step::Mount(i) => LifecycleEvent::Mount { slug: Slug::parse(SLUGS[i]).unwrap(), now },
            Step::Idle { latest } => {
                let ticket = if latest { ledger.tickets.last() } else { ledger.tickets.first() };
                let Some(&ticket) = ticket else { continue };
                LifecycleEvent::HostIdle { ticket, now }
            },
            Step::Advance(ms) => {
                now += Duration::from_millis(ms);
                LifecycleEvent::Tick { now }
            },
            Step::Input(text) => LifecycleEvent::Input { text },
            Step::PeerJoined => {
                LifecycleEvent::Transport(TransportEvent::PeerJoined { peer: PeerId(1) })
            },
            Step::PeerLeft => LifecycleEvent::Transport(TransportEvent::PeerLeft { peer: PeerId(1) }),
            Step::PageHide => LifecycleEvent::PageHide,
            Step::Unmount => LifecycleEvent::Unmount,
        };

        if let Ok(actions) = lifecycle.handle(event) {
            ledger.record(&actions)?;
        }
        prop_assert_eq!(ledger.open_rooms, usize::from(lifecycle.is_active()));
    }

    let actions = lifecycle.handle(LifecycleEvent::Unmount).unwrap();
    ledger.record(&actions)?;

    prop_assert!(matches!(lifecycle.phase(), Phase::Inactive));
    prop_assert_eq!(ledger.open_rooms, 0);
    prop_assert_eq!(ledger.open_signaling, 0);

    let again = lifecycle.handle(LifecycleEvent::Unmount).unwrap();
    prop_assert!(again.is_empty());
    Ok(())
}

proptest! {
    #[test]
    fn prop_lifecycle_never_leaks_rooms(steps in prop::collection::vec(step_strategy(), 0..60)) {
        run(LifecycleConfig::default(), steps)?;
    }

    #[test]
    fn prop_development_lifecycle_never_leaks_rooms(
        steps in prop::collection::vec(step_strategy(), 0..60),
    ) {
        run(LifecycleConfig::development(), steps)?;
    }
}
