//! Session lifecycle state machine.
//!
//! Decides when a [`RoomSession`] runs relative to the hosting page. A mount
//! does not start networking immediately: the lifecycle first asks the host
//! for an idle slot and, when configured, waits out a settle delay that
//! absorbs components mounting twice in quick succession. Only then does it
//! create and join the session.
//!
//! ```text
//! Inactive ──mount──► Pending ──idle + settle──► Active
//!     ▲                  │                          │
//!     └──unmount/hide────┴──────unmount/hide────────┘
//! ```
//!
//! Teardown releases everything in a fixed order: pending start, channel
//! subscriptions, document listener, transport room, rendezvous sockets,
//! local handles. Afterwards the same room can be started again.

use p2paste_core::{
    Replica, RoomId, RoomSession, SessionAction, SessionEvent, SessionState, Slug,
    TransportEvent, env::Environment,
};

use crate::{
    action::{LifecycleAction, TransportCommand},
    binding::TextBinding,
    config::LifecycleConfig,
    error::LifecycleError,
    event::{LifecycleEvent, StartTicket},
    state::{ConnectionStatus, RoomView},
};

/// Start requested, waiting for the host.
#[derive(Debug, Clone)]
pub struct PendingStart<I> {
    slug: Slug,
    room: RoomId,
    ticket: StartTicket,
    host_ready: bool,
    not_before: Option<I>,
}

impl<I: Copy> PendingStart<I> {
    /// Room that will be joined.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Ticket of the outstanding idle request.
    pub fn ticket(&self) -> StartTicket {
        self.ticket
    }

    /// Whether the host has granted the idle slot.
    pub fn host_ready(&self) -> bool {
        self.host_ready
    }

    /// Earliest start time, when a settle delay applies.
    pub fn not_before(&self) -> Option<I> {
        self.not_before
    }
}

/// Live resources for one joined room.
pub struct SessionHandle<E: Environment, R: Replica> {
    slug: Slug,
    session: RoomSession<E, R>,
    binding: TextBinding,
    signaling_open: bool,
}

impl<E: Environment, R: Replica> SessionHandle<E, R> {
    /// The running session.
    pub fn session(&self) -> &RoomSession<E, R> {
        &self.session
    }

    /// Whether rendezvous sockets may still be open.
    pub fn signaling_open(&self) -> bool {
        self.signaling_open
    }
}

/// Where the lifecycle is.
pub enum Phase<E: Environment, R: Replica> {
    /// Nothing mounted or everything released.
    Inactive,
    /// Mounted, session not created yet.
    Pending(PendingStart<E::Instant>),
    /// Session created and joined.
    Active(SessionHandle<E, R>),
}

/// Starts and stops at most one room session per page view.
pub struct Lifecycle<E: Environment, R: Replica> {
    env: E,
    config: LifecycleConfig,
    phase: Phase<E, R>,
    next_ticket: u64,
}

impl<E: Environment, R: Replica> Lifecycle<E, R> {
    /// Lifecycle with nothing mounted.
    pub fn new(env: E, config: LifecycleConfig) -> Self {
        Self { env, config, phase: Phase::Inactive, next_ticket: 0 }
    }

    /// Configuration in use.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> &Phase<E, R> {
        &self.phase
    }

    /// Room being started or running.
    pub fn room(&self) -> Option<&RoomId> {
        match &self.phase {
            Phase::Inactive => None,
            Phase::Pending(pending) => Some(&pending.room),
            Phase::Active(handle) => Some(handle.session.room()),
        }
    }

    /// Whether a session is running.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active(_))
    }

    /// Whether a start or a session timer is outstanding.
    pub fn has_pending_work(&self) -> bool {
        match &self.phase {
            Phase::Inactive => false,
            Phase::Pending(_) => true,
            Phase::Active(handle) => handle.session.request_full_deadline().is_some(),
        }
    }

    /// Running session, if any.
    pub fn session(&self) -> Option<&RoomSession<E, R>> {
        match &self.phase {
            Phase::Active(handle) => Some(&handle.session),
            Phase::Inactive | Phase::Pending(_) => None,
        }
    }

    /// Snapshot of what the page should show.
    pub fn view(&self) -> RoomView {
        match &self.phase {
            Phase::Inactive => RoomView::empty(),
            Phase::Pending(pending) => RoomView {
                slug: Some(pending.slug.clone()),
                room: Some(pending.room.clone()),
                status: ConnectionStatus::Connecting,
                participants: 1,
                text: String::new(),
            },
            Phase::Active(handle) => {
                let peers = handle.session.peers();
                RoomView {
                    slug: Some(handle.slug.clone()),
                    room: Some(handle.session.room().clone()),
                    status: ConnectionStatus::for_peers(peers),
                    participants: peers.participants(),
                    text: handle.binding.shown().to_string(),
                }
            },
        }
    }

    /// Process an event and return resulting actions.
    ///
    /// Repeated mounts of the same room, stale idle callbacks and repeated
    /// teardown are no-ops.
    ///
    /// # Errors
    ///
    /// - `LifecycleError::NotActive` for input while no session runs
    /// - `LifecycleError::Session` if the session rejects an edit or join
    pub fn handle(
        &mut self,
        event: LifecycleEvent<E::Instant>,
    ) -> Result<Vec<LifecycleAction>, LifecycleError> {
        match event {
            LifecycleEvent::Mount { slug, now } => Ok(self.handle_mount(slug, now)),
            LifecycleEvent::HostIdle { ticket, now } => self.handle_host_idle(ticket, now),
            LifecycleEvent::Tick { now } => self.handle_tick(now),
            LifecycleEvent::Input { text } => self.handle_input(&text),
            LifecycleEvent::Transport(event) => self.handle_transport(event),
            LifecycleEvent::PageHide | LifecycleEvent::Unmount => Ok(self.teardown()),
        }
    }

    fn handle_mount(&mut self, slug: Slug, now: E::Instant) -> Vec<LifecycleAction> {
        let room = RoomId::new(&self.config.room_prefix, &slug);
        if self.room() == Some(&room) {
            tracing::debug!(%room, "already started, ignoring mount");
            return Vec::new();
        }

        let mut actions = self.teardown();

        self.next_ticket += 1;
        let ticket = StartTicket(self.next_ticket);
        let not_before = self.config.settle_delay.map(|delay| now + delay);

        tracing::debug!(%room, %ticket, "start requested");
        self.phase =
            Phase::Pending(PendingStart { slug, room, ticket, host_ready: false, not_before });

        actions.push(LifecycleAction::RequestIdle { ticket });
        actions.push(LifecycleAction::Render);
        actions
    }

    fn handle_host_idle(
        &mut self,
        ticket: StartTicket,
        now: E::Instant,
    ) -> Result<Vec<LifecycleAction>, LifecycleError> {
        match &mut self.phase {
            Phase::Pending(pending) if pending.ticket == ticket => pending.host_ready = true,
            _ => {
                tracing::debug!(%ticket, "stale idle callback");
                return Ok(Vec::new());
            },
        }
        self.try_start(now)
    }

    fn handle_tick(&mut self, now: E::Instant) -> Result<Vec<LifecycleAction>, LifecycleError> {
        match &mut self.phase {
            Phase::Inactive => Ok(Vec::new()),
            Phase::Pending(_) => self.try_start(now),
            Phase::Active(handle) => {
                let actions = handle.session.handle(SessionEvent::Tick { now })?;
                Ok(self.translate(actions))
            },
        }
    }

    fn handle_input(&mut self, text: &str) -> Result<Vec<LifecycleAction>, LifecycleError> {
        let Phase::Active(handle) = &mut self.phase else {
            return Err(LifecycleError::NotActive { operation: "input" });
        };

        let Some(edit) = handle.binding.input(text) else {
            return Ok(Vec::new());
        };

        match handle.session.handle(SessionEvent::Edit(edit)) {
            Ok(actions) => Ok(self.translate(actions)),
            Err(error) => {
                // The control and the document disagree; show the document.
                let text = handle.session.text();
                handle.binding.refresh(text);
                Err(error.into())
            },
        }
    }

    fn handle_transport(
        &mut self,
        event: TransportEvent,
    ) -> Result<Vec<LifecycleAction>, LifecycleError> {
        let Phase::Active(handle) = &mut self.phase else {
            tracing::debug!(?event, "no active session, dropping transport event");
            return Ok(Vec::new());
        };

        let actions = handle.session.handle(SessionEvent::Transport(event))?;
        Ok(self.translate(actions))
    }

    fn try_start(&mut self, now: E::Instant) -> Result<Vec<LifecycleAction>, LifecycleError> {
        let Phase::Pending(pending) = &self.phase else {
            return Ok(Vec::new());
        };
        if !pending.host_ready || pending.not_before.is_some_and(|at| now < at) {
            return Ok(Vec::new());
        }

        let Phase::Pending(pending) = std::mem::replace(&mut self.phase, Phase::Inactive) else {
            return Ok(Vec::new());
        };

        let mut session =
            RoomSession::new(self.env.clone(), pending.room, self.config.session.clone());
        let actions = session.handle(SessionEvent::Join { now })?;

        tracing::info!(room = %session.room(), "session started");
        self.phase = Phase::Active(SessionHandle {
            slug: pending.slug,
            session,
            binding: TextBinding::new(),
            signaling_open: false,
        });

        Ok(self.translate(actions))
    }

    /// Release everything. Safe to call in any phase, any number of times.
    fn teardown(&mut self) -> Vec<LifecycleAction> {
        match std::mem::replace(&mut self.phase, Phase::Inactive) {
            Phase::Inactive => Vec::new(),
            Phase::Pending(pending) => {
                tracing::debug!(room = %pending.room, ticket = %pending.ticket, "start cancelled");
                vec![LifecycleAction::Render]
            },
            Phase::Active(mut handle) => {
                let room = handle.session.room().clone();
                let mut actions = Vec::new();

                match handle.session.handle(SessionEvent::Leave) {
                    Ok(session_actions) => {
                        for action in session_actions {
                            if let Some(command) = transport_command(action, &self.config) {
                                actions.push(LifecycleAction::Transport(command));
                            }
                        }
                    },
                    Err(error) => tracing::warn!(%room, %error, "session leave failed"),
                }
                debug_assert_eq!(handle.session.state(), SessionState::Closed);

                if handle.signaling_open {
                    actions.push(LifecycleAction::Transport(TransportCommand::CloseSignaling {
                        room: room.clone(),
                    }));
                }
                handle.binding.clear();

                tracing::info!(%room, "session stopped");
                actions.push(LifecycleAction::Render);
                actions
            },
        }
    }

    /// Map session actions onto lifecycle actions, refreshing the binding.
    fn translate(&mut self, actions: Vec<SessionAction>) -> Vec<LifecycleAction> {
        let Phase::Active(handle) = &mut self.phase else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(actions.len());
        let mut render = false;

        for action in actions {
            match action {
                SessionAction::DocumentChanged => {
                    render |= handle.binding.refresh(handle.session.text());
                },
                SessionAction::StatusChanged => render = true,
                SessionAction::OpenRoom { .. } => {
                    handle.signaling_open = true;
                    if let Some(command) = transport_command(action, &self.config) {
                        out.push(LifecycleAction::Transport(command));
                    }
                },
                other => {
                    if let Some(command) = transport_command(other, &self.config) {
                        out.push(LifecycleAction::Transport(command));
                    }
                },
            }
        }

        if render {
            out.push(LifecycleAction::Render);
        }
        out
    }
}

fn transport_command(action: SessionAction, config: &LifecycleConfig) -> Option<TransportCommand> {
    match action {
        SessionAction::OpenRoom { room } => {
            Some(TransportCommand::OpenRoom { room, signaling: config.signaling.clone() })
        },
        SessionAction::Subscribe { channel } => Some(TransportCommand::Subscribe { channel }),
        SessionAction::Unsubscribe { channel } => Some(TransportCommand::Unsubscribe { channel }),
        SessionAction::Broadcast { channel, payload } => {
            Some(TransportCommand::Broadcast { channel, payload })
        },
        SessionAction::SendTo { peer, channel, payload } => {
            Some(TransportCommand::SendTo { peer, channel, payload })
        },
        SessionAction::LeaveRoom { room } => Some(TransportCommand::LeaveRoom { room }),
        SessionAction::DocumentChanged | SessionAction::StatusChanged => None,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use bytes::Bytes;
    use p2paste_core::{AutomergeReplica, Channel, PeerId};

    use super::*;

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

    type TestLifecycle = Lifecycle<TestEnv, AutomergeReplica>;

    const T0: Duration = Duration::ZERO;

    fn slug(text: &str) -> Slug {
        Slug::parse(text).unwrap()
    }

    fn lifecycle(config: LifecycleConfig) -> TestLifecycle {
        Lifecycle::new(TestEnv::default(), config)
    }

    fn requested_ticket(actions: &[LifecycleAction]) -> StartTicket {
        actions
            .iter()
            .find_map(|a| match a {
                LifecycleAction::RequestIdle { ticket } => Some(*ticket),
                _ => None,
            })
            .unwrap()
    }

    fn commands(actions: &[LifecycleAction]) -> Vec<TransportCommand> {
        actions
            .iter()
            .filter_map(|a| match a {
                LifecycleAction::Transport(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn started(lifecycle: &mut TestLifecycle, slug_text: &str) -> Vec<LifecycleAction> {
        let mount = lifecycle.handle(LifecycleEvent::Mount { slug: slug(slug_text), now: T0 });
        let ticket = requested_ticket(&mount.unwrap());
        lifecycle.handle(LifecycleEvent::HostIdle { ticket, now: T0 }).unwrap()
    }

    #[test]
    fn mount_waits_for_idle() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());

        let actions =
            lifecycle.handle(LifecycleEvent::Mount { slug: slug("blue-otter-degk"), now: T0 });
        let actions = actions.unwrap();

        assert!(commands(&actions).is_empty(), "no networking before idle");
        assert!(matches!(lifecycle.phase(), Phase::Pending(_)));
        assert_eq!(lifecycle.view().status, ConnectionStatus::Connecting);

        let ticket = requested_ticket(&actions);
        let actions = lifecycle.handle(LifecycleEvent::HostIdle { ticket, now: T0 }).unwrap();

        let commands = commands(&actions);
        assert!(matches!(
            commands.first(),
            Some(TransportCommand::OpenRoom { room, signaling })
                if room.as_str() == "p2paste-blue-otter-degk" && signaling.len() == 3
        ));
        assert!(lifecycle.is_active());
    }

    #[test]
    fn settle_delay_holds_start_until_elapsed() {
        let mut lifecycle = lifecycle(LifecycleConfig::development());

        let mount = lifecycle
            .handle(LifecycleEvent::Mount { slug: slug("blue-otter-degk"), now: T0 })
            .unwrap();
        let ticket = requested_ticket(&mount);

        let early = lifecycle.handle(LifecycleEvent::HostIdle { ticket, now: T0 }).unwrap();
        assert!(early.is_empty());
        assert!(!lifecycle.is_active());

        let still_early =
            lifecycle.handle(LifecycleEvent::Tick { now: Duration::from_millis(50) }).unwrap();
        assert!(still_early.is_empty());

        let due =
            lifecycle.handle(LifecycleEvent::Tick { now: Duration::from_millis(100) }).unwrap();
        assert!(!commands(&due).is_empty());
        assert!(lifecycle.is_active());
    }

    #[test]
    fn double_mount_of_same_room_is_noop() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");

        let again = lifecycle
            .handle(LifecycleEvent::Mount { slug: slug("BLUE-otter-degk"), now: T0 })
            .unwrap();

        assert!(again.is_empty());
        assert!(lifecycle.is_active());
    }

    #[test]
    fn double_mount_while_pending_keeps_one_ticket() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        lifecycle.handle(LifecycleEvent::Mount { slug: slug("blue-otter-degk"), now: T0 }).unwrap();

        let again = lifecycle
            .handle(LifecycleEvent::Mount { slug: slug("blue-otter-degk"), now: T0 })
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn unmount_before_idle_cancels_start() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        let mount = lifecycle
            .handle(LifecycleEvent::Mount { slug: slug("blue-otter-degk"), now: T0 })
            .unwrap();
        let ticket = requested_ticket(&mount);

        let actions = lifecycle.handle(LifecycleEvent::Unmount).unwrap();
        assert!(commands(&actions).is_empty());

        let late = lifecycle.handle(LifecycleEvent::HostIdle { ticket, now: T0 }).unwrap();
        assert!(late.is_empty(), "cancelled start never resumes");
        assert!(!lifecycle.is_active());
    }

    #[test]
    fn teardown_releases_in_order() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");
        let room = lifecycle.room().cloned().unwrap();

        let actions = lifecycle.handle(LifecycleEvent::PageHide).unwrap();

        assert_eq!(commands(&actions), vec![
            TransportCommand::Unsubscribe { channel: Channel::RequestFull },
            TransportCommand::Unsubscribe { channel: Channel::FullState },
            TransportCommand::Unsubscribe { channel: Channel::Update },
            TransportCommand::LeaveRoom { room: room.clone() },
            TransportCommand::CloseSignaling { room },
        ]);
        assert!(matches!(lifecycle.phase(), Phase::Inactive));
        assert!(!lifecycle.has_pending_work());
    }

    #[test]
    fn teardown_twice_is_noop() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");

        lifecycle.handle(LifecycleEvent::PageHide).unwrap();
        let second = lifecycle.handle(LifecycleEvent::Unmount).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn same_room_can_start_again_after_teardown() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");
        lifecycle.handle(LifecycleEvent::PageHide).unwrap();

        let actions = started(&mut lifecycle, "blue-otter-degk");
        assert!(!commands(&actions).is_empty());
        assert!(lifecycle.is_active());
    }

    #[test]
    fn navigating_to_another_room_tears_down_first() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");
        let old_room = lifecycle.room().cloned().unwrap();

        let actions = lifecycle
            .handle(LifecycleEvent::Mount { slug: slug("otter-blue-vubo"), now: T0 })
            .unwrap();

        let commands = commands(&actions);
        assert!(commands.contains(&TransportCommand::LeaveRoom { room: old_room.clone() }));
        assert!(commands.contains(&TransportCommand::CloseSignaling { room: old_room }));
        let leave_at = commands.len();
        let idle_at = actions
            .iter()
            .position(|a| matches!(a, LifecycleAction::RequestIdle { .. }))
            .unwrap();
        assert!(idle_at >= leave_at, "old room released before the new start is requested");
        assert_eq!(lifecycle.room().map(RoomId::as_str), Some("p2paste-otter-blue-vubo"));
    }

    #[test]
    fn stale_ticket_from_previous_room_is_ignored() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        let first = lifecycle
            .handle(LifecycleEvent::Mount { slug: slug("blue-otter-degk"), now: T0 })
            .unwrap();
        let stale = requested_ticket(&first);

        lifecycle.handle(LifecycleEvent::Mount { slug: slug("otter-blue-vubo"), now: T0 }).unwrap();

        let actions = lifecycle.handle(LifecycleEvent::HostIdle { ticket: stale, now: T0 }).unwrap();
        assert!(actions.is_empty());
        assert!(!lifecycle.is_active());
    }

    #[test]
    fn input_flows_to_update_broadcast() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");

        let actions = lifecycle.handle(LifecycleEvent::Input { text: "hello".to_string() }).unwrap();

        assert!(commands(&actions).iter().any(|c| matches!(
            c,
            TransportCommand::Broadcast { channel: Channel::Update, .. }
        )));
        assert_eq!(lifecycle.view().text, "hello");
    }

    #[test]
    fn input_without_session_is_an_error() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        let result = lifecycle.handle(LifecycleEvent::Input { text: "x".to_string() });
        assert_eq!(result, Err(LifecycleError::NotActive { operation: "input" }));
    }

    #[test]
    fn peer_join_updates_view() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");
        assert_eq!(lifecycle.view().status, ConnectionStatus::Connecting);

        let actions = lifecycle
            .handle(LifecycleEvent::Transport(TransportEvent::PeerJoined { peer: PeerId(4) }))
            .unwrap();

        assert!(actions.contains(&LifecycleAction::Render));
        let view = lifecycle.view();
        assert_eq!(view.status, ConnectionStatus::Connected);
        assert_eq!(view.participants, 2);
    }

    #[test]
    fn request_full_reply_is_targeted() {
        let mut lifecycle = lifecycle(LifecycleConfig::default());
        started(&mut lifecycle, "blue-otter-degk");

        let actions = lifecycle
            .handle(LifecycleEvent::Transport(TransportEvent::Received {
                from: PeerId(4),
                channel: Channel::RequestFull,
                payload: Bytes::new(),
            }))
            .unwrap();

        assert!(matches!(
            commands(&actions).as_slice(),
            [TransportCommand::SendTo { peer: PeerId(4), channel: Channel::FullState, .. }]
        ));
    }
}
