//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` connects one [`p2paste_app::Runtime`] to a [`SimNetwork`] and a
//! [`SimEnv`] clock, so the same orchestration code that runs against a real
//! host page runs in deterministic tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use p2paste_app::{Driver, LifecycleEvent, RoomView, StartTicket, TransportCommand};
use p2paste_core::{PeerId, env::Environment};

use crate::{
    sim_env::{SimEnv, SimInstant},
    sim_network::SimNetwork,
};

/// Virtual time that passes on every poll with nothing to deliver.
pub const IDLE_STEP: Duration = Duration::from_millis(10);

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection.
///
/// This allows injection and inspection from outside the runtime.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<LifecycleEvent<SimInstant>>,
    views: Vec<RoomView>,
    idle_polls: usize,
    unmount_after_idle: Option<usize>,
    fail_sends: bool,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
#[derive(Clone)]
pub struct SimDriver {
    peer: PeerId,
    env: SimEnv,
    network: SimNetwork,
    state: Arc<Mutex<SharedState>>,
}

impl SimDriver {
    /// Driver for a newly registered participant of `network`.
    pub fn new(env: SimEnv, network: SimNetwork) -> Self {
        let peer = network.register();
        Self { peer, env, network, state: Arc::new(Mutex::new(SharedState::default())) }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Transport identity of this participant.
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Inject a host or user event for processing.
    pub fn inject_event(&self, event: LifecycleEvent<SimInstant>) {
        self.lock().pending_events.push_back(event);
    }

    /// Report `Unmount` once `polls` consecutive polls found nothing to do.
    pub fn unmount_after_idle(&self, polls: usize) {
        self.lock().unmount_after_idle = Some(polls);
    }

    /// Make every send fail, to exercise error handling.
    pub fn fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// Most recently rendered view.
    pub fn last_view(&self) -> Option<RoomView> {
        self.lock().views.last().cloned()
    }

    /// Every rendered view, oldest first.
    pub fn views(&self) -> Vec<RoomView> {
        self.lock().views.clone()
    }

    /// Number of renders so far.
    pub fn render_count(&self) -> usize {
        self.lock().views.len()
    }

    /// Whether the runtime stopped this driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn execute_now(&self, command: TransportCommand) -> Result<(), SimDriverError> {
        if self.lock().fail_sends
            && matches!(
                command,
                TransportCommand::Broadcast { .. } | TransportCommand::SendTo { .. }
            )
        {
            return Err(SimDriverError(format!("send refused: {command:?}")));
        }
        execute(&self.network, self.peer, command)
    }

    fn next_event(&self) -> Option<LifecycleEvent<SimInstant>> {
        let mut state = self.lock();
        if let Some(event) = state.pending_events.pop_front() {
            state.idle_polls = 0;
            return Some(event);
        }
        drop(state);

        if let Some(event) = self.network.poll(self.peer) {
            self.lock().idle_polls = 0;
            return Some(LifecycleEvent::Transport(event));
        }

        let mut state = self.lock();
        state.idle_polls += 1;
        if state.unmount_after_idle.is_some_and(|limit| state.idle_polls >= limit) {
            state.unmount_after_idle = None;
            return Some(LifecycleEvent::Unmount);
        }
        None
    }
}

/// Apply `command` to `network` on behalf of `peer`.
pub(crate) fn execute(
    network: &SimNetwork,
    peer: PeerId,
    command: TransportCommand,
) -> Result<(), SimDriverError> {
    match command {
        TransportCommand::OpenRoom { room, signaling } => network.join(peer, room, signaling),
        TransportCommand::Subscribe { channel } => network.subscribe(peer, channel),
        TransportCommand::Unsubscribe { channel } => network.unsubscribe(peer, channel),
        TransportCommand::Broadcast { channel, payload } => network
            .broadcast(peer, channel, payload)
            .map_err(|e| SimDriverError(e.to_string()))?,
        TransportCommand::SendTo { peer: to, channel, payload } => network
            .send_to(peer, to, channel, payload)
            .map_err(|e| SimDriverError(e.to_string()))?,
        TransportCommand::LeaveRoom { .. } => network.leave(peer),
        TransportCommand::CloseSignaling { .. } => network.close_signaling(peer),
    }
    Ok(())
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(&mut self) -> Result<Option<LifecycleEvent<SimInstant>>, Self::Error> {
        let event = self.next_event();
        if event.is_none() {
            self.env.advance(IDLE_STEP);
            // Let other simulated participants run.
            tokio::task::yield_now().await;
        }
        Ok(event)
    }

    async fn execute(&mut self, command: TransportCommand) -> Result<(), Self::Error> {
        self.execute_now(command)
    }

    /// The idle slot is granted before any input queued behind the mount.
    fn request_idle(&mut self, ticket: StartTicket) {
        let now = self.env.now();
        self.lock().pending_events.push_front(LifecycleEvent::HostIdle { ticket, now });
    }

    fn now(&self) -> SimInstant {
        self.env.now()
    }

    fn render(&mut self, view: &RoomView) -> Result<(), Self::Error> {
        self.lock().views.push(view.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
    }
}
