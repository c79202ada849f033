//! Simulated room of participants for convergence testing.
//!
//! Drives several [`Lifecycle`]s against one [`SimNetwork`] step by step,
//! without an async runtime. Every participant gets its idle slot as soon as
//! it asks, so tests control exactly when traffic is delivered and when the
//! clock moves.

use std::time::Duration;

use p2paste_app::{Lifecycle, LifecycleAction, LifecycleConfig, LifecycleEvent, StartTicket};
use p2paste_core::{PeerId, Replica, Slug, env::Environment};

use crate::{
    invariants::{ClusterSnapshot, PeerSnapshot},
    sim_driver,
    sim_env::{SimEnv, SimInstant},
    sim_network::{Chaos, SimNetwork},
};

/// Clock advance per settle round.
pub const SETTLE_STEP: Duration = Duration::from_millis(50);

/// One simulated participant.
pub struct SimPeer<R: Replica> {
    id: PeerId,
    lifecycle: Lifecycle<SimEnv, R>,
    idle_requests: Vec<StartTicket>,
    renders: usize,
}

impl<R: Replica> SimPeer<R> {
    /// Transport identity.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Lifecycle of this participant.
    pub fn lifecycle(&self) -> &Lifecycle<SimEnv, R> {
        &self.lifecycle
    }

    /// Number of render requests so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    fn snapshot(&self) -> PeerSnapshot {
        let view = self.lifecycle.view();
        let mut snapshot = PeerSnapshot::idle(self.id);
        snapshot.room = self.lifecycle.room().cloned();
        snapshot.status = view.status;
        snapshot.shown = view.text;
        if let Some(session) = self.lifecycle.session() {
            snapshot.state = Some(session.state());
            snapshot.document = session.text();
            snapshot.peer_count = session.peer_count();
        }
        snapshot
    }
}

/// Simulated participants sharing one network and one clock.
pub struct SimCluster<R: Replica> {
    env: SimEnv,
    network: SimNetwork,
    config: LifecycleConfig,
    peers: Vec<SimPeer<R>>,
}

impl<R: Replica> SimCluster<R> {
    /// Empty cluster with perfect delivery.
    pub fn new(seed: u64) -> Self {
        Self::with_chaos(seed, Chaos::NONE)
    }

    /// Empty cluster whose network injects `chaos`.
    pub fn with_chaos(seed: u64, chaos: Chaos) -> Self {
        Self {
            env: SimEnv::with_seed(seed),
            network: SimNetwork::with_chaos(seed.wrapping_add(1), chaos),
            config: LifecycleConfig::default(),
            peers: Vec::new(),
        }
    }

    /// Use `config` for participants added from now on.
    #[must_use]
    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Shared network.
    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    /// Add a participant with nothing mounted. Returns its index.
    pub fn add_peer(&mut self) -> usize {
        let id = self.network.register();
        self.peers.push(SimPeer {
            id,
            lifecycle: Lifecycle::new(self.env.clone(), self.config.clone()),
            idle_requests: Vec::new(),
            renders: 0,
        });
        self.peers.len() - 1
    }

    /// Participant at `index`.
    pub fn peer(&self, index: usize) -> Option<&SimPeer<R>> {
        self.peers.get(index)
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the cluster has no participants.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Text shown by participant `index`.
    pub fn text(&self, index: usize) -> Option<String> {
        self.peers.get(index).map(|peer| peer.lifecycle.view().text)
    }

    /// Mount the room for `slug` on participant `index`.
    pub fn mount(&mut self, index: usize, slug: &Slug) -> Result<(), String> {
        let now = self.env.now();
        self.feed(index, LifecycleEvent::Mount { slug: slug.clone(), now })
    }

    /// Replace the control contents of participant `index` with `text`.
    pub fn input(&mut self, index: usize, text: &str) -> Result<(), String> {
        self.feed(index, LifecycleEvent::Input { text: text.to_string() })
    }

    /// Append `text` at the end of the control of participant `index`.
    pub fn type_text(&mut self, index: usize, text: &str) -> Result<(), String> {
        let current = self.text(index).ok_or_else(|| format!("no peer {index}"))?;
        self.input(index, &format!("{current}{text}"))
    }

    /// Insert `text` at char `position` of the control of participant
    /// `index`, clamped to the end.
    pub fn insert_text(&mut self, index: usize, position: usize, text: &str) -> Result<(), String> {
        let current = self.text(index).ok_or_else(|| format!("no peer {index}"))?;
        let at = current.char_indices().nth(position).map_or(current.len(), |(at, _)| at);
        let mut next = current;
        next.insert_str(at, text);
        self.input(index, &next)
    }

    /// Hide the page of participant `index`.
    pub fn page_hide(&mut self, index: usize) -> Result<(), String> {
        self.feed(index, LifecycleEvent::PageHide)
    }

    /// Unmount the room view of participant `index`.
    pub fn unmount(&mut self, index: usize) -> Result<(), String> {
        self.feed(index, LifecycleEvent::Unmount)
    }

    /// Feed one event to participant `index` and apply the resulting actions.
    pub fn feed(
        &mut self,
        index: usize,
        event: LifecycleEvent<SimInstant>,
    ) -> Result<(), String> {
        let peer = self.peers.get_mut(index).ok_or_else(|| format!("no peer {index}"))?;
        let actions = peer.lifecycle.handle(event).map_err(|e| format!("peer {}: {e}", peer.id))?;
        Self::apply(&self.network, peer, actions)
    }

    fn apply(
        network: &SimNetwork,
        peer: &mut SimPeer<R>,
        actions: Vec<LifecycleAction>,
    ) -> Result<(), String> {
        for action in actions {
            match action {
                LifecycleAction::RequestIdle { ticket } => peer.idle_requests.push(ticket),
                LifecycleAction::Transport(command) => {
                    sim_driver::execute(network, peer.id, command)
                        .map_err(|e| format!("peer {}: {e}", peer.id))?;
                },
                LifecycleAction::Render => peer.renders += 1,
            }
        }
        Ok(())
    }

    /// Run one round: grant idle slots, tick every participant, then deliver
    /// everything queued. Returns whether any event was processed.
    pub fn step(&mut self) -> Result<bool, String> {
        let now = self.env.now();
        let mut progressed = false;

        for index in 0..self.peers.len() {
            let tickets = std::mem::take(&mut self.peers[index].idle_requests);
            for ticket in tickets {
                self.feed(index, LifecycleEvent::HostIdle { ticket, now })?;
                progressed = true;
            }
            self.feed(index, LifecycleEvent::Tick { now })?;
        }

        loop {
            let mut delivered = false;
            for index in 0..self.peers.len() {
                while let Some(event) = self.network.poll(self.peers[index].id) {
                    self.feed(index, LifecycleEvent::Transport(event))?;
                    delivered = true;
                }
            }
            if !delivered {
                break;
            }
            progressed = true;
        }

        Ok(progressed)
    }

    /// Whether nothing is in flight and no start or timer is outstanding.
    pub fn is_quiescent(&self) -> bool {
        self.network.is_quiet()
            && self
                .peers
                .iter()
                .all(|peer| peer.idle_requests.is_empty() && !peer.lifecycle.has_pending_work())
    }

    /// Advance the clock in [`SETTLE_STEP`]s until the cluster is quiescent.
    ///
    /// Returns the number of rounds taken, or an error if the cluster is
    /// still busy after `max_rounds`.
    pub fn settle(&mut self, max_rounds: usize) -> Result<usize, String> {
        for round in 0..max_rounds {
            self.step()?;
            if self.is_quiescent() {
                return Ok(round + 1);
            }
            self.env.advance(SETTLE_STEP);
        }
        Err(format!("cluster still busy after {max_rounds} rounds"))
    }

    /// Observable state of every participant.
    pub fn snapshot(&self) -> ClusterSnapshot {
        let mut snapshot = ClusterSnapshot { quiescent: self.is_quiescent(), ..Default::default() };
        for peer in &self.peers {
            if let Some(room) = peer.lifecycle.room()
                && !snapshot.members.contains_key(room)
            {
                snapshot.members.insert(room.clone(), self.network.members(room).len());
            }
            snapshot.add_peer(peer.snapshot());
        }
        snapshot
    }
}
