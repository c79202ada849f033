//! Deterministic simulation harness for p2paste rooms.
//!
//! Seeded, virtual-clock implementations of the environment and the peer
//! transport, so whole rooms of participants run reproducibly in tests.
//!
//! # Components
//!
//! - [`SimEnv`]: seeded RNG and a virtual clock shared by every participant
//! - [`SimNetwork`]: in-memory rendezvous network with chaos injection
//! - [`SimDriver`]: [`p2paste_app::Driver`] over the simulated network, for
//!   running full [`p2paste_app::Runtime`]s
//! - [`SimCluster`]: step-by-step room of lifecycles for convergence tests
//! - [`LwwReplica`]: second replica engine, used to check the session
//!   protocol is engine-agnostic
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Use [`InvariantRegistry::standard()`] for the room invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cluster;
pub mod invariants;
pub mod lww_replica;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_network;

pub use cluster::{SETTLE_STEP, SimCluster, SimPeer};
pub use invariants::{
    ClusterSnapshot, ConnectedIffPeers, Invariant, InvariantRegistry, InvariantResult,
    PeerCountMatchesRoom, PeerSnapshot, TextConvergence, Violation,
};
pub use lww_replica::LwwReplica;
pub use sim_driver::{IDLE_STEP, SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_network::{Chaos, NetworkStats, SimNetwork};
