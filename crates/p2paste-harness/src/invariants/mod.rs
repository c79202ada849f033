//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! A [`SimCluster`](crate::SimCluster) extracts the observable state of every
//! participant into a [`ClusterSnapshot`], then registered [`Invariant`]
//! checks run against it. Some properties only hold once the room has gone
//! quiet; the snapshot records whether it has.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! cluster.settle(100)?;
//! registry.check_all(&cluster.snapshot())?;
//! ```

mod checks;
mod snapshot;

pub use checks::{ConnectedIffPeers, PeerCountMatchesRoom, TextConvergence};
pub use snapshot::{ClusterSnapshot, PeerSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against cluster state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &ClusterSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
///
/// Use [`InvariantRegistry::standard()`] for the room invariants.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard room invariants.
    ///
    /// Includes:
    /// - [`TextConvergence`]: a quiet room shows one text everywhere
    /// - [`PeerCountMatchesRoom`]: local peer counts match room membership
    /// - [`ConnectedIffPeers`]: the badge reads Connected exactly when a peer
    ///   is known
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(TextConvergence);
        registry.add(PeerCountMatchesRoom);
        registry.add(ConnectedIffPeers);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &ClusterSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, folding every violation into one message.
    pub fn verify(&self, state: &ClusterSnapshot, context: &str) -> Result<(), String> {
        self.check_all(state).map_err(|violations| {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            format!("invariant violation {context}:\n  {}", messages.join("\n  "))
        })
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&ClusterSnapshot::empty()).is_ok());
    }
}
