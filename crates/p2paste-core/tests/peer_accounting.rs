//! Property tests for local peer accounting.
//!
//! These tests verify critical invariants:
//! - N distinct joins followed by M of their leaves yield max(0, N - M) peers
//! - `connected` is true iff the count is nonzero
//! - Repeated joins count once and leaves from unknown peers change nothing

use std::collections::BTreeSet;

use p2paste_core::{PeerId, PeerSet};
use proptest::prelude::*;

proptest! {
    /// INVARIANT: joins then leaves leave max(0, N - M) peers.
    #[test]
    fn joins_then_leaves(joins in 0u64..64, leaves in 0u64..96) {
        let mut peers = PeerSet::new();
        for id in 0..joins {
            peers.joined(PeerId(id));
        }
        for id in 0..leaves {
            peers.left(PeerId(id));
        }

        let expected = usize::try_from(joins.saturating_sub(leaves)).unwrap();
        prop_assert_eq!(peers.count(), expected);
        prop_assert_eq!(peers.is_connected(), expected > 0);
        prop_assert_eq!(peers.participants(), expected + 1);
    }

    /// INVARIANT: the count equals the number of distinct peers joined and
    /// not yet left, for any interleaving with repeats.
    #[test]
    fn interleaved_notifications(
        events in proptest::collection::vec((any::<bool>(), 0u64..8), 0..200),
    ) {
        let mut peers = PeerSet::new();
        let mut model = BTreeSet::new();

        for (join, id) in events {
            if join {
                peers.joined(PeerId(id));
                model.insert(id);
            } else {
                peers.left(PeerId(id));
                model.remove(&id);
            }
            prop_assert_eq!(peers.count(), model.len());
            prop_assert_eq!(peers.is_connected(), !model.is_empty());
        }
    }

    /// INVARIANT: announcing the same peer again never inflates the count.
    #[test]
    fn duplicate_joins_count_once(id in any::<u64>(), repeats in 1usize..10) {
        let mut peers = PeerSet::new();
        for _ in 0..repeats {
            peers.joined(PeerId(id));
        }
        prop_assert_eq!(peers.count(), 1);

        peers.left(PeerId(id));
        prop_assert!(!peers.is_connected());
    }

    /// INVARIANT: a leave for a peer never joined leaves known peers in place.
    #[test]
    fn unknown_leaves_are_ignored(
        known in proptest::collection::btree_set(0u64..32, 1..8),
        stranger in 32u64..64,
    ) {
        let mut peers = PeerSet::new();
        for id in &known {
            peers.joined(PeerId(*id));
        }

        prop_assert!(!peers.left(PeerId(stranger)));
        prop_assert_eq!(peers.count(), known.len());
        prop_assert!(peers.is_connected());
    }
}
