//! Fuzz target for merging untrusted CRDT payloads
//!
//! Peers can send anything on the update and full-state channels. Merging
//! must either succeed or fail cleanly, and a failed merge must leave the
//! document unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use p2paste_core::{AutomergeReplica, Replica};

fuzz_target!(|data: &[u8]| {
    let Ok(mut replica) = AutomergeReplica::empty(7) else {
        return;
    };
    replica.splice(0, 0, "seed").expect("splice into empty text");
    let _ = replica.take_delta();

    let before = replica.text();
    if replica.apply(data).is_err() {
        assert_eq!(replica.text(), before);
    }
    let _ = replica.snapshot();
});
