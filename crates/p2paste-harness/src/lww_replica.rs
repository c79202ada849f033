//! Last-writer-wins fake CRDT.
//!
//! A deliberately simple [`Replica`] for tests: every edit records the whole
//! resulting text under a `(lamport, actor)` stamp, and the text is the entry
//! with the greatest stamp. Merging is a set union, so it is commutative and
//! idempotent by construction, and concurrent edits resolve to one winner
//! rather than interleaving.
//!
//! # Encoding
//!
//! A delta or snapshot is a sequence of entries:
//!
//! ```text
//! [lamport u64 BE][actor u128 BE][len u32 BE][len bytes of UTF-8]
//! ```

use std::collections::BTreeMap;

use p2paste_core::{Replica, ReplicaError};

const ENTRY_HEADER: usize = 8 + 16 + 4;

type Stamp = (u64, u128);

/// Fake replica resolving concurrent edits by last writer.
#[derive(Debug, Clone, Default)]
pub struct LwwReplica {
    actor: u128,
    entries: BTreeMap<Stamp, String>,
    pending: Vec<Stamp>,
}

impl LwwReplica {
    /// Number of recorded entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn encode<'a>(&self, stamps: impl IntoIterator<Item = &'a Stamp>) -> Vec<u8> {
        let mut out = Vec::new();
        for stamp in stamps {
            if let Some(text) = self.entries.get(stamp) {
                out.extend_from_slice(&stamp.0.to_be_bytes());
                out.extend_from_slice(&stamp.1.to_be_bytes());
                out.extend_from_slice(&(text.len() as u32).to_be_bytes());
                out.extend_from_slice(text.as_bytes());
            }
        }
        out
    }

    fn decode(mut bytes: &[u8]) -> Result<Vec<(Stamp, String)>, ReplicaError> {
        let malformed = |reason: &str| ReplicaError::Malformed { reason: reason.to_string() };

        let mut entries = Vec::new();
        while !bytes.is_empty() {
            if bytes.len() < ENTRY_HEADER {
                return Err(malformed("truncated entry header"));
            }
            let (header, rest) = bytes.split_at(ENTRY_HEADER);

            let mut lamport = [0u8; 8];
            lamport.copy_from_slice(&header[..8]);
            let mut actor = [0u8; 16];
            actor.copy_from_slice(&header[8..24]);
            let mut len = [0u8; 4];
            len.copy_from_slice(&header[24..]);
            let len = u32::from_be_bytes(len) as usize;

            if rest.len() < len {
                return Err(malformed("truncated entry text"));
            }
            let (text, rest) = rest.split_at(len);
            let text = std::str::from_utf8(text).map_err(|_| malformed("entry is not UTF-8"))?;

            entries.push(((u64::from_be_bytes(lamport), u128::from_be_bytes(actor)), text.into()));
            bytes = rest;
        }
        Ok(entries)
    }

    fn insert(&mut self, stamp: Stamp, text: String) {
        if self.entries.insert(stamp, text).is_none() {
            self.pending.push(stamp);
        }
    }
}

impl Replica for LwwReplica {
    fn empty(actor: u128) -> Result<Self, ReplicaError> {
        Ok(Self { actor, ..Self::default() })
    }

    fn text(&self) -> String {
        self.entries.values().next_back().cloned().unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.entries.values().next_back().map_or(0, |text| text.chars().count())
    }

    fn splice(&mut self, index: usize, delete: usize, insert: &str) -> Result<(), ReplicaError> {
        let chars: Vec<char> = self.text().chars().collect();
        let len = chars.len();
        let end = index
            .checked_add(delete)
            .filter(|end| *end <= len)
            .ok_or(ReplicaError::OutOfRange { index, delete, len })?;

        let mut next: String = chars[..index].iter().collect();
        next.push_str(insert);
        next.extend(&chars[end..]);

        let lamport = self.entries.keys().next_back().map_or(0, |(l, _)| *l) + 1;
        self.insert((lamport, self.actor), next);
        Ok(())
    }

    fn apply(&mut self, encoded: &[u8]) -> Result<(), ReplicaError> {
        // Decode everything first so a bad tail leaves the replica untouched.
        for (stamp, text) in Self::decode(encoded)? {
            self.insert(stamp, text);
        }
        Ok(())
    }

    fn take_delta(&mut self) -> Vec<u8> {
        let pending = std::mem::take(&mut self.pending);
        self.encode(&pending)
    }

    fn snapshot(&mut self) -> Vec<u8> {
        let stamps: Vec<Stamp> = self.entries.keys().copied().collect();
        self.encode(&stamps)
    }
}
