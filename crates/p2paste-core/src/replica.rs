//! Document replica contract and origin-tagged mutation.
//!
//! The CRDT engine sits behind [`Replica`]. The session never mutates a
//! replica directly; every mutation goes through [`Document`], which tags the
//! resulting delta with its [`Origin`]. Only `Local` deltas are ever
//! broadcast. Deltas caused by applying a peer's message are drained and
//! dropped, which is what keeps two peers from echoing one edit back and forth
//! forever.

use bytes::Bytes;

use crate::error::ReplicaError;

/// A CRDT engine holding one shared text.
///
/// # Contract
///
/// - `apply` is commutative and idempotent: applying the same encoded delta
///   or snapshot twice leaves the text as applying it once, and replicas that
///   apply the same set of deltas in any order converge.
/// - `apply` merges, it never replaces: applying a snapshot from an empty
///   replica leaves local content intact.
/// - `take_delta` returns everything that changed since the previous call
///   (local edits and applied remote changes alike), or an empty vector.
/// - `snapshot` is self-contained: `apply` on a fresh replica reconstructs
///   the text.
pub trait Replica: Send + Sized {
    /// Fresh, empty replica writing as `actor`.
    ///
    /// # Errors
    ///
    /// Returns `ReplicaError::Engine` if the engine cannot initialize.
    fn empty(actor: u128) -> Result<Self, ReplicaError>;

    /// Current text.
    fn text(&self) -> String;

    /// Text length in characters.
    fn len(&self) -> usize;

    /// Whether the text is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace `delete` characters at `index` with `insert`.
    ///
    /// # Errors
    ///
    /// Returns `ReplicaError::OutOfRange` if the range exceeds the text.
    fn splice(&mut self, index: usize, delete: usize, insert: &str) -> Result<(), ReplicaError>;

    /// Merge an encoded delta or snapshot from a peer.
    ///
    /// # Errors
    ///
    /// Returns `ReplicaError::Malformed` if the bytes cannot be decoded.
    fn apply(&mut self, encoded: &[u8]) -> Result<(), ReplicaError>;

    /// Drain the incremental delta accumulated since the last call.
    fn take_delta(&mut self) -> Vec<u8>;

    /// Encode the full state.
    fn snapshot(&mut self) -> Vec<u8>;
}

/// Who caused a document mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Edit made by the local participant.
    Local,
    /// Delta or snapshot received from a peer.
    Remote,
}

/// Delta produced by one mutation, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Who caused the mutation.
    pub origin: Origin,
    /// Encoded incremental delta.
    pub delta: Bytes,
}

/// A splice on the visible text, in characters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextEdit {
    /// Start position.
    pub index: usize,
    /// Characters removed at `index`.
    pub delete: usize,
    /// Text inserted at `index` after removal.
    pub insert: String,
}

impl TextEdit {
    /// Insert `text` at `index`.
    pub fn insert(index: usize, text: impl Into<String>) -> Self {
        Self { index, delete: 0, insert: text.into() }
    }

    /// Delete `count` characters at `index`.
    pub fn delete(index: usize, count: usize) -> Self {
        Self { index, delete: count, insert: String::new() }
    }

    /// Whether the edit changes nothing.
    pub fn is_noop(&self) -> bool {
        self.delete == 0 && self.insert.is_empty()
    }
}

/// Replica plus the local-update listener.
///
/// While the listener is attached, every mutation yields an [`Update`] for
/// the session to inspect. Detaching it silences the document without
/// dropping the replica.
#[derive(Debug)]
pub struct Document<R: Replica> {
    replica: R,
    listening: bool,
}

impl<R: Replica> Document<R> {
    /// Wrap a replica. The listener starts detached.
    pub fn new(replica: R) -> Self {
        Self { replica, listening: false }
    }

    /// Start reporting updates.
    pub fn attach_listener(&mut self) {
        self.listening = true;
    }

    /// Stop reporting updates.
    pub fn detach_listener(&mut self) {
        self.listening = false;
    }

    /// Whether the local-update listener is attached.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Apply a local edit.
    ///
    /// # Errors
    ///
    /// Returns the replica's error; the document is unchanged.
    pub fn edit(&mut self, edit: &TextEdit) -> Result<Option<Update>, ReplicaError> {
        self.replica.splice(edit.index, edit.delete, &edit.insert)?;
        Ok(self.capture(Origin::Local))
    }

    /// Merge a peer's delta or snapshot.
    ///
    /// Whatever the engine managed to load is drained as a `Remote` delta even
    /// when it reports an error, so a partially applied message can never
    /// resurface inside a later local delta.
    ///
    /// # Errors
    ///
    /// Returns the replica's error for malformed input.
    pub fn merge(&mut self, encoded: &[u8]) -> Result<Option<Update>, ReplicaError> {
        let result = self.replica.apply(encoded);
        let update = self.capture(Origin::Remote);
        result.map(|()| update)
    }

    /// Full encoded state.
    pub fn snapshot(&mut self) -> Bytes {
        Bytes::from(self.replica.snapshot())
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.replica.text()
    }

    /// Text length in characters.
    pub fn len(&self) -> usize {
        self.replica.len()
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.replica.is_empty()
    }

    /// Underlying replica.
    pub fn replica(&self) -> &R {
        &self.replica
    }

    fn capture(&mut self, origin: Origin) -> Option<Update> {
        let delta = self.replica.take_delta();
        if !self.listening || delta.is_empty() {
            return None;
        }
        Some(Update { origin, delta: Bytes::from(delta) })
    }
}
