//! Production CRDT engine backed by Automerge.
//!
//! Every replica starts from the same genesis change: a text object created
//! by a fixed actor at time zero. Because the change is byte-identical
//! everywhere, its hash is too, so replicas created independently by peers
//! who have never talked already agree on which object holds the text.
//! After genesis each replica writes under its own random actor.

use std::fmt;

use automerge::{
    ActorId, AutoCommit, AutomergeError, ObjId, ObjType, ROOT, ReadDoc,
    transaction::{CommitOptions, Transactable},
};

use crate::{error::ReplicaError, replica::Replica};

/// Actor that authors the shared genesis change.
const GENESIS_ACTOR: [u8; 16] = *b"p2paste-genesis!";

/// Root key of the shared text object.
const TEXT_KEY: &str = "content";

/// [`Replica`] implemented with an Automerge document.
pub struct AutomergeReplica {
    doc: AutoCommit,
    text: ObjId,
}

impl AutomergeReplica {
    fn genesis() -> Result<(AutoCommit, ObjId), AutomergeError> {
        let mut doc = AutoCommit::new();
        doc.set_actor(ActorId::from(&GENESIS_ACTOR[..]));
        let text = doc.put_object(ROOT, TEXT_KEY, ObjType::Text)?;
        let _genesis = doc.commit_with(CommitOptions::default().with_time(0));
        Ok((doc, text))
    }
}

fn engine_error(err: AutomergeError) -> ReplicaError {
    ReplicaError::Engine { reason: err.to_string() }
}

impl Replica for AutomergeReplica {
    fn empty(actor: u128) -> Result<Self, ReplicaError> {
        let (mut doc, text) = Self::genesis().map_err(engine_error)?;
        doc.set_actor(ActorId::from(&actor.to_be_bytes()[..]));

        // Every peer already has genesis; never ship it.
        let _genesis = doc.save_incremental();

        Ok(Self { doc, text })
    }

    fn text(&self) -> String {
        self.doc.text(&self.text).unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.doc.length(&self.text)
    }

    fn splice(&mut self, index: usize, delete: usize, insert: &str) -> Result<(), ReplicaError> {
        let len = self.len();
        let out_of_range = ReplicaError::OutOfRange { index, delete, len };

        let end = index.checked_add(delete).ok_or_else(|| out_of_range.clone())?;
        if end > len {
            return Err(out_of_range);
        }
        let delete = isize::try_from(delete).map_err(|_| out_of_range)?;

        self.doc.splice_text(&self.text, index, delete, insert).map_err(engine_error)
    }

    fn apply(&mut self, encoded: &[u8]) -> Result<(), ReplicaError> {
        self.doc
            .load_incremental(encoded)
            .map(|_| ())
            .map_err(|e| ReplicaError::Malformed { reason: e.to_string() })
    }

    fn take_delta(&mut self) -> Vec<u8> {
        self.doc.save_incremental()
    }

    fn snapshot(&mut self) -> Vec<u8> {
        self.doc.save()
    }
}

impl fmt::Debug for AutomergeReplica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomergeReplica")
            .field("actor", &self.doc.get_actor().to_hex_string())
            .field("len", &self.len())
            .finish()
    }
}
