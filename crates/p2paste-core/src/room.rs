//! Transport room identity.

use std::fmt;

use crate::slug::Slug;

/// Prefix namespacing this application's rooms on shared rendezvous
/// infrastructure.
pub const DEFAULT_ROOM_PREFIX: &str = "p2paste";

/// Identifier under which peers of one paste find each other,
/// `<prefix>-<slug>`.
///
/// Derived 1:1 from a [`Slug`] and immutable for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// Room for `slug` under `prefix`.
    pub fn new(prefix: &str, slug: &Slug) -> Self {
        Self(format!("{prefix}-{slug}"))
    }

    /// Room for `slug` under [`DEFAULT_ROOM_PREFIX`].
    pub fn for_slug(slug: &Slug) -> Self {
        Self::new(DEFAULT_ROOM_PREFIX, slug)
    }

    /// Identifier as handed to the transport.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
