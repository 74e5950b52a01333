//! Identities and config file values shared across the crate.

use std::fmt;

/// A chat or user identity on the messaging transport.
///
/// Used for requesters and for the approver alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The party asking for a config file.
///
/// Only `id` keys broker state; the names are shown to the approver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Transport identity.
    pub id: RecipientId,
    /// Human-readable name.
    pub full_name: String,
    /// Handle without the leading `@`, if the user has one.
    pub username: Option<String>,
}

impl Requester {
    /// Create a requester profile.
    #[must_use]
    pub fn new(id: RecipientId, full_name: impl Into<String>, username: Option<&str>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            username: username.map(str::to_owned),
        }
    }

    /// A requester with nothing but an id.
    #[must_use]
    pub fn anonymous(id: RecipientId) -> Self {
        Self {
            id,
            full_name: id.to_string(),
            username: None,
        }
    }
}

/// A credential file, identified by its file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigFile {
    /// File name, e.g. `wg-001.conf`.
    pub name: String,
}

impl ConfigFile {
    /// Create a config file reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lifecycle state of a [`ConfigFile`]. Transitions only move forward,
/// except that a release returns `Reserved` to `Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigState {
    /// In the available set and free to reserve.
    Available,
    /// Provisionally held for one requester.
    Reserved,
    /// Delivered and moved out of the available set for good.
    Consumed,
}

/// A loaded config file, ready to hand to the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    /// File name to present to the recipient.
    pub name: String,
    /// Raw file contents.
    pub contents: Vec<u8>,
}

// Contents are credentials; keep them out of logs.
impl fmt::Debug for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDocument")
            .field("name", &self.name)
            .field("contents", &format_args!("[{} bytes]", self.contents.len()))
            .finish()
    }
}
