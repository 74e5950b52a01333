//! Pending requests, keyed by requester.
//!
//! The registry is the single source of truth for "is this requester
//! currently waiting on a decision". [`RequestRegistry::take_and_clear`] is
//! the commit point for a decision: whichever caller removes the entry owns
//! its resolution, every later caller sees `None`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{RegistryError, RegistryResult};
use crate::types::{ConfigFile, RecipientId, Requester};

/// A reservation awaiting the approver's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Who asked.
    pub requester: Requester,
    /// The file held for them.
    pub file: ConfigFile,
    /// When the reservation was made.
    pub created_at: DateTime<Utc>,
}

impl PendingRequest {
    /// Create a pending request stamped with the current time.
    #[must_use]
    pub fn new(requester: Requester, file: ConfigFile) -> Self {
        Self {
            requester,
            file,
            created_at: Utc::now(),
        }
    }

    /// Whether this request is at least `ttl` old at `now`.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at)
            .to_std()
            .is_ok_and(|age| age >= ttl)
    }
}

/// Map from requester to their single pending request.
///
/// Not internally synchronized; the broker guards it together with the pool.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    entries: HashMap<RecipientId, PendingRequest>,
}

impl RequestRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending request.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyPending`] if the requester already has
    /// one; the existing entry is left untouched.
    pub fn put(&mut self, pending: PendingRequest) -> RegistryResult<()> {
        let id = pending.requester.id;
        if self.entries.contains_key(&id) {
            return Err(RegistryError::AlreadyPending(id));
        }
        self.entries.insert(id, pending);
        Ok(())
    }

    /// Atomically remove and return the requester's entry.
    pub fn take_and_clear(&mut self, id: RecipientId) -> Option<PendingRequest> {
        self.entries.remove(&id)
    }

    /// Look at a requester's entry without removing it.
    #[must_use]
    pub fn get(&self, id: RecipientId) -> Option<&PendingRequest> {
        self.entries.get(&id)
    }

    /// Whether the requester has an open request.
    #[must_use]
    pub fn contains(&self, id: RecipientId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of open requests.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no open requests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every entry that is at least `ttl` old, oldest first.
    pub fn drain_expired(&mut self, ttl: Duration, now: DateTime<Utc>) -> Vec<PendingRequest> {
        let expired: Vec<RecipientId> = self
            .entries
            .iter()
            .filter(|(_, p)| p.is_expired(ttl, now))
            .map(|(id, _)| *id)
            .collect();
        let mut drained: Vec<PendingRequest> = expired
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect();
        drained.sort_by_key(|p| p.created_at);
        drained
    }
}
