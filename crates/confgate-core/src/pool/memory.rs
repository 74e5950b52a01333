//! In-memory pool with the same semantics as [`FsConfigPool`](super::FsConfigPool).

use std::collections::BTreeMap;

use super::{ConfigPool, StockLevels};
use crate::error::{PoolError, PoolResult};
use crate::types::{ConfigDocument, ConfigFile, ConfigState};

struct Entry {
    state: ConfigState,
    contents: Vec<u8>,
}

/// A [`ConfigPool`] held entirely in memory. Reservation order is by name.
#[derive(Default)]
pub struct MemoryConfigPool {
    entries: BTreeMap<String, Entry>,
}

impl MemoryConfigPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool with the given available files; contents are the names.
    #[must_use]
    pub fn with_files<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pool = Self::new();
        for name in names {
            let name = name.into();
            let contents = name.clone().into_bytes();
            pool.insert(name, contents);
        }
        pool
    }

    /// Add (or replace) an available file.
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.entries.insert(
            name.into(),
            Entry {
                state: ConfigState::Available,
                contents: contents.into(),
            },
        );
    }

    /// Delete a file behind the pool's back, as an operator or another
    /// process might.
    pub fn remove_externally(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    fn reserved_entry(&self, file: &ConfigFile) -> PoolResult<&Entry> {
        match self.entries.get(&file.name) {
            Some(entry) if entry.state == ConfigState::Reserved => Ok(entry),
            _ => Err(PoolError::NotReserved(file.name.clone())),
        }
    }
}

impl std::fmt::Debug for MemoryConfigPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, e)| (name, e.state)))
            .finish()
    }
}

impl ConfigPool for MemoryConfigPool {
    fn list_available(&self) -> PoolResult<Vec<ConfigFile>> {
        Ok(self
            .entries
            .iter()
            .filter(|(_, e)| e.state == ConfigState::Available)
            .map(|(name, _)| ConfigFile::new(name.clone()))
            .collect())
    }

    fn reserve(&mut self) -> PoolResult<Option<ConfigFile>> {
        let next = self
            .entries
            .iter_mut()
            .find(|(_, e)| e.state == ConfigState::Available);
        Ok(next.map(|(name, entry)| {
            entry.state = ConfigState::Reserved;
            ConfigFile::new(name.clone())
        }))
    }

    fn consume(&mut self, file: &ConfigFile) -> PoolResult<()> {
        match self.entries.get_mut(&file.name) {
            Some(entry) if entry.state == ConfigState::Reserved => {
                entry.state = ConfigState::Consumed;
                Ok(())
            },
            Some(entry) if entry.state == ConfigState::Consumed => {
                Err(PoolError::AlreadyConsumed(file.name.clone()))
            },
            Some(_) => Err(PoolError::NotReserved(file.name.clone())),
            None => Err(PoolError::FileMissing(file.name.clone())),
        }
    }

    fn release(&mut self, file: &ConfigFile) -> PoolResult<()> {
        match self.entries.get_mut(&file.name) {
            Some(entry) if entry.state == ConfigState::Reserved => {
                entry.state = ConfigState::Available;
                Ok(())
            },
            _ => Err(PoolError::NotReserved(file.name.clone())),
        }
    }

    fn load(&mut self, file: &ConfigFile) -> PoolResult<ConfigDocument> {
        if !self.entries.contains_key(&file.name) {
            return Err(PoolError::FileMissing(file.name.clone()));
        }
        let entry = self.reserved_entry(file)?;
        Ok(ConfigDocument {
            name: file.name.clone(),
            contents: entry.contents.clone(),
        })
    }

    fn state(&self, name: &str) -> PoolResult<Option<ConfigState>> {
        Ok(self.entries.get(name).map(|e| e.state))
    }

    fn stock(&self) -> PoolResult<StockLevels> {
        let mut stock = StockLevels::default();
        for entry in self.entries.values() {
            let slot = match entry.state {
                ConfigState::Available => &mut stock.available,
                ConfigState::Reserved => &mut stock.reserved,
                ConfigState::Consumed => &mut stock.consumed,
            };
            *slot = slot.saturating_add(1);
        }
        Ok(stock)
    }
}
