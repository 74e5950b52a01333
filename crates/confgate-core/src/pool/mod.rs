//! The config file pool.
//!
//! A pool owns every file state transition:
//!
//! ```text
//! Available --reserve--> Reserved --consume--> Consumed
//!     ^                      |
//!     +-------release--------+
//! ```
//!
//! Pools are not internally synchronized. The [`ApprovalBroker`] keeps its
//! pool and registry behind one lock so that reserve-then-register and
//! take-then-consume are each a single transaction.
//!
//! [`ApprovalBroker`]: crate::broker::ApprovalBroker

mod fs;
mod memory;

pub use fs::{DEFAULT_EXTENSION, FsConfigPool, ISSUED_SUFFIX};
pub use memory::MemoryConfigPool;

use crate::error::PoolResult;
use crate::types::{ConfigDocument, ConfigFile, ConfigState};

/// Count of files per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockLevels {
    /// Free to reserve.
    pub available: usize,
    /// Held for a pending request.
    pub reserved: usize,
    /// Delivered.
    pub consumed: usize,
}

impl StockLevels {
    /// Files across all three states.
    #[must_use]
    pub fn total(&self) -> usize {
        self.available
            .saturating_add(self.reserved)
            .saturating_add(self.consumed)
    }
}

/// A store of single-use config files.
pub trait ConfigPool: Send {
    /// Files currently available, in reservation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn list_available(&self) -> PoolResult<Vec<ConfigFile>>;

    /// Reserve the first available file, or `None` if the pool is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn reserve(&mut self) -> PoolResult<Option<ConfigFile>>;

    /// Irrevocably move a reserved file to the consumed set.
    ///
    /// A [`PoolError::FileMissing`](crate::PoolError::FileMissing) result
    /// also drops the reservation; any other error leaves it held so the file
    /// is never handed out again.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not reserved, vanished, or could not
    /// be moved.
    fn consume(&mut self, file: &ConfigFile) -> PoolResult<()>;

    /// Return a reserved file to the available set.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotReserved`](crate::PoolError::NotReserved) if
    /// the file was not reserved.
    fn release(&mut self, file: &ConfigFile) -> PoolResult<()>;

    /// Read a reserved file for delivery.
    ///
    /// Drops the reservation if the file vanished.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not reserved, vanished, or could not
    /// be read.
    fn load(&mut self, file: &ConfigFile) -> PoolResult<ConfigDocument>;

    /// Current state of a file by name, `None` if the pool does not know it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn state(&self, name: &str) -> PoolResult<Option<ConfigState>>;

    /// Count of files per state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn stock(&self) -> PoolResult<StockLevels>;
}

impl<P: ConfigPool + ?Sized> ConfigPool for Box<P> {
    fn list_available(&self) -> PoolResult<Vec<ConfigFile>> {
        (**self).list_available()
    }

    fn reserve(&mut self) -> PoolResult<Option<ConfigFile>> {
        (**self).reserve()
    }

    fn consume(&mut self, file: &ConfigFile) -> PoolResult<()> {
        (**self).consume(file)
    }

    fn release(&mut self, file: &ConfigFile) -> PoolResult<()> {
        (**self).release(file)
    }

    fn load(&mut self, file: &ConfigFile) -> PoolResult<ConfigDocument> {
        (**self).load(file)
    }

    fn state(&self, name: &str) -> PoolResult<Option<ConfigState>> {
        (**self).state(name)
    }

    fn stock(&self) -> PoolResult<StockLevels> {
        (**self).stock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_total_sums_states() {
        let stock = StockLevels {
            available: 3,
            reserved: 1,
            consumed: 2,
        };
        assert_eq!(stock.total(), 6);
    }
}
