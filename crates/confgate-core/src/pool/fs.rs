//! Directory-backed pool.
//!
//! Layout under the pool root:
//!
//! ```text
//! <root>/available/   files that may be handed out
//! <root>/used/        files that were delivered
//! ```
//!
//! Reservations live in memory only; after a restart every file still in
//! `available/` is available again. A name that also exists in `used/` was
//! already issued and is never handed out, whichever directory it sits in.
//! If a delivered file cannot be moved to `used/`, it is renamed in place to
//! `<name>.issued` so the extension filter keeps it out of circulation.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{ConfigPool, StockLevels};
use crate::error::{PoolError, PoolResult};
use crate::types::{ConfigDocument, ConfigFile, ConfigState};

/// Default extension of files the pool will hand out.
pub const DEFAULT_EXTENSION: &str = ".conf";

/// Suffix appended to a delivered file that could not be moved to `used/`.
pub const ISSUED_SUFFIX: &str = ".issued";

/// A [`ConfigPool`] over an `available/` and a `used/` directory.
#[derive(Debug)]
pub struct FsConfigPool {
    available_dir: PathBuf,
    used_dir: PathBuf,
    extension: String,
    reserved: BTreeSet<String>,
}

impl FsConfigPool {
    /// Open a pool rooted at `root`, creating both directories if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> PoolResult<Self> {
        Self::open_with_extension(root, DEFAULT_EXTENSION)
    }

    /// Open a pool that only counts files ending in `extension`.
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created.
    pub fn open_with_extension(root: impl AsRef<Path>, extension: &str) -> PoolResult<Self> {
        let root = root.as_ref();
        let available_dir = root.join("available");
        let used_dir = root.join("used");
        for dir in [&available_dir, &used_dir] {
            std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        debug!(root = %root.display(), extension, "opened config pool");
        Ok(Self {
            available_dir,
            used_dir,
            extension: extension.to_owned(),
            reserved: BTreeSet::new(),
        })
    }

    /// Directory holding available files.
    #[must_use]
    pub fn available_dir(&self) -> &Path {
        &self.available_dir
    }

    /// Directory holding consumed files.
    #[must_use]
    pub fn used_dir(&self) -> &Path {
        &self.used_dir
    }

    /// Matching file names in `dir`, sorted.
    fn scan(&self, dir: &Path) -> PoolResult<Vec<String>> {
        let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(dir, e))?;
            if !entry.path().is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            if name.ends_with(&self.extension) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Files in `available/` that were never issued, sorted.
    fn in_circulation(&self) -> PoolResult<Vec<String>> {
        let mut names = self.scan(&self.available_dir)?;
        names.retain(|name| {
            let issued = self.used_dir.join(name).exists();
            if issued {
                warn!(file = %name, "skipping config already present in used/");
            }
            !issued
        });
        Ok(names)
    }

    /// Take a delivered file out of `available/` when `used/` cannot receive it.
    fn quarantine(&mut self, file: &ConfigFile, src: &Path) {
        let parked = self
            .available_dir
            .join(format!("{}{ISSUED_SUFFIX}", file.name));
        match std::fs::rename(src, &parked) {
            Ok(()) => {
                self.reserved.remove(&file.name);
                warn!(file = %file, parked = %parked.display(), "moved issued config aside");
            },
            Err(e) => {
                warn!(file = %file, error = %e, "could not move issued config aside; reservation kept");
            },
        }
    }

    fn ensure_reserved(&self, file: &ConfigFile) -> PoolResult<()> {
        if self.reserved.contains(&file.name) {
            Ok(())
        } else {
            Err(PoolError::NotReserved(file.name.clone()))
        }
    }
}

impl ConfigPool for FsConfigPool {
    fn list_available(&self) -> PoolResult<Vec<ConfigFile>> {
        Ok(self
            .in_circulation()?
            .into_iter()
            .filter(|name| !self.reserved.contains(name))
            .map(ConfigFile::new)
            .collect())
    }

    fn reserve(&mut self) -> PoolResult<Option<ConfigFile>> {
        let Some(file) = self.list_available()?.into_iter().next() else {
            return Ok(None);
        };
        self.reserved.insert(file.name.clone());
        Ok(Some(file))
    }

    fn consume(&mut self, file: &ConfigFile) -> PoolResult<()> {
        self.ensure_reserved(file)?;
        let src = self.available_dir.join(&file.name);
        let dest = self.used_dir.join(&file.name);
        if dest.exists() {
            return Err(PoolError::AlreadyConsumed(file.name.clone()));
        }
        match std::fs::rename(&src, &dest) {
            Ok(()) => {
                self.reserved.remove(&file.name);
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound && !src.exists() => {
                self.reserved.remove(&file.name);
                Err(PoolError::FileMissing(file.name.clone()))
            },
            Err(e) => {
                self.quarantine(file, &src);
                Err(io_error(&dest, e))
            },
        }
    }

    fn release(&mut self, file: &ConfigFile) -> PoolResult<()> {
        if self.reserved.remove(&file.name) {
            Ok(())
        } else {
            Err(PoolError::NotReserved(file.name.clone()))
        }
    }

    fn load(&mut self, file: &ConfigFile) -> PoolResult<ConfigDocument> {
        self.ensure_reserved(file)?;
        if self.used_dir.join(&file.name).exists() {
            self.reserved.remove(&file.name);
            return Err(PoolError::AlreadyConsumed(file.name.clone()));
        }
        let path = self.available_dir.join(&file.name);
        match std::fs::read(&path) {
            Ok(contents) => Ok(ConfigDocument {
                name: file.name.clone(),
                contents,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.reserved.remove(&file.name);
                Err(PoolError::FileMissing(file.name.clone()))
            },
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn state(&self, name: &str) -> PoolResult<Option<ConfigState>> {
        if self.used_dir.join(name).is_file() {
            return Ok(Some(ConfigState::Consumed));
        }
        if !self.available_dir.join(name).is_file() {
            return Ok(None);
        }
        if self.reserved.contains(name) {
            Ok(Some(ConfigState::Reserved))
        } else {
            Ok(Some(ConfigState::Available))
        }
    }

    fn stock(&self) -> PoolResult<StockLevels> {
        let present = self.in_circulation()?;
        let reserved = present
            .iter()
            .filter(|name| self.reserved.contains(*name))
            .count();
        Ok(StockLevels {
            available: present.len().saturating_sub(reserved),
            reserved,
            consumed: self.scan(&self.used_dir)?.len(),
        })
    }
}

fn io_error(path: &Path, source: io::Error) -> PoolError {
    PoolError::Io {
        path: path.display().to_string(),
        source,
    }
}
