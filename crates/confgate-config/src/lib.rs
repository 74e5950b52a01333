#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for the confgate broker.
//!
//! # Usage
//!
//! ```rust,no_run
//! use confgate_config::Config;
//!
//! // defaults → ~/.confgate/config.toml → env fallbacks
//! let resolved = Config::load(None).unwrap();
//! println!("pool root: {}", resolved.config.pool.root);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **File**: an explicit path, or `~/.confgate/config.toml`
//! 2. **Environment variables** (`CONFGATE_*`, plus the bare `TOKEN` and
//!    `ADMIN_ID` names): fallback only, for fields no file set
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLayer, ResolvedConfig};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// `path` replaces the default user config location when given.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file is malformed or the final
    /// configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(path, &env::collect_env_vars())
    }
}
