//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the user file (explicit path or `~/.confgate/config.toml`)
//! 3. Resolve `${VAR}` references in string values
//! 4. Apply env var fallbacks for fields the file left unset
//! 5. Deserialize merged tree → `Config`
//! 6. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, resolve_env_references};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Which layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults.
    Defaults,
    /// The user config file.
    File,
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::File => write!(f, "config file"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Dotted field path → layer that set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// A loaded configuration plus where its values came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Dotted field path → which layer set the value.
    pub field_sources: FieldSources,
    /// Config files that were read.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// Layer that set `field`, if any.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }
}

/// Load the configuration.
///
/// `path` replaces `~/.confgate/config.toml` when given; an explicit path
/// that does not exist is an error, a missing default file is not.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is malformed, an env var cannot be
/// coerced, or the result fails validation.
pub fn load<S: ::std::hash::BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    let user_file = match path {
        Some(explicit) => Some((read_toml(explicit)?, explicit.to_path_buf())),
        None => {
            let default_path = user_config_path()?;
            try_load_file(&default_path)?.map(|overlay| (overlay, default_path))
        },
    };

    if let Some((mut overlay, file)) = user_file {
        resolve_env_references(&mut overlay, env_vars);
        deep_merge_tracking(&mut merged, &overlay, "", &mut field_sources);
        loaded_files.push(file.display().to_string());
        info!(path = %file.display(), "loaded config file");
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// `~/.confgate/config.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if the home directory is unknown.
pub fn user_config_path() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".confgate").join("config.toml"))
        .ok_or(ConfigError::NoHomeDir)
}

/// Try to load a file, returning `None` if it doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match read_toml(path) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

fn read_toml(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    // Checked after reading so there is no stat/read race.
    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Deep-merge `overlay` into `base`, marking every leaf it sets as
/// [`ConfigLayer::File`]. Tables merge per key; scalars and arrays replace.
fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    sources: &mut FieldSources,
) {
    let (Some(base_table), Some(overlay_table)) = (base.as_table_mut(), overlay.as_table()) else {
        *base = overlay.clone();
        sources.insert(prefix.to_owned(), ConfigLayer::File);
        return;
    };

    for (key, overlay_val) in overlay_table {
        let path = join_path(prefix, key);
        match base_table.get_mut(key) {
            Some(base_val) if overlay_val.is_table() => {
                deep_merge_tracking(base_val, overlay_val, &path, sources);
            },
            Some(base_val) => {
                *base_val = overlay_val.clone();
                sources.insert(path, ConfigLayer::File);
            },
            None => {
                base_table.insert(key.clone(), overlay_val.clone());
                record_leaves(overlay_val, &path, ConfigLayer::File, sources);
            },
        }
    }
}

fn record_leaves(val: &toml::Value, prefix: &str, layer: ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer);
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}
