//! Environment variable fallback and `${VAR}` reference resolution.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// Supported variables. Earlier entries win when two map to the same field.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "CONFGATE_BOT_TOKEN",
        field_path: "telegram.bot_token",
    },
    EnvMapping {
        var_name: "TOKEN",
        field_path: "telegram.bot_token",
    },
    EnvMapping {
        var_name: "CONFGATE_APPROVER_ID",
        field_path: "telegram.approver_id",
    },
    EnvMapping {
        var_name: "ADMIN_ID",
        field_path: "telegram.approver_id",
    },
    EnvMapping {
        var_name: "CONFGATE_CONFIGS_DIR",
        field_path: "pool.root",
    },
    EnvMapping {
        var_name: "CONFGATE_PENDING_TTL_SECS",
        field_path: "pending.ttl_secs",
    },
    EnvMapping {
        var_name: "CONFGATE_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "CONFGATE_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Fields whose TOML type is an integer.
const INTEGER_FIELDS: &[&str] = &[
    "telegram.approver_id",
    "pending.ttl_secs",
    "pending.reap_interval_secs",
];

/// Apply env var fallbacks to `merged` for every field still at its default.
///
/// Returns the number of fields set.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable mapped to a numeric field
/// does not parse as an integer.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults)
        {
            continue;
        }

        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if val.trim().is_empty() {
            continue;
        }

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        let toml_val = coerce_to_toml_value(mapping, val)?;
        set_field(merged, mapping.field_path, toml_val);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

/// Replace `${VAR}` references in every string value of `val`.
///
/// Unresolved references are left in place.
pub fn resolve_env_references<S: ::std::hash::BuildHasher>(
    val: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) {
    match val {
        toml::Value::String(s) => {
            if s.contains("${") {
                *s = resolve_string_refs(s, env_vars);
            }
        },
        toml::Value::Table(table) => {
            for (_, child) in table.iter_mut() {
                resolve_env_references(child, env_vars);
            }
        },
        toml::Value::Array(items) => {
            for child in items {
                resolve_env_references(child, env_vars);
            }
        },
        _ => {},
    }
}

fn resolve_string_refs<S: ::std::hash::BuildHasher>(
    input: &str,
    env_vars: &HashMap<String, String, S>,
) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start.saturating_add(2)..];
        let Some(end) = after.find('}') else {
            // Unterminated: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match env_vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            },
        }
        rest = &after[end.saturating_add(1)..];
    }

    out.push_str(rest);
    out
}

fn coerce_to_toml_value(mapping: &EnvMapping, val: &str) -> ConfigResult<toml::Value> {
    if INTEGER_FIELDS.contains(&mapping.field_path) {
        return val
            .trim()
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected an integer: {e}"),
            });
    }
    Ok(toml::Value::String(val.to_owned()))
}

/// Set a dotted `path` in `root`, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

/// Snapshot of the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
