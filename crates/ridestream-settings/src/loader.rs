//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RideStreamSettings::default()`]
//! 2. If `~/.ridestream/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `RIDESTREAM_*` environment overrides
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::RideStreamSettings;

/// Override: gateway base URL.
pub const ENV_BASE_URL: &str = "RIDESTREAM_BASE_URL";
/// Override: connect timeout in milliseconds (100..=600000).
pub const ENV_CONNECT_TIMEOUT_MS: &str = "RIDESTREAM_CONNECT_TIMEOUT_MS";
/// Override: signal channel capacity (1..=65536).
pub const ENV_CHANNEL_CAPACITY: &str = "RIDESTREAM_CHANNEL_CAPACITY";
/// Override: default log filter.
pub const ENV_LOG_LEVEL: &str = "RIDESTREAM_LOG_LEVEL";
/// Override: JSON log lines.
pub const ENV_LOG_JSON: &str = "RIDESTREAM_LOG_JSON";

/// Resolve the path to the settings file (`~/.ridestream/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".ridestream").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RideStreamSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<RideStreamSettings> {
    let mut settings = load_file_layer(path)?;
    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
fn load_file_layer(path: &Path) -> Result<RideStreamSettings> {
    let defaults = serde_json::to_value(RideStreamSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides read through `lookup` (normally the process environment).
///
/// Invalid values are ignored with a warning, leaving the file/default value.
pub fn apply_overrides<F>(settings: &mut RideStreamSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = read(ENV_BASE_URL) {
        settings.client.base_url = v;
    }
    if let Some(v) = read(ENV_CONNECT_TIMEOUT_MS) {
        match parse_u64_range(&v, 100, 600_000) {
            Some(ms) => settings.client.connect_timeout_ms = ms,
            None => warn!(key = ENV_CONNECT_TIMEOUT_MS, value = %v, "invalid u64 override, ignoring"),
        }
    }
    if let Some(v) = read(ENV_CHANNEL_CAPACITY) {
        match parse_usize_range(&v, 1, 65_536) {
            Some(n) => settings.client.channel_capacity = n,
            None => warn!(key = ENV_CHANNEL_CAPACITY, value = %v, "invalid usize override, ignoring"),
        }
    }
    if let Some(v) = read(ENV_LOG_LEVEL) {
        settings.logging.level = v;
    }
    if let Some(v) = read(ENV_LOG_JSON) {
        match parse_bool(&v) {
            Some(b) => settings.logging.json = b,
            None => warn!(key = ENV_LOG_JSON, value = %v, "invalid boolean override, ignoring"),
        }
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `usize` within an inclusive range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
