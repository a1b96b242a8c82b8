//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Settings::default()`]
//! 2. If `~/.taskboard/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `TASKBOARD_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{taskboard_dir, Settings};

/// Resolve the path to the settings file (`~/.taskboard/settings.json`).
pub fn settings_path() -> PathBuf {
    taskboard_dir().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<Settings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let mut settings = read_file_layer(path)?;
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Defaults with the file at `path` merged over them.
fn read_file_layer(path: &Path) -> Result<Settings> {
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_owned(),
            source,
        })?;
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
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `TASKBOARD_*` overrides read through `lookup`.
///
/// Empty values count as unset. Values that fail to parse are logged and
/// ignored, leaving the file/default value in place.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = read("TASKBOARD_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("TASKBOARD_PORT") {
        match parse_u16_range(&v, 1, 65535) {
            Some(port) => settings.server.port = port,
            None => warn!(key = "TASKBOARD_PORT", value = %v, "invalid port env var, ignoring"),
        }
    }
    if let Some(v) = read("TASKBOARD_DB") {
        settings.database.path = PathBuf::from(v);
    }
    if let Some(v) = read("TASKBOARD_COMPLETION_URL") {
        settings.completion.base_url = v;
    }
    if let Some(v) = read("TASKBOARD_MODEL") {
        settings.completion.model = v;
    }
    if let Some(v) = read("TASKBOARD_MAX_TOOL_CALLS") {
        match parse_usize_range(&v, 1, 64) {
            Some(n) => settings.completion.max_tool_calls = n,
            None => warn!(key = "TASKBOARD_MAX_TOOL_CALLS", value = %v, "invalid usize env var, ignoring"),
        }
    }
    if let Some(v) = read("TASKBOARD_STREAM_SUMMARY") {
        match parse_bool(&v) {
            Some(b) => settings.completion.stream_summary = b,
            None => warn!(key = "TASKBOARD_STREAM_SUMMARY", value = %v, "invalid boolean env var, ignoring"),
        }
    }
    if let Some(v) = read("TASKBOARD_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("TASKBOARD_LOG_JSON") {
        match parse_bool(&v) {
            Some(b) => settings.logging.json = b,
            None => warn!(key = "TASKBOARD_LOG_JSON", value = %v, "invalid boolean env var, ignoring"),
        }
    }
    if let Some(v) = read("TASKBOARD_API_KEY") {
        settings.completion.api_key = Some(SecretString::from(v.trim().to_string()));
    }
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.completion.max_tool_calls == 0 {
        return Err(SettingsError::invalid("completion.maxToolCalls", "must be at least 1"));
    }
    if settings.completion.base_url.trim().is_empty() {
        return Err(SettingsError::invalid("completion.baseUrl", "is empty"));
    }
    if settings.completion.model.trim().is_empty() {
        return Err(SettingsError::invalid("completion.model", "is empty"));
    }
    if settings.database.path.as_os_str().is_empty() {
        return Err(SettingsError::invalid("database.path", "is empty"));
    }
    Ok(())
}

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

pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
