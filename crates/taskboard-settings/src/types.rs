//! Settings sections. Every section deserializes with defaults for missing keys.

use std::collections::BTreeMap;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub completion: CompletionSettings,
    pub logging: LoggingSettings,
}

/// HTTP bind address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// SQLite file holding the board.
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: taskboard_dir().join("taskboard.db"),
        }
    }
}

/// Completion gateway and interpreter knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionSettings {
    pub base_url: String,
    pub model: String,
    /// Tool calls executed per chat request before the rest are skipped.
    pub max_tool_calls: usize,
    /// Request the summary round as a server-sent event stream.
    pub stream_summary: bool,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gateway.lovable.dev/v1".to_string(),
            model: "google/gemini-3-flash-preview".to_string(),
            max_tool_calls: 8,
            stream_summary: false,
            api_key: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    /// Per-module level overrides, e.g. `{"taskboard_llm": "debug"}`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            modules: BTreeMap::new(),
        }
    }
}

/// `~/.taskboard`, falling back to `/tmp` when HOME is unset.
pub fn taskboard_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".taskboard")
}
