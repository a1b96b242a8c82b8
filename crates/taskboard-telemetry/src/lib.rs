//! Tracing subscriber setup for the taskboard binary.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "taskboard_llm" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Build from level names as they appear in settings.
    ///
    /// Names that do not parse are returned as `(target, name)` pairs; the
    /// default level falls back to INFO and bad module entries are dropped.
    pub fn from_names<'a>(
        level: &str,
        modules: impl IntoIterator<Item = (&'a str, &'a str)>,
        json: bool,
    ) -> (Self, Vec<(String, String)>) {
        let mut rejected = Vec::new();
        let log_level = parse_level(level).unwrap_or_else(|| {
            rejected.push(("default".to_string(), level.to_string()));
            Level::INFO
        });
        let mut module_levels = Vec::new();
        for (module, name) in modules {
            match parse_level(name) {
                Some(l) => module_levels.push((module.to_string(), l)),
                None => rejected.push((module.to_string(), name.to_string())),
            }
        }
        let config = Self {
            log_level,
            module_levels,
            json,
        };
        (config, rejected)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Parse a level name such as `"debug"` or `"WARN"`.
pub fn parse_level(s: &str) -> Option<Level> {
    s.trim().parse().ok()
}

/// Directive string handed to `EnvFilter` when RUST_LOG is unset.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let mut filter = config.log_level.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        filter.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
    }
    filter
}

/// Initialize the global subscriber. Call once at startup.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    let directives = filter_directives(&config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).try_init()?;
    Ok(())
}
