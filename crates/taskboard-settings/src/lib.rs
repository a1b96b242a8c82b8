//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`Settings::default()`]
//! 2. **User file**: `~/.taskboard/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TASKBOARD_*` overrides (highest priority)
//!
//! The completion credential only ever comes from `TASKBOARD_API_KEY`.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
