//! # ridestream-settings
//!
//! Configuration for the notification client, loaded from three layers
//! (in priority order):
//! 1. **Compiled defaults** — [`RideStreamSettings::default()`]
//! 2. **User file** — `~/.ridestream/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `RIDESTREAM_*` overrides (highest priority)
//!
//! Command-line flags, where a binary offers them, are applied on top by the
//! binary itself.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ClientSettings, LoggingSettings, RideStreamSettings};
