//! Settings type definitions.
//!
//! Field names are camelCase on disk. Every struct is `#[serde(default)]`, so
//! a partial file only overrides what it names.

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "client": { "baseUrl": "https://rides.example.com", "connectTimeoutMs": 5000 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RideStreamSettings {
    /// Notification stream connection settings.
    pub client: ClientSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Notification stream connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Gateway base URL; the subscription path is appended to it.
    pub base_url: String,
    /// TCP/TLS connect timeout for the push connection. There is no idle
    /// timeout: a quiet stream stays open until it errors or is released.
    pub connect_timeout_ms: u64,
    /// Capacity of the per-connection signal channel.
    pub channel_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout_ms: 10_000,
            channel_capacity: 64,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
