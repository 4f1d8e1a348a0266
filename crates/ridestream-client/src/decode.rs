//! Event classification and notification payload decoding.
//!
//! The notification service emits two named events: `connected` with an
//! opaque greeting, and `notification` whose body is a JSON object
//! `{ "message": string, "type": string, "timestamp": string }`. Every field
//! is optional on the wire.

use serde::Deserialize;
use serde_json::Value;

use ridestream_core::{DecodeError, StreamSignal};

/// SSE event name of the server greeting.
pub const EVENT_CONNECTED: &str = "connected";
/// SSE event name of a domain notification.
pub const EVENT_NOTIFICATION: &str = "notification";

/// Map a named SSE event onto a signal. Unknown names yield `None`.
pub fn classify_event(name: &str, data: String) -> Option<StreamSignal> {
    match name {
        EVENT_CONNECTED => Some(StreamSignal::Established { detail: Some(data) }),
        EVENT_NOTIFICATION => Some(StreamSignal::Notification { data }),
        _ => None,
    }
}

/// Decoded fields of a `notification` body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedNotification {
    /// Display text, if the server sent one.
    pub message: Option<String>,
    /// Server category (`RIDE`, `PAYMENT`, ...).
    pub category: Option<String>,
    /// Server timestamp string.
    pub sent_at: Option<String>,
}

#[derive(Deserialize)]
struct NotificationPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    category: Option<String>,
    // The service formats this itself; tolerate whatever shape arrives.
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Decode a `notification` event body.
///
/// Fails when the body is not a JSON object or when `message`/`type` are
/// present with a non-string value.
pub fn decode_notification(data: &str) -> Result<DecodedNotification, DecodeError> {
    let payload: NotificationPayload = serde_json::from_str(data)?;
    Ok(DecodedNotification {
        message: payload.message,
        category: payload.category,
        sent_at: payload
            .timestamp
            .and_then(|v| v.as_str().map(str::to_owned)),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
