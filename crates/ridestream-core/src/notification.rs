//! Notification value objects and the session-local notification list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NotificationId;

/// Message used when the server payload carries none.
pub const DEFAULT_MESSAGE: &str = "New notification";

/// Presentation class of a notification.
///
/// This is a closed set. New server categories map onto one of these
/// variants in [`Severity::from_category`]; they never add a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Ride and payment events.
    Success,
    /// Everything else.
    Info,
}

impl Severity {
    /// Map a server-supplied category onto a severity.
    ///
    /// Matching is exact and case-sensitive, the way the notification
    /// service spells its categories (`RIDE`, `PAYMENT`).
    #[must_use]
    pub fn from_category(category: Option<&str>) -> Self {
        match category {
            Some("RIDE" | "PAYMENT") => Self::Success,
            _ => Self::Info,
        }
    }

    /// Lowercase name, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification, immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: NotificationId,
    message: String,
    severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sent_at: Option<String>,
    received_at: DateTime<Utc>,
}

impl Notification {
    /// Build a notification from decoded payload fields.
    ///
    /// A missing or empty `message` becomes [`DEFAULT_MESSAGE`]; the severity
    /// is derived from `category`.
    #[must_use]
    pub fn new(
        id: NotificationId,
        message: Option<String>,
        category: Option<String>,
        sent_at: Option<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned());
        let severity = Severity::from_category(category.as_deref());
        Self {
            id,
            message,
            severity,
            category,
            sent_at,
            received_at,
        }
    }

    /// Removal handle.
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Human-readable text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Presentation class.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Raw server category (`RIDE`, `PAYMENT`, ...), if one was sent.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Server-side timestamp string, passed through verbatim.
    pub fn sent_at(&self) -> Option<&str> {
        self.sent_at.as_deref()
    }

    /// When the client decoded this notification.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// Ordered notification list owned by one client.
///
/// Insertion order is display order. Ids are unique at all times: pushing a
/// notification whose id is already present replaces nothing and is refused.
#[derive(Clone, Debug, Default)]
pub struct NotificationList {
    items: Vec<Notification>,
}

impl NotificationList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification. Returns `false` if its id is already present.
    pub fn push(&mut self, notification: Notification) -> bool {
        if self.contains(notification.id()) {
            return false;
        }
        self.items.push(notification);
        true
    }

    /// Remove by id. Idempotent: returns `false` when nothing matched.
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id() != id);
        self.items.len() != before
    }

    /// Whether a notification with this id is present.
    pub fn contains(&self, id: NotificationId) -> bool {
        self.items.iter().any(|n| n.id() == id)
    }

    /// Discard every notification.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Notifications in display order.
    pub fn as_slice(&self) -> &[Notification] {
        &self.items
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a NotificationList {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
