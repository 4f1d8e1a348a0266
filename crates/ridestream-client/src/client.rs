//! The notification stream state machine.
//!
//! ```text
//!            activate            Established
//!   Idle ──────────────▶ Connecting ─────────▶ Connected
//!    ▲                       │                    │
//!    │                       └──── Error ─────────┴──▶ Closed
//!    │                                                  │
//!    └──────────── deactivate / identity change ────────┘
//! ```
//!
//! There is no automatic `Closed → Connecting`: a failed stream stays closed
//! until the host binds a different identity or deactivates and activates
//! again.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use ridestream_core::text::preview;
use ridestream_core::{
    ConnectionId, EndpointError, Identity, Notification, NotificationId, NotificationList,
    Principal, StreamError, StreamSignal, TransportError,
};
use ridestream_settings::ClientSettings;

use crate::connection::Connection;
use crate::decode::decode_notification;
use crate::diagnostics::{DiagnosticEvent, Diagnostics, ReleaseReason, TracingDiagnostics};
use crate::endpoint::SubscriptionEndpoint;
use crate::http::HttpTransport;
use crate::transport::{ConnectRequest, Transport};

/// Longest payload excerpt carried by a malformed-payload diagnostic.
const PAYLOAD_PREVIEW_BYTES: usize = 200;

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No identity bound.
    #[default]
    Idle,
    /// Connection requested, server not yet confirmed.
    Connecting,
    /// Server confirmed the stream.
    Connected,
    /// The stream failed and was released.
    Closed,
}

impl ConnectionState {
    /// Short name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`NotificationStreamClient::activate`] and
/// [`NotificationStreamClient::bind_identity`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// No principal; nothing happened.
    Skipped,
    /// The principal is already bound; the existing connection (or closed
    /// state) is kept.
    Unchanged,
    /// A new connection was requested.
    Opened(ConnectionId),
    /// The transport refused to open; the client is `Closed`.
    Failed(TransportError),
    /// The bound identity went away and the client was deactivated.
    Released,
}

/// Result of [`NotificationStreamClient::handle_signal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Not accepted in the current state.
    Ignored,
    /// The connection is confirmed.
    Established,
    /// A notification was appended.
    Appended(NotificationId),
    /// A malformed notification was dropped.
    Dropped,
    /// The connection failed and was released.
    Closed,
}

/// Failure to build a client from settings.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Base URL is unusable.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// HTTP transport could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Owns at most one push connection and the notification list fed by it.
pub struct NotificationStreamClient {
    endpoint: SubscriptionEndpoint,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
    state: ConnectionState,
    principal: Option<Principal>,
    connection: Option<Connection>,
    notifications: NotificationList,
    next_id: u64,
    last_error: Option<StreamError>,
}

impl NotificationStreamClient {
    /// Client over `transport`, reporting to `tracing`.
    pub fn new(endpoint: SubscriptionEndpoint, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            transport,
            diagnostics: Arc::new(TracingDiagnostics),
            state: ConnectionState::Idle,
            principal: None,
            connection: None,
            notifications: NotificationList::new(),
            next_id: 1,
            last_error: None,
        }
    }

    /// Client with the SSE transport configured from `settings`.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, BuildError> {
        let endpoint = SubscriptionEndpoint::new(&settings.base_url)?;
        let transport = HttpTransport::from_settings(settings)?;
        Ok(Self::new(endpoint, Arc::new(transport)))
    }

    /// Replace the diagnostic sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Current notifications, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        self.notifications.as_slice()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Bound principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Id of the live connection, if any.
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        self.connection.as_ref().map(Connection::id)
    }

    /// Subscription endpoint.
    pub fn endpoint(&self) -> &SubscriptionEndpoint {
        &self.endpoint
    }

    /// Most recent error absorbed since the current identity was bound.
    pub fn last_error(&self) -> Option<&StreamError> {
        self.last_error.as_ref()
    }

    // ── Identity ────────────────────────────────────────────────────────

    /// Open a stream for `identity`.
    ///
    /// Re-activating the bound principal is a no-op, even when only the
    /// credential changed. A different principal releases the previous
    /// connection and discards its notifications first.
    pub fn activate(&mut self, identity: Option<Identity>) -> ActivationOutcome {
        let Some(identity) = identity else {
            self.diagnostics.record(DiagnosticEvent::ActivationSkipped);
            return ActivationOutcome::Skipped;
        };
        if self.principal.as_ref() == Some(&identity.principal) {
            return ActivationOutcome::Unchanged;
        }

        self.release_connection(ReleaseReason::IdentityChanged);
        self.notifications.clear();
        self.open(identity)
    }

    /// Release the connection, discard notifications and forget the
    /// principal. Safe to call any number of times.
    pub fn deactivate(&mut self) {
        self.release_connection(ReleaseReason::Deactivated);
        self.notifications.clear();
        self.principal = None;
        self.last_error = None;
        self.state = ConnectionState::Idle;
    }

    /// Follow the host's auth context: activate for `Some`, deactivate when
    /// a bound identity becomes `None`.
    pub fn bind_identity(&mut self, identity: Option<Identity>) -> ActivationOutcome {
        if identity.is_none() && (self.principal.is_some() || self.connection.is_some()) {
            self.deactivate();
            return ActivationOutcome::Released;
        }
        self.activate(identity)
    }

    fn open(&mut self, identity: Identity) -> ActivationOutcome {
        let connection_id = ConnectionId::new();
        let target = self.endpoint.target_for(&identity.principal);
        let credential = match identity.credential {
            Some(token) if self.transport.accepts_credential(&token) => Some(token),
            Some(_) => {
                self.diagnostics.record(DiagnosticEvent::CredentialDropped {
                    connection_id: connection_id.clone(),
                });
                None
            }
            None => None,
        };
        let authenticated = credential.is_some();
        self.principal = Some(identity.principal);
        self.last_error = None;

        let cancel = CancellationToken::new();
        let request = ConnectRequest {
            connection_id: connection_id.clone(),
            target: target.clone(),
            credential,
        };
        match self.transport.open(request, cancel.clone()) {
            Ok(signals) => {
                self.diagnostics.record(DiagnosticEvent::ConnectionOpened {
                    connection_id: connection_id.clone(),
                    target: target.to_string(),
                    authenticated,
                });
                self.connection = Some(Connection::new(
                    connection_id.clone(),
                    target,
                    signals,
                    cancel,
                ));
                self.state = ConnectionState::Connecting;
                ActivationOutcome::Opened(connection_id)
            }
            Err(error) => {
                self.diagnostics.record(DiagnosticEvent::TransportFailed {
                    connection_id: None,
                    error: error.clone(),
                });
                self.last_error = Some(StreamError::Transport(error.clone()));
                self.state = ConnectionState::Closed;
                ActivationOutcome::Failed(error)
            }
        }
    }

    fn release_connection(&mut self, reason: ReleaseReason) {
        if let Some(connection) = self.connection.take() {
            let connection_id = connection.release();
            self.diagnostics.record(DiagnosticEvent::ConnectionReleased {
                connection_id,
                reason,
            });
        }
    }

    // ── Signals ─────────────────────────────────────────────────────────

    /// Apply one inbound signal to the state machine.
    pub fn handle_signal(&mut self, signal: StreamSignal) -> SignalOutcome {
        let connection_id = match (self.state, &self.connection) {
            (ConnectionState::Connecting | ConnectionState::Connected, Some(connection)) => {
                connection.id().clone()
            }
            _ => {
                self.diagnostics.record(DiagnosticEvent::SignalIgnored {
                    state: self.state,
                    kind: signal.kind(),
                });
                return SignalOutcome::Ignored;
            }
        };

        match signal {
            StreamSignal::Established { detail } => {
                self.state = ConnectionState::Connected;
                self.diagnostics.record(DiagnosticEvent::Established {
                    connection_id,
                    detail,
                });
                SignalOutcome::Established
            }
            StreamSignal::Notification { data } => match decode_notification(&data) {
                Ok(decoded) => {
                    let id = NotificationId::from_raw(self.next_id);
                    self.next_id += 1;
                    let appended = self.notifications.push(Notification::new(
                        id,
                        decoded.message,
                        decoded.category,
                        decoded.sent_at,
                        Utc::now(),
                    ));
                    debug_assert!(appended, "notification ids are allocated once");
                    SignalOutcome::Appended(id)
                }
                Err(error) => {
                    self.diagnostics.record(DiagnosticEvent::MalformedPayload {
                        connection_id,
                        error: error.to_string(),
                        preview: preview(&data, PAYLOAD_PREVIEW_BYTES),
                    });
                    self.last_error = Some(error.into());
                    SignalOutcome::Dropped
                }
            },
            StreamSignal::Error(error) => {
                self.diagnostics.record(DiagnosticEvent::TransportFailed {
                    connection_id: Some(connection_id),
                    error: error.clone(),
                });
                self.last_error = Some(error.into());
                self.release_connection(ReleaseReason::TransportError);
                self.state = ConnectionState::Closed;
                SignalOutcome::Closed
            }
        }
    }

    /// Wait for the next signal of the live connection. Pends forever when
    /// there is none.
    pub async fn next_signal(&mut self) -> StreamSignal {
        match self.connection.as_mut() {
            Some(connection) => connection.next_signal().await,
            None => std::future::pending().await,
        }
    }

    /// Wait for one signal and apply it.
    pub async fn pump(&mut self) -> SignalOutcome {
        let signal = self.next_signal().await;
        self.handle_signal(signal)
    }

    // ── Consumer ────────────────────────────────────────────────────────

    /// Remove a notification. Returns whether it was present.
    pub fn remove_notification(&mut self, id: NotificationId) -> bool {
        self.notifications.remove(id)
    }
}

impl Drop for NotificationStreamClient {
    fn drop(&mut self) {
        self.release_connection(ReleaseReason::ClientDropped);
    }
}

impl fmt::Debug for NotificationStreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationStreamClient")
            .field("transport", &self.transport.name())
            .field("state", &self.state)
            .field("principal", &self.principal)
            .field("connection", &self.connection)
            .field("notifications", &self.notifications.len())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticLevel, RecordingDiagnostics};
    use crate::mock::MockTransport;
    use assert_matches::assert_matches;
    use ridestream_core::{BearerToken, Severity};

    struct Harness {
        client: NotificationStreamClient,
        transport: Arc<MockTransport>,
        diagnostics: RecordingDiagnostics,
    }

    fn harness_with(transport: Arc<MockTransport>) -> Harness {
        let diagnostics = RecordingDiagnostics::new();
        let endpoint = SubscriptionEndpoint::new("http://localhost:8080").unwrap();
        let client = NotificationStreamClient::new(endpoint, transport.clone())
            .with_diagnostics(Arc::new(diagnostics.clone()));
        Harness {
            client,
            transport,
            diagnostics,
        }
    }

    fn harness() -> Harness {
        harness_with(MockTransport::new())
    }

    fn identity(address: &str) -> Identity {
        Identity::anonymous(Principal::parse(address).unwrap())
    }

    fn identity_with_token(address: &str, token: &str) -> Identity {
        Identity::with_credential(Principal::parse(address).unwrap(), BearerToken::parse(token))
    }

    fn appended(outcome: SignalOutcome) -> NotificationId {
        match outcome {
            SignalOutcome::Appended(id) => id,
            other => panic!("expected Appended, got {other:?}"),
        }
    }

    // ── activation ──────────────────────────────────────────────────

    #[test]
    fn activate_without_identity_is_noop() {
        let mut h = harness();
        assert_eq!(h.client.activate(None), ActivationOutcome::Skipped);
        assert_eq!(h.client.state(), ConnectionState::Idle);
        assert_eq!(h.transport.open_count(), 0);
        assert!(h.client.notifications().is_empty());
        assert_eq!(h.diagnostics.events(), vec![DiagnosticEvent::ActivationSkipped]);
    }

    #[test]
    fn activate_opens_encoded_target_with_credential() {
        let mut h = harness();
        let outcome = h.client.activate(Some(identity_with_token("rider@example.com", "jwt")));

        let connection_id = assert_matches!(outcome, ActivationOutcome::Opened(id) => id);
        assert_eq!(h.client.connection_id(), Some(&connection_id));
        assert_eq!(h.client.state(), ConnectionState::Connecting);

        let conn = h.transport.last_connection().unwrap();
        assert_eq!(
            conn.target().as_str(),
            "http://localhost:8080/api/notifications/subscribe/rider%40example.com"
        );
        assert!(conn.has_credential());
        assert_eq!(conn.request().connection_id, connection_id);
    }

    #[test]
    fn same_principal_does_not_reconnect() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("rider@example.com")));
        let outcome = h.client.activate(Some(identity_with_token("rider@example.com", "rotated")));

        assert_eq!(outcome, ActivationOutcome::Unchanged);
        assert_eq!(h.transport.open_count(), 1);
        assert_eq!(h.transport.live_connections(), 1);
    }

    #[test]
    fn identity_change_keeps_at_most_one_live_connection() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        assert_eq!(h.transport.live_connections(), 1);
        let first = h.transport.connection(0).unwrap();
        let _ = h.client.handle_signal(StreamSignal::notification(r#"{"message":"old"}"#));

        let _ = h.client.activate(Some(identity("b@example.com")));
        assert_eq!(h.transport.open_count(), 2);
        assert_eq!(h.transport.live_connections(), 1);
        assert!(first.is_cancelled());
        assert!(h.transport.last_connection().unwrap().is_live());
        assert!(h.client.notifications().is_empty());
        assert_eq!(h.client.principal().map(Principal::address), Some("b@example.com"));

        let first_id = first.request().connection_id.clone();
        assert_eq!(
            h.diagnostics.releases_for(&first_id),
            vec![ReleaseReason::IdentityChanged]
        );
    }

    #[test]
    fn credential_dropped_when_transport_declines_it() {
        let mut h = harness_with(MockTransport::rejecting_credentials());
        let outcome = h.client.activate(Some(identity_with_token("a@example.com", "jwt")));

        assert_matches!(outcome, ActivationOutcome::Opened(_));
        assert!(!h.transport.last_connection().unwrap().has_credential());
        assert_eq!(h.diagnostics.count_at_level(DiagnosticLevel::Warn), 1);
        assert!(
            h.diagnostics
                .events()
                .iter()
                .any(|e| matches!(e, DiagnosticEvent::CredentialDropped { .. }))
        );
    }

    #[test]
    fn refused_open_closes_client() {
        let mut h = harness_with(MockTransport::failing(TransportError::Unavailable(
            "no runtime".into(),
        )));
        let outcome = h.client.activate(Some(identity("a@example.com")));

        assert_matches!(outcome, ActivationOutcome::Failed(TransportError::Unavailable(_)));
        assert_eq!(h.client.state(), ConnectionState::Closed);
        assert!(h.client.connection_id().is_none());
        assert_eq!(h.diagnostics.count_at_level(DiagnosticLevel::Error), 1);
    }

    // ── signals ─────────────────────────────────────────────────────

    #[test]
    fn established_moves_to_connected() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));

        assert_eq!(
            h.client.handle_signal(StreamSignal::Established { detail: None }),
            SignalOutcome::Established
        );
        assert_eq!(h.client.state(), ConnectionState::Connected);

        let again = StreamSignal::Established {
            detail: Some("connected".into()),
        };
        assert_eq!(h.client.handle_signal(again), SignalOutcome::Established);
        assert_eq!(h.client.state(), ConnectionState::Connected);
    }

    #[test]
    fn notifications_are_appended_in_order() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));

        let first = appended(h.client.handle_signal(StreamSignal::notification(
            r#"{"message":"Driver assigned","type":"RIDE","timestamp":"2025-03-01T08:15:30"}"#,
        )));
        let second = appended(
            h.client
                .handle_signal(StreamSignal::notification(r#"{"message":"Promo"}"#)),
        );

        assert!(first < second);
        let list = h.client.notifications();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].message(), "Driver assigned");
        assert_eq!(list[0].category(), Some("RIDE"));
        assert_eq!(list[0].sent_at(), Some("2025-03-01T08:15:30"));
        assert_eq!(list[1].message(), "Promo");
    }

    #[test]
    fn severity_mapping() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));

        for body in [
            r#"{"message":"m","type":"RIDE"}"#,
            r#"{"message":"m","type":"PAYMENT"}"#,
            r#"{"message":"m","type":"PROMO"}"#,
            r#"{"message":"m"}"#,
        ] {
            let _ = appended(h.client.handle_signal(StreamSignal::notification(body)));
        }

        let severities: Vec<Severity> =
            h.client.notifications().iter().map(Notification::severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Success, Severity::Success, Severity::Info, Severity::Info]
        );
    }

    #[test]
    fn missing_message_uses_default() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let _ = appended(
            h.client
                .handle_signal(StreamSignal::notification(r#"{"type":"PAYMENT"}"#)),
        );

        let n = &h.client.notifications()[0];
        assert_eq!(n.message(), "New notification");
        assert_eq!(n.severity(), Severity::Success);
    }

    #[test]
    fn malformed_payload_is_dropped_with_warning() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));

        assert_eq!(
            h.client.handle_signal(StreamSignal::notification("not json")),
            SignalOutcome::Dropped
        );
        assert!(h.client.notifications().is_empty());
        assert_eq!(h.client.state(), ConnectionState::Connecting);
        assert_eq!(h.transport.live_connections(), 1);
        assert_matches!(h.client.last_error(), Some(StreamError::MalformedPayload(_)));

        let warning = h
            .diagnostics
            .events()
            .into_iter()
            .find(|e| e.level() == DiagnosticLevel::Warn)
            .unwrap();
        assert_matches!(
            warning,
            DiagnosticEvent::MalformedPayload { preview, .. } if preview == "not json"
        );
    }

    #[test]
    fn error_closes_and_later_signals_are_ignored() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let conn = h.transport.last_connection().unwrap();

        assert_eq!(
            h.client
                .handle_signal(StreamSignal::Error(TransportError::Stream("reset".into()))),
            SignalOutcome::Closed
        );
        assert_eq!(h.client.state(), ConnectionState::Closed);
        assert!(conn.is_cancelled());
        assert!(h.client.connection_id().is_none());
        assert_matches!(
            h.client.last_error(),
            Some(StreamError::Transport(TransportError::Stream(_)))
        );

        assert_eq!(
            h.client.handle_signal(StreamSignal::notification(r#"{"message":"late"}"#)),
            SignalOutcome::Ignored
        );
        assert!(h.client.notifications().is_empty());

        // Same principal again: still closed, no reconnect.
        assert_eq!(
            h.client.activate(Some(identity("a@example.com"))),
            ActivationOutcome::Unchanged
        );
        assert_eq!(h.transport.open_count(), 1);
        assert_eq!(h.client.state(), ConnectionState::Closed);
    }

    #[test]
    fn closed_keeps_notifications_until_teardown() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let _ = h.client.handle_signal(StreamSignal::notification(r#"{"message":"kept"}"#));
        let _ = h.client.handle_signal(StreamSignal::Error(TransportError::ServerClosed));

        assert_eq!(h.client.notifications().len(), 1);
    }

    #[test]
    fn signals_while_idle_are_ignored() {
        let mut h = harness();
        assert_eq!(
            h.client.handle_signal(StreamSignal::Established { detail: None }),
            SignalOutcome::Ignored
        );
        assert_eq!(h.client.state(), ConnectionState::Idle);
        assert_eq!(h.diagnostics.count_at_level(DiagnosticLevel::Debug), 1);
    }

    // ── removal ─────────────────────────────────────────────────────

    #[test]
    fn remove_notification_is_idempotent() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let a = appended(h.client.handle_signal(StreamSignal::notification(r#"{"message":"a"}"#)));
        let b = appended(h.client.handle_signal(StreamSignal::notification(r#"{"message":"b"}"#)));

        assert!(h.client.remove_notification(a));
        assert!(!h.client.remove_notification(a));
        assert_eq!(h.client.notifications().len(), 1);
        assert_eq!(h.client.notifications()[0].id(), b);
        assert!(!h.client.remove_notification(NotificationId::from_raw(999)));
    }

    #[test]
    fn ids_are_not_reused_across_activations() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let first = appended(h.client.handle_signal(StreamSignal::notification("{}")));

        h.client.deactivate();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let second = appended(h.client.handle_signal(StreamSignal::notification("{}")));

        assert_ne!(first, second);
        assert!(!h.client.remove_notification(first));
        assert!(h.client.remove_notification(second));
    }

    // ── teardown ────────────────────────────────────────────────────

    #[test]
    fn deactivate_releases_exactly_once() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let _ = h.client.handle_signal(StreamSignal::notification("{}"));
        let connection_id = h.client.connection_id().cloned().unwrap();

        h.client.deactivate();
        h.client.deactivate();

        assert_eq!(h.client.state(), ConnectionState::Idle);
        assert!(h.client.principal().is_none());
        assert!(h.client.notifications().is_empty());
        assert!(h.client.last_error().is_none());
        assert_eq!(h.transport.live_connections(), 0);
        assert_eq!(
            h.diagnostics.releases_for(&connection_id),
            vec![ReleaseReason::Deactivated]
        );
    }

    #[test]
    fn bind_identity_follows_auth_context() {
        let mut h = harness();
        assert_eq!(h.client.bind_identity(None), ActivationOutcome::Skipped);

        let opened = h.client.bind_identity(Some(identity("a@example.com")));
        assert_matches!(opened, ActivationOutcome::Opened(_));
        assert_eq!(
            h.client.bind_identity(Some(identity("a@example.com"))),
            ActivationOutcome::Unchanged
        );

        assert_eq!(h.client.bind_identity(None), ActivationOutcome::Released);
        assert_eq!(h.client.state(), ConnectionState::Idle);
        assert_eq!(h.transport.live_connections(), 0);
        assert_eq!(h.client.bind_identity(None), ActivationOutcome::Skipped);
    }

    #[test]
    fn drop_releases_connection() {
        let Harness {
            mut client,
            transport,
            diagnostics,
        } = harness();
        let _ = client.activate(Some(identity("a@example.com")));
        let connection_id = client.connection_id().cloned().unwrap();

        drop(client);
        assert_eq!(transport.live_connections(), 0);
        assert_eq!(
            diagnostics.releases_for(&connection_id),
            vec![ReleaseReason::ClientDropped]
        );
    }

    // ── async pump ──────────────────────────────────────────────────

    #[tokio::test]
    async fn pump_applies_pushed_signals() {
        let mut h = harness();
        let _ = h.client.activate(Some(identity("a@example.com")));
        let conn = h.transport.last_connection().unwrap();

        assert!(conn.establish());
        assert!(conn.notify(r#"{"message":"Your driver is here","type":"RIDE"}"#));
        assert!(conn.fail(TransportError::ServerClosed));

        assert_eq!(h.client.pump().await, SignalOutcome::Established);
        let _ = appended(h.client.pump().await);
        assert_eq!(h.client.pump().await, SignalOutcome::Closed);

        assert_eq!(h.client.state(), ConnectionState::Closed);
        assert_eq!(h.client.notifications()[0].message(), "Your driver is here");
        assert!(!conn.notify("{}"));
    }

    #[tokio::test(start_paused = true)]
    async fn next_signal_pends_without_connection() {
        let mut h = harness();
        let waited =
            tokio::time::timeout(std::time::Duration::from_secs(5), h.client.next_signal()).await;
        assert!(waited.is_err());
    }
}
