//! Pluggable diagnostic sink.
//!
//! The client never surfaces connection or parsing problems to the UI
//! layer. It reports them here instead. [`TracingDiagnostics`] forwards to
//! `tracing`; [`RecordingDiagnostics`] keeps events in memory for tests.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use ridestream_core::{ConnectionId, TransportError};

use crate::client::ConnectionState;

/// Severity of a diagnostic event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// Routine state-machine chatter.
    Debug,
    /// Connection lifecycle.
    Info,
    /// Recoverable problem; the connection survives.
    Warn,
    /// The connection was lost.
    Error,
}

/// Why a connection was released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReleaseReason {
    /// Host called `deactivate` or bound no identity.
    Deactivated,
    /// A different principal was activated.
    IdentityChanged,
    /// The transport reported an error.
    TransportError,
    /// The client itself was dropped.
    ClientDropped,
}

impl ReleaseReason {
    /// Short name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deactivated => "deactivated",
            Self::IdentityChanged => "identity_changed",
            Self::TransportError => "transport_error",
            Self::ClientDropped => "client_dropped",
        }
    }
}

impl fmt::Display for ReleaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the client wants an operator to know about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// Activation was requested without a principal.
    ActivationSkipped,
    /// A connection was requested from the transport.
    ConnectionOpened {
        /// New connection.
        connection_id: ConnectionId,
        /// Subscription URL.
        target: String,
        /// Whether a credential was attached.
        authenticated: bool,
    },
    /// The server confirmed the stream.
    Established {
        /// Confirmed connection.
        connection_id: ConnectionId,
        /// Server greeting, if any.
        detail: Option<String>,
    },
    /// The host supplied a credential the transport cannot send.
    CredentialDropped {
        /// Connection that went out without it.
        connection_id: ConnectionId,
    },
    /// A notification body failed to decode and was dropped.
    MalformedPayload {
        /// Connection it arrived on.
        connection_id: ConnectionId,
        /// Decoder message.
        error: String,
        /// Truncated body.
        preview: String,
    },
    /// The transport failed. `connection_id` is `None` when `open` itself
    /// was refused.
    TransportFailed {
        /// Failed connection.
        connection_id: Option<ConnectionId>,
        /// The failure.
        error: TransportError,
    },
    /// A connection was torn down.
    ConnectionReleased {
        /// Released connection.
        connection_id: ConnectionId,
        /// Why.
        reason: ReleaseReason,
    },
    /// A signal arrived in a state that does not accept it.
    SignalIgnored {
        /// State at arrival.
        state: ConnectionState,
        /// Signal kind.
        kind: &'static str,
    },
}

impl DiagnosticEvent {
    /// Level this event is reported at.
    pub fn level(&self) -> DiagnosticLevel {
        match self {
            Self::ActivationSkipped | Self::SignalIgnored { .. } => DiagnosticLevel::Debug,
            Self::ConnectionOpened { .. }
            | Self::Established { .. }
            | Self::ConnectionReleased { .. } => DiagnosticLevel::Info,
            Self::CredentialDropped { .. } | Self::MalformedPayload { .. } => DiagnosticLevel::Warn,
            Self::TransportFailed { .. } => DiagnosticLevel::Error,
        }
    }
}

/// Receives diagnostic events from a client.
pub trait Diagnostics: Send + Sync {
    /// Record one event. Must not block.
    fn record(&self, event: DiagnosticEvent);
}

impl<D: Diagnostics + ?Sized> Diagnostics for Arc<D> {
    fn record(&self, event: DiagnosticEvent) {
        (**self).record(event);
    }
}

/// Forwards events to `tracing` with structured fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::ActivationSkipped => {
                debug!("activation skipped: no principal");
            }
            DiagnosticEvent::ConnectionOpened {
                connection_id,
                target,
                authenticated,
            } => {
                info!(%connection_id, %target, authenticated, "opening notification stream");
            }
            DiagnosticEvent::Established {
                connection_id,
                detail,
            } => {
                info!(%connection_id, detail = detail.as_deref(), "notification stream established");
            }
            DiagnosticEvent::CredentialDropped { connection_id } => {
                warn!(%connection_id, "transport cannot carry credential, connecting without it");
            }
            DiagnosticEvent::MalformedPayload {
                connection_id,
                error,
                preview,
            } => {
                warn!(%connection_id, %error, %preview, "dropping malformed notification");
            }
            DiagnosticEvent::TransportFailed {
                connection_id,
                error,
            } => {
                let connection_id = connection_id.as_ref().map(ConnectionId::as_str);
                error!(
                    connection_id,
                    error_kind = error.error_kind(),
                    auth_rejected = error.is_auth_rejection(),
                    %error,
                    "notification stream failed"
                );
            }
            DiagnosticEvent::ConnectionReleased {
                connection_id,
                reason,
            } => {
                info!(%connection_id, %reason, "notification stream released");
            }
            DiagnosticEvent::SignalIgnored { state, kind } => {
                debug!(?state, kind, "ignoring signal");
            }
        }
    }
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct RecordingDiagnostics {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl RecordingDiagnostics {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Number of events recorded at `level`.
    pub fn count_at_level(&self, level: DiagnosticLevel) -> usize {
        self.events.lock().iter().filter(|e| e.level() == level).count()
    }

    /// Release reasons recorded for `connection_id`.
    pub fn releases_for(&self, connection_id: &ConnectionId) -> Vec<ReleaseReason> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DiagnosticEvent::ConnectionReleased {
                    connection_id: id,
                    reason,
                } if id == connection_id => Some(*reason),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
