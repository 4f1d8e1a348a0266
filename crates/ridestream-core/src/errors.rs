//! Error taxonomy for the notification stream.
//!
//! None of these reach the UI layer. The client absorbs them and reports
//! them to its diagnostic sink:
//!
//! - [`DecodeError`]: a `notification` event whose body is not the expected
//!   JSON object. The event is dropped.
//! - [`TransportError`]: the push connection failed. The connection is
//!   closed and not retried.
//! - [`EndpointError`]: the configured base URL cannot carry the
//!   subscription path. Raised once, at construction.
//!
//! A missing principal is not an error; activation simply does nothing.

use thiserror::Error;

/// A notification payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Body is not JSON, or not an object of the expected shape.
    #[error("malformed notification payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure of the underlying push connection.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection could not be established (DNS, TCP, TLS).
    #[error("network error: {0}")]
    Network(String),
    /// Server answered the subscription request with a non-success status.
    #[error("subscription rejected with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// The event stream broke mid-flight.
    #[error("stream interrupted: {0}")]
    Stream(String),
    /// Server ended the stream.
    #[error("server closed the stream")]
    ServerClosed,
    /// Transport could not start a connection at all.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Status { .. } => "status",
            Self::Stream(_) => "stream",
            Self::ServerClosed => "server_closed",
            Self::Unavailable(_) => "unavailable",
        }
    }

    /// Whether the server refused the credential.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// The subscription base URL is unusable.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Not a parseable URL.
    #[error("invalid base url {url:?}: {reason}")]
    InvalidUrl {
        /// The offending input.
        url: String,
        /// Parser message.
        reason: String,
    },
    /// Parseable, but not an http(s) URL that can carry a path.
    #[error("unsupported base url {0:?}: expected an http or https url")]
    UnsupportedScheme(String),
}

/// Runtime failures the client absorbs.
#[derive(Debug, Error)]
pub enum StreamError {
    /// See [`DecodeError`].
    #[error(transparent)]
    MalformedPayload(#[from] DecodeError),
    /// See [`TransportError`].
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl StreamError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MalformedPayload(_) => "malformed_payload",
            Self::Transport(e) => e.error_kind(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
