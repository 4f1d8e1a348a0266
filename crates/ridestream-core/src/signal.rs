use crate::errors::TransportError;

/// One inbound event from a push connection.
///
/// Every transport reduces its wire protocol to this union so the client's
/// state machine can be driven, and tested, without a network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSignal {
    /// The stream is open. `detail` carries the server's `connected` payload
    /// when the signal came from that event rather than from the response
    /// headers.
    Established {
        /// Opaque diagnostic text.
        detail: Option<String>,
    },
    /// A domain `notification` event with its raw body.
    Notification {
        /// Undecoded event data.
        data: String,
    },
    /// The connection failed.
    Error(TransportError),
}

impl StreamSignal {
    /// Convenience constructor for a notification body.
    pub fn notification(data: impl Into<String>) -> Self {
        Self::Notification { data: data.into() }
    }

    /// Whether this signal ends the connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Established { .. } => "established",
            Self::Notification { .. } => "notification",
            Self::Error(_) => "error",
        }
    }
}
