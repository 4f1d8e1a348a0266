//! # ridestream-client
//!
//! Real-time notification client for the ride-hailing gateway.
//!
//! [`NotificationStreamClient`] owns at most one server-push connection for
//! the currently authenticated principal. It folds inbound
//! [`StreamSignal`](ridestream_core::StreamSignal)s into an ordered
//! notification list the UI layer renders and dismisses from.
//!
//! - [`endpoint`]: subscription URL construction
//! - [`transport`]: the [`Transport`] seam; [`http`] is the SSE implementation,
//!   [`mock`] a scripted one for tests
//! - [`decode`]: event classification and payload decoding
//! - [`diagnostics`]: pluggable sink for connection and parsing events
//! - [`driver`]: a tokio task that binds the client to an identity source

#![deny(unsafe_code)]

pub mod client;
pub mod connection;
pub mod decode;
pub mod diagnostics;
pub mod driver;
pub mod endpoint;
pub mod http;
pub mod mock;
pub mod transport;

pub use client::{
    ActivationOutcome, BuildError, ConnectionState, NotificationStreamClient, SignalOutcome,
};
pub use diagnostics::{
    DiagnosticEvent, DiagnosticLevel, Diagnostics, RecordingDiagnostics, ReleaseReason,
    TracingDiagnostics,
};
pub use driver::{DriverHandle, NotificationDriver};
pub use endpoint::SubscriptionEndpoint;
pub use http::HttpTransport;
pub use mock::{MockConnection, MockTransport};
pub use transport::{ConnectRequest, SignalStream, Transport};
