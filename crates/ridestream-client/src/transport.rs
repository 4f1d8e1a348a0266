//! The push-transport seam.
//!
//! A transport turns a [`ConnectRequest`] into a stream of
//! [`StreamSignal`]s. It must stop producing, and drop whatever socket it
//! holds, once the request's [`CancellationToken`] is cancelled.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use ridestream_core::{BearerToken, ConnectionId, StreamSignal, TransportError};

/// Inbound signals of one connection.
pub type SignalStream = Pin<Box<dyn Stream<Item = StreamSignal> + Send>>;

/// Everything a transport needs to open one connection.
#[derive(Clone, Debug)]
pub struct ConnectRequest {
    /// Id the client assigned to this connection.
    pub connection_id: ConnectionId,
    /// Fully built subscription URL.
    pub target: Url,
    /// Credential to attach. `None` when the host has none or the transport
    /// declined it.
    pub credential: Option<BearerToken>,
}

/// Opens push-stream connections.
///
/// `open` must not block: connection set-up happens in the background and
/// its failures arrive as [`StreamSignal::Error`]. An `Err` return means the
/// transport could not even start.
pub trait Transport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Whether `credential` can be attached to a connection.
    ///
    /// Returning `false` makes the client connect without it. Browser-style
    /// push transports cannot send custom headers at all.
    fn accepts_credential(&self, _credential: &BearerToken) -> bool {
        true
    }

    /// Start a connection.
    fn open(
        &self,
        request: ConnectRequest,
        cancel: CancellationToken,
    ) -> Result<SignalStream, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn accepts_credential(&self, credential: &BearerToken) -> bool {
        (**self).accepts_credential(credential)
    }

    fn open(
        &self,
        request: ConnectRequest,
        cancel: CancellationToken,
    ) -> Result<SignalStream, TransportError> {
        (**self).open(request, cancel)
    }
}
