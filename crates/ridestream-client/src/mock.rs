//! Scripted transport for tests and demos.
//!
//! Every `open` call is recorded as a [`MockConnection`] whose sender side
//! lets the test push signals into the client as if they came from a
//! server.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use ridestream_core::{BearerToken, StreamSignal, TransportError};

use crate::transport::{ConnectRequest, SignalStream, Transport};

const MOCK_CHANNEL_CAPACITY: usize = 32;

/// Test handle on one opened connection.
#[derive(Clone, Debug)]
pub struct MockConnection {
    request: ConnectRequest,
    sender: mpsc::Sender<StreamSignal>,
    cancel: CancellationToken,
}

impl MockConnection {
    /// The request the client made.
    pub fn request(&self) -> &ConnectRequest {
        &self.request
    }

    /// Subscription URL.
    pub fn target(&self) -> &Url {
        &self.request.target
    }

    /// Whether a credential was attached.
    pub fn has_credential(&self) -> bool {
        self.request.credential.is_some()
    }

    /// Push a signal. Returns `false` once the client released the
    /// connection or the buffer is full.
    pub fn send(&self, signal: StreamSignal) -> bool {
        self.sender.try_send(signal).is_ok()
    }

    /// Push a `notification` body.
    pub fn notify(&self, data: impl Into<String>) -> bool {
        self.send(StreamSignal::notification(data))
    }

    /// Push an `Established` signal.
    pub fn establish(&self) -> bool {
        self.send(StreamSignal::Established { detail: None })
    }

    /// Push an error.
    pub fn fail(&self, error: TransportError) -> bool {
        self.send(StreamSignal::Error(error))
    }

    /// Whether the client still holds this connection.
    pub fn is_live(&self) -> bool {
        !self.sender.is_closed() && !self.cancel.is_cancelled()
    }

    /// Whether the client cancelled this connection.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct MockState {
    opened: Vec<MockConnection>,
}

/// In-memory [`Transport`].
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    rejects_credentials: bool,
    open_error: Option<TransportError>,
}

impl MockTransport {
    /// Transport that accepts every request.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport that cannot carry credentials.
    pub fn rejecting_credentials() -> Arc<Self> {
        Arc::new(Self {
            rejects_credentials: true,
            ..Self::default()
        })
    }

    /// Transport whose `open` always fails with `error`.
    pub fn failing(error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            open_error: Some(error),
            ..Self::default()
        })
    }

    /// Number of successful `open` calls.
    pub fn open_count(&self) -> usize {
        self.state.lock().opened.len()
    }

    /// Handle on the `index`-th opened connection.
    pub fn connection(&self, index: usize) -> Option<MockConnection> {
        self.state.lock().opened.get(index).cloned()
    }

    /// Handle on the most recently opened connection.
    pub fn last_connection(&self) -> Option<MockConnection> {
        self.state.lock().opened.last().cloned()
    }

    /// Number of connections the client still holds.
    pub fn live_connections(&self) -> usize {
        self.state.lock().opened.iter().filter(|c| c.is_live()).count()
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    fn accepts_credential(&self, _credential: &BearerToken) -> bool {
        !self.rejects_credentials
    }

    fn open(
        &self,
        request: ConnectRequest,
        cancel: CancellationToken,
    ) -> Result<SignalStream, TransportError> {
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        let (sender, receiver) = mpsc::channel(MOCK_CHANNEL_CAPACITY);
        self.state.lock().opened.push(MockConnection {
            request,
            sender,
            cancel,
        });
        Ok(Box::pin(ReceiverStream::new(receiver)))
    }
}
