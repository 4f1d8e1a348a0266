//! A live push connection.
//!
//! [`Connection`] owns the signal stream and the cancellation token for one
//! transport connection. Releasing it consumes it, so a connection can be
//! released at most once. Dropping it without an explicit release still
//! cancels the transport.

use futures::StreamExt;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use ridestream_core::{ConnectionId, StreamSignal, TransportError};

use crate::transport::SignalStream;

/// One open transport connection.
pub struct Connection {
    id: ConnectionId,
    target: Url,
    signals: SignalStream,
    cancel: CancellationToken,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        target: Url,
        signals: SignalStream,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            target,
            signals,
            cancel,
        }
    }

    /// Connection id.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Subscription URL.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Next inbound signal. A stream that ends without an error reads as
    /// [`TransportError::ServerClosed`].
    pub async fn next_signal(&mut self) -> StreamSignal {
        match self.signals.next().await {
            Some(signal) => signal,
            None => StreamSignal::Error(TransportError::ServerClosed),
        }
    }

    /// Cancel the transport and drop the stream.
    pub fn release(self) -> ConnectionId {
        self.cancel.cancel();
        self.id.clone()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("target", &self.target.as_str())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(signals: Vec<StreamSignal>) -> (Connection, CancellationToken) {
        let cancel = CancellationToken::new();
        let conn = Connection::new(
            ConnectionId::new(),
            Url::parse("http://localhost/api/notifications/subscribe/u").unwrap(),
            Box::pin(futures::stream::iter(signals)),
            cancel.clone(),
        );
        (conn, cancel)
    }

    #[tokio::test]
    async fn yields_signals_then_server_closed() {
        let (mut conn, _) = connection(vec![StreamSignal::notification("{}")]);
        assert_eq!(conn.next_signal().await, StreamSignal::notification("{}"));
        assert_eq!(
            conn.next_signal().await,
            StreamSignal::Error(TransportError::ServerClosed)
        );
    }

    #[test]
    fn release_cancels() {
        let (conn, cancel) = connection(Vec::new());
        let id = conn.id().clone();
        assert_eq!(conn.release(), id);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn drop_cancels() {
        let (conn, cancel) = connection(Vec::new());
        drop(conn);
        assert!(cancel.is_cancelled());
    }
}
