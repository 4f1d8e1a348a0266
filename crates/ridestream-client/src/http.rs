//! Server-sent events transport over `reqwest`.
//!
//! Each connection runs in its own tokio task that performs the subscription
//! `GET`, parses the body with `eventsource-stream` and forwards
//! [`StreamSignal`]s through a bounded channel. Cancelling the request's
//! token, or dropping the returned stream, ends the task and drops the
//! response.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, HeaderValue};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use ridestream_core::text::preview;
use ridestream_core::{BearerToken, StreamSignal, TransportError};
use ridestream_settings::ClientSettings;

use crate::decode::classify_event;
use crate::transport::{ConnectRequest, SignalStream, Transport};

const EVENT_STREAM: &str = "text/event-stream";

/// Longest error-body excerpt kept in [`TransportError::Status`].
const ERROR_BODY_PREVIEW_BYTES: usize = 200;

/// SSE push transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    channel_capacity: usize,
}

impl HttpTransport {
    /// Build a transport. Only the connect phase is bounded by
    /// `connect_timeout`; an open stream may stay quiet indefinitely.
    pub fn new(connect_timeout: Duration, channel_capacity: usize) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            channel_capacity: channel_capacity.max(1),
        })
    }

    /// Build a transport from client settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, TransportError> {
        Self::new(
            Duration::from_millis(settings.connect_timeout_ms),
            settings.channel_capacity,
        )
    }
}

fn bearer_header(token: &BearerToken) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&token.header_value()).ok()?;
    value.set_sensitive(true);
    Some(value)
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http-sse"
    }

    fn accepts_credential(&self, credential: &BearerToken) -> bool {
        bearer_header(credential).is_some()
    }

    fn open(
        &self,
        request: ConnectRequest,
        cancel: CancellationToken,
    ) -> Result<SignalStream, TransportError> {
        let runtime = Handle::try_current()
            .map_err(|e| TransportError::Unavailable(format!("no tokio runtime: {e}")))?;
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let client = self.client.clone();
        let connection_id = request.connection_id.clone();

        drop(runtime.spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(%connection_id, "notification stream cancelled");
                }
                () = pump(client, request, tx) => {}
            }
        }));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Run one subscription until the body ends, the server errors or the
/// receiver goes away.
async fn pump(client: reqwest::Client, request: ConnectRequest, tx: mpsc::Sender<StreamSignal>) {
    let ConnectRequest {
        connection_id,
        target,
        credential,
    } = request;
    debug!(%connection_id, %target, "connecting notification stream");

    let mut builder = client
        .get(target)
        .header(ACCEPT, EVENT_STREAM)
        .header(CACHE_CONTROL, "no-cache");
    if let Some(value) = credential.as_ref().and_then(bearer_header) {
        builder = builder.header(AUTHORIZATION, value);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            let _ = tx
                .send(StreamSignal::Error(TransportError::Network(e.to_string())))
                .await;
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let _ = tx
            .send(StreamSignal::Error(TransportError::Status {
                status: status.as_u16(),
                body: preview(&body, ERROR_BODY_PREVIEW_BYTES),
            }))
            .await;
        return;
    }

    if tx.send(StreamSignal::Established { detail: None }).await.is_err() {
        return;
    }

    let mut events = response.bytes_stream().eventsource();
    while let Some(event) = events.next().await {
        let signal = match event {
            Ok(event) => {
                let name = event.event;
                match classify_event(&name, event.data) {
                    Some(signal) => signal,
                    None => {
                        debug!(%connection_id, event = %name, "skipping unknown event");
                        continue;
                    }
                }
            }
            Err(e) => StreamSignal::Error(TransportError::Stream(e.to_string())),
        };
        let terminal = signal.is_terminal();
        if tx.send(signal).await.is_err() || terminal {
            return;
        }
    }

    let _ = tx
        .send(StreamSignal::Error(TransportError::ServerClosed))
        .await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
