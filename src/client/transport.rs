//! Transport abstraction for the client session layer.
//!
//! [`ConnectionManager`](super::ConnectionManager) is generic over a
//! [`Transport`] so the reconnection state machine can be exercised
//! against an in-memory transport in tests. The production
//! implementation is [`WsTransport`] over `tokio-tungstenite`.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::domain::Credential;
use crate::error::RealtimeError;
use crate::ws::messages::WireFrame;

/// Factory for live connections.
pub trait Transport: Send + Sync + 'static {
    /// The live connection type produced by [`Transport::connect`].
    type Link: TransportLink;

    /// Establishes a connection to `url`, authenticated with
    /// `credential`. A failure here is transient ([`RealtimeError::Connection`])
    /// and triggers a backoff retry in the manager.
    fn connect(
        &self,
        url: &str,
        credential: &Credential,
    ) -> impl Future<Output = Result<Self::Link, RealtimeError>> + Send;
}

/// One live, framed, bidirectional connection.
pub trait TransportLink: Send + 'static {
    /// Transmits one frame.
    fn send(&mut self, frame: WireFrame) -> impl Future<Output = Result<(), RealtimeError>> + Send;

    /// Receives the next frame. `None` means the peer closed the
    /// connection; an error means the transport failed.
    fn next(&mut self) -> impl Future<Output = Option<Result<WireFrame, RealtimeError>>> + Send;

    /// Closes the connection. Best-effort; errors are discarded.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// WebSocket transport over `tokio-tungstenite`.
///
/// The credential travels as upgrade-request query parameters, the
/// same contract the gateway's `/ws` handler authenticates.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    type Link = WsLink;

    async fn connect(&self, url: &str, credential: &Credential) -> Result<WsLink, RealtimeError> {
        let request = format!(
            "{url}?token={}&user_id={}",
            credential.token(),
            credential.user_id()
        );
        let (stream, _response) = connect_async(&request)
            .await
            .map_err(|error| RealtimeError::Connection(error.to_string()))?;
        Ok(WsLink { inner: stream })
    }
}

/// A live WebSocket connection speaking JSON [`WireFrame`]s.
#[derive(Debug)]
pub struct WsLink {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TransportLink for WsLink {
    async fn send(&mut self, frame: WireFrame) -> Result<(), RealtimeError> {
        let json = serde_json::to_string(&frame)
            .map_err(|error| RealtimeError::Internal(error.to_string()))?;
        self.inner
            .send(Message::text(json))
            .await
            .map_err(|error| RealtimeError::Connection(error.to_string()))
    }

    async fn next(&mut self) -> Option<Result<WireFrame, RealtimeError>> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<WireFrame>(text.as_str()) {
                        Ok(frame) => return Some(Ok(frame)),
                        Err(error) => {
                            // Forward compatibility: skip what we cannot decode.
                            tracing::trace!(%error, "ignoring undecodable frame");
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Ok(_)) => {} // ping/pong/binary
                Some(Err(error)) => {
                    return Some(Err(RealtimeError::Connection(error.to_string())));
                }
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.inner.close(None).await;
    }
}
