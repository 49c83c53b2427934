//! Duplex text transport.
//!
//! [`WebApiConnection`](crate::WebApiConnection) only needs to write and read
//! text frames, so the socket sits behind the small [`Transport`] trait. The
//! production implementation wraps `tokio-tungstenite`. Tests swap in a
//! scripted one.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest, http};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// One established duplex connection carrying text frames.
///
/// Implementations must tolerate a concurrent `send` and `recv`: the listen
/// loop reads while user calls and the keepalive task write.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one text frame.
    async fn send(&self, frame: String) -> Result<(), TransportError>;

    /// Read the next text frame. `None` means the peer closed the stream.
    async fn recv(&self) -> Option<Result<String, TransportError>>;

    /// Close the connection.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Establishes a [`Transport`] from a [`ConnectionConfig`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn Transport>, TransportError>;
}

/// Connects over WebSocket, passing token and room as handshake headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        let mut request = config
            .uri
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {e}", config.uri)))?;

        for (name, value) in config.metadata() {
            let value = http::HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
            request
                .headers_mut()
                .insert(http::HeaderName::from_static(name), value);
        }

        let (stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        debug!(status = %response.status(), uri = %config.uri, "websocket established");

        let (sink, stream) = stream.split();
        Ok(Arc::new(WsTransport {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }))
    }
}

/// WebSocket transport with independently locked write and read halves.
pub struct WsTransport {
    sink: Mutex<SplitSink<WsStream, tungstenite::Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, frame: String) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(tungstenite::Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&self) -> Option<Result<String, TransportError>> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await? {
                Ok(tungstenite::Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(tungstenite::Message::Binary(data)) => {
                    return Some(
                        String::from_utf8(data.to_vec())
                            .map_err(|e| TransportError::Receive(e.to_string())),
                    );
                }
                Ok(tungstenite::Message::Close(frame)) => {
                    debug!(?frame, "peer closed websocket");
                    return None;
                }
                // Pings are answered by tungstenite itself.
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return None;
                }
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}
