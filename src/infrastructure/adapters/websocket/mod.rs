//! WebSocket adapter - socket transport and the reconnecting connection holder

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::application::errors::ConnectionError;
use crate::domain::entities::Outbound;
use crate::domain::traits::{ConnectionEvent, Connector, Transport};

#[cfg(test)]
mod tests;

/// Delay between a close and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Opens connections with tokio-tungstenite
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

/// An open tokio-tungstenite socket
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, url: &str) -> Result<WsTransport, ConnectionError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| ConnectionError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Handshake with {} done ({})", url, response.status());
        Ok(WsTransport { stream })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), ConnectionError> {
        self.stream
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| ConnectionError::Write(e.to_string()))
    }

    async fn recv_text(&mut self) -> Option<Result<String, ConnectionError>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => return Some(Ok(text)),
                Ok(WsMessage::Close(frame)) => {
                    tracing::debug!("Server closed the connection: {:?}", frame);
                    return None;
                }
                Ok(WsMessage::Binary(data)) => {
                    tracing::debug!("Ignoring {} byte binary frame", data.len());
                }
                // Ping/pong are answered by tungstenite
                Ok(_) => {}
                Err(e) => return Some(Err(ConnectionError::Read(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("Close handshake failed: {}", e);
        }
    }
}

/// How a connected session ended
enum SessionEnd {
    /// Peer closed cleanly
    Closed,
    Failed(String),
    /// The client went away
    Shutdown,
}

/// Keeps one connection to the server alive.
///
/// Every close or failure is followed by a fixed delay and a fresh attempt,
/// with no backoff and no retry cap. Frames submitted while disconnected are
/// discarded.
pub struct ConnectionSupervisor<C: Connector> {
    connector: C,
    url: String,
    reconnect_delay: Duration,
}

impl<C: Connector> ConnectionSupervisor<C> {
    pub fn new(connector: C, url: impl Into<String>) -> Self {
        Self {
            connector,
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Run until the outbound sender or the event receiver is dropped
    pub async fn run(
        self,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) {
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            if events.send(ConnectionEvent::Connecting { attempt }).is_err() {
                return;
            }

            if !discard_pending(&mut outbound) {
                return;
            }

            match self.connector.connect(&self.url).await {
                Ok(mut transport) => {
                    tracing::info!("Connected to {}", self.url);
                    if events.send(ConnectionEvent::Opened).is_err() {
                        transport.close().await;
                        return;
                    }

                    let end = pump(&mut transport, &mut outbound, &events).await;
                    // Flushes tungstenite's reply to a server close frame
                    transport.close().await;

                    match end {
                        SessionEnd::Shutdown => return,
                        SessionEnd::Closed => {
                            tracing::info!("Connection to {} closed", self.url);
                        }
                        SessionEnd::Failed(reason) => {
                            let _ = events.send(ConnectionEvent::Error(reason));
                        }
                    }
                }
                Err(e) => {
                    let _ = events.send(ConnectionEvent::Error(e.to_string()));
                }
            }

            if events.send(ConnectionEvent::Closed).is_err() {
                return;
            }

            tracing::debug!(
                "Reconnecting in {}ms (attempt {})",
                self.reconnect_delay.as_millis(),
                attempt + 1
            );
            if !self.wait_to_reconnect(&mut outbound).await {
                return;
            }
        }
    }

    /// Sleep out the reconnect delay; false if the client went away
    async fn wait_to_reconnect(&self, outbound: &mut mpsc::UnboundedReceiver<Outbound>) -> bool {
        let sleep = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                frame = outbound.recv() => match frame {
                    Some(frame) => {
                        tracing::debug!("Discarding {} frame while disconnected", frame.kind());
                    }
                    None => return false,
                },
            }
        }
    }
}

/// Drop frames queued before the connection opened; false if the sender is gone
fn discard_pending(outbound: &mut mpsc::UnboundedReceiver<Outbound>) -> bool {
    loop {
        match outbound.try_recv() {
            Ok(frame) => {
                tracing::debug!("Discarding stale {} frame", frame.kind());
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

/// Move frames both ways until the session ends
async fn pump<T: Transport>(
    transport: &mut T,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
    events: &mpsc::UnboundedSender<ConnectionEvent>,
) -> SessionEnd {
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    return SessionEnd::Shutdown;
                };
                let text = match frame.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode {} frame: {}", frame.kind(), e);
                        continue;
                    }
                };
                if let Err(e) = transport.send_text(text).await {
                    return SessionEnd::Failed(e.to_string());
                }
            }
            incoming = transport.recv_text() => match incoming {
                Some(Ok(text)) => {
                    if events.send(ConnectionEvent::Message(text)).is_err() {
                        return SessionEnd::Shutdown;
                    }
                }
                Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
                None => return SessionEnd::Closed,
            },
        }
    }
}
