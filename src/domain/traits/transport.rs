use async_trait::async_trait;
use crate::application::errors::ConnectionError;

/// An open text-frame connection to the chat server
#[async_trait]
pub trait Transport: Send {
    /// Write one text frame
    async fn send_text(&mut self, text: String) -> Result<(), ConnectionError>;

    /// Next text frame, or `None` once the peer has closed
    async fn recv_text(&mut self) -> Option<Result<String, ConnectionError>>;

    /// Send a close frame; errors are ignored
    async fn close(&mut self);
}

/// Opens transports - abstraction over the socket library
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport + 'static;

    async fn connect(&self, url: &str) -> Result<Self::Transport, ConnectionError>;
}

/// Lifecycle and data events reported by the connection holder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt started (1-based)
    Connecting { attempt: u64 },
    Opened,
    /// An inbound text frame
    Message(String),
    Error(String),
    Closed,
}
