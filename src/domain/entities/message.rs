use std::fmt;

/// Maximum characters in a chat message, after trimming
pub const MAX_CONTENT_CHARS: usize = 500;

/// A chat line as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub username: String,
    pub content: String,
    pub timestamp: Option<String>,
}

impl ChatMessage {
    pub fn new(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Connection indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
