//! Wire protocol - JSON text frames tagged by `type`

use serde::{Deserialize, Serialize};
use crate::application::errors::ProtocolError;

/// Tags the client knows how to receive
const INBOUND_TYPES: &[&str] = &["join", "message", "leave", "users_count", "typing", "error"];

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Join {
        username: String,
        timestamp: String,
    },
    Message {
        username: String,
        content: String,
        timestamp: String,
    },
    Typing {
        username: String,
        typing: bool,
    },
}

impl Outbound {
    pub fn join(username: impl Into<String>) -> Self {
        Outbound::Join {
            username: username.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn message(username: impl Into<String>, content: impl Into<String>) -> Self {
        Outbound::Message {
            username: username.into(),
            content: content.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn typing(username: impl Into<String>, typing: bool) -> Self {
        Outbound::Typing {
            username: username.into(),
            typing,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Join { .. } => "join",
            Outbound::Message { .. } => "message",
            Outbound::Typing { .. } => "typing",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames received from the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Join {
        username: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Message {
        username: String,
        content: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Leave {
        username: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    UsersCount {
        count: u64,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Typing {
        username: String,
        #[serde(default)]
        typing: bool,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Error {
        message: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
}

impl Inbound {
    /// Decode a text frame, separating unknown tags from malformed payloads
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(ProtocolError::MissingType)?;

        if !INBOUND_TYPES.contains(&tag) {
            return Err(ProtocolError::UnknownType(tag.to_string()));
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// Current time as an RFC 3339 string
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Render a frame timestamp as `HH:MM` in local time.
///
/// Accepts RFC 3339 and the naive ISO-8601 form (`2024-05-01T09:07:33.123456`)
/// some servers emit; naive values are shown as-is.
pub fn format_clock(timestamp: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.with_timezone(&chrono::Local).format("%H:%M").to_string());
    }

    chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.format("%H:%M").to_string())
}
