//! Application layer errors

use thiserror::Error;

/// General client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Write failed: {0}")]
    Write(String),
}

/// Wire protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Missing type tag")]
    MissingType,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
