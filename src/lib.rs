//! chatline - terminal client for JSON-over-WebSocket chat servers

pub mod domain;
pub mod application;
pub mod infrastructure;
