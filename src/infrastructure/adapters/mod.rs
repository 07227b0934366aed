//! Adapters - terminal front end and the server connection

pub mod console;
pub mod websocket;
