//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Terminal front end and WebSocket connection

pub mod config;
pub mod adapters;
