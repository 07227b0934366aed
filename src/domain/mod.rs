//! Domain layer - Core client types with no I/O
//!
//! This layer contains:
//! - Entities: Wire frames, usernames, chat lines
//! - Traits: Abstractions for infrastructure (ChatView, Connector, Transport)

pub mod entities;
pub mod traits;
