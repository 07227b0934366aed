//! Application layer - Client use cases
//!
//! This layer contains:
//! - Services: The chat client and typing status
//! - Errors: Client error types
//! - Messaging: Inbound dispatch, input parsing, escaping

pub mod errors;
pub mod services;
pub mod messaging;
