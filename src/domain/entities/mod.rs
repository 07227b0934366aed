//! Domain entities - wire frames and the values the client shows

pub mod user;
pub mod message;
pub mod protocol;

pub use user::{Username, UsernameError, MAX_USERNAME_CHARS};
pub use message::{ChatMessage, ConnectionStatus, MAX_CONTENT_CHARS};
pub use protocol::{Inbound, Outbound};
