//! Application services - client state, input queueing and typing status

pub mod chat_client;
pub mod input_gate;
pub mod typing;

pub use chat_client::{ChatClient, Flow};
pub use input_gate::InputGate;
pub use typing::{TypingDebouncer, TypingRoster, DEFAULT_TYPING_TIMEOUT};
