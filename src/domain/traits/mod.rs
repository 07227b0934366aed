//! Domain traits - Abstractions for infrastructure implementations

pub mod transport;
pub mod view;

pub use transport::{Connector, ConnectionEvent, Transport};
pub use view::ChatView;
