//! Message handling - Inbound dispatch, input parsing, output escaping

pub mod dispatcher;
pub mod escape;
pub mod parser;

pub use dispatcher::MessageDispatcher;
pub use escape::{escape_html, strip_controls, RenderFormat};
pub use parser::{InputCommand, InputParser};
