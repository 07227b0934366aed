use crate::domain::entities::{ChatMessage, ConnectionStatus};

/// ChatView trait - abstraction for the rendering surface
///
/// Implementations receive raw, untrusted text and are responsible for
/// escaping it for their output medium.
pub trait ChatView: Send {
    /// Update the connection indicator
    fn show_status(&mut self, status: ConnectionStatus);

    /// Render a chat line; `own` is set for the local user's echoed messages
    fn show_message(&mut self, message: &ChatMessage, own: bool);

    /// Render a system notice (joins, leaves, help text)
    fn show_system(&mut self, text: &str);

    /// Update the online user counter
    fn show_users_count(&mut self, count: u64);

    /// Show who is typing; an empty slice hides the indicator
    fn show_typing(&mut self, usernames: &[String]);

    /// Blocking notice for actions that cannot proceed
    fn alert(&mut self, text: &str);
}
