//! Inbound dispatcher - Routes server frames to view calls by type tag

use crate::application::services::typing::TypingRoster;
use crate::domain::entities::{ChatMessage, Inbound};
use crate::domain::traits::ChatView;

/// Routes decoded frames to the view and tracks who is typing
#[derive(Debug, Default)]
pub struct MessageDispatcher {
    roster: TypingRoster,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typing_users(&self) -> &[String] {
        self.roster.names()
    }

    /// Dispatch a decoded frame
    pub fn dispatch<V: ChatView + ?Sized>(
        &mut self,
        frame: Inbound,
        own_username: Option<&str>,
        view: &mut V,
    ) {
        match frame {
            Inbound::Join { username, .. } => {
                view.show_system(&format!("{} joined the chat", username));
            }
            Inbound::Message { username, content, timestamp } => {
                let own = own_username == Some(username.as_str());
                if self.roster.remove(&username) {
                    view.show_typing(self.roster.names());
                }
                let message = ChatMessage::new(username, content).with_timestamp(timestamp);
                view.show_message(&message, own);
            }
            Inbound::Leave { username, .. } => {
                if self.roster.remove(&username) {
                    view.show_typing(self.roster.names());
                }
                view.show_system(&format!("{} left the chat", username));
            }
            Inbound::UsersCount { count, .. } => {
                view.show_users_count(count);
            }
            Inbound::Typing { username, typing, .. } => {
                if own_username == Some(username.as_str()) {
                    return;
                }
                if self.roster.set(&username, typing) {
                    view.show_typing(self.roster.names());
                }
            }
            Inbound::Error { message, .. } => {
                tracing::warn!("Server error: {}", message);
                view.alert(&message);
            }
        }
    }

    /// Forget remote typing state, hiding the indicator
    pub fn reset<V: ChatView + ?Sized>(&mut self, view: &mut V) {
        if self.roster.clear() {
            view.show_typing(&[]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ConnectionStatus;

    #[derive(Default)]
    struct Lines(Vec<String>);

    impl ChatView for Lines {
        fn show_status(&mut self, status: ConnectionStatus) {
            self.0.push(format!("status {}", status));
        }
        fn show_message(&mut self, message: &ChatMessage, own: bool) {
            self.0.push(format!("{}{}: {}", message.username, if own { "*" } else { "" }, message.content));
        }
        fn show_system(&mut self, text: &str) {
            self.0.push(text.to_string());
        }
        fn show_users_count(&mut self, count: u64) {
            self.0.push(format!("{} online", count));
        }
        fn show_typing(&mut self, usernames: &[String]) {
            self.0.push(format!("typing [{}]", usernames.join(",")));
        }
        fn alert(&mut self, text: &str) {
            self.0.push(format!("alert {}", text));
        }
    }

    fn feed(dispatcher: &mut MessageDispatcher, text: &str, own: Option<&str>, view: &mut Lines) {
        let frame = Inbound::from_json(text).unwrap();
        dispatcher.dispatch(frame, own, view);
    }

    #[test]
    fn test_dispatch_by_tag() {
        let mut dispatcher = MessageDispatcher::new();
        let mut view = Lines::default();
        let frames = [
            r#"{"type":"join","username":"bo"}"#,
            r#"{"type":"typing","username":"bo","typing":true}"#,
            r#"{"type":"message","username":"bo","content":"<hi>"}"#,
            r#"{"type":"message","username":"ana","content":"yo"}"#,
            r#"{"type":"users_count","count":2}"#,
            r#"{"type":"error","message":"Message too long"}"#,
        ];
        for frame in frames {
            feed(&mut dispatcher, frame, Some("ana"), &mut view);
        }

        assert_eq!(
            view.0,
            vec![
                "bo joined the chat",
                "typing [bo]",
                "typing []",
                "bo: <hi>",
                "ana*: yo",
                "2 online",
                "alert Message too long",
            ]
        );
        assert!(dispatcher.typing_users().is_empty());
    }

    #[test]
    fn test_own_typing_ignored() {
        let mut dispatcher = MessageDispatcher::new();
        let mut view = Lines::default();
        feed(&mut dispatcher, r#"{"type":"typing","username":"ana","typing":true}"#, Some("ana"), &mut view);
        assert!(view.0.is_empty());
        assert!(dispatcher.typing_users().is_empty());
    }

    #[test]
    fn test_reset_hides_indicator_once() {
        let mut dispatcher = MessageDispatcher::new();
        let mut view = Lines::default();
        feed(&mut dispatcher, r#"{"type":"typing","username":"bo","typing":true}"#, None, &mut view);
        dispatcher.reset(&mut view);
        dispatcher.reset(&mut view);
        assert_eq!(view.0, vec!["typing [bo]", "typing []"]);
    }
}
