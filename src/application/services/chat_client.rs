//! Chat client - the single object holding connection and session state

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::application::messaging::{InputCommand, InputParser, MessageDispatcher};
use crate::domain::entities::{
    ConnectionStatus, Inbound, Outbound, Username, MAX_CONTENT_CHARS,
};
use crate::domain::traits::{ChatView, ConnectionEvent};
use super::typing::TypingDebouncer;

const NOT_CONNECTED: &str = "Not connected to the chat server. Please wait for the connection.";
const NOT_JOINED: &str = "Join the chat first: type a username or use /join NAME";

/// Whether the event loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Where the local user stands with the server
#[derive(Debug, Clone, PartialEq, Eq)]
enum Membership {
    Anonymous,
    /// Join sent, waiting for the server to announce it
    Pending(Username),
    Joined(Username),
}

impl Membership {
    fn username(&self) -> Option<&Username> {
        match self {
            Membership::Anonymous => None,
            Membership::Pending(name) | Membership::Joined(name) => Some(name),
        }
    }
}

/// Chat client driving a view from connection events and user input
pub struct ChatClient<V: ChatView> {
    view: V,
    outbound: mpsc::UnboundedSender<Outbound>,
    parser: InputParser,
    dispatcher: MessageDispatcher,
    typing: TypingDebouncer,
    membership: Membership,
    status: ConnectionStatus,
}

impl<V: ChatView> ChatClient<V> {
    pub fn new(view: V, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            view,
            outbound,
            parser: InputParser::default(),
            dispatcher: MessageDispatcher::new(),
            typing: TypingDebouncer::default(),
            membership: Membership::Anonymous,
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn with_typing_timeout(mut self, timeout: Duration) -> Self {
        self.typing = TypingDebouncer::new(timeout);
        self
    }

    pub fn with_parser(mut self, parser: InputParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Connected with no join awaiting the server's answer
    pub fn is_ready(&self) -> bool {
        self.is_connected() && !matches!(self.membership, Membership::Pending(_))
    }

    /// Username once the server has confirmed the join
    pub fn username(&self) -> Option<&str> {
        match &self.membership {
            Membership::Joined(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_typing()
    }

    pub fn typing_deadline(&self) -> Option<Instant> {
        self.typing.deadline()
    }

    /// Handle a submitted input line
    pub fn handle_input(&mut self, line: &str) -> Flow {
        let joined = self.membership.username().is_some();
        match self.parser.parse(line, joined) {
            InputCommand::Join(name) => self.join(&name),
            InputCommand::Text(text) => self.send_message(&text),
            InputCommand::Help => {
                let help = self.parser.help();
                self.view.show_system(&help);
            }
            InputCommand::Status => {
                let who = match &self.membership {
                    Membership::Anonymous => "not joined".to_string(),
                    Membership::Pending(name) => format!("joining as {}", name),
                    Membership::Joined(name) => format!("joined as {}", name),
                };
                self.view.show_system(&format!("Status: {}, {}", self.status, who));
            }
            InputCommand::Unknown(name) => {
                self.view.alert(&format!("Unknown command: {}", name));
            }
            InputCommand::Quit => {
                self.stop_typing();
                return Flow::Quit;
            }
            InputCommand::Empty => {}
        }
        Flow::Continue
    }

    /// Ask the server to join under `raw`
    pub fn join(&mut self, raw: &str) {
        let username = match Username::parse(raw) {
            Ok(name) => name,
            Err(e) => {
                self.view.alert(&e.to_string());
                return;
            }
        };

        if let Some(current) = self.membership.username() {
            self.view.alert(&format!("Already joined as {}", current));
            return;
        }

        if !self.is_connected() {
            self.view.alert(NOT_CONNECTED);
            return;
        }

        tracing::info!("Joining as {}", username);
        self.send(Outbound::join(username.as_str()));
        self.membership = Membership::Pending(username);
    }

    /// Send a chat message
    pub fn send_message(&mut self, text: &str) {
        let content = text.trim();
        if content.is_empty() {
            return;
        }

        let username = match &self.membership {
            Membership::Joined(name) => name.as_str().to_string(),
            _ => {
                self.view.alert(NOT_JOINED);
                return;
            }
        };

        if !self.is_connected() {
            self.view.alert(NOT_CONNECTED);
            return;
        }

        if content.chars().count() > MAX_CONTENT_CHARS {
            self.view.alert(&format!(
                "Message too long (max {} characters)",
                MAX_CONTENT_CHARS
            ));
            return;
        }

        self.send(Outbound::message(username, content));
        self.stop_typing();
    }

    /// A key was pressed in the input line
    pub fn on_keystroke(&mut self, now: Instant) {
        if !self.is_connected() {
            return;
        }
        let Some(name) = self.joined_name() else {
            return;
        };
        if let Some(flag) = self.typing.keystroke(now) {
            self.send(Outbound::typing(name, flag));
        }
    }

    /// The typing deadline elapsed
    pub fn on_typing_deadline(&mut self, now: Instant) {
        if let Some(flag) = self.typing.expire(now) {
            if let Some(name) = self.joined_name() {
                if self.is_connected() {
                    self.send(Outbound::typing(name, flag));
                }
            }
        }
    }

    /// Apply a connection lifecycle or data event
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connecting { attempt } => {
                tracing::debug!("Connection attempt {}", attempt);
                self.set_status(ConnectionStatus::Connecting);
            }
            ConnectionEvent::Opened => {
                self.set_status(ConnectionStatus::Connected);
                if let Some(name) = self.membership.username().cloned() {
                    tracing::info!("Resuming session as {}", name);
                    self.send(Outbound::join(name.as_str()));
                    self.membership = Membership::Pending(name);
                }
            }
            ConnectionEvent::Message(text) => self.handle_frame(&text),
            // The status indicator reports the outage
            ConnectionEvent::Error(reason) => {
                tracing::info!("Connection error: {}", reason);
            }
            ConnectionEvent::Closed => {
                self.set_status(ConnectionStatus::Disconnected);
                self.typing.stop();
                self.dispatcher.reset(&mut self.view);
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        let frame = match Inbound::from_json(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping inbound frame: {}", e);
                return;
            }
        };

        if let Membership::Pending(name) = &self.membership {
            match &frame {
                Inbound::Join { username, .. } if username == name.as_str() => {
                    tracing::info!("Joined as {}", name);
                    self.membership = Membership::Joined(name.clone());
                }
                Inbound::Error { .. } => {
                    tracing::info!("Join as {} rejected", name);
                    self.membership = Membership::Anonymous;
                }
                _ => {}
            }
        }

        let own = self.membership.username().map(|n| n.as_str().to_string());
        self.dispatcher.dispatch(frame, own.as_deref(), &mut self.view);
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            self.status = status;
            self.view.show_status(status);
        }
    }

    fn joined_name(&self) -> Option<String> {
        match &self.membership {
            Membership::Joined(name) => Some(name.as_str().to_string()),
            _ => None,
        }
    }

    fn stop_typing(&mut self) {
        if let Some(flag) = self.typing.stop() {
            if let Some(name) = self.joined_name() {
                if self.is_connected() {
                    self.send(Outbound::typing(name, flag));
                }
            }
        }
    }

    fn send(&self, frame: Outbound) {
        tracing::debug!("Sending {} frame", frame.kind());
        if self.outbound.send(frame).is_err() {
            tracing::warn!("Connection task has stopped; frame dropped");
        }
    }
}
