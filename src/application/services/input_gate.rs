//! Input gate - holds piped lines until the client can act on them

use std::collections::VecDeque;

use crate::domain::traits::ChatView;
use super::chat_client::{ChatClient, Flow};

/// Queue between the input reader and the client.
///
/// Piped input arrives all at once, usually before the socket is open. With
/// `hold` set, lines wait until the client is connected with no join in
/// flight, so a username line followed by messages goes out in order. Once
/// input has ended and the queue is drained the gate asks to quit.
#[derive(Debug, Default)]
pub struct InputGate {
    queue: VecDeque<String>,
    hold: bool,
    closed: bool,
}

impl InputGate {
    pub fn new(hold: bool) -> Self {
        Self {
            queue: VecDeque::new(),
            hold,
            closed: false,
        }
    }

    pub fn push(&mut self, line: String) {
        self.queue.push_back(line);
    }

    /// No more input will arrive
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Hand queued lines to the client while it can take them
    pub fn pump<V: ChatView>(&mut self, client: &mut ChatClient<V>) -> Flow {
        while !self.hold || client.is_ready() {
            let Some(line) = self.queue.pop_front() else {
                break;
            };
            if client.handle_input(&line) == Flow::Quit {
                return Flow::Quit;
            }
        }

        if self.closed && self.queue.is_empty() {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }
}
