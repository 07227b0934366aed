//! Typing status - local debounce and the roster of remote typists

use std::time::Duration;
use tokio::time::Instant;

/// Inactivity after which the local user stops "typing"
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_secs(1);

/// Debounces keystrokes into typing start/stop signals.
///
/// The local user counts as typing exactly while a deadline is pending.
/// Methods return `Some(flag)` when a `typing` frame with that flag should
/// be sent.
#[derive(Debug)]
pub struct TypingDebouncer {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl TypingDebouncer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A key was pressed: re-arm the deadline, signal start if idle
    pub fn keystroke(&mut self, now: Instant) -> Option<bool> {
        let started = self.deadline.is_none();
        self.deadline = Some(now + self.timeout);
        started.then_some(true)
    }

    /// Signal stop if the deadline has passed
    pub fn expire(&mut self, now: Instant) -> Option<bool> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(false)
            }
            _ => None,
        }
    }

    /// Cancel the deadline, signalling stop if it was pending
    pub fn stop(&mut self) -> Option<bool> {
        self.deadline.take().map(|_| false)
    }
}

impl Default for TypingDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_TIMEOUT)
    }
}

/// Other users currently typing, in the order they started
#[derive(Debug, Default)]
pub struct TypingRoster {
    names: Vec<String>,
}

impl TypingRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a typing frame; returns true if the roster changed
    pub fn set(&mut self, username: &str, typing: bool) -> bool {
        let present = self.names.iter().any(|n| n == username);
        match (typing, present) {
            (true, false) => {
                self.names.push(username.to_string());
                true
            }
            (false, true) => self.remove(username),
            _ => false,
        }
    }

    pub fn remove(&mut self, username: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != username);
        self.names.len() != before
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.names.is_empty();
        self.names.clear();
        changed
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
