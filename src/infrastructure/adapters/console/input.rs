//! Keyboard input: raw-mode key reader, line-buffered fallback, line editor

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Input as delivered to the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalInput {
    Char(char),
    Backspace,
    Enter,
    /// Esc: drop the current line
    ClearLine,
    /// Ctrl-C / Ctrl-D
    Interrupt,
    /// A whole line (line-buffered mode)
    Line(String),
    Eof,
}

/// Result of feeding one input to the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Buffer changed by a keystroke
    Edited,
    Submitted(String),
    Interrupted,
    Unchanged,
}

/// Single-line editor for raw mode
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn apply(&mut self, input: TerminalInput) -> EditOutcome {
        match input {
            TerminalInput::Char(c) => {
                self.buffer.push(c);
                EditOutcome::Edited
            }
            TerminalInput::Backspace => {
                if self.buffer.pop().is_some() {
                    EditOutcome::Edited
                } else {
                    EditOutcome::Unchanged
                }
            }
            TerminalInput::ClearLine => {
                if self.buffer.is_empty() {
                    EditOutcome::Unchanged
                } else {
                    self.buffer.clear();
                    EditOutcome::Edited
                }
            }
            TerminalInput::Enter => EditOutcome::Submitted(std::mem::take(&mut self.buffer)),
            TerminalInput::Line(line) => EditOutcome::Submitted(line),
            TerminalInput::Interrupt | TerminalInput::Eof => EditOutcome::Interrupted,
        }
    }
}

/// Raw mode for the lifetime of the guard
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::error!("Failed to restore terminal: {}", e);
        }
    }
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<TerminalInput> {
    match code {
        KeyCode::Char('c') | KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TerminalInput::Interrupt)
        }
        KeyCode::Char(c) => Some(TerminalInput::Char(c)),
        KeyCode::Backspace => Some(TerminalInput::Backspace),
        KeyCode::Enter => Some(TerminalInput::Enter),
        KeyCode::Esc => Some(TerminalInput::ClearLine),
        _ => None,
    }
}

/// Read key presses on a blocking thread (raw mode must be enabled)
pub fn spawn_raw_reader(tx: mpsc::UnboundedSender<TerminalInput>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if let Some(input) = map_key(key.code, key.modifiers) {
                    if tx.send(input).is_err() {
                        return;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Keyboard read failed: {}", e);
                let _ = tx.send(TerminalInput::Eof);
                return;
            }
        }
    });
}

/// Read whole lines from stdin when it is not a terminal
pub fn spawn_line_reader(tx: mpsc::UnboundedSender<TerminalInput>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let input = match lines.next_line().await {
                Ok(Some(line)) => TerminalInput::Line(line),
                Ok(None) => TerminalInput::Eof,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    TerminalInput::Eof
                }
            };
            let done = input == TerminalInput::Eof;
            if tx.send(input).is_err() || done {
                return;
            }
        }
    });
}
