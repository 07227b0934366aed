//! Console adapter - terminal rendering and keyboard input

pub mod input;
pub mod log_writer;

use std::io::Write;

use crossterm::style::Stylize;
use crossterm::{cursor, queue, terminal};

use crate::application::messaging::RenderFormat;
use crate::domain::entities::protocol::format_clock;
use crate::domain::entities::{ChatMessage, ConnectionStatus};
use crate::domain::traits::ChatView;

pub use input::{spawn_line_reader, spawn_raw_reader, EditOutcome, LineEditor, RawModeGuard, TerminalInput};
pub use log_writer::RawLineWriter;

/// Terminal view.
///
/// In interactive mode the last line is a prompt carrying the connection
/// indicator, user count and typing indicator, redrawn after every output
/// line. Otherwise each update is printed as its own line.
pub struct ConsoleView<W: Write + Send> {
    out: W,
    format: RenderFormat,
    timestamps: bool,
    interactive: bool,
    status: ConnectionStatus,
    users: Option<u64>,
    typing: Vec<String>,
    input: String,
    alert_open: bool,
}

impl ConsoleView<std::io::Stdout> {
    pub fn stdout(format: RenderFormat, interactive: bool) -> Self {
        Self::new(std::io::stdout(), format, interactive)
    }
}

impl<W: Write + Send> ConsoleView<W> {
    pub fn new(out: W, format: RenderFormat, interactive: bool) -> Self {
        Self {
            out,
            format,
            timestamps: true,
            interactive,
            status: ConnectionStatus::Disconnected,
            users: None,
            typing: Vec::new(),
            input: String::new(),
            alert_open: false,
        }
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Mirror the line editor buffer in the prompt
    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        self.redraw_prompt();
    }

    /// Close an open alert; true if one was open
    pub fn dismiss_alert(&mut self) -> bool {
        let was_open = self.alert_open;
        if was_open {
            self.alert_open = false;
            self.redraw_prompt();
        }
        was_open
    }

    /// Leave the prompt line so the shell starts on a fresh line
    pub fn finish(&mut self) {
        if self.interactive {
            let _ = write!(self.out, "\r\n");
            let _ = self.out.flush();
        }
    }

    fn typing_text(&self) -> Option<String> {
        let names: Vec<String> = self.typing.iter().map(|n| self.format.escape(n)).collect();
        match names.as_slice() {
            [] => None,
            [one] => Some(format!("{} is typing...", one)),
            [a, b] => Some(format!("{} and {} are typing...", a, b)),
            more => Some(format!("{} people are typing...", more.len())),
        }
    }

    fn prompt_text(&self) -> String {
        let mut parts = vec![self.status.to_string()];
        if let Some(users) = self.users {
            parts.push(format!("{} online", users));
        }
        if let Some(typing) = self.typing_text() {
            parts.push(typing);
        }
        let input = strip_for_prompt(&self.input);
        format!("[{}] > {}", parts.join(" | "), input)
    }

    /// Print one finished line, keeping the prompt at the bottom
    fn emit(&mut self, line: &str) {
        let result = if self.interactive {
            queue!(self.out, cursor::MoveToColumn(0), terminal::Clear(terminal::ClearType::CurrentLine))
                .and_then(|_| write!(self.out, "{}\r\n", line))
        } else {
            writeln!(self.out, "{}", line)
        };
        if let Err(e) = result {
            tracing::error!("Failed to write to terminal: {}", e);
        }
        self.redraw_prompt();
    }

    fn redraw_prompt(&mut self) {
        if !self.interactive {
            let _ = self.out.flush();
            return;
        }
        let prompt = if self.alert_open {
            "[press any key] ".to_string()
        } else {
            self.prompt_text()
        };
        let result = queue!(self.out, cursor::MoveToColumn(0), terminal::Clear(terminal::ClearType::CurrentLine))
            .and_then(|_| write!(self.out, "{}", prompt))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::error!("Failed to draw prompt: {}", e);
        }
    }

    fn clock(&self, message: &ChatMessage) -> Option<String> {
        if !self.timestamps {
            return None;
        }
        message.timestamp.as_deref().and_then(format_clock)
    }
}

impl<W: Write + Send> ChatView for ConsoleView<W> {
    fn show_status(&mut self, status: ConnectionStatus) {
        self.status = status;
        if status != ConnectionStatus::Connected {
            self.typing.clear();
        }
        // The prompt already shows the status
        if self.interactive {
            self.redraw_prompt();
            return;
        }
        let line = match self.format {
            RenderFormat::Plain => format!("-- {} --", status),
            RenderFormat::Html => format!(r#"<div class="status {0}">{0}</div>"#, status),
        };
        self.emit(&line);
    }

    fn show_message(&mut self, message: &ChatMessage, own: bool) {
        let name = self.format.escape(&message.username);
        let content = self.format.escape(&message.content);
        let clock = self.clock(message);

        let line = match self.format {
            RenderFormat::Plain => {
                let time = clock.map(|c| format!("[{}] ", c)).unwrap_or_default();
                let who = if own { format!("{} (you)", name) } else { name };
                let who = if self.interactive && own {
                    who.bold().to_string()
                } else {
                    who
                };
                format!("{}{}: {}", time, who, content)
            }
            RenderFormat::Html => {
                let class = if own { "message own" } else { "message" };
                let time = clock
                    .map(|c| format!(r#"<span class="time">{}</span> "#, c))
                    .unwrap_or_default();
                format!(
                    r#"<div class="{}">{}<span class="username">{}</span>: <span class="content">{}</span></div>"#,
                    class, time, name, content
                )
            }
        };
        self.emit(&line);
    }

    fn show_system(&mut self, text: &str) {
        let lines: Vec<String> = text
            .lines()
            .map(|l| self.format.escape(l))
            .map(|l| match self.format {
                RenderFormat::Plain => format!("* {}", l),
                RenderFormat::Html => format!(r#"<div class="system">{}</div>"#, l),
            })
            .collect();
        for line in lines {
            self.emit(&line);
        }
    }

    fn show_users_count(&mut self, count: u64) {
        self.users = Some(count);
        if self.interactive {
            self.redraw_prompt();
            return;
        }
        let line = match self.format {
            RenderFormat::Plain => format!("-- {} online --", count),
            RenderFormat::Html => format!(r#"<div class="users-count">{}</div>"#, count),
        };
        self.emit(&line);
    }

    fn show_typing(&mut self, usernames: &[String]) {
        self.typing = usernames.to_vec();
        if self.interactive {
            self.redraw_prompt();
            return;
        }
        // Raw names: typing_text escapes them
        if let Some(text) = self.typing_text() {
            let line = match self.format {
                RenderFormat::Plain => format!("... {}", text),
                RenderFormat::Html => format!(r#"<div class="typing">{}</div>"#, text),
            };
            self.emit(&line);
        }
    }

    fn alert(&mut self, text: &str) {
        let text = self.format.escape(text);
        let line = match self.format {
            RenderFormat::Plain if self.interactive => format!("!! {}", text).red().bold().to_string(),
            RenderFormat::Plain => format!("!! {}", text),
            RenderFormat::Html => format!(r#"<div class="alert">{}</div>"#, text),
        };
        if self.interactive {
            self.alert_open = true;
        }
        self.emit(&line);
    }
}

fn strip_for_prompt(input: &str) -> String {
    crate::application::messaging::strip_controls(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F: FnOnce(&mut ConsoleView<Vec<u8>>)>(format: RenderFormat, f: F) -> String {
        let mut view = ConsoleView::new(Vec::new(), format, false);
        f(&mut view);
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_message() {
        let out = render(RenderFormat::Plain, |v| {
            let msg = ChatMessage::new("ana", "hello").with_timestamp(Some("2024-05-01T09:07:33.1".into()));
            v.show_message(&msg, false);
            v.show_message(&ChatMessage::new("bo", "hi"), true);
        });
        assert_eq!(out, "[09:07] ana: hello\nbo (you): hi\n");
    }

    #[test]
    fn test_timestamps_can_be_hidden() {
        let mut view = ConsoleView::new(Vec::new(), RenderFormat::Plain, false).with_timestamps(false);
        let msg = ChatMessage::new("ana", "hello").with_timestamp(Some("2024-05-01T09:07:33".into()));
        view.show_message(&msg, false);
        assert_eq!(String::from_utf8(view.into_inner()).unwrap(), "ana: hello\n");
    }

    #[test]
    fn test_html_escapes_untrusted_text() {
        let out = render(RenderFormat::Html, |v| {
            v.show_message(&ChatMessage::new("<b>eve</b>", "<img src=x onerror=alert(1)>"), false);
        });
        assert_eq!(
            out,
            "<div class=\"message\"><span class=\"username\">&lt;b&gt;eve&lt;/b&gt;</span>: \
             <span class=\"content\">&lt;img src=x onerror=alert(1)&gt;</span></div>\n"
        );
    }

    #[test]
    fn test_plain_strips_terminal_escapes() {
        let out = render(RenderFormat::Plain, |v| {
            v.show_message(&ChatMessage::new("eve\x1b[2J", "boom\x1b]0;pwned\x07"), false);
        });
        assert!(!out.contains('\x1b'));
        assert!(!out.contains('\x07'));
        assert_eq!(out, "eve[2J: boom]0;pwned\n");
    }

    #[test]
    fn test_system_alert_and_counters() {
        let out = render(RenderFormat::Plain, |v| {
            v.show_status(ConnectionStatus::Connected);
            v.show_system("ana joined the chat");
            v.show_users_count(2);
            v.show_typing(&["ana".to_string()]);
            v.show_typing(&[]);
            v.alert("Not connected");
        });
        assert_eq!(
            out,
            "-- connected --\n* ana joined the chat\n-- 2 online --\n... ana is typing...\n!! Not connected\n"
        );
    }

    #[test]
    fn test_typing_text_variants() {
        let mut view = ConsoleView::new(Vec::new(), RenderFormat::Plain, false);
        view.typing = vec!["a".into(), "b".into()];
        assert_eq!(view.typing_text().as_deref(), Some("a and b are typing..."));
        view.typing.push("c".into());
        assert_eq!(view.typing_text().as_deref(), Some("3 people are typing..."));
    }

    #[test]
    fn test_interactive_prompt_and_alert_dismissal() {
        let mut view = ConsoleView::new(Vec::new(), RenderFormat::Plain, true);
        view.show_users_count(4);
        view.set_input("hel");
        assert_eq!(view.prompt_text(), "[disconnected | 4 online] > hel");

        assert!(!view.dismiss_alert());
        view.alert("Join the chat first");
        assert!(view.dismiss_alert());
        assert!(!view.dismiss_alert());

        let out = String::from_utf8(view.into_inner()).unwrap();
        assert!(out.contains("Join the chat first"));
        assert!(out.contains("[press any key]"));
    }

    #[test]
    fn test_interactive_status_stays_in_prompt() {
        let mut view = ConsoleView::new(Vec::new(), RenderFormat::Plain, true);
        for _ in 0..3 {
            view.show_status(ConnectionStatus::Connecting);
            view.show_status(ConnectionStatus::Disconnected);
        }
        view.show_status(ConnectionStatus::Connecting);
        assert!(view.prompt_text().starts_with("[connecting]"));

        let out = String::from_utf8(view.into_inner()).unwrap();
        assert!(!out.contains("-- connecting --"));
        assert!(!out.contains("-- disconnected --"));
        assert!(!out.contains("\r\n"));
    }
}
