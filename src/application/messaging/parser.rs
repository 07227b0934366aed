//! Input parser - Turns typed lines into client commands

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Join with a username
    Join(String),
    /// Send a chat message
    Text(String),
    Quit,
    Help,
    Status,
    Unknown(String),
    Empty,
}

/// Parses input lines into commands
pub struct InputParser {
    command_prefix: String,
}

impl InputParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a line. Until a username is joined, plain text is a join request.
    pub fn parse(&self, line: &str, joined: bool) -> InputCommand {
        let line = line.trim();
        if line.is_empty() {
            return InputCommand::Empty;
        }

        if let Some(cmd_text) = line.strip_prefix(self.command_prefix.as_str()) {
            return self.parse_command(cmd_text);
        }

        if joined {
            InputCommand::Text(line.to_string())
        } else {
            InputCommand::Join(line.to_string())
        }
    }

    fn parse_command(&self, cmd_text: &str) -> InputCommand {
        let (name, rest) = match cmd_text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (cmd_text, ""),
        };

        match name.to_lowercase().as_str() {
            "join" => InputCommand::Join(rest.to_string()),
            "quit" | "exit" => InputCommand::Quit,
            "help" => InputCommand::Help,
            "status" => InputCommand::Status,
            _ => InputCommand::Unknown(name.to_string()),
        }
    }

    /// Help text listing the commands
    pub fn help(&self) -> String {
        let p = &self.command_prefix;
        format!(
            "Commands:\n{p}join NAME - join the chat\n{p}status - show connection status\n{p}help - show this message\n{p}quit - leave"
        )
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new("/")
    }
}
