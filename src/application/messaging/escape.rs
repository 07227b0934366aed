//! Escaping of untrusted text before it reaches the output

use serde::{Deserialize, Serialize};

/// Output medium for rendered lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderFormat {
    /// Terminal text with control characters removed
    #[default]
    Plain,
    /// One HTML fragment per line
    Html,
}

impl RenderFormat {
    /// Make untrusted text safe for this format
    pub fn escape(&self, text: &str) -> String {
        match self {
            RenderFormat::Plain => strip_controls(text),
            RenderFormat::Html => escape_html(&strip_controls(text)),
        }
    }
}

/// Replace the HTML metacharacters with entities
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Drop terminal control characters.
///
/// Line breaks become spaces so one message stays on one line; tab is kept.
/// Removing ESC disarms any escape sequence that follows it.
pub fn strip_controls(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' | '\r' => Some(' '),
            '\t' => Some(c),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}
