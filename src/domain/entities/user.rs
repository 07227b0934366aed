use std::fmt;

/// Maximum characters in a username, after trimming
pub const MAX_USERNAME_CHARS: usize = 20;

/// A validated chat username
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

/// Why a username was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    Empty,
    TooLong,
}

impl fmt::Display for UsernameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsernameError::Empty => write!(f, "Username cannot be empty"),
            UsernameError::TooLong => {
                write!(f, "Username too long (max {} characters)", MAX_USERNAME_CHARS)
            }
        }
    }
}

impl Username {
    /// Trim and validate a candidate name
    pub fn parse(raw: &str) -> Result<Self, UsernameError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(UsernameError::Empty);
        }
        if name.chars().count() > MAX_USERNAME_CHARS {
            return Err(UsernameError::TooLong);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(Username::parse("  ana ").unwrap().as_str(), "ana");
    }

    #[test]
    fn test_parse_rejects_blank_and_long() {
        assert_eq!(Username::parse("   "), Err(UsernameError::Empty));
        assert_eq!(Username::parse(&"x".repeat(21)), Err(UsernameError::TooLong));
        assert!(Username::parse(&"é".repeat(20)).is_ok());
    }
}
