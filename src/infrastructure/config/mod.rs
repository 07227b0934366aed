//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::application::messaging::RenderFormat;

/// Client configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    pub url: String,
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Joined automatically once connected
    pub username: Option<String>,
    pub typing_timeout_ms: u64,
    pub command_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DisplayConfig {
    pub format: RenderFormat,
    pub timestamps: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8765".to_string(),
            reconnect_delay_ms: 3000,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: None,
            typing_timeout_ms: 1000,
            command_prefix: "/".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: RenderFormat::Plain,
            timestamps: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Load from `path` if it exists, otherwise start from defaults
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Apply `CHATLINE_URL` / `CHATLINE_USERNAME`
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("CHATLINE_URL").ok(),
            std::env::var("CHATLINE_USERNAME").ok(),
        );
    }

    pub fn apply_overrides(&mut self, url: Option<String>, username: Option<String>) {
        if let Some(url) = url {
            self.server.url = url;
        }
        if let Some(username) = username {
            self.client.username = Some(username);
        }
    }

    /// Check values the client cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.server.url)
            .map_err(|e| ConfigError::InvalidValue(format!("server.url {}: {}", self.server.url, e)))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidValue(format!(
                "server.url must use ws:// or wss://, got {}://",
                url.scheme()
            )));
        }

        if self.server.reconnect_delay_ms == 0 {
            return Err(ConfigError::InvalidValue("server.reconnect-delay-ms must be positive".into()));
        }

        if self.client.typing_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("client.typing-timeout-ms must be positive".into()));
        }

        if self.client.command_prefix.is_empty() {
            return Err(ConfigError::InvalidValue("client.command-prefix cannot be empty".into()));
        }

        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.server.reconnect_delay_ms)
    }

    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.client.typing_timeout_ms)
    }
}
