//! Configuration loading and typed config structures.
//!
//! The configuration lives in `imweb-config.yaml` next to the binary's
//! working directory. Every field has a default, so an empty or missing
//! file yields a server on port 4040 pacing frames at 20 Hz.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImwebConfig {
    /// Listener address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Frame loop and event queue tuning.
    #[serde(default)]
    pub frame: FrameConfig,

    /// Bootstrap page settings.
    #[serde(default)]
    pub page: PageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ImwebConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `IMWEB_HOST` overrides `server.host`
    /// - `IMWEB_PORT` overrides `server.port`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame.fps == 0 {
            return Err(ConfigError::Invalid {
                reason: "frame.fps must be at least 1".to_owned(),
            });
        }
        if self.frame.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "frame.queue_capacity must be at least 1".to_owned(),
            });
        }
        if !self.page.ws_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                reason: format!("page.ws_path must start with '/': {}", self.page.ws_path),
            });
        }
        if self.page.ws_path == "/" {
            return Err(ConfigError::Invalid {
                reason: "page.ws_path must not be the page root".to_owned(),
            });
        }
        Ok(())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Apply `IMWEB_HOST` / `IMWEB_PORT` if set.
    ///
    /// An unparseable port is ignored and the configured one is kept.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("IMWEB_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("IMWEB_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(e) => tracing::warn!(value = %val, error = %e, "ignoring invalid IMWEB_PORT"),
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// What the reader does when the event queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// The reader waits for the frame loop to drain. Ties the socket read
    /// rate to the frame rate.
    #[default]
    Block,
    /// The oldest queued event is discarded to make room.
    DropOldest,
}

/// What the frame loop does when a command fails to send for a reason
/// other than a disconnect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendErrorPolicy {
    /// Log the failure and keep sending the rest of the frame.
    #[default]
    Continue,
    /// Log the failure and skip the remaining commands of this frame.
    AbortFrame,
}

/// Frame loop and event queue tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameConfig {
    /// Target frame frequency in Hz.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Maximum number of pending events per session.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Backpressure policy of the event queue.
    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Policy for non-disconnect send failures.
    #[serde(default)]
    pub send_errors: SendErrorPolicy,
}

impl FrameConfig {
    /// Minimum spacing between frame starts (`1s / fps`).
    ///
    /// A zero `fps` yields a zero interval, i.e. unpaced frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1)
            .checked_div(self.fps)
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            queue_capacity: default_queue_capacity(),
            overflow: OverflowPolicy::default(),
            send_errors: SendErrorPolicy::default(),
        }
    }
}

/// Bootstrap page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageConfig {
    /// Document title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Path of the websocket endpoint.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Delay before the page reconnects after the socket closes.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            ws_path: default_ws_path(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    4040
}

const fn default_fps() -> u32 {
    20
}

const fn default_queue_capacity() -> usize {
    100
}

fn default_title() -> String {
    String::from("imweb")
}

fn default_ws_path() -> String {
    String::from("/ws")
}

const fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = ImwebConfig::default();
        assert_eq!(config.server.port, 4040);
        assert_eq!(config.frame.fps, 20);
        assert_eq!(config.frame.queue_capacity, 100);
        assert_eq!(config.frame.overflow, OverflowPolicy::Block);
        assert_eq!(config.frame.send_errors, SendErrorPolicy::Continue);
        assert_eq!(config.page.ws_path, "/ws");
        assert_eq!(config.page.reconnect_delay_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn twenty_hz_is_fifty_millis() {
        let frame = FrameConfig::default();
        assert_eq!(frame.frame_interval(), Duration::from_millis(50));
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
frame:
  fps: 60
  overflow: drop_oldest
  send_errors: abort_frame
page:
  title: Counter
";
        let config: ImwebConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.frame.fps, 60);
        assert_eq!(config.frame.queue_capacity, 100);
        assert_eq!(config.frame.overflow, OverflowPolicy::DropOldest);
        assert_eq!(config.frame.send_errors, SendErrorPolicy::AbortFrame);
        assert_eq!(config.page.title, "Counter");
        assert_eq!(config.page.ws_path, "/ws");
        assert_eq!(config.server.port, 4040);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let yaml = include_str!("../../../imweb-config.yaml");
        let config: ImwebConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config, ImwebConfig::default());
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: ImwebConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config, ImwebConfig::default());
    }

    #[test]
    fn zero_fps_is_rejected() {
        let mut config = ImwebConfig::default();
        config.frame.fps = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = ImwebConfig::default();
        config.frame.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_ws_path_is_rejected() {
        let mut config = ImwebConfig::default();
        config.page.ws_path = String::from("ws");
        assert!(config.validate().is_err());
        config.page.ws_path = String::from("/");
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result: Result<ImwebConfig, _> = serde_yml::from_str("frame: [not, a, map]");
        assert!(result.is_err());
    }
}
