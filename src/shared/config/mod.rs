//! Application configuration module
//!
//! `HubConfig` holds every knob of the streaming server. Values come from
//! defaults, then an optional TOML file, then `CHATHUB_*` environment
//! variables, and are checked by [`HubConfig::validate`].

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the optional TOML config file
pub const CONFIG_PATH_ENV: &str = "CHATHUB_CONFIG";

/// How the identity of a streaming client is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Identity key carried verbatim in the `userId` cookie
    #[default]
    Cookie,
    /// HS256 JWT in the `Authorization` header or the `token` cookie
    Jwt,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(Self::Cookie),
            "jwt" => Ok(Self::Jwt),
            other => Err(ConfigError::InvalidValue {
                key: "auth_mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Streaming server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// TCP port the HTTP server listens on
    pub port: u16,
    /// Seconds between heartbeat frames on an idle connection
    pub heartbeat_secs: u64,
    /// Bound of every session's inbound queue and offline backlog
    pub queue_capacity: usize,
    /// Attempts made for each write or flush
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_base_ms: u64,
    /// Seconds between connection monitor reports, 0 disables the monitor
    pub monitor_interval_secs: u64,
    /// Identity resolution strategy
    pub auth_mode: AuthMode,
    /// Secret for JWT verification
    pub jwt_secret: Option<String>,
    /// Identities allowed to announce and to list sessions
    pub admins: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: 5555,
            heartbeat_secs: 2,
            queue_capacity: 256,
            retry_attempts: 3,
            retry_base_ms: 100,
            monitor_interval_secs: 60,
            auth_mode: AuthMode::Cookie,
            jwt_secret: None,
            admins: Vec::new(),
        }
    }
}

impl HubConfig {
    /// Create a new HubConfigBuilder
    pub fn builder() -> HubConfigBuilder {
        HubConfigBuilder::default()
    }

    /// Load defaults, the optional TOML file and the environment, then validate
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_toml_file(path)?,
            Err(_) => Self::default(),
        };
        let config = config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document, missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Override fields from `CHATHUB_*` variables looked up through `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CHATHUB_PORT") {
            self.port = parse_value("port", &v)?;
        }
        if let Some(v) = lookup("CHATHUB_HEARTBEAT_SECS") {
            self.heartbeat_secs = parse_value("heartbeat_secs", &v)?;
        }
        if let Some(v) = lookup("CHATHUB_QUEUE_CAPACITY") {
            self.queue_capacity = parse_value("queue_capacity", &v)?;
        }
        if let Some(v) = lookup("CHATHUB_RETRY_ATTEMPTS") {
            self.retry_attempts = parse_value("retry_attempts", &v)?;
        }
        if let Some(v) = lookup("CHATHUB_RETRY_BASE_MS") {
            self.retry_base_ms = parse_value("retry_base_ms", &v)?;
        }
        if let Some(v) = lookup("CHATHUB_MONITOR_INTERVAL_SECS") {
            self.monitor_interval_secs = parse_value("monitor_interval_secs", &v)?;
        }
        if let Some(v) = lookup("CHATHUB_AUTH_MODE") {
            self.auth_mode = v.parse()?;
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.jwt_secret = Some(v);
        }
        if let Some(v) = lookup("CHATHUB_ADMINS") {
            self.admins = v
                .split(',')
                .map(str::trim)
                .filter(|admin| !admin.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::MissingValue("port"));
        }
        if self.heartbeat_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "heartbeat_secs",
                value: "0".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue_capacity",
                value: "0".to_string(),
            });
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retry_attempts",
                value: "0".to_string(),
            });
        }
        if self.auth_mode == AuthMode::Jwt
            && self.jwt_secret.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::MissingValue("jwt_secret"));
        }
        Ok(())
    }

    /// Whether `identity` may use the administrative endpoints
    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.iter().any(|admin| admin == identity)
    }

    /// Heartbeat period
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Base backoff delay
    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }

    /// Monitor period, `None` when disabled
    pub fn monitor_interval(&self) -> Option<Duration> {
        (self.monitor_interval_secs > 0).then(|| Duration::from_secs(self.monitor_interval_secs))
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Builder for HubConfig
#[derive(Debug, Default)]
pub struct HubConfigBuilder {
    config: HubConfig,
}

impl HubConfigBuilder {
    /// Set the listening port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the heartbeat period in seconds
    pub fn heartbeat_secs(mut self, secs: u64) -> Self {
        self.config.heartbeat_secs = secs;
        self
    }

    /// Set the inbound queue bound
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the retry budget and base delay
    pub fn retry(mut self, attempts: u32, base_ms: u64) -> Self {
        self.config.retry_attempts = attempts;
        self.config.retry_base_ms = base_ms;
        self
    }

    /// Set the monitor period in seconds
    pub fn monitor_interval_secs(mut self, secs: u64) -> Self {
        self.config.monitor_interval_secs = secs;
        self
    }

    /// Use JWT identity resolution with the given secret
    pub fn jwt(mut self, secret: impl Into<String>) -> Self {
        self.config.auth_mode = AuthMode::Jwt;
        self.config.jwt_secret = Some(secret.into());
        self
    }

    /// Allow `identity` to use the administrative endpoints
    pub fn admin(mut self, identity: impl Into<String>) -> Self {
        self.config.admins.push(identity.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<HubConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("invalid config file: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = HubConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.heartbeat(), Duration::from_secs(2));
        assert_eq!(config.retry_base(), Duration::from_millis(100));
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn test_toml_partial_document() {
        let document = "port = 8080\nauth_mode = \"jwt\"\njwt_secret = \"s\"";
        let config = HubConfig::from_toml_str(document).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.auth_mode, AuthMode::Jwt);
        assert_eq!(config.queue_capacity, 256);
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "heartbeat_secs = 15").unwrap();
        let config = HubConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.heartbeat_secs, 15);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = HubConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CHATHUB_PORT", "9000"),
            ("CHATHUB_HEARTBEAT_SECS", "5"),
            ("CHATHUB_AUTH_MODE", "JWT"),
            ("JWT_SECRET", "topsecret"),
        ]
        .into_iter()
        .collect();
        let config = HubConfig::default()
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.heartbeat_secs, 5);
        assert_eq!(config.auth_mode, AuthMode::Jwt);
        assert_eq!(config.jwt_secret.as_deref(), Some("topsecret"));
    }

    #[test]
    fn test_admins_from_env_and_toml() {
        let config = HubConfig::default()
            .apply_env(|key| (key == "CHATHUB_ADMINS").then(|| " ops, alice ,,".to_string()))
            .unwrap();
        assert_eq!(config.admins, vec!["ops".to_string(), "alice".to_string()]);
        assert!(config.is_admin("alice"));
        assert!(!config.is_admin("bob"));

        let config = HubConfig::from_toml_str("admins = [\"root\"]").unwrap();
        assert!(config.is_admin("root"));
        assert!(!HubConfig::default().is_admin(""));
    }

    #[test]
    fn test_env_invalid_number() {
        let err = HubConfig::default()
            .apply_env(|key| (key == "CHATHUB_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "port",
                value: "http".to_string()
            }
        );
    }

    #[test]
    fn test_jwt_mode_requires_secret() {
        let config = HubConfig {
            auth_mode: AuthMode::Jwt,
            ..HubConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingValue("jwt_secret")));
    }

    #[test]
    fn test_builder_rejects_zero_heartbeat() {
        assert!(HubConfig::builder().heartbeat_secs(0).build().is_err());
    }

    #[test]
    fn test_monitor_interval_disabled() {
        let config = HubConfig::builder().monitor_interval_secs(0).build().unwrap();
        assert!(config.monitor_interval().is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_load_reads_file_named_by_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "queue_capacity = 32").unwrap();
        std::env::set_var(CONFIG_PATH_ENV, file.path());
        std::env::set_var("CHATHUB_RETRY_ATTEMPTS", "5");
        let config = HubConfig::load();
        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::remove_var("CHATHUB_RETRY_ATTEMPTS");
        let config = config.unwrap();
        assert_eq!(config.queue_capacity, 32);
        assert_eq!(config.retry_attempts, 5);
    }
}
