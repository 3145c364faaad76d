//! Service configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or
//! no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding `server.port`
pub const PORT_ENV: &str = "CALC_PORT";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub pool: PoolSection,
    #[serde(default)]
    pub operations: OperationsSection,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Worker pool and dispatch queue settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolSection {
    /// Number of worker agents, fixed for the process lifetime
    #[serde(default = "default_agents")]
    pub agents: usize,
    /// Maximum number of tasks waiting for an agent
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// What submission does when the queue is full
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            queue_capacity: default_queue_capacity(),
            overflow: OverflowPolicy::default(),
        }
    }
}

fn default_agents() -> usize {
    3
}

fn default_queue_capacity() -> usize {
    100
}

/// Queue overflow policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Submission waits until an agent frees a slot
    #[default]
    Block,
    /// Submission fails immediately with `queue_full`
    Reject,
}

/// Simulated operator durations in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationsSection {
    #[serde(default = "default_addition_ms")]
    pub addition_ms: u64,
    #[serde(default = "default_subtraction_ms")]
    pub subtraction_ms: u64,
    #[serde(default = "default_multiplication_ms")]
    pub multiplication_ms: u64,
    #[serde(default = "default_division_ms")]
    pub division_ms: u64,
}

impl Default for OperationsSection {
    fn default() -> Self {
        Self {
            addition_ms: default_addition_ms(),
            subtraction_ms: default_subtraction_ms(),
            multiplication_ms: default_multiplication_ms(),
            division_ms: default_division_ms(),
        }
    }
}

fn default_addition_ms() -> u64 {
    20_000
}

fn default_subtraction_ms() -> u64 {
    30_000
}

fn default_multiplication_ms() -> u64 {
    25_000
}

fn default_division_ms() -> u64 {
    50_000
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid environment override {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ServiceConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.agents == 0 {
            return Err(ConfigError::InvalidConfig(
                "pool.agents must be at least 1".to_string(),
            ));
        }
        if self.pool.queue_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "pool.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must not be 0".to_string(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Apply environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(PORT_ENV) {
            self.server.port = parse_port(&value).ok_or_else(|| ConfigError::InvalidEnvVar {
                name: PORT_ENV.to_string(),
                value,
            })?;
        }
        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                ConfigError::InvalidConfig(format!(
                    "invalid server address {}:{}: {e}",
                    self.server.host, self.server.port
                ))
            })
    }
}

fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok().filter(|port| *port != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();

        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pool.agents, 3);
        assert_eq!(config.pool.queue_capacity, 100);
        assert_eq!(config.pool.overflow, OverflowPolicy::Block);
        assert_eq!(config.operations.division_ms, 50_000);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = ServiceConfig::from_toml_str(
            r#"
[pool]
agents = 5

[operations]
addition_ms = 10
"#,
        )
        .unwrap();

        assert_eq!(config.pool.agents, 5);
        assert_eq!(config.pool.queue_capacity, 100);
        assert_eq!(config.operations.addition_ms, 10);
        assert_eq!(config.operations.subtraction_ms, 30_000);
    }

    #[test]
    fn test_overflow_policy_parses_lowercase() {
        let config = ServiceConfig::from_toml_str(
            r#"
[pool]
overflow = "reject"
"#,
        )
        .unwrap();
        assert_eq!(config.pool.overflow, OverflowPolicy::Reject);

        assert!(ServiceConfig::from_toml_str("[pool]\noverflow = \"drop\"").is_err());
    }

    #[test]
    fn test_zero_agents_rejected() {
        let result = ServiceConfig::from_toml_str("[pool]\nagents = 0");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let result = ServiceConfig::from_toml_str("[pool]\nqueue_capacity = 0");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let result = ServiceConfig::from_toml_str("[server]\nhost = \"not a host\"");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_socket_addr() {
        let mut config = ServiceConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;

        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:9090".parse().unwrap()
        );
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8081"), Some(8081));
        assert_eq!(parse_port(" 9000 "), Some(9000));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port("http"), None);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = ServiceConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(ServiceConfig::from_toml_str(&text).unwrap(), config);
    }
}
