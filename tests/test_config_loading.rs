//! Configuration loading and validation tests
//!
//! Exercise file loading, defaults and environment overrides through the
//! public API.

use calc_agents::config::{ConfigError, OverflowPolicy, ServiceConfig, PORT_ENV};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[server]
host = "127.0.0.1"
port = 9090

[pool]
agents = 5
queue_capacity = 20
overflow = "reject"

[operations]
addition_ms = 10
subtraction_ms = 20
multiplication_ms = 30
division_ms = 40
"#
    )
    .unwrap();

    let config = ServiceConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.pool.agents, 5);
    assert_eq!(config.pool.queue_capacity, 20);
    assert_eq!(config.pool.overflow, OverflowPolicy::Reject);
    assert_eq!(config.operations.addition_ms, 10);
    assert_eq!(config.operations.division_ms, 40);
}

#[test]
fn test_partial_config_fills_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[pool]
agents = 2
"#
    )
    .unwrap();

    let config = ServiceConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.pool.agents, 2);
    assert_eq!(config.pool.queue_capacity, 100);
    assert_eq!(config.pool.overflow, OverflowPolicy::Block);
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.operations.addition_ms, 20_000);
    assert_eq!(config.operations.subtraction_ms, 30_000);
    assert_eq!(config.operations.multiplication_ms, 25_000);
    assert_eq!(config.operations.division_ms, 50_000);
}

#[test]
fn test_missing_file_is_read_error() {
    let result = ServiceConfig::load_from_file(Path::new("/nonexistent/calc-agents.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[pool\nagents = ").unwrap();

    let result = ServiceConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_unknown_overflow_policy_is_parse_error() {
    let result = ServiceConfig::from_toml_str("[pool]\noverflow = \"drop\"\n");
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_zero_agents_is_invalid() {
    let result = ServiceConfig::from_toml_str("[pool]\nagents = 0\n");
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_invalid_host_is_invalid() {
    let result = ServiceConfig::from_toml_str("[server]\nhost = \"not a host\"\n");
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

// Sole user of the port variable in this binary
#[test]
fn test_port_env_override() {
    let mut config = ServiceConfig::default();

    std::env::set_var(PORT_ENV, "9191");
    config.apply_env_overrides().unwrap();
    assert_eq!(config.server.port, 9191);

    std::env::set_var(PORT_ENV, "not-a-port");
    let result = config.apply_env_overrides();
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));

    std::env::remove_var(PORT_ENV);
    config.apply_env_overrides().unwrap();
    assert_eq!(config.server.port, 9191);
}
