use mcp_cockpit::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

// Clear environment variables that feed into config loading, so tests only
// see what they set themselves.
fn clear_env_vars() {
    unsafe {
        env::remove_var("COCKPIT_SERVER__HOST");
        env::remove_var("COCKPIT_SERVER__PORT");
        env::remove_var("COCKPIT_MOCK__ENABLED");
        env::remove_var("COCKPIT_MOCK__PORT");
        env::remove_var("COCKPIT_MCP__CONFIG_PATH");
        env::remove_var("CONFIG_FILE");
        env::remove_var("HOST");
        env::remove_var("PORT");
        env::remove_var("MCP_CONFIG");
        env::remove_var("MOCK_DISABLED");
        env::remove_var("MOCK_PORT");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["mcp-cockpit"]).expect("defaults should load");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert!(config.mock.enabled);
    assert_eq!(config.mock.port, 8001);
    assert_eq!(config.mcp.config_path, "mcp.json");
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("COCKPIT_SERVER__PORT", "9090");
        env::set_var("COCKPIT_MOCK__ENABLED", "false");
    }

    let config = AppConfig::load_from_args(["mcp-cockpit"]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert!(!config.mock.enabled);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("COCKPIT_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["mcp-cockpit", "--port", "4000", "--mock-disabled"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 4000);
    assert!(!config.mock.enabled);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("cockpit.yaml");
    fs::write(
        &file_path,
        r"
server:
  port: 7070
mcp:
  config_path: servers.json
",
    )
    .expect("Failed to write temp config");

    let config = AppConfig::load_from_args([
        "mcp-cockpit",
        "--config",
        file_path.to_str().expect("utf-8 path"),
    ])
    .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.mcp.config_path, "servers.json");
    // Untouched keys keep their defaults.
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
#[serial]
fn test_mcp_config_path_flag() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["mcp-cockpit", "--mcp-config", "other.json"])
        .expect("Failed to load config");
    assert_eq!(config.mcp.config_path, "other.json");
}
