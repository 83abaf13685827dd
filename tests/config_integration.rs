use hov_admin::config::{AppConfig, DEFAULT_BACKEND_URL, LogFormat};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;

const ARGV0: [&str; 1] = ["hov-admin"];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        for key in [
            "HOV_SERVER__PORT",
            "HOV_BACKEND__BASE_URL",
            "HOV_LOGGING__FORMAT",
            "CONFIG_FILE",
            "PORT",
            "HOST",
            "API_BASE_URL",
            "SESSION_FILE",
            "LOG_FORMAT",
        ] {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(ARGV0).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.backend.base_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(
        config.storage.session_file,
        PathBuf::from(".hov-admin/session.json")
    );
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("HOV_SERVER__PORT", "9090");
        env::set_var("HOV_BACKEND__BASE_URL", "http://localhost:5000/api");
    }

    let config = AppConfig::load_from_args(ARGV0).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.backend.base_url, "http://localhost:5000/api");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("HOV_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([
        "hov-admin",
        "--port",
        "8181",
        "--log-format",
        "JSON",
        "--session-file",
        "/tmp/hov/session.json",
    ])
    .expect("Failed to load config");
    assert_eq!(config.server.port, 8181);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(
        config.storage.session_file,
        PathBuf::from("/tmp/hov/session.json")
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("hov.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
backend:
  base_url: "https://staging.example.com/api"
"#,
    )
    .expect("Failed to write temp config");

    let config = AppConfig::load_from_args([
        "hov-admin",
        "--config",
        file_path.to_str().expect("utf-8 path"),
    ])
    .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.backend.base_url, "https://staging.example.com/api");
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();
    let result = AppConfig::load_from_args(["hov-admin", "--config", "/nonexistent/hov.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_unknown_log_format_is_rejected() {
    clear_env_vars();
    let result = AppConfig::load_from_args(["hov-admin", "--log-format", "xml"]);
    assert!(result.is_err());
}
