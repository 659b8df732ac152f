//! Integration tests for configuration management
//!
//! These tests validate that the configuration system properly reads
//! environment variables and that the extension server binds to the
//! configured port.

use aigw_extserver::observability::MetricsRecorder;
use aigw_extserver::storage::InMemoryRouteStore;
use aigw_extserver::{xds, Config, Error, Result};
use std::env;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: [&str; 3] = ["AIGW_PORT", "AIGW_HOST", "AIGW_ROUTES_PATH"];

/// Run `f` with `vars` set and every other tracked variable removed.
fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let saved: Vec<_> = VARS.iter().map(|k| (*k, env::var(k).ok())).collect();

    for key in VARS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
    result
}

#[test]
fn test_config_environment_integration() -> Result<()> {
    let config = with_env(
        &[("AIGW_PORT", "18001"), ("AIGW_HOST", "127.0.0.1"), ("AIGW_ROUTES_PATH", "/tmp/r.yaml")],
        Config::from_env,
    )?;
    assert_eq!(config.server.port, 18001);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.resolver.manifest_path.as_deref(), Some(std::path::Path::new("/tmp/r.yaml")));

    let invalid = with_env(&[("AIGW_PORT", "invalid")], Config::from_env);
    assert!(matches!(invalid, Err(Error::Config { .. })));

    Ok(())
}

#[test]
fn test_config_defaults_integration() -> Result<()> {
    let config = with_env(&[], Config::from_env)?;
    assert_eq!(config.server.port, 1063);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.resolver.manifest_path, None);
    config.validate()
}

/// Find an available port for testing
fn find_available_port() -> u16 {
    for port in 18001..19000 {
        if TcpListener::bind(("127.0.0.1", port)).is_ok() {
            return port;
        }
    }
    panic!("No available ports found for testing");
}

fn test_config(port: u16) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config
}

fn hook(config: &Config) -> xds::HookService {
    xds::hook_service(
        config,
        Arc::new(InMemoryRouteStore::new()),
        MetricsRecorder::new(),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_server_binds_to_configured_port() -> Result<()> {
    let config = test_config(find_available_port());

    let shutdown_signal = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
    };
    let server = xds::start_extension_server(&config.server, hook(&config), shutdown_signal);

    let result = timeout(Duration::from_secs(5), server).await;
    assert!(result.is_ok(), "server did not shut down in time");
    result.unwrap()
}

#[tokio::test]
async fn test_server_reports_port_in_use() {
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let config = test_config(occupied.local_addr().unwrap().port());

    let server = xds::start_extension_server(&config.server, hook(&config), async {});
    let result =
        timeout(Duration::from_secs(5), server).await.expect("bind failure is reported promptly");

    assert!(matches!(result, Err(Error::Transport { .. })));
}
