//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Backend host override, same name the container deployment uses.
pub const ENV_BACKEND_HOST: &str = "TCP_HOST";
/// Backend port override.
pub const ENV_BACKEND_PORT: &str = "TCP_PORT";
/// HTTP listener port override.
pub const ENV_HTTP_PORT: &str = "BRIDGE_HTTP_PORT";
/// WebSocket listener port override.
pub const ENV_WS_PORT: &str = "BRIDGE_WS_PORT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value {:?} for environment variable {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: BridgeConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the startup configuration: file when given, defaults otherwise,
/// with environment overrides applied on top.
pub fn load_startup_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = BridgeConfig::default();
            apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut BridgeConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_BACKEND_HOST).filter(|h| !h.trim().is_empty()) {
        config.backend.host = host.trim().to_string();
    }
    if let Some(port) = port_var(&lookup, ENV_BACKEND_PORT)? {
        config.backend.port = port;
    }
    if let Some(port) = port_var(&lookup, ENV_HTTP_PORT)? {
        config.listener.http_address = with_port(&config.listener.http_address, port);
    }
    if let Some(port) = port_var(&lookup, ENV_WS_PORT)? {
        config.listener.ws_address = with_port(&config.listener.ws_address, port);
    }
    Ok(())
}

fn port_var<F>(lookup: &F, var: &'static str) -> Result<Option<u16>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}

/// Replace the port of a `host:port` bind address.
fn with_port(address: &str, port: u16) -> String {
    match address.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", address, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_backend_and_ports() {
        let mut config = BridgeConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("TCP_HOST", "backend"),
                ("TCP_PORT", "8080"),
                ("BRIDGE_HTTP_PORT", "4001"),
                ("BRIDGE_WS_PORT", "4002"),
            ]),
        )
        .unwrap();

        assert_eq!(config.backend.host, "backend");
        assert_eq!(config.backend.port, 8080);
        assert_eq!(config.listener.http_address, "0.0.0.0:4001");
        assert_eq!(config.listener.ws_address, "0.0.0.0:4002");
    }

    #[test]
    fn blank_host_ignored() {
        let mut config = BridgeConfig::default();
        apply_env_overrides(&mut config, env(&[("TCP_HOST", "  ")])).unwrap();
        assert_eq!(config.backend.host, "localhost");
    }

    #[test]
    fn bad_port_rejected() {
        let mut config = BridgeConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("TCP_PORT", "70000")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "TCP_PORT", .. }));
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("game-bridge-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[backend]\nhost = \"10.0.0.7\"\nport = 6000\n\n[admin]\nenabled = true\napi_key = \"k\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.backend.port, 6000);
        assert!(config.admin.enabled);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn invalid_file_reports_validation() {
        let path = std::env::temp_dir().join(format!("game-bridge-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[timeouts]\nconnect_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("timeouts.connect_secs"));

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/game-bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
