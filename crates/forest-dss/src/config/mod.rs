use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::eligibility::DEFAULT_TOP_K;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the decision-support service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub models: ModelConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("DSS_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("DSS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("DSS_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("DSS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("DSS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        )?;

        let model_root = env::var("DSS_MODEL_DIR").unwrap_or_else(|_| "models".to_string());
        let top_k = match env::var("DSS_TOP_K") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => return Err(ConfigError::InvalidTopK { value: raw }),
            },
            Err(_) => DEFAULT_TOP_K,
        };
        let cache_artifacts = match env::var("DSS_CACHE_ARTIFACTS") {
            Ok(raw) => parse_switch(&raw).ok_or(ConfigError::InvalidSwitch {
                name: "DSS_CACHE_ARTIFACTS",
                value: raw,
            })?,
            Err(_) => true,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            models: ModelConfig {
                root: PathBuf::from(model_root),
                top_k,
                cache_artifacts,
            },
        })
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log filter and output shape.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::InvalidLogFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Where trained artifacts live and how results are explained.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub root: PathBuf,
    pub top_k: usize,
    pub cache_artifacts: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat { value: String },
    InvalidTopK { value: String },
    InvalidSwitch { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "DSS_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "DSS_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat { value } => {
                write!(f, "DSS_LOG_FORMAT must be 'compact' or 'pretty', got '{value}'")
            }
            ConfigError::InvalidTopK { value } => {
                write!(f, "DSS_TOP_K must be a positive integer, got '{value}'")
            }
            ConfigError::InvalidSwitch { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat { .. }
            | ConfigError::InvalidTopK { .. }
            | ConfigError::InvalidSwitch { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "DSS_ENV",
            "DSS_HOST",
            "DSS_PORT",
            "DSS_LOG_LEVEL",
            "DSS_LOG_FORMAT",
            "DSS_MODEL_DIR",
            "DSS_TOP_K",
            "DSS_CACHE_ARTIFACTS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.models.root, PathBuf::from("models"));
        assert_eq!(config.models.top_k, 3);
        assert!(config.models.cache_artifacts);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DSS_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8000));
        reset_env();
    }

    #[test]
    fn rejects_zero_top_k() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DSS_TOP_K", "0");
        let error = AppConfig::load().expect_err("zero top-k rejected");
        assert!(matches!(error, ConfigError::InvalidTopK { .. }));
        reset_env();
    }

    #[test]
    fn reads_model_settings_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DSS_MODEL_DIR", "/srv/dss/models");
        env::set_var("DSS_TOP_K", "5");
        env::set_var("DSS_CACHE_ARTIFACTS", "off");
        env::set_var("DSS_LOG_FORMAT", "Pretty");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.models.root, PathBuf::from("/srv/dss/models"));
        assert_eq!(config.models.top_k, 5);
        assert!(!config.models.cache_artifacts);
        assert_eq!(config.telemetry.format, LogFormat::Pretty);
        reset_env();
    }
}
