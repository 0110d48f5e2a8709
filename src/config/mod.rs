//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the binary)
//!
//! The session core never reads configuration itself; callers resolve a
//! [`Config`] and pass endpoint, credential and deadline explicitly.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LivegenError, Result};
use crate::protocol::{DEFAULT_DEADLINE_SECS, DEFAULT_ENDPOINT};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| LivegenError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| LivegenError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`<config dir>/livegen/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("livegen").join("config.toml"))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Service settings
        if let Ok(key) = std::env::var("KNOWLIFY_API_KEY") {
            if !key.is_empty() {
                config.service.api_key = Some(key);
            }
        }
        if let Ok(endpoint) = std::env::var("LIVEGEN_ENDPOINT") {
            config.service.endpoint = endpoint;
        }
        if let Ok(secs) = std::env::var("LIVEGEN_DEADLINE_SECS") {
            if let Ok(secs) = secs.parse() {
                config.service.deadline_secs = secs;
            }
        }

        // Server settings
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(host) = std::env::var("LIVEGEN_HOST") {
            config.server.host = host;
        }

        config
    }

    /// Merge with another config (other takes precedence where it differs
    /// from the defaults)
    pub fn merge(self, other: Self) -> Self {
        let service_defaults = ServiceConfig::default();
        let server_defaults = ServerConfig::default();

        Self {
            service: ServiceConfig {
                endpoint: if other.service.endpoint != service_defaults.endpoint {
                    other.service.endpoint
                } else {
                    self.service.endpoint
                },
                api_key: other.service.api_key.or(self.service.api_key),
                deadline_secs: if other.service.deadline_secs != service_defaults.deadline_secs {
                    other.service.deadline_secs
                } else {
                    self.service.deadline_secs
                },
                connect_timeout_secs: if other.service.connect_timeout_secs
                    != service_defaults.connect_timeout_secs
                {
                    other.service.connect_timeout_secs
                } else {
                    self.service.connect_timeout_secs
                },
            },
            server: ServerConfig {
                host: if other.server.host != server_defaults.host {
                    other.server.host
                } else {
                    self.server.host
                },
                port: if other.server.port != server_defaults.port {
                    other.server.port
                } else {
                    self.server.port
                },
                rate_limit_max: if other.server.rate_limit_max != server_defaults.rate_limit_max {
                    other.server.rate_limit_max
                } else {
                    self.server.rate_limit_max
                },
                rate_limit_window_secs: if other.server.rate_limit_window_secs
                    != server_defaults.rate_limit_window_secs
                {
                    other.server.rate_limit_window_secs
                } else {
                    self.server.rate_limit_window_secs
                },
                cors_enabled: if other.server.cors_enabled != server_defaults.cors_enabled {
                    other.server.cors_enabled
                } else {
                    self.server.cors_enabled
                },
            },
        }
    }
}

/// Generation service configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// WebSocket endpoint of the generation service
    pub endpoint: String,

    /// Access credential
    pub api_key: Option<String>,

    /// Session deadline in seconds
    pub deadline_secs: u64,

    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            connect_timeout_secs: 15,
        }
    }
}

impl ServiceConfig {
    /// Session deadline
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Connection establishment timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("deadline_secs", &self.deadline_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Generation requests allowed per client within one window
    pub rate_limit_max: u32,

    /// Rate limit window in seconds
    pub rate_limit_window_secs: u64,

    /// Enable permissive CORS
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            rate_limit_max: 5,
            rate_limit_window_secs: 15 * 60, // 15 minutes
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Get the full listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse the listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr()
            .parse()
            .map_err(|e| LivegenError::Config(format!("Invalid listen address: {e}")))
    }

    /// Rate limit window
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
