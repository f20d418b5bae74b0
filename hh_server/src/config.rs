//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use heist_holdem::SessionConfig;
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address.
    pub bind: SocketAddr,
    /// Game session tunables.
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:3000"
                    .parse()
                    .expect("Default bind address is valid")
            });

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            min_players: parse_env_or("MIN_PLAYERS", defaults.min_players),
            tomato_ttl_ms: parse_env_or("TOMATO_TTL_MS", defaults.tomato_ttl_ms),
            chat_log_cap: parse_env_or("CHAT_LOG_CAP", defaults.chat_log_cap),
            max_chat_len: parse_env_or("MAX_CHAT_LEN", defaults.max_chat_len),
        };

        Ok(ServerConfig { bind, session })
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session
            .validate()
            .map_err(|err| ConfigError::Invalid {
                var: "session".to_string(),
                reason: err.to_string(),
            })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable with a default fallback.
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
