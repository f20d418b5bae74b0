//! Session configuration models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::constants;

/// Tunables for one game session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Minimum participating players required to start a hand.
    pub min_players: usize,

    /// How long a tomato event stays visible in snapshots.
    pub tomato_ttl_ms: u64,

    /// Chat log capacity; the oldest entry is evicted past it.
    pub chat_log_cap: usize,

    /// Chat messages are truncated to this many characters.
    pub max_chat_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_players: constants::MIN_PLAYERS,
            tomato_ttl_ms: constants::DEFAULT_TOMATO_TTL_MS,
            chat_log_cap: constants::CHAT_LOG_CAP,
            max_chat_len: constants::MAX_CHAT_LEN,
        }
    }
}

impl SessionConfig {
    /// Validate configuration before building a session from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 {
            return Err(ConfigError::Invalid {
                field: "min_players",
                reason: "must be at least 2".to_string(),
            });
        }
        // 2 hole cards each plus a 5-card board must fit one deck.
        if self.min_players > 23 {
            return Err(ConfigError::Invalid {
                field: "min_players",
                reason: "must be at most 23 (52-card deck)".to_string(),
            });
        }
        if self.chat_log_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "chat_log_cap",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.max_chat_len == 0 {
            return Err(ConfigError::Invalid {
                field: "max_chat_len",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
