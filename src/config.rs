//! HTTP front end configuration.
//!
//! The country table is compiled in; only the server's surroundings are
//! configurable.

use std::env;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_BATCH: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {name}={value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Server configuration loaded from environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (`IBAN_SERVER_ADDR`).
    pub addr: SocketAddr,
    /// Largest accepted batch for `POST /api/validate` (`IBAN_MAX_BATCH`).
    pub max_batch: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = match lookup("IBAN_SERVER_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "IBAN_SERVER_ADDR",
                value,
                reason: "expected host:port",
            })?,
            None => Self::default().addr,
        };

        let max_batch = match lookup("IBAN_MAX_BATCH") {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "IBAN_MAX_BATCH",
                        value,
                        reason: "expected a positive integer",
                    })
                }
            },
            None => DEFAULT_MAX_BATCH,
        };

        Ok(Self { addr, max_batch })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_batch: DEFAULT_MAX_BATCH,
        }
    }
}
