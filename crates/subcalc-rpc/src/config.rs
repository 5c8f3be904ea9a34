//! Server configuration
//!
//! Read from environment variables so the same binary can be tuned per
//! deployment without flags.

use crate::{Result, RpcError};
use std::env;

/// Requests allowed per caller per minute
pub const RATE_LIMIT_ENV: &str = "SUBCALC_RATE_LIMIT_PER_MINUTE";
/// Turns rate limiting off entirely
pub const RATE_LIMIT_DISABLED_ENV: &str = "SUBCALC_RATE_LIMIT_DISABLED";

const DEFAULT_RATE_LIMIT: u32 = 60;

/// RPC server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Requests allowed per caller per minute
    pub rate_limit_per_minute: u32,
    /// Skip rate limiting
    pub rate_limit_disabled: bool,
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self> {
        let rate_limit_per_minute = match env::var(RATE_LIMIT_ENV) {
            Ok(value) => parse_limit(&value)?,
            Err(_) => DEFAULT_RATE_LIMIT,
        };

        let rate_limit_disabled = env::var(RATE_LIMIT_DISABLED_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Ok(Self {
            rate_limit_per_minute,
            rate_limit_disabled,
        })
    }

    /// Configuration with rate limiting turned off
    pub fn unlimited() -> Self {
        Self {
            rate_limit_per_minute: DEFAULT_RATE_LIMIT,
            rate_limit_disabled: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: DEFAULT_RATE_LIMIT,
            rate_limit_disabled: false,
        }
    }
}

fn parse_limit(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(RpcError::Config(format!(
            "{} must be a positive integer, got '{}'",
            RATE_LIMIT_ENV, value
        ))),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "t" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.rate_limit_per_minute, 60);
        assert!(!config.rate_limit_disabled);
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("120").unwrap(), 120);
        assert_eq!(parse_limit(" 5 ").unwrap(), 5);
        assert!(parse_limit("0").is_err());
        assert!(parse_limit("lots").is_err());
    }

    #[test]
    fn test_truthy_values() {
        for value in ["1", "true", "True", "t", "yes"] {
            assert!(is_truthy(value), "{}", value);
        }
        for value in ["0", "false", "", "no"] {
            assert!(!is_truthy(value), "{}", value);
        }
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(RATE_LIMIT_ENV, "15");
        std::env::set_var(RATE_LIMIT_DISABLED_ENV, "true");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.rate_limit_per_minute, 15);
        assert!(config.rate_limit_disabled);

        // Clean up
        std::env::remove_var(RATE_LIMIT_ENV);
        std::env::remove_var(RATE_LIMIT_DISABLED_ENV);
    }
}
