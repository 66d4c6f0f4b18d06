//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//!
//! ```bash
//! export JWT_SECRET="a-long-random-signing-secret"
//! export TOKEN_TTL_SECONDS="86400"
//! export LISTEN="0.0.0.0:3000"
//! ```
//!
//! ## Required Variables
//!
//! - `JWT_SECRET` - HS256 signing key for access tokens (at least 16 bytes)
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `TOKEN_TTL_SECONDS` - Access token lifetime (default: 86400)
//! - `PASSWORD_PEPPER` - Server-side secret mixed into password hashes

use anyhow::{Context, Result};
use std::env;

use crate::auth::token::MAX_TTL_SECONDS;

const MIN_SECRET_LENGTH: usize = 16;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// HS256 key used to sign and verify access tokens.
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
    /// Empty when `PASSWORD_PEPPER` is unset.
    pub password_pepper: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is missing or `TOKEN_TTL_SECONDS` is
    /// not a number.
    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let token_ttl_seconds = match env::var("TOKEN_TTL_SECONDS") {
            Ok(v) => v
                .parse::<u64>()
                .with_context(|| format!("TOKEN_TTL_SECONDS must be a number, got '{v}'"))?,
            Err(_) => 86_400,
        };

        let password_pepper = env::var("PASSWORD_PEPPER").unwrap_or_default();

        Ok(Self {
            listen_addr,
            log_level,
            log_format,
            jwt_secret,
            token_ttl_seconds,
            password_pepper,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is not `host:port`
    /// - `jwt_secret` is shorter than 16 bytes
    /// - `token_ttl_seconds` is zero or longer than ten years
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if self.jwt_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {MIN_SECRET_LENGTH} bytes");
        }

        if self.token_ttl_seconds == 0 || self.token_ttl_seconds > MAX_TTL_SECONDS {
            anyhow::bail!(
                "TOKEN_TTL_SECONDS must be between 1 and {MAX_TTL_SECONDS}, got {}",
                self.token_ttl_seconds
            );
        }

        Ok(())
    }

    /// Prints configuration summary (without secrets).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!("  Token TTL: {}s", self.token_ttl_seconds);
        tracing::info!(
            "  Password pepper: {}",
            if self.password_pepper.is_empty() {
                "disabled"
            } else {
                "enabled"
            }
        );
    }
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if required variables are missing or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
