// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! by the gateway. Configuration is loaded from the environment at startup;
//! a missing signing secret is the only condition that aborts startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET_KEY` | HS256 signing secret for bearer tokens | Required |
//! | `JWT_ACCESS_TOKEN_EXPIRES` | Access token lifetime in seconds | `900` |
//! | `JWT_LEEWAY_SECONDS` | Grace window added to token expiry | `0` |
//! | `PASSWORD_HASH_ITERATIONS` | PBKDF2 iteration count for new hashes | `600000` |
//! | `ISSUE_API_KEY_ON_REGISTER` | Mint an API key for each new principal | `true` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::num::NonZeroU32;

use chrono::Duration;
use thiserror::Error;

/// Environment variable holding the token signing secret.
pub const JWT_SECRET_KEY_ENV: &str = "JWT_SECRET_KEY";

/// Environment variable for the access token lifetime, in seconds.
pub const JWT_ACCESS_TOKEN_EXPIRES_ENV: &str = "JWT_ACCESS_TOKEN_EXPIRES";

/// Environment variable for the expiry grace window, in seconds.
pub const JWT_LEEWAY_SECONDS_ENV: &str = "JWT_LEEWAY_SECONDS";

/// Environment variable for the PBKDF2 iteration count.
pub const PASSWORD_HASH_ITERATIONS_ENV: &str = "PASSWORD_HASH_ITERATIONS";

/// Environment variable toggling API key issuance at registration.
pub const ISSUE_API_KEY_ON_REGISTER_ENV: &str = "ISSUE_API_KEY_ON_REGISTER";

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 900;

/// Longest accepted access token lifetime and expiry leeway (one year).
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Default PBKDF2 iteration count.
pub const DEFAULT_HASH_ITERATIONS: u32 = 600_000;

/// Secrets shorter than this are accepted but logged as weak.
const RECOMMENDED_SECRET_LEN: usize = 32;

/// Configuration errors. Any of these aborts startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{JWT_SECRET_KEY_ENV} must be set to a non-empty value")]
    MissingSigningSecret,

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Token signing secret. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Wrap a secret, rejecting empty input.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::MissingSigningSecret);
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret([REDACTED; {} bytes])", self.0.len())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Symmetric secret used to sign and verify bearer tokens.
    pub signing_secret: SigningSecret,
    /// Lifetime of tokens issued without an explicit TTL.
    pub access_token_ttl: Duration,
    /// Grace window applied when checking expiry. Zero means strict.
    pub token_leeway: Duration,
    /// PBKDF2 iteration count for newly hashed passwords.
    pub hash_iterations: NonZeroU32,
    /// Whether registration also mints an API key.
    pub issue_api_key_on_register: bool,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Configuration with defaults around the given secret.
    pub fn new(signing_secret: SigningSecret) -> Self {
        Self {
            signing_secret,
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            token_leeway: Duration::zero(),
            hash_iterations: NonZeroU32::new(DEFAULT_HASH_ITERATIONS)
                .unwrap_or(NonZeroU32::MIN),
            issue_api_key_on_register: true,
            log_format: LogFormat::default(),
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(JWT_SECRET_KEY_ENV).ok_or(ConfigError::MissingSigningSecret)?;
        let signing_secret = SigningSecret::new(secret)?;
        if signing_secret.as_bytes().len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = signing_secret.as_bytes().len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "Token signing secret is shorter than recommended"
            );
        }

        let mut config = Self::new(signing_secret);

        if let Some(value) = lookup(JWT_ACCESS_TOKEN_EXPIRES_ENV) {
            config.access_token_ttl = parse_seconds(JWT_ACCESS_TOKEN_EXPIRES_ENV, &value, 1)?;
        }
        if let Some(value) = lookup(JWT_LEEWAY_SECONDS_ENV) {
            config.token_leeway = parse_seconds(JWT_LEEWAY_SECONDS_ENV, &value, 0)?;
        }
        if let Some(value) = lookup(PASSWORD_HASH_ITERATIONS_ENV) {
            config.hash_iterations = value
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| invalid(PASSWORD_HASH_ITERATIONS_ENV, &value))?;
        }
        if let Some(value) = lookup(ISSUE_API_KEY_ON_REGISTER_ENV) {
            config.issue_api_key_on_register = parse_bool(&value)
                .ok_or_else(|| invalid(ISSUE_API_KEY_ON_REGISTER_ENV, &value))?;
        }
        if let Some(value) = lookup(LOG_FORMAT_ENV) {
            config.log_format =
                LogFormat::parse(&value).ok_or_else(|| invalid(LOG_FORMAT_ENV, &value))?;
        }

        Ok(config)
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

/// Whole seconds in `min..=MAX_ACCESS_TOKEN_TTL_SECS`.
fn parse_seconds(name: &'static str, value: &str, min: i64) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|secs| (min..=MAX_ACCESS_TOKEN_TTL_SECS).contains(secs))
        .and_then(Duration::try_seconds)
        .ok_or_else(|| invalid(name, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
