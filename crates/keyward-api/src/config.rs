//! # Service Configuration
//!
//! Read once from the environment at startup.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `PORT` | `8080` | HTTP listen port |
//! | `ADMIN_TOKEN` | unset | bearer token for admin routes; unset disables admin auth |
//! | `LICENSE_RENEWAL_DAYS` | `30` | days added per renewal |
//! | `MAX_KEY_ATTEMPTS` | `5` | key generations per issuance |
//! | `LOG_FORMAT` | `plain` | `json` for structured logs |
//! | `METRICS_ENABLED` | `true` | `false` disables `/metrics` and request metrics |
//!
//! `DATABASE_URL` and `RUST_LOG` are read by [`crate::db::init_pool`] and the
//! tracing subscriber respectively.

use keyward_state::{EngineConfig, DEFAULT_MAX_KEY_ATTEMPTS, DEFAULT_RENEWAL_DAYS, MAX_DURATION_DAYS};
use thiserror::Error;

/// A configuration variable held an unusable value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Application configuration.
///
/// Custom `Debug` redacts the admin token.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Bearer token required on admin routes. `None` disables admin auth.
    pub admin_token: Option<String>,
    pub renewal_extension_days: i64,
    pub max_key_attempts: u32,
    pub log_format: LogFormat,
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .field("renewal_extension_days", &self.renewal_extension_days)
            .field("max_key_attempts", &self.max_key_attempts)
            .field("log_format", &self.log_format)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_token: None,
            renewal_extension_days: DEFAULT_RENEWAL_DAYS,
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,
            log_format: LogFormat::Plain,
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_or(&lookup, "PORT", defaults.port)?;

        let admin_token = lookup("ADMIN_TOKEN").filter(|t| !t.trim().is_empty());

        let renewal_extension_days =
            parse_or(&lookup, "LICENSE_RENEWAL_DAYS", defaults.renewal_extension_days)?;
        if !(1..=MAX_DURATION_DAYS).contains(&renewal_extension_days) {
            return Err(invalid(
                "LICENSE_RENEWAL_DAYS",
                renewal_extension_days.to_string(),
                format!("must be between 1 and {MAX_DURATION_DAYS}"),
            ));
        }

        let max_key_attempts = parse_or(&lookup, "MAX_KEY_ATTEMPTS", defaults.max_key_attempts)?;
        if max_key_attempts == 0 {
            return Err(invalid("MAX_KEY_ATTEMPTS", "0".into(), "must be at least 1".into()));
        }

        let log_format = match lookup("LOG_FORMAT") {
            None => LogFormat::Plain,
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "" | "plain" | "text" | "pretty" => LogFormat::Plain,
                "json" => LogFormat::Json,
                _ => return Err(invalid("LOG_FORMAT", v, "expected `plain` or `json`".into())),
            },
        };

        let metrics_enabled = lookup("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Ok(Self {
            port,
            admin_token,
            renewal_extension_days,
            max_key_attempts,
            log_format,
            metrics_enabled,
        })
    }

    /// The engine tunables carried by this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            renewal_extension_days: self.renewal_extension_days,
            max_key_attempts: self.max_key_attempts,
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, raw.clone(), e.to_string())),
    }
}

fn invalid(var: &'static str, value: String, reason: String) -> ConfigError {
    ConfigError { var, value, reason }
}
