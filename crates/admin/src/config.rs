//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; the defaults suit the hosted backend the
//! console runs against.
//!
//! - `ADMIN_RESOLVE_TIMEOUT_SECS` - Bound on one session resolution cycle
//!   (credential fetch + role lookup, default: 5)
//! - `ADMIN_BACKFILL_TIMEOUT_SECS` - Bound on the historical message fetch
//!   (default: 10)
//! - `ADMIN_SEND_TIMEOUT_SECS` - Bound on a message write (default: 10)
//! - `ADMIN_LOGIN_ROUTE` - Redirect target for unauthenticated visitors
//!   (default: `/`)
//! - `ADMIN_HOME_ROUTE` - Redirect target for blocked-but-authenticated
//!   visitors (default: `/home`)

use std::time::Duration;

use thiserror::Error;

const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_BACKFILL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOGIN_ROUTE: &str = "/";
const DEFAULT_HOME_ROUTE: &str = "/home";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin engine configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Bound on one session resolution cycle.
    pub resolve_timeout: Duration,
    /// Bound on the historical message fetch.
    pub backfill_timeout: Duration,
    /// Bound on a message write.
    pub send_timeout: Duration,
    /// Route the gate redirects to when a session is required but absent.
    pub login_route: String,
    /// Route the gate redirects to when a session is present but the route
    /// is not available to it.
    pub home_route: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            resolve_timeout: Duration::from_secs(DEFAULT_RESOLVE_TIMEOUT_SECS),
            backfill_timeout: Duration::from_secs(DEFAULT_BACKFILL_TIMEOUT_SECS),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            home_route: DEFAULT_HOME_ROUTE.to_string(),
        }
    }
}

impl AdminConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a timeout variable is present
    /// but not a positive integer number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            resolve_timeout: get_secs_or_default(
                "ADMIN_RESOLVE_TIMEOUT_SECS",
                DEFAULT_RESOLVE_TIMEOUT_SECS,
            )?,
            backfill_timeout: get_secs_or_default(
                "ADMIN_BACKFILL_TIMEOUT_SECS",
                DEFAULT_BACKFILL_TIMEOUT_SECS,
            )?,
            send_timeout: get_secs_or_default("ADMIN_SEND_TIMEOUT_SECS", DEFAULT_SEND_TIMEOUT_SECS)?,
            login_route: get_env_or_default("ADMIN_LOGIN_ROUTE", DEFAULT_LOGIN_ROUTE),
            home_route: get_env_or_default("ADMIN_HOME_ROUTE", DEFAULT_HOME_ROUTE),
        })
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a duration in whole seconds from the environment, with a default.
fn get_secs_or_default(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => {
            let secs = raw
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must be a positive number of seconds".to_string(),
                ));
            }
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}
