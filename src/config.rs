//! Configuration for the dreamer profile engine.

mod database;

use std::time::Duration;

pub use self::database::{DatabaseBackend, DatabaseConfig, default_libsql_path};
use crate::error::ConfigError;

/// Main configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub profile: ProfileConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database: DatabaseConfig::resolve()?,
            profile: ProfileConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }
}

/// Recalculation settings.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Deadline for one recalculation; an elapsed deadline persists nothing.
    pub recalc_timeout: Duration,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            recalc_timeout: Duration::from_secs(30),
        }
    }
}

impl ProfileConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secs: u64 = parse_optional_env("PROFILE_RECALC_TIMEOUT_SECS", 30)?;
        if secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PROFILE_RECALC_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            recalc_timeout: Duration::from_secs(secs),
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid log format '{}', expected 'text' or 'json'", s)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl LoggingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            format: parse_optional_env("LOG_FORMAT", LogFormat::default())?,
        })
    }
}

pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global, so serialize tests that mutate them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // --- optional_env tests ---

    #[test]
    fn optional_env_returns_none_for_missing_var() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::remove_var("_TEST_DP_MISSING_42") };
        let result = optional_env("_TEST_DP_MISSING_42").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn optional_env_returns_none_for_empty_string() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::set_var("_TEST_DP_EMPTY_42", "") };
        let result = optional_env("_TEST_DP_EMPTY_42").unwrap();
        assert!(result.is_none());
        unsafe { std::env::remove_var("_TEST_DP_EMPTY_42") };
    }

    #[test]
    fn optional_env_returns_value_when_set() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::set_var("_TEST_DP_SET_42", "hello") };
        let result = optional_env("_TEST_DP_SET_42").unwrap();
        assert_eq!(result, Some("hello".to_string()));
        unsafe { std::env::remove_var("_TEST_DP_SET_42") };
    }

    // --- parse_optional_env tests ---

    #[test]
    fn parse_optional_env_returns_default_when_missing() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::remove_var("_TEST_DP_PARSE_MISSING_42") };
        let result: u64 = parse_optional_env("_TEST_DP_PARSE_MISSING_42", 999).unwrap();
        assert_eq!(result, 999);
    }

    #[test]
    fn parse_optional_env_parses_value() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::set_var("_TEST_DP_PARSE_VAL_42", "42") };
        let result: u64 = parse_optional_env("_TEST_DP_PARSE_VAL_42", 0).unwrap();
        assert_eq!(result, 42);
        unsafe { std::env::remove_var("_TEST_DP_PARSE_VAL_42") };
    }

    #[test]
    fn parse_optional_env_returns_error_for_invalid_value() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::set_var("_TEST_DP_PARSE_BAD_42", "not_a_number") };
        let result: Result<u64, _> = parse_optional_env("_TEST_DP_PARSE_BAD_42", 0);
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "_TEST_DP_PARSE_BAD_42"));
        unsafe { std::env::remove_var("_TEST_DP_PARSE_BAD_42") };
    }

    // --- section tests ---

    #[test]
    fn profile_timeout_reads_env() {
        let _lock = ENV_LOCK.lock();
        unsafe { std::env::set_var("PROFILE_RECALC_TIMEOUT_SECS", "5") };
        let config = ProfileConfig::from_env().unwrap();
        assert_eq!(config.recalc_timeout, Duration::from_secs(5));
        unsafe { std::env::set_var("PROFILE_RECALC_TIMEOUT_SECS", "0") };
        assert!(ProfileConfig::from_env().is_err());
        unsafe { std::env::remove_var("PROFILE_RECALC_TIMEOUT_SECS") };
        let config = ProfileConfig::from_env().unwrap();
        assert_eq!(config.recalc_timeout, ProfileConfig::default().recalc_timeout);
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn postgres_backend_requires_url() {
        let _lock = ENV_LOCK.lock();
        unsafe {
            std::env::set_var("DATABASE_BACKEND", "postgres");
            std::env::remove_var("DATABASE_URL");
        }
        let err = DatabaseConfig::resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "DATABASE_URL"));

        unsafe { std::env::set_var("DATABASE_BACKEND", "libsql") };
        let config = DatabaseConfig::resolve().unwrap();
        assert_eq!(config.backend, DatabaseBackend::LibSql);
        assert_eq!(config.pool_size, 10);
        unsafe { std::env::remove_var("DATABASE_BACKEND") };
    }
}
