//! Error types for the dreamer profile engine.
//!
//! Only infrastructure failures are errors. Sparse data, unnormalizable
//! census values and unmet archetype gates are represented in-band as
//! `None` scores and archetypes.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[cfg(feature = "postgres")]
    #[error("Pool runtime error: {0}")]
    PoolRuntime(#[from] deadpool_postgres::PoolError),
}

/// Failures of a profile recalculation.
///
/// Any of these leaves the previously persisted snapshot untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Failed to fetch profile inputs for user {user_id}: {source}")]
    Fetch {
        user_id: String,
        #[source]
        source: DatabaseError,
    },

    #[error("Failed to persist profile for user {user_id}: {source}")]
    Persist {
        user_id: String,
        #[source]
        source: DatabaseError,
    },

    #[error("Recalculation for user {user_id} timed out after {timeout:?}")]
    Timeout { user_id: String, timeout: Duration },
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_error_display() {
        let err = DatabaseError::Query("no such table: dream_entries".to_string());
        assert!(err.to_string().contains("no such table"));

        let err = DatabaseError::Pool("Failed to connect to libSQL: locked".to_string());
        let msg = err.to_string();
        assert!(msg.contains("locked"), "Should mention the cause: {msg}");
    }

    #[test]
    fn profile_error_names_user_and_source() {
        let err = ProfileError::Fetch {
            user_id: "u-42".to_string(),
            source: DatabaseError::Query("census unavailable".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("u-42"), "Should mention the user: {msg}");
        assert!(
            msg.contains("census unavailable"),
            "Should include the source: {msg}"
        );
        assert!(std::error::Error::source(&err).is_some());

        let err = ProfileError::Timeout {
            user_id: "u-42".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));

        let err: Error = err.into();
        assert!(matches!(err, Error::Profile(ProfileError::Timeout { .. })));
    }
}
