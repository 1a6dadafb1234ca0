//! Storage for profile inputs and snapshots.
//!
//! The engine reads census answers and journal entries owned by other
//! flows and writes one `DreamerProfile` row per user. Each concern has its
//! own store trait; [`Database`] ties them together so the engine can hold
//! a single `Arc<dyn Database>` regardless of backend.

#[cfg(feature = "libsql")]
pub mod libsql;
#[cfg(feature = "libsql")]
pub mod libsql_migrations;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::error::DatabaseError;
use crate::profile::{CensusAnswer, DreamerProfile, JournalEntry};

/// Read access to a user's census data.
#[async_trait]
pub trait CensusStore: Send + Sync {
    /// Every stored answer for the user, resolved to section and question
    /// slugs. Several answers to the same question may be returned.
    async fn list_census_answers(&self, user_id: &str)
    -> Result<Vec<CensusAnswer>, DatabaseError>;

    /// Number of census sections the user has completed.
    async fn count_completed_census_sections(&self, user_id: &str)
    -> Result<usize, DatabaseError>;
}

/// Read access to a user's dream journal.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// All journal entries for the user with their tags, newest first.
    async fn list_journal_entries(&self, user_id: &str)
    -> Result<Vec<JournalEntry>, DatabaseError>;
}

/// Persisted profile snapshots.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_dreamer_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<DreamerProfile>, DatabaseError>;

    /// Insert or fully replace the user's snapshot.
    async fn upsert_dreamer_profile(&self, profile: &DreamerProfile) -> Result<(), DatabaseError>;

    /// Flag an existing snapshot as stale. Returns false when the user has
    /// no snapshot.
    async fn mark_dreamer_profile_stale(&self, user_id: &str) -> Result<bool, DatabaseError>;
}

/// Backend-agnostic database supertrait.
#[async_trait]
pub trait Database: CensusStore + JournalStore + ProfileStore + Send + Sync {
    /// Create or upgrade the schema.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;
}

/// Open the configured backend.
///
/// Migrations are not run; call [`Database::run_migrations`] explicitly.
pub async fn connect_from_config(
    config: &DatabaseConfig,
) -> Result<Arc<dyn Database>, DatabaseError> {
    tracing::debug!(backend = %config.backend, "Connecting to database");
    match config.backend {
        #[cfg(feature = "libsql")]
        DatabaseBackend::LibSql => {
            let backend = self::libsql::LibSqlBackend::new_local(&config.libsql_path).await?;
            Ok(Arc::new(backend))
        }
        #[cfg(feature = "postgres")]
        DatabaseBackend::Postgres => {
            let backend = self::postgres::PgBackend::new(config).await?;
            Ok(Arc::new(backend))
        }
        #[allow(unreachable_patterns)]
        other => Err(DatabaseError::Pool(format!(
            "backend '{other}' is not enabled in this build"
        ))),
    }
}
