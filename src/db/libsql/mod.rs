//! libSQL backend for the Database trait.
//!
//! Stores timestamps as RFC 3339 text and JSON values as encoded text; see
//! `libsql_migrations.rs` for the type mapping.

mod census;
mod journal;
mod profile;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::db::Database;
use crate::db::libsql_migrations::SCHEMA;
use crate::error::DatabaseError;

/// libSQL database backend over a local file.
#[derive(Clone)]
pub struct LibSqlBackend {
    db: Arc<libsql::Database>,
}

impl LibSqlBackend {
    /// Open (creating if needed) a database file at `path`.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DatabaseError::Pool(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        tracing::debug!(path = %path.display(), "Opened libSQL database");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open a new connection.
    pub async fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to connect to libSQL: {e}")))
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        conn.execute_batch(SCHEMA)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }
}

// ==================== Row helpers ====================

/// Text column, empty when NULL or not text.
pub(crate) fn get_text(row: &libsql::Row, idx: i32) -> String {
    get_opt_text(row, idx).unwrap_or_default()
}

pub(crate) fn get_opt_text(row: &libsql::Row, idx: i32) -> Option<String> {
    match row.get_value(idx) {
        Ok(libsql::Value::Text(s)) => Some(s),
        _ => None,
    }
}

pub(crate) fn get_opt_i64(row: &libsql::Row, idx: i32) -> Option<i64> {
    match row.get_value(idx) {
        Ok(libsql::Value::Integer(v)) => Some(v),
        _ => None,
    }
}

pub(crate) fn get_i64(row: &libsql::Row, idx: i32) -> i64 {
    get_opt_i64(row, idx).unwrap_or(0)
}

/// Timestamp column. Accepts RFC 3339 and SQLite's `datetime('now')` form.
pub(crate) fn get_ts(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>, DatabaseError> {
    parse_ts(&get_text(row, idx))
}

pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|n| n.and_utc()))
        .map_err(|e| DatabaseError::Serialization(format!("invalid timestamp '{s}': {e}")))
}

/// Clamp a stored integer into a 0-100 percentage.
pub(crate) fn to_percent(v: i64) -> u8 {
    v.clamp(0, 100) as u8
}
