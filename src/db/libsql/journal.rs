//! JournalStore implementation for LibSqlBackend.

use std::collections::HashMap;

use async_trait::async_trait;
use libsql::params;
use uuid::Uuid;

use crate::db::JournalStore;
use crate::db::libsql::{LibSqlBackend, get_opt_i64, get_opt_text, get_text, get_ts, to_percent};
use crate::error::DatabaseError;
use crate::profile::{DreamTag, JournalEntry, Lucidity, TagSource};

/// Column order: id(0), emotions(1), vividness(2), lucidity(3),
/// waking_life_link(4), captured_at(5).
fn row_to_entry(row: &libsql::Row) -> Result<JournalEntry, DatabaseError> {
    let id: Uuid = get_text(row, 0)
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("invalid dream id: {e}")))?;

    let emotions_raw = get_text(row, 1);
    let emotions: Vec<String> = if emotions_raw.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&emotions_raw).unwrap_or_else(|e| {
            tracing::warn!(dream_id = %id, error = %e, "Ignoring undecodable emotions");
            Vec::new()
        })
    };

    let lucidity = get_opt_text(row, 3).and_then(|s| match s.parse::<Lucidity>() {
        Ok(l) => Some(l),
        Err(e) => {
            tracing::warn!(dream_id = %id, error = %e, "Ignoring unknown lucidity");
            None
        }
    });

    Ok(JournalEntry {
        id,
        emotions,
        vividness: get_opt_i64(row, 2).map(to_percent),
        lucidity,
        tags: Vec::new(),
        waking_life_link: get_opt_text(row, 4),
        captured_at: get_ts(row, 5)?,
    })
}

#[async_trait]
impl JournalStore for LibSqlBackend {
    async fn list_journal_entries(
        &self,
        user_id: &str,
    ) -> Result<Vec<JournalEntry>, DatabaseError> {
        let conn = self.connect().await?;

        let mut tags: HashMap<String, Vec<DreamTag>> = HashMap::new();
        let mut rows = conn
            .query(
                r#"
                SELECT t.dream_id, t.name, t.source
                FROM dream_tags t
                JOIN dream_entries d ON d.id = t.dream_id
                WHERE d.user_id = ?1
                ORDER BY t.dream_id, t.position, t.name
                "#,
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            tags.entry(get_text(&row, 0)).or_default().push(DreamTag {
                name: get_text(&row, 1),
                source: TagSource::from_label(&get_text(&row, 2)),
            });
        }

        let mut rows = conn
            .query(
                r#"
                SELECT id, emotions, vividness, lucidity, waking_life_link, captured_at
                FROM dream_entries
                WHERE user_id = ?1
                "#,
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        let mut entries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            let mut entry = row_to_entry(&row)?;
            if let Some(entry_tags) = tags.remove(&get_text(&row, 0)) {
                entry.tags = entry_tags;
            }
            entries.push(entry);
        }
        // captured_at is TEXT and may carry any offset; order by instant.
        entries.sort_by(|a, b| b.captured_at.cmp(&a.captured_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }
}
