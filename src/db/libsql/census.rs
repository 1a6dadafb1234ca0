//! CensusStore implementation for LibSqlBackend.

use async_trait::async_trait;
use libsql::params;

use crate::db::CensusStore;
use crate::db::libsql::{LibSqlBackend, get_i64, get_text, get_ts};
use crate::error::DatabaseError;
use crate::profile::CensusAnswer;

#[async_trait]
impl CensusStore for LibSqlBackend {
    async fn list_census_answers(
        &self,
        user_id: &str,
    ) -> Result<Vec<CensusAnswer>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                r#"
                SELECT q.section_slug, q.slug, q.question_type, a.value, a.answered_at
                FROM census_answers a
                JOIN census_questions q ON q.id = a.question_id
                WHERE a.user_id = ?1
                ORDER BY a.rowid
                "#,
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        let mut answers = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            let question_slug = get_text(&row, 1);
            let raw = get_text(&row, 3);
            let value: serde_json::Value = match serde_json::from_str(&raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(
                        user_id,
                        question = %question_slug,
                        error = %e,
                        "Skipping census answer with undecodable value"
                    );
                    continue;
                }
            };
            answers.push(CensusAnswer {
                section_slug: get_text(&row, 0),
                question_slug,
                question_type: get_text(&row, 2),
                value,
                answered_at: get_ts(&row, 4)?,
            });
        }
        // answered_at is TEXT and may carry any offset; order by instant.
        answers.sort_by_key(|a| a.answered_at);
        Ok(answers)
    }

    async fn count_completed_census_sections(
        &self,
        user_id: &str,
    ) -> Result<usize, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM census_section_progress \
                 WHERE user_id = ?1 AND completed = 1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        let count = match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            Some(row) => get_i64(&row, 0),
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
