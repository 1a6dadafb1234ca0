//! ProfileStore implementation for LibSqlBackend.

use async_trait::async_trait;
use libsql::params;

use crate::db::ProfileStore;
use crate::db::libsql::{
    LibSqlBackend, fmt_ts, get_i64, get_opt_i64, get_opt_text, get_text, get_ts, to_percent,
};
use crate::error::DatabaseError;
use crate::profile::{DimensionId, DimensionResult, DreamerProfile, JournalMetrics};

const PROFILE_COLUMNS: &str = "user_id, \
    boundary_score, boundary_confidence, \
    lucidity_score, lucidity_confidence, \
    emotion_score, emotion_confidence, \
    meaning_score, meaning_confidence, \
    engagement_score, engagement_confidence, \
    primary_archetype, primary_confidence, \
    secondary_archetype, secondary_confidence, \
    unlock_points, unlock_level, journal, is_stale, last_calculated_at";

/// Convert a libsql Row selected with [`PROFILE_COLUMNS`] to a snapshot.
fn row_to_profile(row: &libsql::Row) -> Result<DreamerProfile, DatabaseError> {
    let dimensions = DimensionId::ALL
        .iter()
        .zip((1..).step_by(2))
        .map(|(&dim, idx)| {
            DimensionResult::new(
                dim,
                get_opt_i64(row, idx).map(to_percent),
                to_percent(get_i64(row, idx + 1)),
            )
        })
        .collect();

    let journal_raw = get_text(row, 17);
    let journal: JournalMetrics = serde_json::from_str(&journal_raw)
        .map_err(|e| DatabaseError::Serialization(format!("invalid journal metrics: {e}")))?;

    Ok(DreamerProfile {
        user_id: get_text(row, 0),
        dimensions,
        primary_archetype: get_opt_text(row, 11),
        primary_confidence: get_opt_i64(row, 12).map(to_percent),
        secondary_archetype: get_opt_text(row, 13),
        secondary_confidence: get_opt_i64(row, 14).map(to_percent),
        unlock_points: u32::try_from(get_i64(row, 15)).unwrap_or(0),
        unlock_level: u8::try_from(get_i64(row, 16)).unwrap_or(0),
        journal,
        is_stale: get_i64(row, 18) != 0,
        last_calculated_at: get_ts(row, 19)?,
    })
}

fn score_column(profile: &DreamerProfile, dim: DimensionId) -> Option<i64> {
    profile
        .dimension(dim)
        .and_then(|d| d.score)
        .map(i64::from)
}

fn confidence_column(profile: &DreamerProfile, dim: DimensionId) -> i64 {
    profile.dimension(dim).map_or(0, |d| i64::from(d.confidence))
}

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn get_dreamer_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<DreamerProfile>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM dreamer_profiles WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_dreamer_profile(&self, profile: &DreamerProfile) -> Result<(), DatabaseError> {
        let journal = serde_json::to_string(&profile.journal)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        let conn = self.connect().await?;
        conn.execute(
            &format!(
                r#"
                INSERT INTO dreamer_profiles ({PROFILE_COLUMNS})
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                        ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
                ON CONFLICT (user_id) DO UPDATE SET
                    boundary_score = excluded.boundary_score,
                    boundary_confidence = excluded.boundary_confidence,
                    lucidity_score = excluded.lucidity_score,
                    lucidity_confidence = excluded.lucidity_confidence,
                    emotion_score = excluded.emotion_score,
                    emotion_confidence = excluded.emotion_confidence,
                    meaning_score = excluded.meaning_score,
                    meaning_confidence = excluded.meaning_confidence,
                    engagement_score = excluded.engagement_score,
                    engagement_confidence = excluded.engagement_confidence,
                    primary_archetype = excluded.primary_archetype,
                    primary_confidence = excluded.primary_confidence,
                    secondary_archetype = excluded.secondary_archetype,
                    secondary_confidence = excluded.secondary_confidence,
                    unlock_points = excluded.unlock_points,
                    unlock_level = excluded.unlock_level,
                    journal = excluded.journal,
                    is_stale = excluded.is_stale,
                    last_calculated_at = excluded.last_calculated_at
                "#
            ),
            params![
                profile.user_id.as_str(),
                score_column(profile, DimensionId::Boundary),
                confidence_column(profile, DimensionId::Boundary),
                score_column(profile, DimensionId::Lucidity),
                confidence_column(profile, DimensionId::Lucidity),
                score_column(profile, DimensionId::Emotion),
                confidence_column(profile, DimensionId::Emotion),
                score_column(profile, DimensionId::Meaning),
                confidence_column(profile, DimensionId::Meaning),
                score_column(profile, DimensionId::Engagement),
                confidence_column(profile, DimensionId::Engagement),
                profile.primary_archetype.as_deref(),
                profile.primary_confidence.map(i64::from),
                profile.secondary_archetype.as_deref(),
                profile.secondary_confidence.map(i64::from),
                i64::from(profile.unlock_points),
                i64::from(profile.unlock_level),
                journal,
                i64::from(profile.is_stale),
                fmt_ts(&profile.last_calculated_at),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))?;

        Ok(())
    }

    async fn mark_dreamer_profile_stale(&self, user_id: &str) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let n = conn
            .execute(
                "UPDATE dreamer_profiles SET is_stale = 1 WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(n > 0)
    }
}
