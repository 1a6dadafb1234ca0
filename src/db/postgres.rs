//! PostgreSQL backend for the Database trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::{CensusStore, Database, JournalStore, ProfileStore};
use crate::error::DatabaseError;
use crate::profile::{
    CensusAnswer, DimensionId, DimensionResult, DreamTag, DreamerProfile, JournalEntry,
    JournalMetrics, Lucidity, TagSource,
};

/// PostgreSQL database backend.
pub struct PgBackend {
    pool: Pool,
}

impl PgBackend {
    /// Create a new backend and verify connectivity.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url().to_string());
        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: config.pool_size,
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        // Test connection
        let _ = pool.get().await?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    pub async fn conn(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }
}

fn to_percent(v: i32) -> u8 {
    v.clamp(0, 100) as u8
}

// ==================== Database (supertrait) ====================

#[async_trait]
impl Database for PgBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        use refinery::embed_migrations;
        embed_migrations!("migrations");

        let mut client = self.pool.get().await?;
        migrations::runner()
            .run_async(&mut **client)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }
}

// ==================== CensusStore ====================

#[async_trait]
impl CensusStore for PgBackend {
    async fn list_census_answers(
        &self,
        user_id: &str,
    ) -> Result<Vec<CensusAnswer>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                r#"
                SELECT q.section_slug, q.slug, q.question_type, a.value, a.answered_at
                FROM census_answers a
                JOIN census_questions q ON q.id = a.question_id
                WHERE a.user_id = $1
                ORDER BY a.answered_at
                "#,
                &[&user_id],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| CensusAnswer {
                section_slug: row.get("section_slug"),
                question_slug: row.get("slug"),
                question_type: row.get("question_type"),
                value: row.get("value"),
                answered_at: row.get("answered_at"),
            })
            .collect())
    }

    async fn count_completed_census_sections(
        &self,
        user_id: &str,
    ) -> Result<usize, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM census_section_progress WHERE user_id = $1 AND completed",
                &[&user_id],
            )
            .await?;
        let count: i64 = row.get(0);
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

// ==================== JournalStore ====================

#[async_trait]
impl JournalStore for PgBackend {
    async fn list_journal_entries(
        &self,
        user_id: &str,
    ) -> Result<Vec<JournalEntry>, DatabaseError> {
        let conn = self.conn().await?;

        let tag_rows = conn
            .query(
                r#"
                SELECT t.dream_id, t.name, t.source
                FROM dream_tags t
                JOIN dream_entries d ON d.id = t.dream_id
                WHERE d.user_id = $1
                ORDER BY t.dream_id, t.position, t.name
                "#,
                &[&user_id],
            )
            .await?;
        let mut tags: HashMap<Uuid, Vec<DreamTag>> = HashMap::new();
        for row in &tag_rows {
            let source: String = row.get("source");
            tags.entry(row.get("dream_id")).or_default().push(DreamTag {
                name: row.get("name"),
                source: TagSource::from_label(&source),
            });
        }

        let rows = conn
            .query(
                r#"
                SELECT id, emotions, vividness, lucidity, waking_life_link, captured_at
                FROM dream_entries
                WHERE user_id = $1
                ORDER BY captured_at DESC, id
                "#,
                &[&user_id],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let lucidity: Option<String> = row.get("lucidity");
                let lucidity = lucidity.and_then(|s| match s.parse::<Lucidity>() {
                    Ok(l) => Some(l),
                    Err(e) => {
                        tracing::warn!(dream_id = %id, error = %e, "Ignoring unknown lucidity");
                        None
                    }
                });
                JournalEntry {
                    id,
                    emotions: row.get("emotions"),
                    vividness: row.get::<_, Option<i32>>("vividness").map(to_percent),
                    lucidity,
                    tags: tags.remove(&id).unwrap_or_default(),
                    waking_life_link: row.get("waking_life_link"),
                    captured_at: row.get("captured_at"),
                }
            })
            .collect())
    }
}

// ==================== ProfileStore ====================

fn row_to_profile(row: &tokio_postgres::Row) -> Result<DreamerProfile, DatabaseError> {
    let dimensions = DimensionId::ALL
        .iter()
        .map(|&dim| {
            let score: Option<i32> = row.get(format!("{dim}_score").as_str());
            let confidence: i32 = row.get(format!("{dim}_confidence").as_str());
            DimensionResult::new(dim, score.map(to_percent), to_percent(confidence))
        })
        .collect();

    let journal: serde_json::Value = row.get("journal");
    let journal: JournalMetrics = serde_json::from_value(journal)
        .map_err(|e| DatabaseError::Serialization(format!("invalid journal metrics: {e}")))?;

    let last_calculated_at: DateTime<Utc> = row.get("last_calculated_at");
    Ok(DreamerProfile {
        user_id: row.get("user_id"),
        dimensions,
        primary_archetype: row.get("primary_archetype"),
        primary_confidence: row.get::<_, Option<i32>>("primary_confidence").map(to_percent),
        secondary_archetype: row.get("secondary_archetype"),
        secondary_confidence: row
            .get::<_, Option<i32>>("secondary_confidence")
            .map(to_percent),
        unlock_points: u32::try_from(row.get::<_, i32>("unlock_points")).unwrap_or(0),
        unlock_level: u8::try_from(row.get::<_, i32>("unlock_level")).unwrap_or(0),
        journal,
        is_stale: row.get("is_stale"),
        last_calculated_at,
    })
}

fn score_column(profile: &DreamerProfile, dim: DimensionId) -> Option<i32> {
    profile
        .dimension(dim)
        .and_then(|d| d.score)
        .map(i32::from)
}

fn confidence_column(profile: &DreamerProfile, dim: DimensionId) -> i32 {
    profile.dimension(dim).map_or(0, |d| i32::from(d.confidence))
}

#[async_trait]
impl ProfileStore for PgBackend {
    async fn get_dreamer_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<DreamerProfile>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM dreamer_profiles WHERE user_id = $1",
                &[&user_id],
            )
            .await?;
        row.as_ref().map(row_to_profile).transpose()
    }

    async fn upsert_dreamer_profile(&self, profile: &DreamerProfile) -> Result<(), DatabaseError> {
        let journal = serde_json::to_value(&profile.journal)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let unlock_points = i32::try_from(profile.unlock_points).unwrap_or(i32::MAX);
        let unlock_level = i32::from(profile.unlock_level);
        let primary_confidence = profile.primary_confidence.map(i32::from);
        let secondary_confidence = profile.secondary_confidence.map(i32::from);

        let [bs, ls, es, ms, gs] = DimensionId::ALL.map(|d| score_column(profile, d));
        let [bc, lc, ec, mc, gc] = DimensionId::ALL.map(|d| confidence_column(profile, d));

        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO dreamer_profiles (
                user_id,
                boundary_score, boundary_confidence,
                lucidity_score, lucidity_confidence,
                emotion_score, emotion_confidence,
                meaning_score, meaning_confidence,
                engagement_score, engagement_confidence,
                primary_archetype, primary_confidence,
                secondary_archetype, secondary_confidence,
                unlock_points, unlock_level, journal, is_stale, last_calculated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (user_id) DO UPDATE SET
                boundary_score = EXCLUDED.boundary_score,
                boundary_confidence = EXCLUDED.boundary_confidence,
                lucidity_score = EXCLUDED.lucidity_score,
                lucidity_confidence = EXCLUDED.lucidity_confidence,
                emotion_score = EXCLUDED.emotion_score,
                emotion_confidence = EXCLUDED.emotion_confidence,
                meaning_score = EXCLUDED.meaning_score,
                meaning_confidence = EXCLUDED.meaning_confidence,
                engagement_score = EXCLUDED.engagement_score,
                engagement_confidence = EXCLUDED.engagement_confidence,
                primary_archetype = EXCLUDED.primary_archetype,
                primary_confidence = EXCLUDED.primary_confidence,
                secondary_archetype = EXCLUDED.secondary_archetype,
                secondary_confidence = EXCLUDED.secondary_confidence,
                unlock_points = EXCLUDED.unlock_points,
                unlock_level = EXCLUDED.unlock_level,
                journal = EXCLUDED.journal,
                is_stale = EXCLUDED.is_stale,
                last_calculated_at = EXCLUDED.last_calculated_at
            "#,
            &[
                &profile.user_id,
                &bs,
                &bc,
                &ls,
                &lc,
                &es,
                &ec,
                &ms,
                &mc,
                &gs,
                &gc,
                &profile.primary_archetype,
                &primary_confidence,
                &profile.secondary_archetype,
                &secondary_confidence,
                &unlock_points,
                &unlock_level,
                &journal,
                &profile.is_stale,
                &profile.last_calculated_at,
            ],
        )
        .await?;

        Ok(())
    }

    async fn mark_dreamer_profile_stale(&self, user_id: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let n = conn
            .execute(
                "UPDATE dreamer_profiles SET is_stale = TRUE WHERE user_id = $1",
                &[&user_id],
            )
            .await?;
        Ok(n > 0)
    }
}
