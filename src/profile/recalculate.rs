//! Profile recalculation and the snapshot read paths.
//!
//! A recalculation fetches census answers, completed sections and journal
//! entries concurrently, scores them, and replaces the user's snapshot in a
//! single upsert. Nothing is written unless every fetch and every scoring
//! step succeeded, so a failed or timed-out run leaves the previous
//! snapshot untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SubsecRound, Utc};

use crate::db::Database;
use crate::error::ProfileError;
use crate::profile::archetypes::{assign_archetype, find_archetype};
use crate::profile::calculator::calculate_dimensions;
use crate::profile::census::extract_census_signals;
use crate::profile::metrics::compute_journal_metrics;
use crate::profile::types::{
    CensusAnswer, DimensionId, DimensionResult, DreamerProfile, DreamerProfileView, JournalEntry,
    UnlockProgress,
};
use crate::profile::unlock::{UnlockActivity, level_for_points, unlock_progress};

/// Default deadline for one recalculation.
pub const DEFAULT_RECALC_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a snapshot from raw inputs. Pure; `now` becomes
/// `last_calculated_at` and anchors every time window.
pub fn build_profile(
    user_id: &str,
    answers: &[CensusAnswer],
    completed_sections: usize,
    entries: &[JournalEntry],
    now: DateTime<Utc>,
) -> DreamerProfile {
    let signals = extract_census_signals(answers);
    let journal = compute_journal_metrics(entries, now);
    let dimensions = calculate_dimensions(&signals, &journal);
    let archetypes = assign_archetype(&dimensions);

    let unlock_points = UnlockActivity::from_entries(completed_sections, entries, now).points();

    DreamerProfile {
        user_id: user_id.to_string(),
        dimensions,
        primary_archetype: archetypes.primary.as_ref().map(|a| a.id.clone()),
        primary_confidence: archetypes.primary.as_ref().map(|a| a.confidence),
        secondary_archetype: archetypes.secondary.as_ref().map(|a| a.id.clone()),
        secondary_confidence: archetypes.secondary.as_ref().map(|a| a.confidence),
        unlock_points,
        unlock_level: level_for_points(unlock_points),
        journal,
        is_stale: false,
        last_calculated_at: now,
    }
}

impl DreamerProfile {
    /// Presentation shape with archetype details filled from the catalogue.
    ///
    /// Archetype ids that are no longer in the catalogue are dropped.
    pub fn to_view(&self) -> DreamerProfileView {
        let dimensions = DimensionId::ALL
            .iter()
            .map(|&dim| {
                self.dimension(dim).map_or_else(
                    || DimensionResult::new(dim, None, 0),
                    |d| DimensionResult::new(dim, d.score, d.confidence),
                )
            })
            .collect();

        let hydrate = |id: &Option<String>, confidence: Option<u8>| {
            let id = id.as_deref()?;
            match find_archetype(id) {
                Some(def) => {
                    let mut result = def.to_result(0.0);
                    result.confidence = confidence.unwrap_or(0);
                    Some(result)
                }
                None => {
                    tracing::warn!(
                        user_id = %self.user_id,
                        archetype = id,
                        "Stored archetype is not in the catalogue"
                    );
                    None
                }
            }
        };

        DreamerProfileView {
            dimensions,
            primary_archetype: hydrate(&self.primary_archetype, self.primary_confidence),
            secondary_archetype: hydrate(&self.secondary_archetype, self.secondary_confidence),
            unlock_points: self.unlock_points,
            unlock_level: self.unlock_level,
            last_calculated_at: Some(self.last_calculated_at),
            is_stale: self.is_stale,
        }
    }
}

/// Recalculates and serves dreamer profiles over a [`Database`].
#[derive(Clone)]
pub struct ProfileEngine {
    db: Arc<dyn Database>,
    timeout: Duration,
}

impl ProfileEngine {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            timeout: DEFAULT_RECALC_TIMEOUT,
        }
    }

    /// Set the deadline for one recalculation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Recalculate and persist the user's snapshot as of now.
    pub async fn recalculate(&self, user_id: &str) -> Result<DreamerProfile, ProfileError> {
        self.recalculate_at(user_id, Utc::now()).await
    }

    /// Recalculate and persist the user's snapshot as of `now`.
    ///
    /// `now` is truncated to the millisecond precision snapshots are stored
    /// with. If the deadline elapses the computation is dropped before
    /// anything is written.
    pub async fn recalculate_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DreamerProfile, ProfileError> {
        let now = now.trunc_subsecs(3);
        tokio::time::timeout(self.timeout, self.run(user_id, now))
            .await
            .map_err(|_| {
                tracing::warn!(user_id, timeout = ?self.timeout, "Profile recalculation timed out");
                ProfileError::Timeout {
                    user_id: user_id.to_string(),
                    timeout: self.timeout,
                }
            })?
    }

    async fn run(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DreamerProfile, ProfileError> {
        let started = Instant::now();

        // Independent reads; a failure in any aborts before scoring.
        let (answers, completed_sections, entries) = tokio::try_join!(
            self.db.list_census_answers(user_id),
            self.db.count_completed_census_sections(user_id),
            self.db.list_journal_entries(user_id),
        )
        .map_err(|source| ProfileError::Fetch {
            user_id: user_id.to_string(),
            source,
        })?;

        let profile = build_profile(user_id, &answers, completed_sections, &entries, now);

        self.db
            .upsert_dreamer_profile(&profile)
            .await
            .map_err(|source| ProfileError::Persist {
                user_id: user_id.to_string(),
                source,
            })?;

        tracing::info!(
            user_id,
            primary = ?profile.primary_archetype,
            secondary = ?profile.secondary_archetype,
            unlock_level = profile.unlock_level,
            answers = answers.len(),
            dreams = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dreamer profile recalculated"
        );

        Ok(profile)
    }

    /// The stored snapshot, recalculating first when it is stale or missing.
    pub async fn load_or_recalculate(
        &self,
        user_id: &str,
    ) -> Result<DreamerProfile, ProfileError> {
        match self.snapshot(user_id).await? {
            Some(profile) if !profile.is_stale => Ok(profile),
            Some(_) => {
                tracing::debug!(user_id, "Snapshot is stale, recalculating");
                self.recalculate(user_id).await
            }
            None => {
                tracing::debug!(user_id, "No snapshot yet, calculating");
                self.recalculate(user_id).await
            }
        }
    }

    /// Hydrated view of the user's profile, recalculating when needed.
    pub async fn view(&self, user_id: &str) -> Result<DreamerProfileView, ProfileError> {
        Ok(self.load_or_recalculate(user_id).await?.to_view())
    }

    /// Unlock progress from the stored snapshot. Users without a snapshot
    /// get the level-0 view.
    pub async fn unlock_progress(&self, user_id: &str) -> Result<UnlockProgress, ProfileError> {
        let (points, level) = self
            .snapshot(user_id)
            .await?
            .map_or((0, 0), |p| (p.unlock_points, p.unlock_level));
        Ok(unlock_progress(points, level))
    }

    /// Flag the user's snapshot for recalculation on next read.
    pub async fn mark_stale(&self, user_id: &str) -> Result<bool, ProfileError> {
        self.db
            .mark_dreamer_profile_stale(user_id)
            .await
            .map_err(|source| ProfileError::Persist {
                user_id: user_id.to_string(),
                source,
            })
    }

    async fn snapshot(&self, user_id: &str) -> Result<Option<DreamerProfile>, ProfileError> {
        self.db
            .get_dreamer_profile(user_id)
            .await
            .map_err(|source| ProfileError::Fetch {
                user_id: user_id.to_string(),
                source,
            })
    }
}
