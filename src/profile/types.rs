//! Shared types for the dreamer profile pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confidence below which a dimension score is withheld.
pub const MIN_CONFIDENCE: u8 = 40;

/// Confidence at or above which a dimension score counts as stable.
pub const STABLE_CONFIDENCE: u8 = 70;

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// One of the five psychometric axes a profile is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionId {
    Boundary,
    Lucidity,
    Emotion,
    Meaning,
    Engagement,
}

impl DimensionId {
    /// All dimensions in canonical order.
    pub const ALL: [DimensionId; 5] = [
        DimensionId::Boundary,
        DimensionId::Lucidity,
        DimensionId::Emotion,
        DimensionId::Meaning,
        DimensionId::Engagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boundary => "boundary",
            Self::Lucidity => "lucidity",
            Self::Emotion => "emotion",
            Self::Meaning => "meaning",
            Self::Engagement => "engagement",
        }
    }
}

impl std::fmt::Display for DimensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DimensionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "boundary" => Ok(Self::Boundary),
            "lucidity" => Ok(Self::Lucidity),
            "emotion" => Ok(Self::Emotion),
            "meaning" => Ok(Self::Meaning),
            "engagement" => Ok(Self::Engagement),
            _ => Err(format!("unknown dimension '{s}'")),
        }
    }
}

/// Score of a single dimension after blending census and journal signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub dimension: DimensionId,
    /// 0-100, or `None` when confidence is too low or nothing contributed.
    pub score: Option<u8>,
    /// 0-100.
    pub confidence: u8,
    /// True while confidence is below [`STABLE_CONFIDENCE`].
    pub is_estimate: bool,
}

impl DimensionResult {
    /// Build a result, deriving `is_estimate` from the confidence.
    pub fn new(dimension: DimensionId, score: Option<u8>, confidence: u8) -> Self {
        Self {
            dimension,
            score,
            confidence,
            is_estimate: confidence < STABLE_CONFIDENCE,
        }
    }
}

// ---------------------------------------------------------------------------
// Census
// ---------------------------------------------------------------------------

/// A user's stored answer to one census question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusAnswer {
    pub section_slug: String,
    pub question_slug: String,
    pub question_type: String,
    /// Raw answer as captured: number, boolean, string or object.
    pub value: serde_json::Value,
    pub answered_at: DateTime<Utc>,
}

/// Census-derived signal for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CensusSignal {
    /// 0-100, `None` when no configured question had a usable answer.
    pub score: Option<u8>,
    /// Fraction of configured questions with a usable answer, 0..=1.
    pub coverage: f64,
    pub answered_count: usize,
    pub total_count: usize,
}

impl CensusSignal {
    pub(crate) fn empty(total_count: usize) -> Self {
        Self {
            score: None,
            coverage: 0.0,
            answered_count: 0,
            total_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Self-reported lucidity of a dream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lucidity {
    No,
    Maybe,
    Yes,
}

impl Lucidity {
    /// Weight used for the lucid share: yes=1, maybe=0.5, no=0.
    pub fn weight(&self) -> f64 {
        match self {
            Self::No => 0.0,
            Self::Maybe => 0.5,
            Self::Yes => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Maybe => "maybe",
            Self::Yes => "yes",
        }
    }
}

impl std::str::FromStr for Lucidity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "no" => Ok(Self::No),
            "maybe" => Ok(Self::Maybe),
            "yes" => Ok(Self::Yes),
            _ => Err(format!("unknown lucidity '{s}'")),
        }
    }
}

/// Who attached a tag to a dream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    User,
    AiAccepted,
    Ai,
    /// Any source this engine does not distinguish.
    #[serde(other)]
    Other,
}

impl TagSource {
    /// Whether tags from this source reflect the dreamer's own labelling.
    pub fn is_user_endorsed(&self) -> bool {
        matches!(self, Self::User | Self::AiAccepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::AiAccepted => "ai_accepted",
            Self::Ai => "ai",
            Self::Other => "other",
        }
    }

    /// Parse a stored source label. Unrecognised labels map to `Other`.
    pub fn from_label(s: &str) -> Self {
        match s {
            "user" => Self::User,
            "ai_accepted" => Self::AiAccepted,
            "ai" => Self::Ai,
            _ => Self::Other,
        }
    }
}

/// A tag attached to a dream entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamTag {
    pub name: String,
    pub source: TagSource,
}

/// The fields of a journal entry that feed the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    #[serde(default)]
    pub emotions: Vec<String>,
    /// 0-100.
    #[serde(default)]
    pub vividness: Option<u8>,
    #[serde(default)]
    pub lucidity: Option<Lucidity>,
    #[serde(default)]
    pub tags: Vec<DreamTag>,
    #[serde(default)]
    pub waking_life_link: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl JournalEntry {
    /// True when the entry carries a non-blank waking-life link.
    pub fn has_waking_life_link(&self) -> bool {
        self.waking_life_link
            .as_deref()
            .is_some_and(|link| !link.trim().is_empty())
    }
}

/// Summary statistics over a user's whole journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalMetrics {
    pub dream_count: usize,
    pub avg_vividness: Option<u8>,
    /// "maybe" counts as half a lucid dream.
    pub lucid_percent: Option<u8>,
    pub emotion_count_avg: Option<f64>,
    /// Up to 3, most frequent first.
    pub top_emotions: Vec<String>,
    /// Up to 5 user-endorsed tags, most frequent first.
    pub top_tags: Vec<String>,
    /// unique / total user-endorsed tags.
    pub tag_diversity_index: Option<f64>,
    /// 0-100.
    pub waking_life_link_rate: Option<u8>,
    /// 0-100, one dream per day over the last 14 days scores 100.
    pub recent_activity_score: u8,
}

impl JournalMetrics {
    /// Metrics for a user with no journal entries.
    pub fn empty() -> Self {
        Self {
            dream_count: 0,
            avg_vividness: None,
            lucid_percent: None,
            emotion_count_avg: None,
            top_emotions: Vec::new(),
            top_tags: Vec::new(),
            tag_diversity_index: None,
            waking_life_link_rate: None,
            recent_activity_score: 0,
        }
    }
}

impl Default for JournalMetrics {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Archetypes
// ---------------------------------------------------------------------------

/// An archetype assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeResult {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub icon: String,
    /// Rounded fit, 0-100.
    pub confidence: u8,
}

/// Primary and secondary archetype classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeAssignment {
    pub primary: Option<ArchetypeResult>,
    pub secondary: Option<ArchetypeResult>,
}

// ---------------------------------------------------------------------------
// Persisted snapshot
// ---------------------------------------------------------------------------

/// Read-model snapshot of a user's profile, fully replaced on every
/// recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamerProfile {
    pub user_id: String,
    /// One result per dimension, in [`DimensionId::ALL`] order.
    pub dimensions: Vec<DimensionResult>,
    pub primary_archetype: Option<String>,
    pub primary_confidence: Option<u8>,
    pub secondary_archetype: Option<String>,
    pub secondary_confidence: Option<u8>,
    pub unlock_points: u32,
    pub unlock_level: u8,
    pub journal: JournalMetrics,
    pub is_stale: bool,
    pub last_calculated_at: DateTime<Utc>,
}

impl DreamerProfile {
    /// Look up the stored result for one dimension.
    pub fn dimension(&self, id: DimensionId) -> Option<&DimensionResult> {
        self.dimensions.iter().find(|d| d.dimension == id)
    }
}

/// Presentation shape of a snapshot, with archetype details resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamerProfileView {
    pub dimensions: Vec<DimensionResult>,
    pub primary_archetype: Option<ArchetypeResult>,
    pub secondary_archetype: Option<ArchetypeResult>,
    pub unlock_points: u32,
    pub unlock_level: u8,
    pub last_calculated_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
}

/// Where a user stands on the unlock ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockProgress {
    pub current_points: u32,
    pub current_level: u8,
    pub next_level: Option<u8>,
    pub next_level_points: Option<u32>,
    /// 0-100 toward the next level; 100 at the top level.
    pub progress: u8,
    pub unlocked_features: Vec<String>,
    pub next_feature: Option<String>,
}
