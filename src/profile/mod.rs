//! Dreamer profile engine.
//!
//! Turns two independent, partially overlapping inputs, census answers and
//! dream journal entries, into a read-model snapshot:
//!
//! ```text
//! census answers ──► census::extract_census_signals ──┐
//!                                                    ├─► calculator ─► archetypes ─┐
//! journal entries ─► metrics::compute_journal_metrics ┘                            ├─► DreamerProfile
//!                 └─► unlock::UnlockActivity ──────────────────────────────────────┘
//! ```
//!
//! Everything up to the snapshot is a pure function of its inputs;
//! [`ProfileEngine`] adds the fetches and the final upsert. Sparse data is
//! never an error: dimensions and archetypes degrade to `None`.

pub mod archetypes;
pub mod calculator;
pub mod census;
pub mod metrics;
pub mod recalculate;
pub mod types;
pub mod unlock;

pub use archetypes::{ARCHETYPES, ArchetypeDefinition, assign_archetype, find_archetype};
pub use calculator::calculate_dimensions;
pub use census::{CensusSignals, extract_census_signals, normalize_value};
pub use metrics::compute_journal_metrics;
pub use recalculate::{ProfileEngine, build_profile};
pub use types::{
    ArchetypeAssignment, ArchetypeResult, CensusAnswer, CensusSignal, DimensionId,
    DimensionResult, DreamTag, DreamerProfile, DreamerProfileView, JournalEntry, JournalMetrics,
    Lucidity, TagSource, UnlockProgress,
};
pub use unlock::{UnlockActivity, level_for_points, unlock_progress};
