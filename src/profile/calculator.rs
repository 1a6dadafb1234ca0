//! Dimension calculator: blends census and journal signals.
//!
//! Every dimension gets a census score (weighted survey answers) and a
//! journal score (derived from [`JournalMetrics`]). The journal's share of
//! the blend grows with dream count along a log curve that saturates at
//! [`TARGET_DREAM_COUNT`]. Confidence is half census coverage, half journal
//! reliability; scores under [`MIN_CONFIDENCE`] are withheld.

use crate::profile::census::{CensusSignals, questions_for};
use crate::profile::types::{
    CensusSignal, DimensionId, DimensionResult, JournalMetrics, MIN_CONFIDENCE,
};

/// Dream count at which the journal signal reaches full reliability.
pub const TARGET_DREAM_COUNT: usize = 10;

/// How a dimension's journal score is derived from the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalFormula {
    /// 0.6 x vividness + 0.4 x tag diversity (x200, capped).
    VividDiversity,
    /// The lucid share of dreams.
    LucidShare,
    /// Emotions per dream x20, capped.
    EmotionDensity,
    /// 0.4 x tag diversity (x150, capped) + 0.6 x "has any tags".
    SymbolicTagging,
    /// 0.4 x waking-life link rate + 0.6 x recent activity.
    WakingEngagement,
}

/// Pairs a dimension with its journal formula and minimum-dream gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionRule {
    pub dimension: DimensionId,
    pub formula: JournalFormula,
    pub min_dreams_required: usize,
}

/// Journal rules, one per dimension in canonical order.
pub static DIMENSION_RULES: [DimensionRule; 5] = [
    DimensionRule {
        dimension: DimensionId::Boundary,
        formula: JournalFormula::VividDiversity,
        min_dreams_required: 3,
    },
    DimensionRule {
        dimension: DimensionId::Lucidity,
        formula: JournalFormula::LucidShare,
        min_dreams_required: 3,
    },
    DimensionRule {
        dimension: DimensionId::Emotion,
        formula: JournalFormula::EmotionDensity,
        min_dreams_required: 5,
    },
    DimensionRule {
        dimension: DimensionId::Meaning,
        formula: JournalFormula::SymbolicTagging,
        min_dreams_required: 3,
    },
    DimensionRule {
        dimension: DimensionId::Engagement,
        formula: JournalFormula::WakingEngagement,
        min_dreams_required: 3,
    },
];

impl JournalFormula {
    /// Evaluate the formula. Returns `None` when the metrics lack the
    /// inputs the formula needs.
    pub fn evaluate(&self, m: &JournalMetrics) -> Option<u8> {
        let score = match self {
            Self::VividDiversity => {
                let vividness = m.avg_vividness.map(f64::from).unwrap_or(50.0);
                let diversity = m
                    .tag_diversity_index
                    .map(|d| (d * 200.0).min(100.0))
                    .unwrap_or(50.0);
                vividness * 0.6 + diversity * 0.4
            }
            Self::LucidShare => f64::from(m.lucid_percent?),
            Self::EmotionDensity => (m.emotion_count_avg? * 20.0).round().min(100.0),
            Self::SymbolicTagging => {
                let diversity = m
                    .tag_diversity_index
                    .map(|d| (d * 150.0).min(100.0))
                    .unwrap_or(50.0);
                let has_tags = if m.top_tags.is_empty() { 0.0 } else { 100.0 };
                diversity * 0.4 + has_tags * 0.6
            }
            Self::WakingEngagement => {
                let links = m.waking_life_link_rate.map(f64::from).unwrap_or(0.0);
                links * 0.4 + f64::from(m.recent_activity_score) * 0.6
            }
        };
        Some(score.round().clamp(0.0, 100.0) as u8)
    }
}

impl DimensionRule {
    /// Journal score for this dimension, gated on dream count.
    pub fn journal_score(&self, metrics: &JournalMetrics) -> Option<u8> {
        if metrics.dream_count < self.min_dreams_required {
            return None;
        }
        self.formula.evaluate(metrics)
    }
}

/// Rule for one dimension.
pub fn rule_for(dimension: DimensionId) -> &'static DimensionRule {
    // Table rows follow `DimensionId::ALL` order.
    &DIMENSION_RULES[dimension as usize]
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Relative trust in the journal signal: `ln(1 + n) / ln(1 + 10)`,
/// clamped to 0..=1.
pub fn journal_reliability(dream_count: usize) -> f64 {
    clamp01((dream_count as f64).ln_1p() / (TARGET_DREAM_COUNT as f64).ln_1p())
}

/// Blend census and journal scores by journal reliability.
///
/// If only one side has a score it is used as is.
pub fn blend_scores(
    census_score: Option<u8>,
    journal_score: Option<u8>,
    journal_reliability: f64,
) -> Option<u8> {
    match (census_score, journal_score) {
        (None, None) => None,
        (Some(census), None) => Some(census),
        (None, Some(journal)) => Some(journal),
        (Some(census), Some(journal)) => {
            let blended = f64::from(census) * (1.0 - journal_reliability)
                + f64::from(journal) * journal_reliability;
            Some(blended.round().clamp(0.0, 100.0) as u8)
        }
    }
}

/// Confidence 0-100: 50% census coverage plus 50% journal reliability.
pub fn compute_confidence(census_coverage: Option<f64>, journal_reliability: f64) -> u8 {
    let coverage = clamp01(census_coverage.unwrap_or(0.0));
    (100.0 * (0.5 * coverage + 0.5 * clamp01(journal_reliability)))
        .round()
        .clamp(0.0, 100.0) as u8
}

/// Score one dimension from its census signal and the journal metrics.
pub fn calculate_dimension(
    dimension: DimensionId,
    census: Option<&CensusSignal>,
    journal: &JournalMetrics,
) -> DimensionResult {
    let reliability = journal_reliability(journal.dream_count);
    let journal_score = rule_for(dimension).journal_score(journal);

    let census_score = census.and_then(|c| c.score);
    let has_min_census = census
        .is_some_and(|c| c.answered_count >= questions_for(dimension).min_answers_required);

    let score = if has_min_census || journal_score.is_some() {
        blend_scores(census_score, journal_score, reliability)
    } else {
        None
    };

    let confidence = compute_confidence(census.map(|c| c.coverage), reliability);
    let final_score = if confidence >= MIN_CONFIDENCE {
        score
    } else {
        None
    };

    DimensionResult::new(dimension, final_score, confidence)
}

/// Score all five dimensions, in canonical order.
pub fn calculate_dimensions(
    census: &CensusSignals,
    journal: &JournalMetrics,
) -> Vec<DimensionResult> {
    DimensionId::ALL
        .iter()
        .map(|&dimension| {
            let result = calculate_dimension(dimension, census.get(&dimension), journal);
            tracing::debug!(
                dimension = %dimension,
                score = ?result.score,
                confidence = result.confidence,
                is_estimate = result.is_estimate,
                "dimension scored"
            );
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn metrics(dream_count: usize) -> JournalMetrics {
        JournalMetrics {
            dream_count,
            avg_vividness: Some(70),
            lucid_percent: Some(40),
            emotion_count_avg: Some(2.5),
            top_emotions: vec!["joy".into()],
            top_tags: vec!["water".into()],
            tag_diversity_index: Some(0.4),
            waking_life_link_rate: Some(50),
            recent_activity_score: 60,
        }
    }

    fn signal(score: u8, answered_count: usize, total_count: usize) -> CensusSignal {
        CensusSignal {
            score: Some(score),
            coverage: answered_count as f64 / total_count as f64,
            answered_count,
            total_count,
        }
    }

    #[test]
    fn reliability_curve() {
        assert_eq!(journal_reliability(0), 0.0);
        assert!((journal_reliability(10) - 1.0).abs() < 1e-12);
        assert_eq!(journal_reliability(50), 1.0);
        let mut prev = 0.0;
        for n in 0..=30 {
            let r = journal_reliability(n);
            assert!(r >= prev, "reliability decreased at {n}");
            assert!((0.0..=1.0).contains(&r));
            prev = r;
        }
    }

    #[test]
    fn blend_handles_missing_sides() {
        assert_eq!(blend_scores(None, None, 0.5), None);
        assert_eq!(blend_scores(Some(70), None, 0.9), Some(70));
        assert_eq!(blend_scores(None, Some(30), 0.1), Some(30));
        assert_eq!(blend_scores(Some(80), Some(40), 0.25), Some(70));
        assert_eq!(blend_scores(Some(80), Some(40), 1.0), Some(40));
    }

    #[test]
    fn confidence_is_half_and_half() {
        assert_eq!(compute_confidence(None, 0.0), 0);
        assert_eq!(compute_confidence(Some(1.0), 0.0), 50);
        assert_eq!(compute_confidence(Some(1.0), 1.0), 100);
        assert_eq!(compute_confidence(Some(0.5), 0.5), 50);
    }

    #[test]
    fn journal_formulas() {
        let m = metrics(10);
        // 70 * 0.6 + min(0.4 * 200, 100) * 0.4 = 42 + 32
        assert_eq!(rule_for(DimensionId::Boundary).journal_score(&m), Some(74));
        assert_eq!(rule_for(DimensionId::Lucidity).journal_score(&m), Some(40));
        assert_eq!(rule_for(DimensionId::Emotion).journal_score(&m), Some(50));
        // min(0.4 * 150, 100) * 0.4 + 100 * 0.6 = 24 + 60
        assert_eq!(rule_for(DimensionId::Meaning).journal_score(&m), Some(84));
        // 50 * 0.4 + 60 * 0.6 = 20 + 36
        assert_eq!(rule_for(DimensionId::Engagement).journal_score(&m), Some(56));
    }

    #[test]
    fn journal_formula_defaults() {
        let mut m = metrics(4);
        m.avg_vividness = None;
        m.tag_diversity_index = None;
        m.top_tags.clear();
        m.waking_life_link_rate = None;
        assert_eq!(rule_for(DimensionId::Boundary).journal_score(&m), Some(50));
        assert_eq!(rule_for(DimensionId::Meaning).journal_score(&m), Some(20));
        assert_eq!(rule_for(DimensionId::Engagement).journal_score(&m), Some(36));
    }

    #[test]
    fn emotion_density_caps_at_one_hundred() {
        let mut m = metrics(6);
        m.emotion_count_avg = Some(7.0);
        assert_eq!(rule_for(DimensionId::Emotion).journal_score(&m), Some(100));
        m.emotion_count_avg = None;
        assert_eq!(rule_for(DimensionId::Emotion).journal_score(&m), None);
    }

    #[test]
    fn minimum_dream_gates() {
        let m = metrics(4);
        assert!(rule_for(DimensionId::Lucidity).journal_score(&m).is_some());
        assert!(rule_for(DimensionId::Emotion).journal_score(&m).is_none());
        let m = metrics(2);
        for dim in DimensionId::ALL {
            assert!(rule_for(dim).journal_score(&m).is_none(), "{dim} not gated");
        }
    }

    #[test]
    fn rules_follow_canonical_order() {
        for dim in DimensionId::ALL {
            assert_eq!(rule_for(dim).dimension, dim);
        }
    }

    #[test]
    fn no_data_means_null_score() {
        let results = calculate_dimensions(&HashMap::new(), &JournalMetrics::empty());
        assert_eq!(results.len(), 5);
        for result in results {
            assert_eq!(result.score, None);
            assert_eq!(result.confidence, 0);
            assert!(result.is_estimate);
        }
    }

    #[test]
    fn census_only_score_depends_on_coverage() {
        // Full coverage alone reaches only 50 confidence, which passes.
        let census = signal(72, 7, 7);
        let result = calculate_dimension(
            DimensionId::Boundary,
            Some(&census),
            &JournalMetrics::empty(),
        );
        assert_eq!(result.confidence, 50);
        assert_eq!(result.score, Some(72));
        assert!(result.is_estimate);

        // Partial coverage stays below 40.
        let census = signal(72, 5, 7);
        let result = calculate_dimension(
            DimensionId::Boundary,
            Some(&census),
            &JournalMetrics::empty(),
        );
        assert_eq!(result.confidence, 36);
        assert_eq!(result.score, None);
    }

    #[test]
    fn blends_both_sources() {
        let census = signal(80, 7, 7);
        let m = metrics(10);
        let result = calculate_dimension(DimensionId::Lucidity, Some(&census), &m);
        // reliability 1.0 -> journal wins outright
        assert_eq!(result.score, Some(40));
        assert_eq!(result.confidence, 100);
        assert!(!result.is_estimate);
    }

    #[test]
    fn journal_only_dimension() {
        let m = metrics(10);
        let result = calculate_dimension(DimensionId::Engagement, None, &m);
        assert_eq!(result.confidence, 50);
        assert_eq!(result.score, Some(56));
    }

    #[test]
    fn census_below_minimum_answers_without_journal_is_null() {
        let census = signal(90, 1, 7);
        let mut m = metrics(10);
        m.lucid_percent = None;
        let result = calculate_dimension(DimensionId::Lucidity, Some(&census), &m);
        assert_eq!(result.score, None);
        assert!(result.confidence >= MIN_CONFIDENCE);
    }

    #[test]
    fn census_below_minimum_still_blends_with_journal() {
        let census = signal(90, 1, 7);
        let m = metrics(4);
        let result = calculate_dimension(DimensionId::Lucidity, Some(&census), &m);
        let reliability = journal_reliability(4);
        let expected = (90.0 * (1.0 - reliability) + 40.0 * reliability).round() as u8;
        assert_eq!(result.score, Some(expected));
    }

    #[test]
    fn confidence_monotonic_in_dream_count() {
        let census = signal(60, 3, 7);
        let mut prev = 0;
        for n in 0..=25 {
            let result = calculate_dimension(DimensionId::Meaning, Some(&census), &metrics(n));
            assert!(result.confidence >= prev);
            prev = result.confidence;
        }
    }
}
