//! Census signal extraction.
//!
//! Each dimension is fed by a fixed, weighted list of census questions.
//! Answers are normalized to 0..=1 and averaged by weight. Values that
//! cannot be normalized are skipped as if the question were unanswered:
//! questions evolve, and stale or malformed answers must not halt scoring.

use std::collections::HashMap;

use crate::profile::types::{CensusAnswer, CensusSignal, DimensionId};

/// One census question feeding a dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CensusQuestion {
    pub section: &'static str,
    pub slug: &'static str,
    pub weight: f64,
}

/// The census questions mapped onto one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionQuestions {
    pub dimension: DimensionId,
    pub questions: &'static [CensusQuestion],
    /// Answers needed before the census alone may produce a score.
    pub min_answers_required: usize,
}

const fn q(section: &'static str, slug: &'static str, weight: f64) -> CensusQuestion {
    CensusQuestion {
        section,
        slug,
        weight,
    }
}

/// Census question table, one entry per dimension in canonical order.
pub static DIMENSION_QUESTIONS: [DimensionQuestions; 5] = [
    DimensionQuestions {
        dimension: DimensionId::Boundary,
        questions: &[
            q("personality", "vivid-thoughts", 0.20),
            q("personality", "mind-wanders", 0.15),
            q("personality", "thin-boundaries", 0.25),
            q("personality", "imagine-being-someone-else", 0.15),
            q("imagination", "vivid-imagination-waking", 0.10),
            q("spacetime", "confuse-dream-with-reality", 0.10),
            q("content", "impossible-surreal-scenarios", 0.05),
        ],
        min_answers_required: 2,
    },
    DimensionQuestions {
        dimension: DimensionId::Lucidity,
        questions: &[
            q("lucidity", "lucid-dream-frequency", 0.30),
            q("lucidity", "control-level-when-lucid", 0.20),
            q("lucidity", "maintain-lucidity-duration", 0.15),
            q("lucidity", "awareness-without-control", 0.10),
            q("lucidity", "reality-testing-in-dreams", 0.10),
            q("lucidity", "return-to-dream-after-waking", 0.10),
            q("lucidity", "false-awakening-frequency", 0.05),
        ],
        min_answers_required: 2,
    },
    DimensionQuestions {
        dimension: DimensionId::Emotion,
        questions: &[
            q("emotion", "emotional-intensity-rating", 0.25),
            q("emotion", "wake-with-residual-emotion", 0.20),
            q("emotion", "mood-atmosphere-prominence", 0.15),
            q("emotion", "joy-happiness-frequency", 0.10),
            q("emotion", "fear-anxiety-frequency", 0.10),
            q("emotion", "sadness-frequency", 0.05),
            q("emotion", "anger-frequency", 0.05),
            q("emotion", "awe-wonder-frequency", 0.05),
            q("emotion", "confusion-frequency", 0.05),
        ],
        min_answers_required: 2,
    },
    DimensionQuestions {
        dimension: DimensionId::Meaning,
        questions: &[
            q("interiority", "search-for-dream-meaning", 0.25),
            q("symbolism", "seek-symbol-interpretation", 0.20),
            q("symbolism", "personal-symbol-dictionary", 0.15),
            q("interiority", "dreams-reveal-hidden-feelings", 0.15),
            q("symbolism", "recurring-dream-frequency", 0.10),
            q("imagination", "inspiration-from-dreams", 0.10),
            q("imagination", "problem-solving-in-dreams", 0.05),
        ],
        min_answers_required: 2,
    },
    DimensionQuestions {
        dimension: DimensionId::Engagement,
        questions: &[
            q("interiority", "reflect-on-dreams", 0.20),
            q("interiority", "dreams-influence-waking-life", 0.20),
            q("interiority", "dreams-important-to-identity", 0.20),
            q("interiority", "discuss-dreams-with-others", 0.10),
            q("recall", "write-dreams-down", 0.10),
            q("recall", "tell-others-about-dreams", 0.10),
            q("imagination", "act-out-dream-inspired-ideas", 0.10),
        ],
        min_answers_required: 2,
    },
];

/// Question configuration for one dimension.
pub fn questions_for(dimension: DimensionId) -> &'static DimensionQuestions {
    // Table rows follow `DimensionId::ALL` order.
    &DIMENSION_QUESTIONS[dimension as usize]
}

/// Census signals keyed by dimension.
pub type CensusSignals = HashMap<DimensionId, CensusSignal>;

/// Normalize a raw census answer to 0..=1.
///
/// Numbers on a 0-4 frequency scale map to `v / 4`, 0-100 visual analog
/// scales to `v / 100`. A fractional value strictly inside (0, 1) is taken
/// as already unit-scaled. Booleans map to 1/0, "yes"/"true" and
/// "no"/"false" likewise (case-insensitive), other strings are parsed as
/// numbers. Objects are unwrapped through a `value` or `score` key.
/// Anything else yields `None`.
pub fn normalize_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => normalize_number(n.as_f64()?),
        serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        serde_json::Value::String(s) => {
            let lower = s.trim().to_lowercase();
            match lower.as_str() {
                "yes" | "true" => Some(1.0),
                "no" | "false" => Some(0.0),
                other => other.parse::<f64>().ok().and_then(normalize_number),
            }
        }
        serde_json::Value::Object(obj) => obj
            .get("value")
            .or_else(|| obj.get("score"))
            .and_then(normalize_value),
        serde_json::Value::Null | serde_json::Value::Array(_) => None,
    }
}

fn normalize_number(v: f64) -> Option<f64> {
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    if v > 0.0 && v < 1.0 && v.fract() != 0.0 {
        return Some(v);
    }
    if v <= 4.0 {
        Some(v / 4.0)
    } else if v <= 100.0 {
        Some(v / 100.0)
    } else {
        None
    }
}

/// Compute the census signal for every dimension.
///
/// When several answers exist for the same question the most recent one
/// is used.
pub fn extract_census_signals(answers: &[CensusAnswer]) -> CensusSignals {
    let mut latest: HashMap<(&str, &str), &CensusAnswer> = HashMap::new();
    for answer in answers {
        let key = (answer.section_slug.as_str(), answer.question_slug.as_str());
        match latest.get(&key) {
            Some(existing) if existing.answered_at > answer.answered_at => {}
            _ => {
                latest.insert(key, answer);
            }
        }
    }

    DIMENSION_QUESTIONS
        .iter()
        .map(|config| {
            (
                config.dimension,
                signal_for(config, |section, slug| latest.get(&(section, slug)).copied()),
            )
        })
        .collect()
}

fn signal_for<'a>(
    config: &DimensionQuestions,
    lookup: impl Fn(&'static str, &'static str) -> Option<&'a CensusAnswer>,
) -> CensusSignal {
    let total_count = config.questions.len();
    if total_count == 0 {
        return CensusSignal::empty(0);
    }

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut answered_count = 0;

    for question in config.questions {
        let Some(answer) = lookup(question.section, question.slug) else {
            continue;
        };
        match normalize_value(&answer.value) {
            Some(normalized) => {
                weighted_sum += normalized * question.weight;
                weight_sum += question.weight;
                answered_count += 1;
            }
            None => {
                tracing::trace!(
                    dimension = %config.dimension,
                    section = question.section,
                    question = question.slug,
                    question_type = %answer.question_type,
                    "skipping unnormalizable census answer"
                );
            }
        }
    }

    let score = if weight_sum > 0.0 {
        Some((100.0 * weighted_sum / weight_sum).round().clamp(0.0, 100.0) as u8)
    } else {
        None
    };

    CensusSignal {
        score,
        coverage: answered_count as f64 / total_count as f64,
        answered_count,
        total_count,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn answer(section: &str, slug: &str, value: serde_json::Value) -> CensusAnswer {
        CensusAnswer {
            section_slug: section.to_string(),
            question_slug: slug.to_string(),
            question_type: "scale".to_string(),
            value,
            answered_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn normalizes_frequency_scale() {
        assert_eq!(normalize_value(&json!(2)), Some(0.5));
        assert_eq!(normalize_value(&json!(0)), Some(0.0));
        assert_eq!(normalize_value(&json!(4)), Some(1.0));
    }

    #[test]
    fn normalizes_visual_analog_scale() {
        assert_eq!(normalize_value(&json!(50)), Some(0.5));
        assert_eq!(normalize_value(&json!(100)), Some(1.0));
    }

    #[test]
    fn keeps_unit_fractions() {
        assert_eq!(normalize_value(&json!(0.5)), Some(0.5));
        assert_eq!(normalize_value(&json!(0.25)), Some(0.25));
    }

    #[test]
    fn normalizes_booleans_and_words() {
        assert_eq!(normalize_value(&json!(true)), Some(1.0));
        assert_eq!(normalize_value(&json!(false)), Some(0.0));
        assert_eq!(normalize_value(&json!("yes")), Some(1.0));
        assert_eq!(normalize_value(&json!("TRUE")), Some(1.0));
        assert_eq!(normalize_value(&json!("No")), Some(0.0));
        assert_eq!(normalize_value(&json!("3")), Some(0.75));
        assert_eq!(normalize_value(&json!("80")), Some(0.8));
    }

    #[test]
    fn unwraps_value_and_score_objects() {
        assert_eq!(normalize_value(&json!({ "value": 3 })), Some(0.75));
        assert_eq!(normalize_value(&json!({ "score": 25 })), Some(0.25));
        assert_eq!(normalize_value(&json!({ "value": { "score": "yes" } })), Some(1.0));
    }

    #[test]
    fn rejects_unnormalizable_values() {
        assert_eq!(normalize_value(&json!(-1)), None);
        assert_eq!(normalize_value(&json!(250)), None);
        assert_eq!(normalize_value(&json!("sometimes")), None);
        assert_eq!(normalize_value(&json!(null)), None);
        assert_eq!(normalize_value(&json!([1, 2])), None);
        assert_eq!(normalize_value(&json!({ "label": "often" })), None);
    }

    #[test]
    fn no_answers_gives_null_score_and_zero_coverage() {
        let signals = extract_census_signals(&[]);
        assert_eq!(signals.len(), 5);
        for dim in DimensionId::ALL {
            let signal = signals[&dim];
            assert_eq!(signal.score, None);
            assert_eq!(signal.coverage, 0.0);
            assert_eq!(signal.answered_count, 0);
            assert_eq!(signal.total_count, questions_for(dim).questions.len());
        }
    }

    #[test]
    fn weighted_average_over_answered_questions() {
        // lucid-dream-frequency (0.30) = 4 -> 1.0, control-level-when-lucid (0.20) = 0 -> 0.0
        let answers = vec![
            answer("lucidity", "lucid-dream-frequency", json!(4)),
            answer("lucidity", "control-level-when-lucid", json!(0)),
        ];
        let signal = extract_census_signals(&answers)[&DimensionId::Lucidity];
        assert_eq!(signal.score, Some(60));
        assert_eq!(signal.answered_count, 2);
        assert_eq!(signal.total_count, 7);
        assert!((signal.coverage - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn unnormalizable_answer_does_not_count_as_answered() {
        let answers = vec![
            answer("emotion", "emotional-intensity-rating", json!(3)),
            answer("emotion", "wake-with-residual-emotion", json!("whenever")),
        ];
        let signal = extract_census_signals(&answers)[&DimensionId::Emotion];
        assert_eq!(signal.answered_count, 1);
        assert_eq!(signal.score, Some(75));
        assert!((signal.coverage - 1.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn unmapped_questions_are_ignored() {
        let answers = vec![answer("demographics", "age-range", json!(3))];
        let signals = extract_census_signals(&answers);
        assert!(signals.values().all(|s| s.answered_count == 0));
    }

    #[test]
    fn most_recent_answer_wins() {
        let mut old = answer("recall", "write-dreams-down", json!(0));
        old.answered_at -= Duration::days(30);
        let new = answer("recall", "write-dreams-down", json!(4));
        let signals = extract_census_signals(&[new.clone(), old.clone()]);
        assert_eq!(signals[&DimensionId::Engagement].score, Some(100));
        let signals = extract_census_signals(&[old, new]);
        assert_eq!(signals[&DimensionId::Engagement].score, Some(100));
    }

    #[test]
    fn shared_question_feeds_only_its_dimension() {
        let answers = vec![answer("imagination", "inspiration-from-dreams", json!(true))];
        let signals = extract_census_signals(&answers);
        assert_eq!(signals[&DimensionId::Meaning].score, Some(100));
        assert_eq!(signals[&DimensionId::Engagement].score, None);
    }

    #[test]
    fn every_dimension_has_questions() {
        for dim in DimensionId::ALL {
            let config = questions_for(dim);
            assert_eq!(config.dimension, dim);
            assert!(!config.questions.is_empty());
            assert!(config.min_answers_required <= config.questions.len());
        }
    }
}
