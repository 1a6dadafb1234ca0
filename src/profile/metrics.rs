//! Journal metrics: summary statistics over a user's dream entries.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::profile::types::{JournalEntry, JournalMetrics};

/// Window, in days, for the recent-activity score.
pub const RECENT_ACTIVITY_DAYS: i64 = 14;

const TOP_EMOTIONS: usize = 3;
const TOP_TAGS: usize = 5;

/// Aggregate a user's full journal history.
///
/// `entries` should be in the order the store returns them (newest first);
/// frequency ties in the top lists keep first-seen order. `now` anchors the
/// recent-activity window so results are reproducible.
pub fn compute_journal_metrics(entries: &[JournalEntry], now: DateTime<Utc>) -> JournalMetrics {
    let dream_count = entries.len();
    if dream_count == 0 {
        return JournalMetrics::empty();
    }
    let count = dream_count as f64;

    let vivid: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.vividness.map(f64::from))
        .collect();
    let avg_vividness = if vivid.is_empty() {
        None
    } else {
        Some(to_percent(vivid.iter().sum::<f64>() / vivid.len() as f64))
    };

    let lucid_score: f64 = entries
        .iter()
        .filter_map(|e| e.lucidity.map(|l| l.weight()))
        .sum();
    let lucid_percent = Some(to_percent(100.0 * lucid_score / count));

    let mut emotions = FrequencyCounter::default();
    for entry in entries {
        for emotion in &entry.emotions {
            emotions.add(emotion);
        }
    }
    let emotion_count_avg = if emotions.total > 0 {
        Some(emotions.total as f64 / count)
    } else {
        None
    };

    let mut tags = FrequencyCounter::default();
    for entry in entries {
        for tag in entry.tags.iter().filter(|t| t.source.is_user_endorsed()) {
            tags.add(&tag.name);
        }
    }
    let tag_diversity_index = if tags.total > 0 {
        Some(tags.unique() as f64 / tags.total as f64)
    } else {
        None
    };

    let linked = entries.iter().filter(|e| e.has_waking_life_link()).count();
    let waking_life_link_rate = Some(to_percent(100.0 * linked as f64 / count));

    let window_start = now - Duration::days(RECENT_ACTIVITY_DAYS);
    let recent = entries
        .iter()
        .filter(|e| e.captured_at >= window_start)
        .count();
    let recent_activity_score =
        to_percent(100.0 * recent as f64 / RECENT_ACTIVITY_DAYS as f64);

    JournalMetrics {
        dream_count,
        avg_vividness,
        lucid_percent,
        emotion_count_avg,
        top_emotions: emotions.top(TOP_EMOTIONS),
        top_tags: tags.top(TOP_TAGS),
        tag_diversity_index,
        waking_life_link_rate,
        recent_activity_score,
    }
}

fn to_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Counts occurrences while remembering first-seen order.
#[derive(Default)]
struct FrequencyCounter {
    order: Vec<(String, usize)>,
    index: HashMap<String, usize>,
    total: usize,
}

impl FrequencyCounter {
    fn add(&mut self, item: &str) {
        self.total += 1;
        if let Some(&i) = self.index.get(item) {
            self.order[i].1 += 1;
        } else {
            self.index.insert(item.to_string(), self.order.len());
            self.order.push((item.to_string(), 1));
        }
    }

    fn unique(&self) -> usize {
        self.order.len()
    }

    /// Most frequent items first; the sort is stable so ties keep
    /// first-seen order.
    fn top(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<&(String, usize)> = self.order.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
