//! Unlock points, levels and the progress view.

use chrono::{DateTime, Duration, Utc};

use crate::profile::types::{JournalEntry, UnlockProgress};

/// Points needed to reach each level, indexed by level.
pub const LEVEL_THRESHOLDS: [u32; 5] = [0, 10, 30, 60, 100];

/// Highest reachable level.
pub const MAX_LEVEL: u8 = 4;

/// Feature unlocked on reaching each level, indexed by level.
pub const FEATURES_BY_LEVEL: [&str; 5] = [
    "Profile forming",
    "1-2 estimated dimensions",
    "All computed dimensions",
    "Full archetype reveal",
    "Community comparisons",
];

const POINTS_PER_SECTION: u32 = 10;
const POINTS_PER_DREAM: u32 = 5;
const POINTS_PER_LINK: u32 = 2;
const WEEKLY_STREAK_BONUS: u32 = 10;
const WEEKLY_STREAK_DREAMS: usize = 5;
const WEEKLY_STREAK_DAYS: i64 = 7;

/// Activity counts that accrue unlock points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnlockActivity {
    pub completed_census_sections: usize,
    pub total_dream_count: usize,
    pub dreams_with_waking_life_link: usize,
    pub dreams_in_last_7_days: usize,
}

impl UnlockActivity {
    /// Count activity from a user's journal relative to `now`.
    pub fn from_entries(
        completed_census_sections: usize,
        entries: &[JournalEntry],
        now: DateTime<Utc>,
    ) -> Self {
        let week_start = now - Duration::days(WEEKLY_STREAK_DAYS);
        Self {
            completed_census_sections,
            total_dream_count: entries.len(),
            dreams_with_waking_life_link: entries
                .iter()
                .filter(|e| e.has_waking_life_link())
                .count(),
            dreams_in_last_7_days: entries
                .iter()
                .filter(|e| e.captured_at >= week_start)
                .count(),
        }
    }

    /// Total points for this activity.
    pub fn points(&self) -> u32 {
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        let streak = if self.dreams_in_last_7_days >= WEEKLY_STREAK_DREAMS {
            WEEKLY_STREAK_BONUS
        } else {
            0
        };
        count(self.completed_census_sections)
            .saturating_mul(POINTS_PER_SECTION)
            .saturating_add(count(self.total_dream_count).saturating_mul(POINTS_PER_DREAM))
            .saturating_add(
                count(self.dreams_with_waking_life_link).saturating_mul(POINTS_PER_LINK),
            )
            .saturating_add(streak)
    }
}

/// Level reached with `points`.
pub fn level_for_points(points: u32) -> u8 {
    LEVEL_THRESHOLDS
        .iter()
        .rposition(|&threshold| points >= threshold)
        .map_or(0, |level| level as u8)
}

/// Progress view for a (points, level) pair as stored on a snapshot.
///
/// Levels above [`MAX_LEVEL`] are treated as the top level.
pub fn unlock_progress(points: u32, level: u8) -> UnlockProgress {
    let level = level.min(MAX_LEVEL);
    let next_level = (level < MAX_LEVEL).then_some(level + 1);
    let next_level_points = next_level.map(|next| LEVEL_THRESHOLDS[usize::from(next)]);

    let progress = match next_level_points {
        Some(target) => {
            let floor = LEVEL_THRESHOLDS[usize::from(level)];
            let span = f64::from(target - floor);
            let gained = f64::from(points) - f64::from(floor);
            (100.0 * gained / span).round().clamp(0.0, 100.0) as u8
        }
        None => 100,
    };

    UnlockProgress {
        current_points: points,
        current_level: level,
        next_level,
        next_level_points,
        progress,
        unlocked_features: FEATURES_BY_LEVEL[..=usize::from(level)]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        next_feature: next_level.map(|next| FEATURES_BY_LEVEL[usize::from(next)].to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 7, 30, 0).unwrap()
    }

    fn entry(days_ago: i64, link: Option<&str>) -> JournalEntry {
        JournalEntry {
            id: Uuid::new_v4(),
            emotions: Vec::new(),
            vividness: None,
            lucidity: None,
            tags: Vec::new(),
            waking_life_link: link.map(String::from),
            captured_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn level_boundaries() {
        let cases = [
            (0, 0),
            (9, 0),
            (10, 1),
            (29, 1),
            (30, 2),
            (59, 2),
            (60, 3),
            (99, 3),
            (100, 4),
            (5000, 4),
        ];
        for (points, level) in cases {
            assert_eq!(level_for_points(points), level, "points = {points}");
        }
    }

    #[test]
    fn points_formula() {
        let activity = UnlockActivity {
            completed_census_sections: 3,
            total_dream_count: 4,
            dreams_with_waking_life_link: 2,
            dreams_in_last_7_days: 4,
        };
        assert_eq!(activity.points(), 30 + 20 + 4);

        let streak = UnlockActivity {
            dreams_in_last_7_days: 5,
            ..activity
        };
        assert_eq!(streak.points(), 64);
    }

    #[test]
    fn no_activity_is_zero_points() {
        assert_eq!(UnlockActivity::default().points(), 0);
    }

    #[test]
    fn activity_from_entries() {
        let entries = vec![
            entry(0, Some("exam tomorrow")),
            entry(1, None),
            entry(3, Some(" ")),
            entry(7, None),
            entry(8, Some("moving house")),
        ];
        let activity = UnlockActivity::from_entries(2, &entries, now());
        assert_eq!(
            activity,
            UnlockActivity {
                completed_census_sections: 2,
                total_dream_count: 5,
                dreams_with_waking_life_link: 2,
                dreams_in_last_7_days: 4,
            }
        );
        assert_eq!(activity.points(), 20 + 25 + 4);
    }

    #[test]
    fn progress_mid_level() {
        let view = unlock_progress(45, 2);
        assert_eq!(view.next_level, Some(3));
        assert_eq!(view.next_level_points, Some(60));
        assert_eq!(view.progress, 50);
        assert_eq!(
            view.unlocked_features,
            vec![
                "Profile forming",
                "1-2 estimated dimensions",
                "All computed dimensions"
            ]
        );
        assert_eq!(view.next_feature.as_deref(), Some("Full archetype reveal"));
    }

    #[test]
    fn progress_for_missing_snapshot() {
        let view = unlock_progress(0, 0);
        assert_eq!(view.current_level, 0);
        assert_eq!(view.next_level, Some(1));
        assert_eq!(view.next_level_points, Some(10));
        assert_eq!(view.progress, 0);
        assert_eq!(view.unlocked_features, vec!["Profile forming"]);
        assert_eq!(view.next_feature.as_deref(), Some("1-2 estimated dimensions"));
    }

    #[test]
    fn progress_at_top_level() {
        let view = unlock_progress(140, 4);
        assert_eq!(view.next_level, None);
        assert_eq!(view.next_level_points, None);
        assert_eq!(view.progress, 100);
        assert_eq!(view.unlocked_features.len(), FEATURES_BY_LEVEL.len());
        assert_eq!(view.next_feature, None);
    }

    #[test]
    fn progress_is_clamped_for_inconsistent_pairs() {
        assert_eq!(unlock_progress(5, 2).progress, 0);
        assert_eq!(unlock_progress(90, 1).progress, 100);
    }
}
