//! Achievement definitions and the evaluator.
//!
//! Each catalog entry carries its own rule; the evaluator walks the table uniformly and
//! only ever moves an achievement from locked to unlocked.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Achievement, ExerciseScore, Timestamp};

/// Stable catalog key, persisted as kebab-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementId {
    FirstExercise,
    PerfectScore,
    SpeedDemon,
    StreakMaster,
    TableChampion,
    HintMinimalist,
}

impl AchievementId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstExercise => "first-exercise",
            Self::PerfectScore => "perfect-score",
            Self::SpeedDemon => "speed-demon",
            Self::StreakMaster => "streak-master",
            Self::TableChampion => "table-champion",
            Self::HintMinimalist => "hint-minimalist",
        }
    }
}

/// Everything a rule may look at.
pub struct AchievementContext<'a> {
    pub scores: &'a [ExerciseScore],
    pub catalog_size: usize,
    /// Daily streak counter, maintained by the streak module.
    pub streak: u32,
}

pub struct AchievementDef {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rule: fn(&AchievementContext<'_>) -> bool,
}

pub const STREAK_MASTER_DAYS: u32 = 7;
pub const SPEED_DEMON_SECS: u32 = 60;
pub const HINT_MINIMALIST_COUNT: usize = 5;

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: AchievementId::FirstExercise,
        title: "First Steps",
        description: "Complete your first exercise",
        icon: "🎯",
        rule: |ctx| !ctx.scores.is_empty(),
    },
    AchievementDef {
        id: AchievementId::PerfectScore,
        title: "Perfectionist",
        description: "Complete an exercise on first try without hints",
        icon: "⭐",
        rule: |ctx| ctx.scores.iter().any(|s| s.attempts == 1 && s.hints_used == 0),
    },
    AchievementDef {
        id: AchievementId::SpeedDemon,
        title: "Speed Demon",
        description: "Complete an exercise in under a minute",
        icon: "⚡",
        rule: |ctx| ctx.scores.iter().any(|s| s.time_spent < SPEED_DEMON_SECS),
    },
    AchievementDef {
        id: AchievementId::StreakMaster,
        title: "Streak Master",
        description: "Maintain a 7-day learning streak",
        icon: "🔥",
        rule: |ctx| ctx.streak >= STREAK_MASTER_DAYS,
    },
    AchievementDef {
        id: AchievementId::TableChampion,
        title: "Table Champion",
        description: "Complete all exercises",
        icon: "🏆",
        rule: |ctx| {
            let distinct: HashSet<_> = ctx.scores.iter().map(|s| s.exercise_id).collect();
            distinct.len() == ctx.catalog_size
        },
    },
    AchievementDef {
        id: AchievementId::HintMinimalist,
        title: "Hint Minimalist",
        description: "Complete 5 exercises without using hints",
        icon: "🧠",
        rule: |ctx| ctx.scores.iter().filter(|s| s.hints_used == 0).count() >= HINT_MINIMALIST_COUNT,
    },
];

impl AchievementDef {
    pub fn get(id: AchievementId) -> Option<&'static AchievementDef> {
        ACHIEVEMENTS.iter().find(|a| a.id == id)
    }
}

/// Stamp `unlocked_at` on every locked achievement whose rule now holds.
/// Returns the newly unlocked ids in catalog order.
pub fn evaluate(
    achievements: &mut [Achievement],
    ctx: &AchievementContext<'_>,
    now: Timestamp,
) -> Vec<AchievementId> {
    let mut newly_unlocked = Vec::new();

    for achievement in achievements.iter_mut().filter(|a| !a.is_unlocked()) {
        let Some(def) = AchievementDef::get(achievement.id) else {
            continue;
        };
        if (def.rule)(ctx) {
            achievement.unlocked_at = Some(now);
            newly_unlocked.push(achievement.id);
        }
    }

    newly_unlocked
}

pub fn is_unlocked(achievements: &[Achievement], id: AchievementId) -> bool {
    achievements.iter().any(|a| a.id == id && a.is_unlocked())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GameState;
    use chrono::{TimeZone, Utc};

    fn ts(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap()
    }

    fn score(id: u32, attempts: u32, time: u32, hints: u32) -> ExerciseScore {
        ExerciseScore { exercise_id: id, points: 100, attempts, time_spent: time, completed_at: ts(1), hints_used: hints }
    }

    fn ctx(scores: &[ExerciseScore], streak: u32) -> AchievementContext<'_> {
        AchievementContext { scores, catalog_size: 4, streak }
    }

    #[test]
    fn test_nothing_unlocks_without_scores() {
        let mut gs = GameState::new("ada", ts(1));
        assert!(evaluate(&mut gs.achievements, &ctx(&[], 0), ts(1)).is_empty());
    }

    #[test]
    fn test_first_perfect_and_speed() {
        let mut gs = GameState::new("ada", ts(1));
        let scores = [score(1, 1, 30, 0)];
        let unlocked = evaluate(&mut gs.achievements, &ctx(&scores, 1), ts(2));
        assert_eq!(
            unlocked,
            vec![AchievementId::FirstExercise, AchievementId::PerfectScore, AchievementId::SpeedDemon]
        );
        assert!(is_unlocked(&gs.achievements, AchievementId::SpeedDemon));
        assert!(!is_unlocked(&gs.achievements, AchievementId::TableChampion));
    }

    #[test]
    fn test_table_champion_needs_distinct_exercises() {
        let mut gs = GameState::new("ada", ts(1));
        let partial = [score(1, 2, 300, 1), score(2, 2, 300, 1), score(3, 2, 300, 1)];
        evaluate(&mut gs.achievements, &ctx(&partial, 0), ts(1));
        assert!(!is_unlocked(&gs.achievements, AchievementId::TableChampion));

        let all = [score(1, 2, 300, 1), score(2, 2, 300, 1), score(3, 2, 300, 1), score(4, 2, 300, 1)];
        let unlocked = evaluate(&mut gs.achievements, &ctx(&all, 0), ts(1));
        assert_eq!(unlocked, vec![AchievementId::TableChampion]);
    }

    #[test]
    fn test_hint_minimalist_and_streak() {
        let mut gs = GameState::new("ada", ts(1));
        let scores: Vec<_> = (1..=5).map(|i| score(i, 2, 300, 0)).collect();
        let unlocked = evaluate(&mut gs.achievements, &ctx(&scores, 7), ts(1));
        assert!(unlocked.contains(&AchievementId::HintMinimalist));
        assert!(unlocked.contains(&AchievementId::StreakMaster));
    }

    #[test]
    fn test_unlock_is_monotonic() {
        let mut gs = GameState::new("ada", ts(1));
        let scores = [score(1, 1, 30, 0)];
        evaluate(&mut gs.achievements, &ctx(&scores, 0), ts(2));
        let stamped = gs.achievements[0].unlocked_at;
        assert!(stamped.is_some());

        // Re-running with an empty history neither clears nor restamps.
        let again = evaluate(&mut gs.achievements, &ctx(&[], 0), ts(3));
        assert!(again.is_empty());
        assert_eq!(gs.achievements[0].unlocked_at, stamped);

        let superset = [score(1, 1, 30, 0), score(2, 3, 500, 2)];
        evaluate(&mut gs.achievements, &ctx(&superset, 0), ts(4));
        assert_eq!(gs.achievements[0].unlocked_at, stamped);
    }

    #[test]
    fn test_catalog_ids_match_serde_names() {
        for def in ACHIEVEMENTS {
            let json = serde_json::to_value(def.id).unwrap();
            assert_eq!(json, def.id.as_str());
        }
    }
}
