//! Gamification layer: points, levels, streaks, achievements, rewards, daily challenges
//! and the local leaderboard.
//!
//! `apply_completion` runs the whole pipeline for one finished exercise against the
//! session's aggregates. It is synchronous and takes the clock as a parameter.

pub mod achievements;
pub mod daily;
pub mod leaderboard;
pub mod levels;
pub mod rewards;
pub mod scoring;
pub mod streaks;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{ExerciseId, ExerciseScore, GameState, LegacyProgress, Timestamp};
use achievements::{AchievementContext, AchievementId};
use rewards::{RewardContext, RewardId};

/// Something the UI should celebrate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GamificationEvent {
    PointsAwarded { exercise_id: ExerciseId, points: u32, new_best: bool },
    LevelUp { old_level: u32, new_level: u32 },
    StreakExtended { count: u32 },
    AchievementUnlocked { id: AchievementId },
    RewardUnlocked { id: RewardId },
    LegacyLabel { label: String },
    DailyChallengeCompleted { id: String },
}

/// Raw facts about one completion, gathered by the session.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    pub exercise_id: ExerciseId,
    pub time_spent_secs: u32,
    pub hints_used: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub score: ExerciseScore,
    pub total_points: u32,
    pub level: u32,
    pub streak: u32,
    pub events: Vec<GamificationEvent>,
}

/// Score one completion and update both aggregates.
pub fn apply_completion(
    game: &mut GameState,
    progress: &mut LegacyProgress,
    completion: Completion,
    catalog_size: usize,
    now: Timestamp,
) -> CompletionOutcome {
    let mut events = Vec::new();
    let Completion { exercise_id, time_spent_secs, hints_used } = completion;

    let attempts = progress.attempts_for(exercise_id) + 1;
    let is_first_try = attempts == 1;
    let points = scoring::points(attempts, time_spent_secs, hints_used, is_first_try);
    let score = ExerciseScore {
        exercise_id,
        points,
        attempts,
        time_spent: time_spent_secs,
        completed_at: now,
        hints_used,
    };
    let new_best = game.record_score(score.clone());
    events.push(GamificationEvent::PointsAwarded { exercise_id, points, new_best });
    info!(target: "gamification", exercise_id, points, attempts, hints_used, time_spent_secs, new_best, "Exercise scored");

    let (old_level, new_level) = game.refresh_totals();
    if new_level > old_level {
        info!(target: "gamification", old_level, new_level, "Level up");
        events.push(GamificationEvent::LevelUp { old_level, new_level });
    }

    let old_streak = game.user_profile.streak;
    let streak = streaks::next_streak(old_streak, game.last_played_date.date_naive(), now.date_naive());
    game.user_profile.streak = streak;
    game.last_played_date = now;
    if streak > old_streak {
        events.push(GamificationEvent::StreakExtended { count: streak });
    }

    let ctx = AchievementContext { scores: &game.scores, catalog_size, streak };
    for id in achievements::evaluate(&mut game.achievements, &ctx, now) {
        info!(target: "gamification", achievement = id.as_str(), "Achievement unlocked");
        events.push(GamificationEvent::AchievementUnlocked { id });
    }

    let ctx = RewardContext { total_points: game.user_profile.total_points, achievements: &game.achievements };
    for id in rewards::unlock(&mut game.rewards, &ctx, now) {
        info!(target: "gamification", reward = ?id, "Reward unlocked");
        events.push(GamificationEvent::RewardUnlocked { id });
    }

    if let Some(id) = refresh_daily(game, catalog_size, now) {
        events.push(GamificationEvent::DailyChallengeCompleted { id });
    }

    for label in progress.record_completion(exercise_id, now, catalog_size) {
        debug!(target: "gamification", %label, "Legacy label granted");
        events.push(GamificationEvent::LegacyLabel { label });
    }

    CompletionOutcome {
        score,
        total_points: game.user_profile.total_points,
        level: game.user_profile.level,
        streak,
        events,
    }
}

/// Make sure today's challenge exists and re-check its completion.
/// Returns the challenge id if it just became completed.
pub fn refresh_daily(game: &mut GameState, catalog_size: usize, now: Timestamp) -> Option<String> {
    let (idx, created) = daily::lookup_or_create(&mut game.daily_challenges, now.date_naive(), catalog_size);
    if created {
        debug!(target: "gamification", id = %game.daily_challenges[idx].id, "Daily challenge created");
    }
    let challenge = &mut game.daily_challenges[idx];
    if daily::refresh_completion(challenge, &game.scores) {
        info!(target: "gamification", id = %challenge.id, "Daily challenge completed");
        return Some(challenge.id.clone());
    }
    None
}
