//! Daily challenge: three exercises derived from the calendar day.

use chrono::{Datelike, NaiveDate};

use crate::domain::{DailyChallenge, ExerciseScore};

pub const TARGET_POINTS: u32 = 250;
pub const REWARD_POINTS: u32 = 100;

/// Challenge for `date`. Pure: the same date and catalog size always give the same challenge.
pub fn generate(date: NaiveDate, catalog_size: usize) -> DailyChallenge {
    let n = catalog_size.max(1) as u32;
    let day = date.day();
    let exercise_ids = vec![((day - 1) % n) + 1, (day % n) + 1, ((day + 1) % n) + 1];
    let listed = exercise_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    DailyChallenge {
        id: format!("daily-{}", date.format("%Y-%m-%d")),
        title: "Daily Challenge".into(),
        description: format!("Complete exercises {} with high scores!", listed),
        exercise_ids,
        target_points: TARGET_POINTS,
        reward_points: REWARD_POINTS,
        date,
        completed: false,
    }
}

/// Parse a `YYYY-MM-DD` day key.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

/// Index of the challenge for `date`, creating it if absent. The bool is true when created.
pub fn lookup_or_create(challenges: &mut Vec<DailyChallenge>, date: NaiveDate, catalog_size: usize) -> (usize, bool) {
    if let Some(idx) = challenges.iter().position(|c| c.date == date) {
        return (idx, false);
    }
    challenges.push(generate(date, catalog_size));
    (challenges.len() - 1, true)
}

/// Sum of the best points for the challenge's exercises.
pub fn challenge_points(challenge: &DailyChallenge, scores: &[ExerciseScore]) -> u32 {
    challenge
        .exercise_ids
        .iter()
        .map(|id| scores.iter().find(|s| s.exercise_id == *id).map(|s| s.points).unwrap_or(0))
        .sum()
}

/// Flip `completed` once the target is reached. One-way. Returns true on the transition.
pub fn refresh_completion(challenge: &mut DailyChallenge, scores: &[ExerciseScore]) -> bool {
    if challenge.completed {
        return false;
    }
    if challenge_points(challenge, scores) >= challenge.target_points {
        challenge.completed = true;
        return true;
    }
    false
}
