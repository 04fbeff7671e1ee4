//! Domain models used by the tutor: learner profile, exercise scores, unlockables,
//! daily challenges, leaderboard rows and the two persisted aggregates.
//!
//! Field names serialize in camelCase so records written by the browser build of the
//! tutorial load unchanged.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::gamification::achievements::{AchievementId, ACHIEVEMENTS};
use crate::gamification::levels::level_for;
use crate::gamification::rewards::{RewardId, REWARDS};

pub type ExerciseId = u32;
pub type Timestamp = DateTime<Utc>;

/// Schema version written into both persisted aggregates.
pub const SCHEMA_VERSION: u32 = 1;

fn schema_v1() -> u32 { SCHEMA_VERSION }

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub username: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar: Option<String>,
  pub level: u32,
  pub total_points: u32,
  pub streak: u32,
  pub join_date: Timestamp,
}

/// Best result for one exercise. At most one per exercise id lives in `GameState::scores`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseScore {
  pub exercise_id: ExerciseId,
  pub points: u32,
  pub attempts: u32,
  /// Seconds.
  pub time_spent: u32,
  pub completed_at: Timestamp,
  pub hints_used: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
  pub id: AchievementId,
  pub title: String,
  pub description: String,
  pub icon: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unlocked_at: Option<Timestamp>,
}

impl Achievement {
  pub fn is_unlocked(&self) -> bool { self.unlocked_at.is_some() }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
  Theme,
  Badge,
  Title,
  Feature,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
  pub id: RewardId,
  #[serde(rename = "type")]
  pub kind: RewardKind,
  pub name: String,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unlocked_at: Option<Timestamp>,
}

impl Reward {
  pub fn is_unlocked(&self) -> bool { self.unlocked_at.is_some() }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
  pub id: String,
  pub title: String,
  pub description: String,
  pub exercise_ids: Vec<ExerciseId>,
  pub target_points: u32,
  pub reward_points: u32,
  /// Calendar day key, serialized as `YYYY-MM-DD`.
  pub date: NaiveDate,
  pub completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  pub username: String,
  pub total_points: u32,
  pub level: u32,
  pub completed_exercises: u32,
  pub streak: u32,
  pub last_active: Timestamp,
}

/// Aggregate root of the gamification layer, owned by the single local session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
  #[serde(default = "schema_v1")]
  pub version: u32,
  pub user_profile: UserProfile,
  pub scores: Vec<ExerciseScore>,
  pub achievements: Vec<Achievement>,
  pub rewards: Vec<Reward>,
  pub daily_challenges: Vec<DailyChallenge>,
  pub last_played_date: Timestamp,
}

impl GameState {
  /// Fresh state for a first-run learner: one locked entry per catalog achievement/reward.
  pub fn new(username: &str, now: Timestamp) -> Self {
    Self {
      version: SCHEMA_VERSION,
      user_profile: UserProfile {
        username: username.to_string(),
        avatar: None,
        level: 1,
        total_points: 0,
        streak: 0,
        join_date: now,
      },
      scores: Vec::new(),
      achievements: ACHIEVEMENTS
        .iter()
        .map(|a| Achievement {
          id: a.id,
          title: a.title.into(),
          description: a.description.into(),
          icon: a.icon.into(),
          unlocked_at: None,
        })
        .collect(),
      rewards: REWARDS
        .iter()
        .map(|r| Reward {
          id: r.id,
          kind: r.kind,
          name: r.name.into(),
          description: r.description.into(),
          unlocked_at: None,
        })
        .collect(),
      daily_challenges: Vec::new(),
      last_played_date: now,
    }
  }

  /// Replace-if-better insert. Returns true if `score` is now the stored record.
  pub fn record_score(&mut self, score: ExerciseScore) -> bool {
    match self.scores.iter_mut().find(|s| s.exercise_id == score.exercise_id) {
      Some(existing) if score.points > existing.points => {
        *existing = score;
        true
      }
      Some(_) => false,
      None => {
        self.scores.push(score);
        true
      }
    }
  }

  pub fn sum_points(&self) -> u32 {
    self.scores.iter().map(|s| s.points).sum()
  }

  pub fn best_points(&self, exercise_id: ExerciseId) -> u32 {
    self.scores
      .iter()
      .find(|s| s.exercise_id == exercise_id)
      .map(|s| s.points)
      .unwrap_or(0)
  }

  /// Recompute total points and level from the score list. Returns (old_level, new_level).
  pub fn refresh_totals(&mut self) -> (u32, u32) {
    let old_level = self.user_profile.level;
    self.user_profile.total_points = self.sum_points();
    self.user_profile.level = level_for(self.user_profile.total_points);
    (old_level, self.user_profile.level)
  }

  /// Catalog entries missing from an older stored state are added back as locked.
  pub fn backfill_catalog(&mut self) {
    let fresh = GameState::new(&self.user_profile.username, self.last_played_date);
    for a in fresh.achievements {
      if !self.achievements.iter().any(|x| x.id == a.id) {
        self.achievements.push(a);
      }
    }
    for r in fresh.rewards {
      if !self.rewards.iter().any(|x| x.id == r.id) {
        self.rewards.push(r);
      }
    }
  }

  pub fn leaderboard_entry(&self, now: Timestamp) -> LeaderboardEntry {
    LeaderboardEntry {
      username: self.user_profile.username.clone(),
      total_points: self.user_profile.total_points,
      level: self.user_profile.level,
      completed_exercises: self.scores.len() as u32,
      streak: self.user_profile.streak,
      last_active: now,
    }
  }
}

/// Legacy labels granted by completed-exercise count. They are persisted strings, so the
/// German wording from the browser build is kept.
const LEGACY_LABELS: &[(usize, &str)] = &[
  (1, "Erste Schritte"),
  (2, "Tabellenbauer"),
  (3, "HTML-Meister"),
];
const LEGACY_CHAMPION: &str = "Tabellen-Champion";

/// The older, simpler progress record. Written alongside `GameState` on every completion;
/// its labels are not the catalog achievements and are never reconciled with them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProgress {
  #[serde(default = "schema_v1")]
  pub version: u32,
  #[serde(default)]
  pub completed_exercises: Vec<ExerciseId>,
  #[serde(default)]
  pub attempts: BTreeMap<ExerciseId, u32>,
  #[serde(default)]
  pub last_attempt: BTreeMap<ExerciseId, Timestamp>,
  #[serde(default)]
  pub achievements: Vec<String>,
}

impl Default for LegacyProgress {
  fn default() -> Self {
    Self {
      version: SCHEMA_VERSION,
      completed_exercises: Vec::new(),
      attempts: BTreeMap::new(),
      last_attempt: BTreeMap::new(),
      achievements: Vec::new(),
    }
  }
}

impl LegacyProgress {
  pub fn attempts_for(&self, exercise_id: ExerciseId) -> u32 {
    self.attempts.get(&exercise_id).copied().unwrap_or(0)
  }

  pub fn is_completed(&self, exercise_id: ExerciseId) -> bool {
    self.completed_exercises.contains(&exercise_id)
  }

  /// Record one completion. Returns the legacy labels granted by this call.
  pub fn record_completion(&mut self, exercise_id: ExerciseId, now: Timestamp, catalog_size: usize) -> Vec<String> {
    *self.attempts.entry(exercise_id).or_insert(0) += 1;
    self.last_attempt.insert(exercise_id, now);
    if !self.is_completed(exercise_id) {
      self.completed_exercises.push(exercise_id);
    }

    let done = self.completed_exercises.len();
    let mut granted = Vec::new();
    for (needed, label) in LEGACY_LABELS {
      if done >= *needed && !self.achievements.iter().any(|a| a == label) {
        granted.push(label.to_string());
      }
    }
    if done == catalog_size && !self.achievements.iter().any(|a| a == LEGACY_CHAMPION) {
      granted.push(LEGACY_CHAMPION.to_string());
    }
    self.achievements.extend(granted.iter().cloned());
    granted
  }
}
