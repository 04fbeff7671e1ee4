//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Profile creation (first run)
//!   - Exercise start / hints / reset / solution
//!   - Checking editor content (validity + optional error string)
//!   - Recording a completion through the gamification pipeline and persisting it
//!   - Read models for progress, leaderboard, daily challenge and theme

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::domain::{ExerciseId, GameState, LeaderboardEntry};
use crate::error::TutorError;
use crate::gamification::{self, daily, levels::LevelProgress, Completion, CompletionOutcome};
use crate::protocol::{to_out, CheckOut, CodeOut, DailyOut, ExerciseOut, HintOut, ProgressOut};
use crate::seeds::{catalog_size, exercise, Exercise, EXERCISES};
use crate::state::{ActiveExercise, AppState};
use crate::storage::Theme;
use crate::util::trunc_for_log;
use crate::validator::editor_diagnostic;

fn lookup(exercise_id: ExerciseId) -> Result<&'static Exercise, TutorError> {
  exercise(exercise_id).ok_or(TutorError::UnknownExercise(exercise_id))
}

/// An editor-level structure problem makes the code invalid even when the exercise's own
/// rules hold. Otherwise the first unmet rule is reported.
fn assess(ex: &Exercise, code: &str) -> Result<(), String> {
  if let Some(problem) = editor_diagnostic(code) {
    return Err(problem);
  }
  if ex.validate(code) {
    return Ok(());
  }
  ex.explain(code)
}

pub fn list_exercises() -> Vec<ExerciseOut> {
  EXERCISES.iter().map(to_out).collect()
}

pub fn get_exercise(exercise_id: ExerciseId) -> Result<ExerciseOut, TutorError> {
  lookup(exercise_id).map(to_out)
}

/// Initial code of the exercise, for the editor's reset button.
pub fn reset_code(exercise_id: ExerciseId) -> Result<CodeOut, TutorError> {
  let ex = lookup(exercise_id)?;
  Ok(CodeOut { exercise_id, code: ex.initial_code.to_string() })
}

/// Showing the solution does not complete the exercise.
pub fn solution(exercise_id: ExerciseId) -> Result<CodeOut, TutorError> {
  let ex = lookup(exercise_id)?;
  info!(target: "exercise", exercise_id, "Solution revealed");
  Ok(CodeOut { exercise_id, code: ex.solution.to_string() })
}

#[instrument(level = "info", skip(state))]
pub async fn create_profile(state: &AppState, username: &str) -> Result<GameState, TutorError> {
  let username = username.trim();
  if username.is_empty() {
    return Err(TutorError::EmptyUsername);
  }
  let mut session = state.session.write().await;
  if let Some(existing) = &session.game {
    return Err(TutorError::ProfileExists(existing.user_profile.username.clone()));
  }

  let now = Utc::now();
  let mut game = GameState::new(username, now);
  gamification::refresh_daily(&mut game, catalog_size(), now);
  state.persistence.save_game_state(&game);
  info!(target: "tables_tutor", %username, "Learner profile created");
  session.game = Some(game.clone());
  Ok(game)
}

pub async fn game_state(state: &AppState) -> Result<GameState, TutorError> {
  state.session.read().await.game.clone().ok_or(TutorError::NoProfile)
}

/// (Re)start an exercise: fresh timer, no hints revealed.
#[instrument(level = "info", skip(state))]
pub async fn start_exercise(state: &AppState, exercise_id: ExerciseId) -> Result<ExerciseOut, TutorError> {
  let ex = lookup(exercise_id)?;
  let mut session = state.session.write().await;
  session.active = Some(ActiveExercise::start(exercise_id));
  info!(target: "exercise", exercise_id, title = ex.title, "Exercise started");
  Ok(to_out(ex))
}

/// Reveal the next hint. Each distinct hint counts once toward hints used;
/// asking again after the last one repeats it without counting.
#[instrument(level = "info", skip(state))]
pub async fn reveal_hint(state: &AppState, exercise_id: ExerciseId) -> Result<HintOut, TutorError> {
  let ex = lookup(exercise_id)?;
  let mut session = state.session.write().await;
  let active = session.activate(exercise_id);

  let index = active.hints_revealed.len().min(ex.hints.len().saturating_sub(1));
  let text = ex.hints.get(index).copied().unwrap_or_default().to_string();
  if !ex.hints.is_empty() {
    active.hints_revealed.insert(index);
  }
  let hints_used = active.hints_used();
  debug!(target: "exercise", exercise_id, index, hints_used, "Hint revealed");
  Ok(HintOut { exercise_id, index, text, hints_used, remaining: ex.hints.len() - active.hints_revealed.len() })
}

/// Check the current editor content. Editing an exercise that is not active starts it.
#[instrument(level = "debug", skip(state, code), fields(code_len = code.len()))]
pub async fn check_code(state: &AppState, exercise_id: ExerciseId, code: &str) -> Result<CheckOut, TutorError> {
  let ex = lookup(exercise_id)?;
  state.session.write().await.activate(exercise_id);

  let out = match assess(ex, code) {
    Ok(()) => CheckOut { valid: true, error: None },
    Err(problem) => CheckOut { valid: false, error: Some(problem) },
  };
  debug!(target: "exercise", exercise_id, valid = out.valid, error = ?out.error, "Code checked");
  Ok(out)
}

/// Validate, score and persist one completion. The active exercise supplies elapsed time
/// and hints; without one (e.g. after a restart) both count as zero.
#[instrument(level = "info", skip(state, code), fields(code_len = code.len()))]
pub async fn complete_exercise(state: &AppState, exercise_id: ExerciseId, code: &str) -> Result<CompletionOutcome, TutorError> {
  let ex = lookup(exercise_id)?;
  if let Err(reason) = assess(ex, code) {
    warn!(target: "exercise", exercise_id, code = %trunc_for_log(code, 200), %reason, "Completion rejected");
    return Err(TutorError::NotSolved { id: exercise_id, reason });
  }

  let mut guard = state.session.write().await;
  let session = &mut *guard;
  let Some(game) = session.game.as_mut() else {
    return Err(TutorError::NoProfile);
  };

  let (time_spent_secs, hints_used) = match session.active.take() {
    Some(a) if a.exercise_id == exercise_id => (a.elapsed_secs(), a.hints_used()),
    _ => (0, 0),
  };
  let previous_best = game.best_points(exercise_id);
  let now = Utc::now();
  let outcome = gamification::apply_completion(
    game,
    &mut session.progress,
    Completion { exercise_id, time_spent_secs, hints_used },
    catalog_size(),
    now,
  );
  session.leaderboard.upsert(game.leaderboard_entry(now));
  state.persist(session);

  info!(
    target: "exercise",
    exercise_id,
    points = outcome.score.points,
    previous_best,
    total_points = outcome.total_points,
    level = outcome.level,
    events = outcome.events.len(),
    "Exercise completed"
  );
  Ok(outcome)
}

pub async fn progress(state: &AppState) -> ProgressOut {
  let session = state.session.read().await;
  ProgressOut {
    progress: session.progress.clone(),
    level: session.game.as_ref().map(|g| LevelProgress::new(g.user_profile.total_points)),
  }
}

/// Leaderboard rows plus the learner's 1-based rank, if listed.
pub async fn leaderboard(state: &AppState) -> (Vec<LeaderboardEntry>, Option<usize>) {
  let session = state.session.read().await;
  let rank = session.game.as_ref().and_then(|g| session.leaderboard.rank_of(&g.user_profile.username));
  (session.leaderboard.entries().to_vec(), rank)
}

/// Daily challenge for `date` (today by default). Today's challenge is looked up or created
/// and stored; any other day is generated on the fly and not stored.
#[instrument(level = "debug", skip(state))]
pub async fn daily_challenge(state: &AppState, date: Option<NaiveDate>) -> Result<DailyOut, TutorError> {
  let now = Utc::now();
  let today = now.date_naive();
  let mut session = state.session.write().await;
  let game = session.game.as_mut().ok_or(TutorError::NoProfile)?;

  let challenge = match date {
    Some(d) if d != today => game
      .daily_challenges
      .iter()
      .find(|c| c.date == d)
      .cloned()
      .unwrap_or_else(|| daily::generate(d, catalog_size())),
    _ => {
      let before = game.daily_challenges.len();
      gamification::refresh_daily(game, catalog_size(), now);
      if game.daily_challenges.len() != before {
        state.persistence.save_game_state(game);
      }
      game
        .daily_challenges
        .iter()
        .find(|c| c.date == today)
        .cloned()
        .unwrap_or_else(|| daily::generate(today, catalog_size()))
    }
  };
  let current_points = daily::challenge_points(&challenge, &game.scores);
  Ok(DailyOut { challenge, current_points })
}

pub async fn theme(state: &AppState) -> Theme {
  state.session.read().await.theme
}

#[instrument(level = "info", skip(state))]
pub async fn set_theme(state: &AppState, raw: &str) -> Result<Theme, TutorError> {
  let theme = Theme::parse(raw).ok_or_else(|| TutorError::InvalidTheme(raw.to_string()))?;
  state.session.write().await.theme = theme;
  state.persistence.save_theme(theme);
  info!(target: "tables_tutor", theme = theme.as_str(), "Theme changed");
  Ok(theme)
}
