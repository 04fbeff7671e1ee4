//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::domain::ExerciseId;
use crate::error::TutorError;
use crate::gamification::daily::parse_day_key;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic;

impl IntoResponse for TutorError {
  fn into_response(self) -> Response {
    let status = match &self {
      TutorError::UnknownExercise(_) | TutorError::NoProfile => StatusCode::NOT_FOUND,
      TutorError::ProfileExists(_) => StatusCode::CONFLICT,
      TutorError::EmptyUsername | TutorError::InvalidTheme(_) => StatusCode::BAD_REQUEST,
      TutorError::NotSolved { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
  /// `YYYY-MM-DD`; today when absent.
  pub date: Option<String>,
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_list_exercises() -> impl IntoResponse {
  Json(logic::list_exercises())
}

#[instrument(level = "info")]
pub async fn http_get_exercise(Path(id): Path<ExerciseId>) -> Result<Json<ExerciseOut>, TutorError> {
  logic::get_exercise(id).map(Json)
}

#[instrument(level = "info")]
pub async fn http_get_solution(Path(id): Path<ExerciseId>) -> Result<Json<CodeOut>, TutorError> {
  logic::solution(id).map(Json)
}

#[instrument(level = "info")]
pub async fn http_get_initial_code(Path(id): Path<ExerciseId>) -> Result<Json<CodeOut>, TutorError> {
  logic::reset_code(id).map(Json)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_profile(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ProfileIn>,
) -> Result<impl IntoResponse, TutorError> {
  let game = logic::create_profile(&state, &body.username).await?;
  Ok((StatusCode::CREATED, Json(game)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_state(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, TutorError> {
  logic::game_state(&state).await.map(Json)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_start(
  State(state): State<Arc<AppState>>,
  Path(id): Path<ExerciseId>,
) -> Result<Json<ExerciseOut>, TutorError> {
  logic::start_exercise(&state, id).await.map(Json)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_hint(
  State(state): State<Arc<AppState>>,
  Path(id): Path<ExerciseId>,
) -> Result<Json<HintOut>, TutorError> {
  let hint = logic::reveal_hint(&state, id).await?;
  info!(target: "exercise", exercise_id = id, index = hint.index, "HTTP hint served");
  Ok(Json(hint))
}

#[instrument(level = "debug", skip(state, body), fields(exercise_id = body.exercise_id, code_len = body.code.len()))]
pub async fn http_post_check(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CodeIn>,
) -> Result<Json<CheckOut>, TutorError> {
  logic::check_code(&state, body.exercise_id, &body.code).await.map(Json)
}

/// Immediate completion (no grace period); the WebSocket path applies the delay.
#[instrument(level = "info", skip(state, body), fields(exercise_id = body.exercise_id, code_len = body.code.len()))]
pub async fn http_post_complete(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CodeIn>,
) -> Result<impl IntoResponse, TutorError> {
  let outcome = logic::complete_exercise(&state, body.exercise_id, &body.code).await?;
  info!(target: "exercise", exercise_id = body.exercise_id, points = outcome.score.points, "HTTP completion recorded");
  Ok(Json(outcome))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::progress(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (entries, rank) = logic::leaderboard(&state).await;
  Json(serde_json::json!({ "entries": entries, "rank": rank }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_daily(
  State(state): State<Arc<AppState>>,
  Query(q): Query<DailyQuery>,
) -> Response {
  let date = match q.date.as_deref() {
    None => None,
    Some(raw) => match parse_day_key(raw) {
      Some(d) => Some(d),
      None => {
        warn!(target: "gamification", date = %raw, "Bad daily challenge date");
        let error = format!("invalid date '{}', expected YYYY-MM-DD", raw);
        return (StatusCode::BAD_REQUEST, Json(ErrorOut { error })).into_response();
      }
    },
  };
  match logic::daily_challenge(&state, date).await {
    Ok(out) => Json(out).into_response(),
    Err(e) => e.into_response(),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_theme(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let theme = logic::theme(&state).await;
  Json(ThemeBody { theme: theme.as_str().to_string() })
}

#[instrument(level = "info", skip(state, body), fields(theme = %body.theme))]
pub async fn http_put_theme(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, TutorError> {
  let theme = logic::set_theme(&state, &body.theme).await?;
  Ok(Json(ThemeBody { theme: theme.as_str().to_string() }))
}
