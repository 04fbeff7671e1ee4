//! WebSocket upgrade + message loop for the editor bridge.
//!
//! Each client message is parsed as JSON and forwarded to core logic. A `code_changed`
//! that validates arms the grace period; the loop selects over the socket and the grace
//! timer so that a late invalid edit (or switching exercise) cancels the completion.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, error, instrument, debug, warn};
use uuid::Uuid;

use crate::grace::{GracePeriod, GraceTick};
use crate::logic;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "tables_tutor", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state), fields(conn = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "tables_tutor", "WebSocket connected");
  let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<GraceTick>();
  let mut grace = GracePeriod::new(state.grace_period());

  loop {
    let replies = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "tables_tutor", "WS received: {:?}", &msg);
            handle_client_ws(msg, &state, &mut grace, &tick_tx).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => continue,
        Some(Err(e)) => {
          warn!(target: "tables_tutor", error = %e, "WS receive error");
          break;
        }
      },
      Some(tick) = tick_rx.recv() => match grace.take_fired(tick) {
        Some((exercise_id, code)) => match logic::complete_exercise(&state, exercise_id, &code).await {
          Ok(outcome) => vec![ServerWsMessage::ExerciseCompleted { outcome }],
          Err(e) => {
            // Nothing was recorded, so the next valid edit may try again.
            grace.unsettle(exercise_id);
            vec![ServerWsMessage::Error { message: e.to_string() }]
          }
        },
        None => continue,
      },
    };

    if !send_all(&mut socket, replies).await {
      break;
    }
  }

  if let Some(exercise_id) = grace.cancel() {
    debug!(target: "exercise", exercise_id, "Pending completion dropped on disconnect");
  }
  info!(target: "tables_tutor", "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> bool {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "tables_tutor", error = %e, "WS send error");
      return false;
    }
  }
  true
}

/// Dispatch one client message. Grace-period transitions are reported alongside the reply.
#[instrument(level = "debug", skip(state, grace, tick_tx))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  grace: &mut GracePeriod,
  tick_tx: &UnboundedSender<GraceTick>,
) -> Vec<ServerWsMessage> {
  let mut out = Vec::new();
  match msg {
    ClientWsMessage::Ping => out.push(ServerWsMessage::Pong),

    ClientWsMessage::StartExercise { exercise_id } => {
      if let Some(canceled) = grace.cancel() {
        out.push(ServerWsMessage::CompletionCanceled { exercise_id: canceled });
      }
      grace.unsettle(exercise_id);
      match logic::start_exercise(state, exercise_id).await {
        Ok(exercise) => out.push(ServerWsMessage::Exercise { exercise }),
        Err(e) => out.push(ServerWsMessage::Error { message: e.to_string() }),
      }
    }

    ClientWsMessage::CodeChanged { exercise_id, code } => {
      if let Some(armed) = grace.armed_for().filter(|armed| *armed != exercise_id) {
        grace.cancel();
        out.push(ServerWsMessage::CompletionCanceled { exercise_id: armed });
      }
      match logic::check_code(state, exercise_id, &code).await {
        Ok(check) => {
          let valid = check.valid;
          out.push(ServerWsMessage::CheckResult { exercise_id, valid, error: check.error });
          if valid {
            if grace.arm(exercise_id, code, tick_tx) {
              let grace_ms = grace.delay().as_millis() as u64;
              out.push(ServerWsMessage::CompletionPending { exercise_id, grace_ms });
            }
          } else {
            grace.unsettle(exercise_id);
            if let Some(canceled) = grace.cancel() {
              info!(target: "exercise", exercise_id = canceled, "Completion canceled by a later edit");
              out.push(ServerWsMessage::CompletionCanceled { exercise_id: canceled });
            }
          }
        }
        Err(e) => out.push(ServerWsMessage::Error { message: e.to_string() }),
      }
    }

    ClientWsMessage::Hint { exercise_id } => match logic::reveal_hint(state, exercise_id).await {
      Ok(hint) => {
        info!(target: "exercise", exercise_id, index = hint.index, "WS hint served");
        out.push(ServerWsMessage::Hint { hint });
      }
      Err(e) => out.push(ServerWsMessage::Error { message: e.to_string() }),
    },
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  use crate::config::TutorConfig;
  use crate::seeds::exercise;
  use crate::storage::MemoryStore;

  fn state() -> AppState {
    AppState::with_store(TutorConfig::default(), Arc::new(MemoryStore::new()))
  }

  fn code_changed(exercise_id: u32, code: &str) -> ClientWsMessage {
    ClientWsMessage::CodeChanged { exercise_id, code: code.to_string() }
  }

  #[tokio::test(start_paused = true)]
  async fn valid_edit_arms_and_invalid_edit_cancels() {
    let state = state();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut grace = GracePeriod::new(Duration::from_millis(1000));
    let solution = exercise(2).unwrap().solution;

    let out = handle_client_ws(code_changed(2, solution), &state, &mut grace, &tx).await;
    assert!(matches!(out[0], ServerWsMessage::CheckResult { valid: true, .. }));
    assert!(matches!(out[1], ServerWsMessage::CompletionPending { exercise_id: 2, grace_ms: 1000 }));

    // Still valid: the running timer is kept, nothing new to announce.
    let out = handle_client_ws(code_changed(2, solution), &state, &mut grace, &tx).await;
    assert_eq!(out.len(), 1);

    let out = handle_client_ws(code_changed(2, "<table></table>"), &state, &mut grace, &tx).await;
    assert!(matches!(out[0], ServerWsMessage::CheckResult { valid: false, .. }));
    assert!(matches!(out[1], ServerWsMessage::CompletionCanceled { exercise_id: 2 }));
    assert!(!grace.is_armed());
  }

  #[tokio::test(start_paused = true)]
  async fn switching_exercise_cancels_pending_completion() {
    let state = state();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut grace = GracePeriod::new(Duration::from_millis(1000));

    handle_client_ws(code_changed(1, exercise(1).unwrap().solution), &state, &mut grace, &tx).await;
    let out = handle_client_ws(ClientWsMessage::StartExercise { exercise_id: 3 }, &state, &mut grace, &tx).await;
    assert!(matches!(out[0], ServerWsMessage::CompletionCanceled { exercise_id: 1 }));
    assert!(matches!(out[1], ServerWsMessage::Exercise { .. }));
    assert!(!grace.is_armed());
  }

  #[tokio::test(start_paused = true)]
  async fn fired_timer_completes_with_latest_code() {
    let state = state();
    logic::create_profile(&state, "ada").await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut grace = GracePeriod::new(state.grace_period());

    handle_client_ws(code_changed(3, exercise(3).unwrap().solution), &state, &mut grace, &tx).await;
    let tick = rx.recv().await.unwrap();
    let (exercise_id, code) = grace.take_fired(tick).unwrap();
    let outcome = logic::complete_exercise(&state, exercise_id, &code).await.unwrap();
    assert_eq!(outcome.score.exercise_id, 3);
    assert_eq!(outcome.score.time_spent, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn solved_exercise_is_not_completed_again_until_broken_or_restarted() {
    let state = state();
    logic::create_profile(&state, "ada").await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut grace = GracePeriod::new(state.grace_period());
    let solution = exercise(2).unwrap().solution;

    handle_client_ws(code_changed(2, solution), &state, &mut grace, &tx).await;
    let tick = rx.recv().await.unwrap();
    let (exercise_id, code) = grace.take_fired(tick).unwrap();
    logic::complete_exercise(&state, exercise_id, &code).await.unwrap();

    // Tidying the solved code: still valid, but nothing new is pending.
    let tidied = format!("{}\n", solution);
    let out = handle_client_ws(code_changed(2, &tidied), &state, &mut grace, &tx).await;
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], ServerWsMessage::CheckResult { valid: true, .. }));
    assert!(!grace.is_armed());
    assert_eq!(state.session.read().await.progress.attempts_for(2), 1);

    // Breaking it and fixing it again is a new attempt.
    handle_client_ws(code_changed(2, "<table></table>"), &state, &mut grace, &tx).await;
    let out = handle_client_ws(code_changed(2, solution), &state, &mut grace, &tx).await;
    assert!(matches!(out[1], ServerWsMessage::CompletionPending { exercise_id: 2, .. }));
    grace.cancel();

    // So is restarting the exercise.
    handle_client_ws(code_changed(3, exercise(3).unwrap().solution), &state, &mut grace, &tx).await;
    let tick = rx.recv().await.unwrap();
    let (exercise_id, code) = grace.take_fired(tick).unwrap();
    logic::complete_exercise(&state, exercise_id, &code).await.unwrap();
    handle_client_ws(ClientWsMessage::StartExercise { exercise_id: 3 }, &state, &mut grace, &tx).await;
    let out = handle_client_ws(code_changed(3, exercise(3).unwrap().solution), &state, &mut grace, &tx).await;
    assert!(matches!(out[1], ServerWsMessage::CompletionPending { exercise_id: 3, .. }));
  }

  #[tokio::test]
  async fn unknown_exercise_is_an_error_message() {
    let state = state();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut grace = GracePeriod::new(Duration::from_millis(10));
    let out = handle_client_ws(ClientWsMessage::Hint { exercise_id: 42 }, &state, &mut grace, &tx).await;
    assert!(matches!(&out[0], ServerWsMessage::Error { message } if message.contains("42")));
  }
}
