//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{DailyChallenge, ExerciseId, LegacyProgress};
use crate::gamification::levels::LevelProgress;
use crate::gamification::CompletionOutcome;
use crate::seeds::Exercise;

/// Messages the editor can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartExercise {
        #[serde(rename = "exerciseId")]
        exercise_id: ExerciseId,
    },
    /// Sent on every edit with the full editor content.
    CodeChanged {
        #[serde(rename = "exerciseId")]
        exercise_id: ExerciseId,
        code: String,
    },
    Hint {
        #[serde(rename = "exerciseId")]
        exercise_id: ExerciseId,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Exercise {
        exercise: ExerciseOut,
    },
    CheckResult {
        #[serde(rename = "exerciseId")]
        exercise_id: ExerciseId,
        valid: bool,
        error: Option<String>,
    },
    CompletionPending {
        #[serde(rename = "exerciseId")]
        exercise_id: ExerciseId,
        #[serde(rename = "graceMs")]
        grace_ms: u64,
    },
    CompletionCanceled {
        #[serde(rename = "exerciseId")]
        exercise_id: ExerciseId,
    },
    ExerciseCompleted {
        outcome: CompletionOutcome,
    },
    Hint {
        hint: HintOut,
    },
    Error {
        message: String,
    },
}

/// Catalog entry as the UI sees it. The solution is only served on request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOut {
    pub id: ExerciseId,
    pub title: String,
    pub description: String,
    pub initial_code: String,
    pub hint_count: usize,
}

pub fn to_out(e: &Exercise) -> ExerciseOut {
    ExerciseOut {
        id: e.id,
        title: e.title.to_string(),
        description: e.description.to_string(),
        initial_code: e.initial_code.to_string(),
        hint_count: e.hints.len(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Deserialize)]
pub struct ProfileIn {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeIn {
    #[serde(rename = "exerciseId")]
    pub exercise_id: ExerciseId,
    pub code: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CheckOut {
    pub valid: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintOut {
    pub exercise_id: ExerciseId,
    pub index: usize,
    pub text: String,
    pub hints_used: u32,
    pub remaining: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeOut {
    pub exercise_id: ExerciseId,
    pub code: String,
}

#[derive(Serialize)]
pub struct ProgressOut {
    pub progress: LegacyProgress,
    pub level: Option<LevelProgress>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOut {
    pub challenge: DailyChallenge,
    pub current_points: u32,
}

#[derive(Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
