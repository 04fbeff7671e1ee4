//! Errors surfaced by session operations. None of them is fatal to the session.

use crate::domain::ExerciseId;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TutorError {
  #[error("unknown exercise id {0}")]
  UnknownExercise(ExerciseId),
  #[error("no learner profile yet; enter a username first")]
  NoProfile,
  #[error("a profile for '{0}' already exists on this device")]
  ProfileExists(String),
  #[error("username must not be empty")]
  EmptyUsername,
  #[error("exercise {id} is not solved yet: {reason}")]
  NotSolved { id: ExerciseId, reason: String },
  #[error("invalid theme '{0}'")]
  InvalidTheme(String),
}
