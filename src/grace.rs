//! Grace period between "the code is valid" and "the completion is recorded".
//!
//! One `GracePeriod` lives per editor connection. Arming spawns a tokio sleep that
//! reports back through a channel; every arm gets a fresh generation number so a
//! tick that raced with a cancel is recognized as stale and dropped.
//!
//! A fired timer settles its exercise: further valid edits do not arm again until
//! the exercise is unsettled by an invalid edit or a restart.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::ExerciseId;

/// Generation number of a fired timer.
pub type GraceTick = u64;

struct Pending {
    generation: GraceTick,
    exercise_id: ExerciseId,
    code: String,
    handle: JoinHandle<()>,
}

pub struct GracePeriod {
    delay: Duration,
    generation: GraceTick,
    pending: Option<Pending>,
    settled: Option<ExerciseId>,
}

impl GracePeriod {
    pub fn new(delay: Duration) -> Self {
        Self { delay, generation: 0, pending: None, settled: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the timer for `exercise_id`, or keep the running one and remember the latest code.
    /// A timer for a different exercise is canceled first. A settled exercise is not armed.
    /// Returns true if a new timer started.
    pub fn arm(&mut self, exercise_id: ExerciseId, code: String, tx: &UnboundedSender<GraceTick>) -> bool {
        if self.settled == Some(exercise_id) {
            return false;
        }
        if let Some(p) = self.pending.as_mut() {
            if p.exercise_id == exercise_id {
                p.code = code;
                return false;
            }
        }
        self.cancel();

        self.generation += 1;
        let generation = self.generation;
        let delay = self.delay;
        let tx = tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(generation);
        });
        debug!(target: "exercise", exercise_id, generation, delay_ms = delay.as_millis() as u64, "Grace period armed");
        self.pending = Some(Pending { generation, exercise_id, code, handle });
        true
    }

    /// Drop the pending completion, if any. Returns the exercise it was armed for.
    pub fn cancel(&mut self) -> Option<ExerciseId> {
        let p = self.pending.take()?;
        p.handle.abort();
        debug!(target: "exercise", exercise_id = p.exercise_id, generation = p.generation, "Grace period canceled");
        Some(p.exercise_id)
    }

    /// Allow `exercise_id` to be armed again.
    pub fn unsettle(&mut self, exercise_id: ExerciseId) {
        if self.settled == Some(exercise_id) {
            debug!(target: "exercise", exercise_id, "Exercise unsettled");
            self.settled = None;
        }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn armed_for(&self) -> Option<ExerciseId> {
        self.pending.as_ref().map(|p| p.exercise_id)
    }

    /// Consume a tick from the channel. Yields the exercise and the latest valid code
    /// only if the tick belongs to the timer that is still pending, and settles that exercise.
    pub fn take_fired(&mut self, tick: GraceTick) -> Option<(ExerciseId, String)> {
        if self.pending.as_ref().map(|p| p.generation) != Some(tick) {
            debug!(target: "exercise", tick, "Stale grace tick ignored");
            return None;
        }
        let p = self.pending.take()?;
        self.settled = Some(p.exercise_id);
        Some((p.exercise_id, p.code))
    }
}

impl Drop for GracePeriod {
    fn drop(&mut self) {
        self.cancel();
    }
}
