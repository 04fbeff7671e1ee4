//! Application state: the single learner session and its persistence gateway.
//!
//! This module owns:
//!   - the session aggregates (game state, legacy progress, leaderboard, theme)
//!   - the active exercise (start instant + revealed hints)
//!   - the persistence façade (file or memory backed, per config)
//!
//! There is exactly one session and one writer. Every mutation happens under the
//! session write lock and is flushed through `Persistence` before the lock is released.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{sync::RwLock, time::Instant};
use tracing::{info, instrument};

use crate::config::{resolve_config, StorageBackend, TutorConfig};
use crate::domain::{ExerciseId, GameState, LegacyProgress};
use crate::gamification::{leaderboard::Leaderboard, refresh_daily};
use crate::seeds::catalog_size;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, Persistence, Theme};

/// The exercise currently open in the editor.
#[derive(Debug, Clone)]
pub struct ActiveExercise {
    pub exercise_id: ExerciseId,
    pub started_at: Instant,
    pub hints_revealed: BTreeSet<usize>,
}

impl ActiveExercise {
    pub fn start(exercise_id: ExerciseId) -> Self {
        Self { exercise_id, started_at: Instant::now(), hints_revealed: BTreeSet::new() }
    }

    pub fn elapsed_secs(&self) -> u32 {
        u32::try_from(self.started_at.elapsed().as_secs()).unwrap_or(u32::MAX)
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_revealed.len() as u32
    }
}

#[derive(Debug, Default)]
pub struct Session {
    /// None until the learner enters a username (first run).
    pub game: Option<GameState>,
    pub progress: LegacyProgress,
    pub leaderboard: Leaderboard,
    pub theme: Theme,
    pub active: Option<ActiveExercise>,
}

impl Session {
    /// The active exercise for `exercise_id`, starting it if another one (or none) is open.
    pub fn activate(&mut self, exercise_id: ExerciseId) -> &mut ActiveExercise {
        if self.active.as_ref().map(|a| a.exercise_id) != Some(exercise_id) {
            info!(target: "exercise", exercise_id, "Exercise started");
            self.active = Some(ActiveExercise::start(exercise_id));
        }
        self.active.get_or_insert_with(|| ActiveExercise::start(exercise_id))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
    pub persistence: Persistence,
    pub config: TutorConfig,
}

impl AppState {
    /// Build state from env: load config, open the configured store, load the session.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = resolve_config();
        let store: Arc<dyn KeyValueStore> = match config.storage.backend {
            StorageBackend::File => {
                let store = FileStore::new(&config.storage.dir);
                info!(target: "storage", dir = %store.dir().display(), "Using file-backed storage");
                Arc::new(store)
            }
            StorageBackend::Memory => {
                info!(target: "storage", "Using in-memory storage; nothing survives a restart");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_store(config, store)
    }

    /// Load whatever the store holds. Missing or unreadable records start empty.
    pub fn with_store(config: TutorConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let persistence = Persistence::new(store);
        let mut session = Session {
            game: persistence.load_game_state(),
            progress: persistence.load_progress().unwrap_or_default(),
            leaderboard: persistence.load_leaderboard().unwrap_or_default(),
            theme: persistence.load_theme(),
            active: None,
        };

        match session.game.as_mut() {
            Some(game) => {
                // A new day may have started since the last visit.
                refresh_daily(game, catalog_size(), Utc::now());
                persistence.save_game_state(game);
                info!(
                    target: "tables_tutor",
                    username = %game.user_profile.username,
                    level = game.user_profile.level,
                    total_points = game.user_profile.total_points,
                    completed = session.progress.completed_exercises.len(),
                    leaderboard = session.leaderboard.entries().len(),
                    "Session restored"
                );
            }
            None => info!(target: "tables_tutor", "No learner profile yet; waiting for first-run username"),
        }

        Self { session: Arc::new(RwLock::new(session)), persistence, config }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.config.session.grace_period_ms)
    }

    /// Write every session slice through the gateway. Failures are logged there.
    pub fn persist(&self, session: &Session) {
        if let Some(game) = &session.game {
            self.persistence.save_game_state(game);
        }
        self.persistence.save_progress(&session.progress);
        self.persistence.save_leaderboard(&session.leaderboard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_state() -> AppState {
        AppState::with_store(TutorConfig::default(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn fresh_store_has_no_profile() {
        let state = memory_state();
        let session = state.session.read().await;
        assert!(session.game.is_none());
        assert!(session.leaderboard.entries().is_empty());
        assert_eq!(session.theme, Theme::Light);
        assert_eq!(state.grace_period(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn restores_profile_and_creates_todays_challenge() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let seed = Persistence::new(store.clone());
        seed.save_game_state(&GameState::new("ada", Utc::now()));
        seed.save_theme(Theme::Dark);

        let state = AppState::with_store(TutorConfig::default(), store);
        let session = state.session.read().await;
        let game = session.game.as_ref().unwrap();
        assert_eq!(game.user_profile.username, "ada");
        assert_eq!(game.daily_challenges.len(), 1);
        assert_eq!(session.theme, Theme::Dark);
    }

    #[tokio::test(start_paused = true)]
    async fn activate_keeps_running_exercise_and_restarts_on_switch() {
        let mut session = Session::default();
        session.activate(1).hints_revealed.insert(0);
        tokio::time::advance(Duration::from_secs(42)).await;

        let same = session.activate(1);
        assert_eq!(same.hints_used(), 1);
        assert_eq!(same.elapsed_secs(), 42);

        let other = session.activate(2);
        assert_eq!(other.hints_used(), 0);
        assert_eq!(other.elapsed_secs(), 0);
    }
}
