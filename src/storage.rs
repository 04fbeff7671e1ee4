//! Local durable storage.
//!
//! `KeyValueStore` is the minimal string key/value seam (get/set/remove) so the session can
//! run against a directory on disk or purely in memory. `Persistence` is the typed gateway
//! on top: it never returns an error. Failed writes are logged and dropped, unreadable or
//! corrupt records load as absent.

use std::{
  collections::HashMap,
  fs, io,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{GameState, LegacyProgress, SCHEMA_VERSION};
use crate::gamification::leaderboard::Leaderboard;

pub const GAME_STATE_KEY: &str = "html-tables-gamification";
pub const PROGRESS_KEY: &str = "html-tables-progress";
pub const LEADERBOARD_KEY: &str = "html-tables-leaderboard";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("storage I/O failed: {0}")]
  Io(#[from] io::Error),
  #[error("storage unavailable: {0}")]
  Unavailable(String),
  #[error("storage quota exceeded ({used} of {limit} bytes)")]
  QuotaExceeded { used: usize, limit: usize },
}

pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
  fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store with an optional byte quota (sum of all values).
#[derive(Default)]
pub struct MemoryStore {
  items: Mutex<HashMap<String, String>>,
  quota: Option<usize>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  #[cfg(test)]
  pub fn with_quota(limit: usize) -> Self {
    Self { items: Mutex::new(HashMap::new()), quota: Some(limit) }
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let items = self.items.lock().map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
    Ok(items.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut items = self.items.lock().map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
    if let Some(limit) = self.quota {
      let used: usize = items.iter().filter(|(k, _)| k.as_str() != key).map(|(_, v)| v.len()).sum::<usize>() + value.len();
      if used > limit {
        return Err(StoreError::QuotaExceeded { used, limit });
      }
    }
    items.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    let mut items = self.items.lock().map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
    items.remove(key);
    Ok(())
  }
}

/// One file per key inside a directory.
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path { &self.dir }

  fn path_for(&self, key: &str) -> PathBuf {
    let safe: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
      .collect();
    self.dir.join(format!("{safe}.json"))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    fs::create_dir_all(&self.dir)?;
    // Readers never observe a half-written record.
    let path = self.path_for(key);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, value)?;
    fs::rename(&tmp, &path)?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    match fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

/// Theme preference. Stored as a bare string, not JSON.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
  #[default]
  Light,
  Dark,
  HighContrast,
}

impl Theme {
  pub fn as_str(&self) -> &'static str {
    match self {
      Theme::Light => "light",
      Theme::Dark => "dark",
      Theme::HighContrast => "high-contrast",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim() {
      "light" => Some(Theme::Light),
      "dark" => Some(Theme::Dark),
      "high-contrast" => Some(Theme::HighContrast),
      _ => None,
    }
  }
}

/// Typed façade over a `KeyValueStore`. The gamification record and the legacy progress
/// record are separate schemas; both are written through here and neither overrides the other.
#[derive(Clone)]
pub struct Persistence {
  store: Arc<dyn KeyValueStore>,
}

impl Persistence {
  pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
    Self { store }
  }

  fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let raw = match self.store.get(key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        error!(target: "storage", %key, error = %e, "Failed to read record");
        return None;
      }
    };
    match serde_json::from_str::<T>(&raw) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(target: "storage", %key, error = %e, bytes = raw.len(), "Stored record is corrupt; discarding");
        if let Err(e) = self.store.remove(key) {
          error!(target: "storage", %key, error = %e, "Failed to discard corrupt record");
        }
        None
      }
    }
  }

  fn write<T: Serialize>(&self, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
      Ok(json) => json,
      Err(e) => {
        error!(target: "storage", %key, error = %e, "Failed to serialize record");
        return;
      }
    };
    match self.store.set(key, &json) {
      Ok(()) => debug!(target: "storage", %key, bytes = json.len(), "Record saved"),
      Err(e) => error!(target: "storage", %key, error = %e, "Failed to save record; continuing in memory"),
    }
  }

  #[instrument(level = "debug", skip_all)]
  pub fn save_game_state(&self, state: &GameState) {
    self.write(GAME_STATE_KEY, state);
  }

  #[instrument(level = "debug", skip_all)]
  pub fn load_game_state(&self) -> Option<GameState> {
    let mut state: GameState = self.read(GAME_STATE_KEY)?;
    if state.version > SCHEMA_VERSION {
      warn!(target: "storage", version = state.version, "Game state written by a newer schema; ignoring");
      return None;
    }
    if state.user_profile.username.trim().is_empty() {
      warn!(target: "storage", "Game state has an empty username; ignoring");
      return None;
    }
    state.backfill_catalog();
    info!(target: "storage", username = %state.user_profile.username, scores = state.scores.len(), "Game state loaded");
    Some(state)
  }

  pub fn save_progress(&self, progress: &LegacyProgress) {
    self.write(PROGRESS_KEY, progress);
  }

  pub fn load_progress(&self) -> Option<LegacyProgress> {
    let progress: LegacyProgress = self.read(PROGRESS_KEY)?;
    if progress.version > SCHEMA_VERSION {
      warn!(target: "storage", version = progress.version, "Progress record written by a newer schema; ignoring");
      return None;
    }
    Some(progress)
  }

  pub fn save_leaderboard(&self, board: &Leaderboard) {
    self.write(LEADERBOARD_KEY, board);
  }

  pub fn load_leaderboard(&self) -> Option<Leaderboard> {
    let board: Leaderboard = self.read(LEADERBOARD_KEY)?;
    // Re-establish ordering/size in case the stored array was edited by hand.
    Some(Leaderboard::from_entries(board.entries().to_vec()))
  }

  pub fn save_theme(&self, theme: Theme) {
    if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
      error!(target: "storage", key = THEME_KEY, error = %e, "Failed to save theme");
    }
  }

  /// Unknown or unreadable values fall back to the default theme.
  pub fn load_theme(&self) -> Theme {
    match self.store.get(THEME_KEY) {
      Ok(Some(raw)) => Theme::parse(&raw).unwrap_or_default(),
      Ok(None) => Theme::default(),
      Err(e) => {
        error!(target: "storage", key = THEME_KEY, error = %e, "Failed to read theme");
        Theme::default()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  /// A store where every operation fails, like disabled browser storage.
  struct BrokenStore;

  impl KeyValueStore for BrokenStore {
    fn get(&self, _: &str) -> Result<Option<String>, StoreError> { Err(StoreError::Unavailable("disabled".into())) }
    fn set(&self, _: &str, _: &str) -> Result<(), StoreError> { Err(StoreError::Unavailable("disabled".into())) }
    fn remove(&self, _: &str) -> Result<(), StoreError> { Err(StoreError::Unavailable("disabled".into())) }
  }

  fn game() -> GameState {
    GameState::new("ada", Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap())
  }

  #[test]
  fn round_trips_through_memory() {
    let store = Arc::new(MemoryStore::new());
    let p = Persistence::new(store);
    assert!(p.load_game_state().is_none());
    p.save_game_state(&game());
    assert_eq!(p.load_game_state(), Some(game()));
  }

  #[test]
  fn corrupt_or_partial_records_load_as_absent() {
    let store = Arc::new(MemoryStore::new());
    let p = Persistence::new(store.clone());
    store.set(GAME_STATE_KEY, "{not json").unwrap();
    assert!(p.load_game_state().is_none());
    store.set(GAME_STATE_KEY, r#"{"userProfile":{"username":"ada"}}"#).unwrap();
    assert!(p.load_game_state().is_none());
    store.set(LEADERBOARD_KEY, "42").unwrap();
    assert!(p.load_leaderboard().is_none());
    store.set(PROGRESS_KEY, "null").unwrap();
    assert!(p.load_progress().is_none());
    // Unparseable records are dropped from the store, not re-read on every start.
    assert!(store.get(GAME_STATE_KEY).unwrap().is_none());
    assert!(store.get(PROGRESS_KEY).unwrap().is_none());
  }

  #[test]
  fn newer_schema_is_ignored() {
    let store = Arc::new(MemoryStore::new());
    let p = Persistence::new(store.clone());
    let mut gs = game();
    gs.version = SCHEMA_VERSION + 1;
    store.set(GAME_STATE_KEY, &serde_json::to_string(&gs).unwrap()).unwrap();
    assert!(p.load_game_state().is_none());
  }

  #[test]
  fn broken_store_never_errors_outward() {
    let p = Persistence::new(Arc::new(BrokenStore));
    p.save_game_state(&game());
    p.save_progress(&LegacyProgress::default());
    p.save_theme(Theme::Dark);
    assert!(p.load_game_state().is_none());
    assert!(p.load_progress().is_none());
    assert_eq!(p.load_theme(), Theme::Light);
  }

  #[test]
  fn quota_exceeded_is_swallowed() {
    let store = Arc::new(MemoryStore::with_quota(16));
    let p = Persistence::new(store.clone());
    p.save_game_state(&game());
    assert!(store.get(GAME_STATE_KEY).unwrap().is_none());
  }

  #[test]
  fn theme_is_a_bare_string() {
    let store = Arc::new(MemoryStore::new());
    let p = Persistence::new(store.clone());
    p.save_theme(Theme::HighContrast);
    assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("high-contrast"));
    store.set(THEME_KEY, "neon").unwrap();
    assert_eq!(p.load_theme(), Theme::Light);
  }

  #[test]
  fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let p = Persistence::new(store.clone());
    p.save_game_state(&game());
    p.save_progress(&LegacyProgress::default());

    let again = Persistence::new(Arc::new(FileStore::new(dir.path())));
    assert_eq!(again.load_game_state(), Some(game()));
    assert_eq!(again.load_progress(), Some(LegacyProgress::default()));

    store.remove(GAME_STATE_KEY).unwrap();
    store.remove(GAME_STATE_KEY).unwrap();
    assert!(again.load_game_state().is_none());
  }

  #[test]
  fn file_store_sanitizes_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.set("../escape", "x").unwrap();
    assert_eq!(store.get("../escape").unwrap().as_deref(), Some("x"));
    assert!(dir.path().join("___escape.json").exists());
  }
}
