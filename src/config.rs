//! Loading tutor configuration (server, storage, session timing) from TOML.
//!
//! Every field has a default, so an absent or partial file is fine.
//! See `TutorConfig` for the expected schema.

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct TutorConfig {
  #[serde(default)]
  pub server: ServerCfg,
  #[serde(default)]
  pub storage: StorageCfg,
  #[serde(default)]
  pub session: SessionCfg,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerCfg {
  /// Loopback by default: the bridge serves exactly one local learner.
  pub bind: IpAddr,
  pub port: u16,
  pub static_dir: String,
}

impl Default for ServerCfg {
  fn default() -> Self {
    Self { bind: IpAddr::V4(Ipv4Addr::LOCALHOST), port: 3000, static_dir: "./static".into() }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
  #[default]
  File,
  Memory,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageCfg {
  pub backend: StorageBackend,
  pub dir: String,
}

impl Default for StorageCfg {
  fn default() -> Self {
    Self { backend: StorageBackend::File, dir: "./.tables-tutor".into() }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionCfg {
  /// Delay between "code is valid" and "completion is recorded".
  pub grace_period_ms: u64,
}

impl Default for SessionCfg {
  fn default() -> Self {
    Self { grace_period_ms: 1000 }
  }
}

pub fn parse_config(s: &str) -> Result<TutorConfig, toml::de::Error> {
  toml::from_str::<TutorConfig>(s)
}

/// Attempt to load `TutorConfig` from TUTOR_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_tutor_config_from_env() -> Option<TutorConfig> {
  let path = std::env::var("TUTOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "tables_tutor", %path, "Loaded tutor config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "tables_tutor", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "tables_tutor", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Config file (or defaults) with PORT / STORAGE_DIR env overrides applied.
pub fn resolve_config() -> TutorConfig {
  let mut cfg = load_tutor_config_from_env().unwrap_or_default();
  if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
    cfg.server.port = port;
  }
  if let Ok(dir) = std::env::var("STORAGE_DIR") {
    if !dir.trim().is_empty() {
      cfg.storage.dir = dir;
    }
  }
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    assert_eq!(parse_config("").unwrap(), TutorConfig::default());
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg = parse_config("[session]\ngrace_period_ms = 250\n[storage]\nbackend = \"memory\"\n").unwrap();
    assert_eq!(cfg.session.grace_period_ms, 250);
    assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    assert_eq!(cfg.storage.dir, "./.tables-tutor");
    assert_eq!(cfg.server.port, 3000);
    assert!(cfg.server.bind.is_loopback());
  }

  #[test]
  fn bad_values_are_rejected() {
    assert!(parse_config("[server]\nport = \"many\"").is_err());
  }
}
