//! Tables Tutor · local backend for the interactive HTML-tables tutorial
//!
//! - Axum HTTP + WebSocket bridge between the browser editor and the tutor core
//! - Structural validation of table markup, scoring, levels, achievements, rewards
//! - Daily challenges, a local leaderboard and key-value persistence
//! - Static SPA fallback (<static_dir>/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   STORAGE_DIR       : directory for the file-backed store (default ./.tables-tutor)
//!   TUTOR_CONFIG_PATH : path to TOML config (server, storage, session)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod validator;
mod seeds;
mod gamification;
mod storage;
mod state;
mod grace;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared session state (config, persistence, loaded learner profile).
  let state = Arc::new(AppState::new());

  let addr = SocketAddr::new(state.config.server.bind, state.config.server.port);
  let grace_ms = state.config.session.grace_period_ms;
  let static_dir = state.config.server.static_dir.clone();

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "tables_tutor", %addr, grace_ms, %static_dir, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
