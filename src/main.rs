//! Echo · Ear-Training Quiz Backend
//!
//! - Axum HTTP + WebSocket API over in-memory quiz sessions
//! - Static presentation client fallback (ECHO_STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   ECHO_CONFIG_PATH : path to TOML config (scoring rules, case bank, ranks, session limits)
//!   ECHO_STATIC_DIR  : presentation client assets (default "./static")
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use echo_backend::{build_router, telemetry, AppState};

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (catalog, scoring rules, session store).
  let state = Arc::new(AppState::new()?);
  let _sweeper = state.spawn_idle_sweeper();

  let static_dir = std::env::var("ECHO_STATIC_DIR")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("./static"));

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone(), &static_dir);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "echo_backend", %addr, static_dir = %static_dir.display(), cases = state.catalog.cases().len(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "echo_backend", "Server stopped; all sessions discarded");
  Ok(())
}

async fn shutdown_signal() {
  wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolves once `signal` fires. If the listener cannot be installed the
/// server keeps running until killed rather than shutting down at boot.
async fn wait_for_shutdown<F>(signal: F)
where
  F: Future<Output = std::io::Result<()>>,
{
  match signal.await {
    Ok(()) => info!(target: "echo_backend", "Shutdown signal received"),
    Err(e) => {
      error!(target: "echo_backend", error = %e, "Failed to listen for Ctrl-C; graceful shutdown disabled");
      std::future::pending::<()>().await
    }
  }
}
