//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, Path, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::{QuizError, Result};
use crate::logic::*;
use crate::protocol::*;
use crate::session::Intent;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_catalog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(catalog_summary(&state))
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let session = state.open_session().await;
  (StatusCode::CREATED, Json(view(&state, &session)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionView>> {
  let session = state.get_session(&id).await?;
  Ok(Json(view(&state, &session)))
}

#[instrument(level = "info", skip(state, payload), fields(%id))]
pub async fn http_post_intent(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  payload: std::result::Result<Json<Intent>, JsonRejection>,
) -> Result<Json<SessionView>> {
  let Json(intent) = payload.map_err(|rejection| QuizError::MalformedIntent(rejection.body_text()))?;
  let view = apply_stored_intent(&state, &id, intent).await?;
  info!(target: "session", %id, screen = ?view.screen, xp = view.header.xp, "HTTP intent applied");
  Ok(Json(view))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode> {
  state.close_session(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}
