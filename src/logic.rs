//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Applying an intent to a session and rendering the resulting view
//!   - Summarising the catalog for the selection screen

use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::protocol::{catalog_out, session_view, CatalogOut, ServerWsMessage, SessionView};
use crate::session::{Intent, Session};
use crate::state::AppState;

pub fn view(state: &AppState, session: &Session) -> SessionView {
  session_view(session, &state.catalog)
}

/// Apply an intent to a connection-owned session.
#[instrument(level = "info", skip(state, session, intent), fields(session = %session.id()))]
pub fn apply_intent(state: &AppState, session: &mut Session, intent: Intent) -> Result<SessionView> {
  debug!(target: "session", id = %session.id(), ?intent, "Dispatching intent");
  session.dispatch(intent, &state.catalog, &state.rules)?;
  Ok(view(state, session))
}

/// Apply an intent to a stored (HTTP) session.
#[instrument(level = "info", skip(state, intent), fields(%session_id))]
pub async fn apply_stored_intent(state: &AppState, session_id: &str, intent: Intent) -> Result<SessionView> {
  debug!(target: "session", id = %session_id, ?intent, "Dispatching intent");
  let session = state.dispatch(session_id, intent).await?;
  Ok(view(state, &session))
}

/// Same as `apply_intent`, folded into the single reply a socket sends back.
pub fn reply_to_intent(state: &AppState, session: &mut Session, intent: Intent) -> ServerWsMessage {
  match apply_intent(state, session, intent) {
    Ok(view) => {
      if let Some(notice) = &view.notice {
        info!(target: "session", id = %view.session_id, %notice, "Intent fell back");
      }
      ServerWsMessage::Session { session: view }
    }
    Err(e) => {
      warn!(target: "session", id = %session.id(), error = %e, "Intent rejected");
      ServerWsMessage::Error { message: e.to_string() }
    }
  }
}

pub fn catalog_summary(state: &AppState) -> CatalogOut {
  catalog_out(&state.catalog)
}
