//! WebSocket upgrade + message loop. Each connection owns one session for its
//! lifetime; every client message is parsed as JSON, applied to that session,
//! and answered with a single JSON message.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic::*;
use crate::protocol::{parse_client_message, ClientWsMessage, ControlMessage, ServerWsMessage};
use crate::session::Session;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "echo_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let mut session = state.new_session();
  info!(target: "echo_backend", session = %session.id(), "WebSocket connected");

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match parse_client_message(&txt) {
          Ok(incoming) => {
            debug!(target: "echo_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &mut session, &state)
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "echo_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(
    target: "echo_backend",
    session = %session.id(),
    xp = session.progress().experience(),
    rounds = session.progress().accuracy().total,
    "WebSocket disconnected; session discarded"
  );
}

fn handle_client_ws(msg: ClientWsMessage, session: &mut Session, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Control(ControlMessage::Ping) => ServerWsMessage::Pong,
    ClientWsMessage::Control(ControlMessage::State) => ServerWsMessage::Session { session: view(state, session) },
    ClientWsMessage::Intent(intent) => reply_to_intent(state, session, intent),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::EchoConfig;
  use crate::session::{Intent, Screen};

  fn state() -> AppState {
    AppState::from_config(EchoConfig::default()).unwrap()
  }

  fn reply(txt: &str, session: &mut Session, state: &AppState) -> ServerWsMessage {
    match parse_client_message(txt) {
      Ok(msg) => handle_client_ws(msg, session, state),
      Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
    }
  }

  #[test]
  fn ping_is_answered_with_pong() {
    let state = state();
    let mut session = state.new_session();
    let parsed = parse_client_message(r#"{"type":"ping"}"#).unwrap();
    assert!(matches!(parsed, ClientWsMessage::Control(ControlMessage::Ping)));
    assert!(matches!(handle_client_ws(parsed, &mut session, &state), ServerWsMessage::Pong));
  }

  #[test]
  fn state_request_returns_view_without_changing_session() {
    let state = state();
    let mut session = state.new_session();
    reply(r#"{"type":"select_challenge","genre":"Pop","difficulty":"Beginner"}"#, &mut session, &state);
    let before = session.clone();

    match reply(r#"{"type":"state"}"#, &mut session, &state) {
      ServerWsMessage::Session { session: view } => {
        assert_eq!(view.session_id, session.id());
        assert_eq!(view.screen, Screen::Game);
        assert_eq!(view.game.as_ref().map(|g| g.case.id.as_str()), Some("case-002"));
      }
      other => panic!("expected a session view, got {:?}", other),
    }
    assert_eq!(session.screen(), before.screen());
    assert_eq!(session.round_index(), before.round_index());
    assert_eq!(session.progress(), before.progress());
    assert_eq!(session.last_round(), before.last_round());
  }

  #[test]
  fn intents_are_parsed_as_intents() {
    assert!(matches!(
      parse_client_message(r#"{"type":"next"}"#),
      Ok(ClientWsMessage::Intent(Intent::Next))
    ));
    match parse_client_message(r#"{"type":"submit_guess","option":"Harsh Highs","elapsedSeconds":3.5}"#) {
      Ok(ClientWsMessage::Intent(Intent::SubmitGuess { option, elapsed_seconds })) => {
        assert_eq!(option, "Harsh Highs");
        assert_eq!(elapsed_seconds, Some(3.5));
      }
      other => panic!("expected a guess intent, got {:?}", other),
    }
  }

  #[test]
  fn malformed_message_reports_the_intent_parse_error() {
    let err = parse_client_message(r#"{"type":"dance"}"#).unwrap_err();
    let direct = serde_json::from_str::<Intent>(r#"{"type":"dance"}"#).unwrap_err();
    assert_eq!(err.to_string(), direct.to_string());

    assert!(parse_client_message("{not json").is_err());

    let state = state();
    let mut session = state.new_session();
    match reply("{not json", &mut session, &state) {
      ServerWsMessage::Error { message } => assert!(message.starts_with("Invalid JSON")),
      other => panic!("expected an error reply, got {:?}", other),
    }
  }

  #[test]
  fn refused_intent_becomes_error_reply_and_keeps_state() {
    let state = state();
    let mut session = state.new_session();
    reply(r#"{"type":"select_challenge","genre":"Hip-Hop","difficulty":"Beginner"}"#, &mut session, &state);

    let refused = reply(r#"{"type":"submit_guess","option":"Harsh Highs"}"#, &mut session, &state);
    match refused {
      ServerWsMessage::Error { message } => {
        assert!(message.contains("Harsh Highs"));
        assert!(message.contains("case-001"));
      }
      other => panic!("expected an error reply, got {:?}", other),
    }
    assert_eq!(session.screen(), Screen::Game);
    assert_eq!(session.progress().accuracy().total, 0);

    let json = serde_json::to_value(&reply(r#"{"type":"submit_guess","option":"Harsh Highs"}"#, &mut session, &state)).unwrap();
    assert_eq!(json["type"], "error");
  }

  #[test]
  fn accepted_intent_becomes_session_reply() {
    let state = state();
    let mut session = state.new_session();
    let out = reply(r#"{"type":"select_challenge","genre":"Hip-Hop","difficulty":"Beginner"}"#, &mut session, &state);
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["type"], "session");
    assert_eq!(json["session"]["screen"], "game");
    assert_eq!(json["session"]["game"]["case"]["id"], "case-001");
  }
}
