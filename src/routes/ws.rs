//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic::grade_essay;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "essaycoach_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "essaycoach_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        debug!(target = "essaycoach_backend", "WS text: {}", trunc_for_log(&txt, 200));
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => handle_client_ws(incoming, &state).await,
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "essaycoach_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "essaycoach_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartSession { text_type } => {
      let text_type = text_type.unwrap_or_else(|| "narrative".into());
      let (session_id, greeting) = state.sessions.start(&text_type).await;
      ServerWsMessage::SessionStarted { session_id, greeting }
    }

    ClientWsMessage::Sample { session_id, content, elapsed_seconds } => {
      match state.sessions.sample(&session_id, &content, elapsed_seconds).await {
        Ok(Some(reply)) => ServerWsMessage::Coach { reply },
        Ok(None) => ServerWsMessage::Quiet,
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Grade { essay_text, text_type } => {
      if essay_text.trim().is_empty() {
        return ServerWsMessage::Error { message: "Essay text is required".into() };
      }
      let text_type = text_type.unwrap_or_else(|| "narrative".into());
      let report = grade_essay(state, &essay_text, &text_type).await;
      tracing::info!(target: "feedback", overall = report.overall_score, model = %report.model_version, "WS grade served");
      ServerWsMessage::Report { report }
    }
  }
}
