//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//!
//! The feedback handler reads the raw body instead of using the Json
//! extractor: the gateway contract distinguishes "invalid JSON" from
//! "missing essay text" with specific 400 bodies, and grading failures must
//! never surface as HTTP errors.

use std::sync::Arc;

use axum::{
  body::Body,
  extract::State,
  http::{header::CONTENT_TYPE, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument};

use crate::logic::grade_essay;
use crate::protocol::*;
use crate::scoring::strict_fallback_report;
use crate::state::AppState;

const DEFAULT_TEXT_TYPE: &str = "narrative";

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// The grading gateway only answers POST; everything else gets an explicit
/// JSON 405 body rather than the bare default.
pub async fn http_method_not_allowed() -> impl IntoResponse {
  (
    StatusCode::METHOD_NOT_ALLOWED,
    Json(ErrorOut { error: "Method Not Allowed".into() }),
  )
}

#[instrument(level = "info", skip(state, body), fields(body_len = body.len()))]
pub async fn http_post_feedback(State(state): State<Arc<AppState>>, body: String) -> Response {
  match feedback_inner(&state, &body).await {
    Ok(resp) => resp,
    Err(e) => {
      error!(target: "feedback", error = %e, "Unexpected error in feedback handler");
      // Best effort: re-derive the essay from the raw request and still
      // hand back a fallback report rather than an error.
      if let Ok(v) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(essay) = v.get("essayText").and_then(|s| s.as_str()) {
          if !essay.trim().is_empty() {
            let text_type = v
              .get("textType")
              .and_then(|t| t.as_str())
              .unwrap_or(DEFAULT_TEXT_TYPE);
            let report = strict_fallback_report(essay, text_type);
            return (StatusCode::OK, Json(report)).into_response();
          }
        }
      }
      let out = ServerErrorOut {
        error: "Internal server error".into(),
        message: e,
        timestamp: chrono::Utc::now().to_rfc3339(),
      };
      (StatusCode::INTERNAL_SERVER_ERROR, Json(out)).into_response()
    }
  }
}

async fn feedback_inner(state: &AppState, body: &str) -> Result<Response, String> {
  let parsed = match serde_json::from_str::<serde_json::Value>(body) {
    Ok(v) => v,
    Err(e) => {
      info!(target: "feedback", error = %e, "Rejecting request: invalid JSON body");
      let out = ErrorOut { error: "Invalid JSON in request body".into() };
      return Ok((StatusCode::BAD_REQUEST, Json(out)).into_response());
    }
  };

  let essay_text = parsed.get("essayText").and_then(|v| v.as_str()).unwrap_or("");
  if essay_text.trim().is_empty() {
    info!(target: "feedback", "Rejecting request: missing or empty essay text");
    let out = ErrorOut { error: "Essay text is required".into() };
    return Ok((StatusCode::BAD_REQUEST, Json(out)).into_response());
  }
  let text_type = parsed
    .get("textType")
    .and_then(|v| v.as_str())
    .unwrap_or(DEFAULT_TEXT_TYPE);

  info!(target: "feedback", essay_len = essay_text.len(), %text_type, "Grading request accepted");
  let report = grade_essay(state, essay_text, text_type).await;

  // CORS headers are part of the gateway's success contract specifically.
  let json = serde_json::to_string(&report).map_err(|e| e.to_string())?;
  Response::builder()
    .status(StatusCode::OK)
    .header(CONTENT_TYPE, "application/json")
    .header("access-control-allow-origin", "*")
    .header("access-control-allow-headers", "Content-Type")
    .header("access-control-allow-methods", "POST, OPTIONS")
    .body(Body::from(json))
    .map_err(|e| e.to_string())
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_coach_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionStartIn>,
) -> impl IntoResponse {
  let text_type = body.text_type.unwrap_or_else(|| DEFAULT_TEXT_TYPE.into());
  let (session_id, greeting) = state.sessions.start(&text_type).await;
  Json(SessionStartOut { session_id, greeting })
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, content_len = body.content.len()))]
pub async fn http_post_coach_sample(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SampleIn>,
) -> Response {
  match state
    .sessions
    .sample(&body.session_id, &body.content, body.elapsed_seconds)
    .await
  {
    Ok(reply) => {
      let out = SampleOut { quiet: reply.is_none(), reply };
      Json(out).into_response()
    }
    Err(e) => (StatusCode::NOT_FOUND, Json(ErrorOut { error: e })).into_response(),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::body::to_bytes;
  use axum::http::{Request, StatusCode};
  use serde_json::{json, Value};
  use tower::ServiceExt;

  use crate::routes::build_router;
  use crate::state::AppState;

  fn test_router() -> axum::Router {
    // No OPENAI_API_KEY in the test environment, so every grading request
    // exercises the strict fallback path.
    std::env::remove_var("OPENAI_API_KEY");
    build_router(Arc::new(AppState::new()))
  }

  async fn post_json(router: axum::Router, path: &str, body: &str) -> (StatusCode, Value) {
    let res = router
      .oneshot(
        Request::post(path)
          .header("content-type", "application/json")
          .body(axum::body::Body::from(body.to_string()))
          .unwrap(),
      )
      .await
      .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  #[tokio::test]
  async fn health_reports_ok() {
    let res = test_router()
      .oneshot(Request::get("/api/v1/health").body(axum::body::Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn missing_key_is_transparent_to_the_caller() {
    let body = json!({ "essayText": "The dog ran.", "textType": "narrative" }).to_string();
    let res = test_router()
      .oneshot(
        Request::post("/api/v1/feedback")
          .header("content-type", "application/json")
          .body(axum::body::Body::from(body))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
      res.headers().get("access-control-allow-origin").map(|v| v.to_str().unwrap()),
      Some("*")
    );
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let report: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(report["modelVersion"], "strict-fallback");
    assert_eq!(report["criteria"]["ideasContent"]["score"], 1);
    assert_eq!(report["overallScore"], 20);
    // All four criteria are always present, with their fixed weights.
    for (key, weight) in [
      ("ideasContent", 30),
      ("structureOrganization", 25),
      ("languageVocab", 25),
      ("spellingPunctuationGrammar", 20),
    ] {
      assert_eq!(report["criteria"][key]["weight"], weight, "weight for {key}");
    }
    assert!(report["id"].as_str().unwrap().starts_with("feedback-"));
    assert_eq!(report["narrativeStructure"]["orientationPresent"], false);
  }

  #[tokio::test]
  async fn invalid_json_is_a_400() {
    let (status, body) = post_json(test_router(), "/api/v1/feedback", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON in request body");
  }

  #[tokio::test]
  async fn blank_essay_is_a_400() {
    for payload in [json!({}), json!({ "essayText": "   " })] {
      let (status, body) = post_json(test_router(), "/api/v1/feedback", &payload.to_string()).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert_eq!(body["error"], "Essay text is required");
    }
  }

  #[tokio::test]
  async fn non_post_is_a_405_with_a_json_body() {
    let res = test_router()
      .oneshot(Request::get("/api/v1/feedback").body(axum::body::Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Method Not Allowed");
  }

  #[tokio::test]
  async fn coach_session_flow_round_trips() {
    let router = test_router();
    let (status, started) = post_json(
      router.clone(),
      "/api/v1/coach/session",
      &json!({ "textType": "narrative" }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session_id = started["sessionId"].as_str().unwrap().to_string();
    assert!(started["greeting"].as_str().unwrap().contains("narrative"));

    let sample = json!({
      "sessionId": session_id,
      "content": "The mysterious door creaked open and she stepped inside slowly.",
      "elapsedSeconds": 120,
    });
    let (status, out) = post_json(router.clone(), "/api/v1/coach/sample", &sample.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["quiet"], false);
    assert_eq!(out["reply"]["phase"]["phase"], "opening");
    assert_eq!(out["reply"]["contextual"]["kind"], "praise");

    // Unknown sessions are a 404, not a silent new session.
    let bad = json!({ "sessionId": "nope", "content": "words", "elapsedSeconds": 0 });
    let (status, _) = post_json(router, "/api/v1/coach/sample", &bad.to_string()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
