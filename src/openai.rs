//! Minimal OpenAI client for essay grading.
//!
//! We only call chat.completions, always requesting a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes
//! (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to
//! avoid leaking student writing into logs.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Prompts;
use crate::domain::DEFAULT_GRADING_MODEL;
use crate::util::{fill_template, word_count};

/// Grading calls favor determinism.
const GRADING_TEMPERATURE: f32 = 0.1;
const GRADING_MAX_TOKENS: u32 = 2000;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub grading_model: String,
}

/// Raw grading result: the parsed JSON body, the model the API reports, and
/// measured wall-clock latency from dispatch to response parse.
pub struct RawGrading {
  pub parsed: serde_json::Value,
  pub model: String,
  pub latency_ms: u64,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let grading_model =
      std::env::var("OPENAI_GRADING_MODEL").unwrap_or_else(|_| DEFAULT_GRADING_MODEL.into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, grading_model })
  }

  /// JSON-object chat completion. Returns the raw content string plus the
  /// model name echoed by the API.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json_raw(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
    max_tokens: u32,
  ) -> Result<(String, String), String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: Some(max_tokens),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "essaycoach-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let model_name = if body.model.is_empty() { model.to_string() } else { body.model.clone() };
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    Ok((text, model_name))
  }

  /// Grade an essay against the strict rubric prompt. Any failure here
  /// (transport, HTTP error, non-JSON content) routes the caller to the
  /// deterministic fallback.
  #[instrument(
    level = "info",
    skip(self, prompts, essay_text),
    fields(essay_len = essay_text.len(), %text_type, model = %self.grading_model)
  )]
  pub async fn grade_essay(
    &self,
    prompts: &Prompts,
    essay_text: &str,
    text_type: &str,
  ) -> Result<RawGrading, String> {
    let words = word_count(essay_text).to_string();
    let user = fill_template(
      &prompts.grading_user_template,
      &[("text_type", text_type), ("essay", essay_text), ("word_count", &words)],
    );

    let start = Instant::now();
    let (content, model) = self
      .chat_json_raw(
        &self.grading_model,
        &prompts.grading_system,
        &user,
        GRADING_TEMPERATURE,
        GRADING_MAX_TOKENS,
      )
      .await?;
    let parsed = serde_json::from_str::<serde_json::Value>(&content)
      .map_err(|e| format!("JSON parse error: {}", e))?;
    let latency_ms = start.elapsed().as_millis() as u64;

    info!(latency_ms, content_len = content.len(), %model, "Grading response received");
    Ok(RawGrading { parsed, model, latency_ms })
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] model: String,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
