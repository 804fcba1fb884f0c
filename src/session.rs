//! Coach sessions: per-writer tracking of the previously sampled draft so
//! the gate can suppress noisy feedback. Session state lives on an explicit
//! manager instance owned by `AppState`, never in module-level statics, so
//! concurrent writers cannot leak into each other.
//!
//! The 10-second sampling cadence belongs to the caller (the browser timer);
//! this module only decides whether a given sample deserves a message.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::analyzer::analyze_increment;
use crate::coach::{compose_coach_reply, time_guidance, writing_phase, CoachReply, Urgency};
use crate::util::word_count;

/// A sample only produces a message when at least this many words were added
/// since the last accepted sample.
const MIN_WORD_DELTA: i64 = 5;

/// Feedback history kept per session.
const HISTORY_LIMIT: usize = 10;

#[derive(Clone, Debug)]
pub struct FeedbackEntry {
  pub at: DateTime<Utc>,
  pub kind: &'static str,
  pub word_count: usize,
}

pub struct CoachSession {
  pub id: String,
  pub text_type: String,
  previous_content: String,
  previous_word_count: usize,
  history: Vec<FeedbackEntry>,
}

impl CoachSession {
  fn new(text_type: String) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      text_type,
      previous_content: String::new(),
      previous_word_count: 0,
      history: Vec::new(),
    }
  }

  /// Greeting shown when the session starts.
  pub fn greeting(&self) -> String {
    format!(
      "Hi! I'm your writing coach, and I'm excited to help you with your {} writing today! \
       I'll be watching your progress and giving you helpful tips as you write. \
       You're aiming for 200-300 words in about 40 minutes. Ready to start? \
       Just begin writing, and I'll guide you along the way!",
      self.text_type
    )
  }

  /// Sample the current draft. Returns a message only when:
  /// content is non-empty, content changed since the last sample, and at
  /// least `MIN_WORD_DELTA` words were added. Empty content resets tracking.
  pub fn sample(&mut self, content: &str, elapsed_seconds: u64) -> Option<CoachReply> {
    if content.trim().is_empty() {
      self.previous_content.clear();
      self.previous_word_count = 0;
      return None;
    }
    if content == self.previous_content {
      return None;
    }

    let words = word_count(content);
    if (words as i64) - (self.previous_word_count as i64) < MIN_WORD_DELTA {
      return None;
    }

    // The increment is whatever was appended past the previous snapshot.
    let new_content = content.get(self.previous_content.len()..).unwrap_or("");

    let phase = writing_phase(words);
    let time = time_guidance(elapsed_seconds, words);
    let contextual = analyze_increment(new_content, content, &self.text_type);
    let reply = compose_coach_reply(content, phase, time, contextual.as_ref());

    let kind = if reply.time_guidance.urgency == Urgency::High {
      "warning"
    } else if contextual.as_ref().map_or(false, |fb| !fb.praise.is_empty()) {
      "celebration"
    } else {
      "guidance"
    };
    self.history.push(FeedbackEntry { at: Utc::now(), kind, word_count: words });
    if self.history.len() > HISTORY_LIMIT {
      let overflow = self.history.len() - HISTORY_LIMIT;
      self.history.drain(..overflow);
    }

    self.previous_content = content.to_string();
    self.previous_word_count = words;
    Some(reply)
  }

  #[allow(dead_code)]
  pub fn history(&self) -> &[FeedbackEntry] {
    &self.history
  }
}

/// Owns all live coach sessions. One instance per `AppState`.
#[derive(Default)]
pub struct SessionManager {
  sessions: RwLock<HashMap<String, CoachSession>>,
}

impl SessionManager {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a session and return `(session_id, greeting)`.
  #[instrument(level = "info", skip(self))]
  pub async fn start(&self, text_type: &str) -> (String, String) {
    let session = CoachSession::new(text_type.to_string());
    let id = session.id.clone();
    let greeting = session.greeting();
    self.sessions.write().await.insert(id.clone(), session);
    info!(target: "essaycoach_backend", session_id = %id, %text_type, "Coach session started");
    (id, greeting)
  }

  /// Sample a draft within a session. `Err` only for unknown session ids;
  /// `Ok(None)` means the gate suppressed the sample.
  #[instrument(level = "debug", skip(self, content), fields(%session_id, content_len = content.len()))]
  pub async fn sample(
    &self,
    session_id: &str,
    content: &str,
    elapsed_seconds: u64,
  ) -> Result<Option<CoachReply>, String> {
    let mut sessions = self.sessions.write().await;
    let session = sessions
      .get_mut(session_id)
      .ok_or_else(|| format!("Unknown sessionId: {}", session_id))?;
    let reply = session.sample(content, elapsed_seconds);
    debug!(target: "essaycoach_backend", %session_id, emitted = reply.is_some(), "Coach sample evaluated");
    Ok(reply)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(words: usize) -> String {
    (0..words).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
  }

  #[test]
  fn empty_content_resets_and_stays_quiet() {
    let mut s = CoachSession::new("narrative".into());
    assert!(s.sample("", 0).is_none());
    assert!(s.sample("   ", 30).is_none());
  }

  #[test]
  fn small_deltas_are_gated() {
    let mut s = CoachSession::new("narrative".into());
    assert!(s.sample(&draft(20), 60).is_some());
    // Only 4 more words since the accepted sample.
    assert!(s.sample(&draft(24), 70).is_none());
    // 5 more words clears the gate.
    assert!(s.sample(&draft(25), 80).is_some());
  }

  #[test]
  fn unchanged_content_is_gated() {
    let mut s = CoachSession::new("narrative".into());
    let content = draft(40);
    assert!(s.sample(&content, 60).is_some());
    assert!(s.sample(&content, 120).is_none());
  }

  #[test]
  fn history_keeps_the_last_ten() {
    let mut s = CoachSession::new("narrative".into());
    for i in 1..=14 {
      let _ = s.sample(&draft(i * 6), i as u64 * 10);
    }
    assert_eq!(s.history().len(), 10);
  }

  #[test]
  fn greeting_mentions_the_text_type() {
    let s = CoachSession::new("persuasive".into());
    assert!(s.greeting().contains("persuasive"));
  }

  #[tokio::test]
  async fn manager_rejects_unknown_sessions() {
    let mgr = SessionManager::new();
    assert!(mgr.sample("nope", "text", 0).await.is_err());
    let (id, greeting) = mgr.start("narrative").await;
    assert!(greeting.contains("narrative"));
    let reply = mgr.sample(&id, "one two three four five six seven", 30).await.unwrap();
    assert!(reply.is_some());
  }
}
