//! Core grading behavior shared by the HTTP and WebSocket handlers.
//!
//! The flow is: try the LLM, normalize whatever JSON it returned into the
//! canonical `ScoreReport`, and on any failure at all fall back to the
//! deterministic strict scorer. Callers always get a report; the two paths
//! are only distinguishable via `modelVersion`.

use serde_json::Value;
use tracing::{error, info, instrument};

use crate::domain::{
  Criteria, CriterionResult, Improvement, NarrativeStructure, ScoreReport, TextSpan, Timings,
  WEIGHT_IDEAS, WEIGHT_LANGUAGE, WEIGHT_SPAG, WEIGHT_STRUCTURE,
};
use crate::scoring::strict_fallback_report;
use crate::state::AppState;
use crate::util::new_feedback_id;

/// Grade an essay, preferring the LLM and absorbing every grading-path
/// failure into the strict fallback.
#[instrument(level = "info", skip(state, essay_text), fields(essay_len = essay_text.len(), %text_type))]
pub async fn grade_essay(state: &AppState, essay_text: &str, text_type: &str) -> ScoreReport {
  if let Some(oa) = &state.openai {
    match oa.grade_essay(&state.prompts, essay_text, text_type).await {
      Ok(raw) => {
        let report = normalize_llm_report(raw.parsed, &raw.model, raw.latency_ms);
        info!(
          target: "feedback",
          overall = report.overall_score,
          ideas = report.criteria.ideas_content.score,
          structure = report.criteria.structure_organization.score,
          language = report.criteria.language_vocab.score,
          spag = report.criteria.spelling_punctuation_grammar.score,
          model = %report.model_version,
          "LLM graded essay"
        );
        return report;
      }
      Err(e) => {
        error!(target: "feedback", error = %e, "OpenAI grading failed; using strict fallback");
      }
    }
  } else {
    info!(target: "feedback", "OPENAI_API_KEY not set; using strict fallback");
  }
  strict_fallback_report(essay_text, text_type)
}

/// Re-merge a (possibly partially malformed) LLM reply with safe defaults so
/// the result is always a structurally valid `ScoreReport`. Missing or zero
/// scores become 1, missing lists become empty, a missing overall becomes 20.
pub fn normalize_llm_report(parsed: Value, model: &str, latency_ms: u64) -> ScoreReport {
  let criterion = |key: &str, weight: u32| -> CriterionResult {
    let node = &parsed["criteria"][key];
    let score = match node["score"].as_u64() {
      Some(s) if s >= 1 => s.min(5) as u8,
      _ => 1,
    };
    let strengths = serde_json::from_value::<Vec<TextSpan>>(node["strengths"].clone()).unwrap_or_default();
    let improvements =
      serde_json::from_value::<Vec<Improvement>>(node["improvements"].clone()).unwrap_or_default();
    CriterionResult { score, weight, strengths, improvements }
  };

  let overall_score = match parsed["overallScore"].as_f64() {
    Some(v) if v > 0.0 => v.round() as u32,
    _ => 20,
  };

  let list = |key: &str| -> Vec<Value> {
    parsed[key].as_array().cloned().unwrap_or_default()
  };

  let narrative_structure =
    serde_json::from_value::<Option<NarrativeStructure>>(parsed["narrativeStructure"].clone())
      .unwrap_or_default();

  let id = match parsed["id"].as_str() {
    Some(s) if !s.trim().is_empty() => s.to_string(),
    _ => new_feedback_id(),
  };

  ScoreReport {
    overall_score,
    criteria: Criteria {
      ideas_content: criterion("ideasContent", WEIGHT_IDEAS),
      structure_organization: criterion("structureOrganization", WEIGHT_STRUCTURE),
      language_vocab: criterion("languageVocab", WEIGHT_LANGUAGE),
      spelling_punctuation_grammar: criterion("spellingPunctuationGrammar", WEIGHT_SPAG),
    },
    grammar_corrections: list("grammarCorrections"),
    vocabulary_enhancements: list("vocabularyEnhancements"),
    narrative_structure,
    timings: Timings { model_latency_ms: latency_ms },
    model_version: model.to_string(),
    id,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn empty_reply_normalizes_to_floor_defaults() {
    let report = normalize_llm_report(json!({}), "gpt-4o-mini", 840);
    assert_eq!(report.overall_score, 20);
    assert_eq!(report.criteria.ideas_content.score, 1);
    assert_eq!(report.criteria.ideas_content.weight, 30);
    assert_eq!(report.criteria.spelling_punctuation_grammar.weight, 20);
    assert!(report.criteria.ideas_content.strengths.is_empty());
    assert!(report.grammar_corrections.is_empty());
    assert!(report.narrative_structure.is_none());
    assert_eq!(report.timings.model_latency_ms, 840);
    assert_eq!(report.model_version, "gpt-4o-mini");
    assert!(report.id.starts_with("feedback-"));
  }

  #[test]
  fn partial_reply_keeps_what_parses() {
    let parsed = json!({
      "overallScore": 46,
      "criteria": {
        "ideasContent": {
          "score": 3,
          "weight": 30,
          "strengths": [{"text": "Clear premise", "start": 0, "end": 20}],
          "improvements": "not-a-list"
        },
        "languageVocab": { "score": 9 }
      },
      "narrativeStructure": {
        "orientationPresent": true,
        "complicationPresent": false,
        "climaxPresent": false,
        "resolutionPresent": false,
        "notes": "Opening only"
      },
      "id": "feedback-123-abc"
    });
    let report = normalize_llm_report(parsed, "gpt-4o-mini", 512);
    assert_eq!(report.overall_score, 46);
    assert_eq!(report.criteria.ideas_content.score, 3);
    assert_eq!(report.criteria.ideas_content.strengths.len(), 1);
    assert!(report.criteria.ideas_content.improvements.is_empty());
    // Out-of-range scores are clamped, absent ones floored.
    assert_eq!(report.criteria.language_vocab.score, 5);
    assert_eq!(report.criteria.structure_organization.score, 1);
    let ns = report.narrative_structure.expect("narrative structure");
    assert!(ns.orientation_present);
    assert_eq!(report.id, "feedback-123-abc");
  }

  #[test]
  fn zero_scores_are_treated_as_missing() {
    let parsed = json!({
      "overallScore": 0,
      "criteria": { "ideasContent": { "score": 0 } }
    });
    let report = normalize_llm_report(parsed, "gpt-4o-mini", 100);
    assert_eq!(report.overall_score, 20);
    assert_eq!(report.criteria.ideas_content.score, 1);
  }
}
