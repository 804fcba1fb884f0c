//! Domain models shared by both grading paths: rubric criterion results,
//! the canonical score report, and the narrative-structure annotation.
//!
//! The report shape is identical whether it came from the LLM or the local
//! strict fallback; consumers can only tell the paths apart via `modelVersion`.

use serde::{Deserialize, Serialize};

/// Fixed rubric weights. They always sum to 100.
pub const WEIGHT_IDEAS: u32 = 30;
pub const WEIGHT_STRUCTURE: u32 = 25;
pub const WEIGHT_LANGUAGE: u32 = 25;
pub const WEIGHT_SPAG: u32 = 20;

/// `modelVersion` value for reports produced by the local strict scorer.
pub const FALLBACK_MODEL_VERSION: &str = "strict-fallback";

/// Default grading model when the API response does not name one.
pub const DEFAULT_GRADING_MODEL: &str = "gpt-4o-mini";

/// A highlighted span of the essay. `start`/`end` are character offsets,
/// `0 <= start <= end <= len(essay)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextSpan {
  pub text: String,
  pub start: usize,
  pub end: usize,
}

/// One suggested improvement, anchored to an evidence span.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Improvement {
  pub issue: String,
  pub evidence: TextSpan,
  pub suggestion: String,
}

/// Per-criterion result. `score` is always in `1..=5`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CriterionResult {
  pub score: u8,
  pub weight: u32,
  pub strengths: Vec<TextSpan>,
  pub improvements: Vec<Improvement>,
}

/// The four rubric dimensions. Always all present, fixed wire names.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
  pub ideas_content: CriterionResult,
  pub structure_organization: CriterionResult,
  pub language_vocab: CriterionResult,
  pub spelling_punctuation_grammar: CriterionResult,
}

/// Narrative-only structural checklist.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeStructure {
  pub orientation_present: bool,
  pub complication_present: bool,
  pub climax_present: bool,
  pub resolution_present: bool,
  pub notes: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
  pub model_latency_ms: u64,
}

/// Canonical grading output. Serialized as-is to the client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
  /// Weighted combination of the four criterion scores. The divisor-5
  /// arithmetic is preserved from the original assessor, so the value is
  /// not a literal percentage of the weighted maximum.
  pub overall_score: u32,
  pub criteria: Criteria,
  pub grammar_corrections: Vec<serde_json::Value>,
  pub vocabulary_enhancements: Vec<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub narrative_structure: Option<NarrativeStructure>,
  pub timings: Timings,
  pub model_version: String,
  pub id: String,
}
