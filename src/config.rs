//! Loading coach configuration (grading prompts) from TOML.
//!
//! The defaults reproduce the strict NSW assessor prompt verbatim; a TOML
//! file pointed to by COACH_CONFIG_PATH can override either prompt.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CoachConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used by the grading gateway. Templates accept `{text_type}`,
/// `{essay}` and `{word_count}` placeholders (see `util::fill_template`).
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub grading_system: String,
  pub grading_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      grading_system: r#"You are a STRICT NSW Selective School writing assessor for students aged 10-12.

IMPORTANT SCORING GUIDELINES:
- Score 1: Minimal effort, copied prompts, very short text (under 50 words)
- Score 2: Basic attempt but lacks development (50-100 words, simple ideas)
- Score 3: Adequate writing with some development (100-200 words, clear structure)
- Score 4: Good writing with strong development (200+ words, engaging content)
- Score 5: Excellent writing, exceptional for age group (creative, well-structured, sophisticated)

BE VERY STRICT: Most student writing should score 1-3. Only exceptional work gets 4-5.

If the text is just a copied prompt, instructions, or very short/undeveloped content, give scores of 1-2.

Return ONLY valid JSON with this exact structure:

{
  "overallScore": number (0-100),
  "criteria": {
    "ideasContent": {
      "score": number (1-5, BE STRICT),
      "weight": 30,
      "strengths": [{"text": "strength description", "start": 0, "end": 20}],
      "improvements": [{"issue": "issue description", "evidence": {"text": "evidence text", "start": 0, "end": 20}, "suggestion": "improvement suggestion"}]
    },
    "structureOrganization": { "score": number (1-5, BE STRICT), "weight": 25, "strengths": [], "improvements": [] },
    "languageVocab": { "score": number (1-5, BE STRICT), "weight": 25, "strengths": [], "improvements": [] },
    "spellingPunctuationGrammar": { "score": number (1-5, BE STRICT), "weight": 20, "strengths": [], "improvements": [] }
  },
  "grammarCorrections": [],
  "vocabularyEnhancements": [],
  "narrativeStructure": {
    "orientationPresent": boolean,
    "complicationPresent": boolean,
    "climaxPresent": boolean,
    "resolutionPresent": boolean,
    "notes": "structure notes"
  },
  "timings": {"modelLatencyMs": number},
  "modelVersion": "gpt-4o-mini",
  "id": "feedback-unique-id"
}

REMEMBER: Be extremely strict. Copied prompts = Score 1. Short undeveloped text = Score 1-2. Only well-developed creative stories get 3+."#.into(),
      grading_user_template: r#"Evaluate this {text_type} writing for NSW Selective School assessment.

IMPORTANT: Be EXTREMELY STRICT with scoring. This appears to be student work that may be:
- A copied prompt or instructions (Score 1 for all criteria)
- Very short or undeveloped content (Score 1-2)
- Basic attempt with minimal creativity (Score 2-3)

TEXT TO EVALUATE:
"""
{essay}
"""

STRICT SCORING CRITERIA:

IDEAS & CONTENT (30%):
- Score 1: No original ideas, copied text, or minimal content
- Score 2: Basic ideas but undeveloped
- Score 3: Some creative ideas with adequate development
- Score 4: Good creative ideas with strong development
- Score 5: Exceptional creativity and sophisticated ideas

STRUCTURE & ORGANIZATION (25%):
- Score 1: No clear structure, single paragraph or copied text
- Score 2: Basic structure but poor organization
- Score 3: Clear paragraphs with adequate organization
- Score 4: Well-organized with good transitions
- Score 5: Sophisticated structure with excellent flow

LANGUAGE & VOCABULARY (25%):
- Score 1: Very basic vocabulary, repetitive language
- Score 2: Simple vocabulary with some variety
- Score 3: Good vocabulary choices for age group
- Score 4: Rich vocabulary with varied sentence structure
- Score 5: Sophisticated language use, exceptional for age

SPELLING, PUNCTUATION & GRAMMAR (20%):
- Score 1: Many errors, poor mechanics
- Score 2: Some errors but readable
- Score 3: Generally correct with minor errors
- Score 4: Very few errors, good mechanics
- Score 5: Excellent mechanics, error-free

Word count: {word_count} words

BE STRICT: If this looks like copied instructions or very short content, give scores of 1-2. Only exceptional work gets 4-5.

Return only the JSON response with realistic strict scores."#.into(),
    }
  }
}

/// Attempt to load `CoachConfig` from COACH_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_coach_config_from_env() -> Option<CoachConfig> {
  let path = std::env::var("COACH_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<CoachConfig>(&s) {
      Ok(cfg) => {
        info!(target: "essaycoach_backend", %path, "Loaded coach config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "essaycoach_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "essaycoach_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
