//! Deterministic strict-rubric fallback scorer.
//!
//! This is the grading path used whenever the LLM is unavailable or fails.
//! It must produce the exact same `ScoreReport` shape as the LLM path, and
//! its arithmetic is preserved bit-for-bit from the original assessor,
//! including the divisor-5 overall-score formula and the fixed `[0, 30)`
//! evidence spans. Scores 1-4 are reachable; 5 never is.

use tracing::{info, instrument};

use crate::domain::{
  Criteria, CriterionResult, Improvement, NarrativeStructure, ScoreReport, TextSpan, Timings,
  FALLBACK_MODEL_VERSION, WEIGHT_IDEAS, WEIGHT_LANGUAGE, WEIGHT_SPAG, WEIGHT_STRUCTURE,
};
use crate::util::{new_feedback_id, paragraph_count, sentences, word_count};

/// Words that suggest the student pasted the task instructions instead of
/// writing a story. Four or more matches force all scores to 1.
const PROMPT_WORDS: [&str; 7] = ["describe", "write", "story", "about", "what", "happens", "adventure"];

/// Ordered threshold ladder with unconditional overwrite: the last matching
/// rule wins. Do not replace with a max-of-matches reducer; rule order is
/// part of the contract.
fn apply_ladder(rules: &[(bool, u8)]) -> u8 {
  let mut score = 1u8;
  for (matched, value) in rules {
    if *matched {
      score = *value;
    }
  }
  score
}

/// True if the text contains a run of 7 or more ASCII letters.
fn has_long_word(text: &str) -> bool {
  let mut run = 0usize;
  for ch in text.chars() {
    if ch.is_ascii_alphabetic() {
      run += 1;
      if run >= 7 {
        return true;
      }
    } else {
      run = 0;
    }
  }
  false
}

fn first_chars(text: &str, n: usize) -> String {
  text.chars().take(n).collect()
}

/// Score an essay 1-5 per rubric criterion using word/sentence/paragraph
/// counts and keyword matching. Total: succeeds on any input, including
/// the empty string.
#[instrument(level = "info", skip(essay_text), fields(essay_len = essay_text.len(), %text_type))]
pub fn strict_fallback_report(essay_text: &str, text_type: &str) -> ScoreReport {
  let text = essay_text.trim();
  let lower = text.to_lowercase();
  let words = word_count(text);
  let sents = sentences(text).len();
  let paras = paragraph_count(text);

  let mut ideas = apply_ladder(&[
    (words >= 50 && sents >= 3, 2),
    (words >= 100 && text.contains('"'), 3),
    (words >= 200 && paras >= 2, 4),
  ]);
  let mut structure = apply_ladder(&[
    (paras >= 2, 2),
    (paras >= 3 && sents >= 5, 3),
    (paras >= 3 && lower.contains("then"), 4),
  ]);
  let mut language = apply_ladder(&[
    (words >= 75, 2),
    (words >= 150 && has_long_word(text), 3),
  ]);
  let starts_upper = text.chars().next().map_or(false, |c| c.is_ascii_uppercase());
  let has_terminal = text.contains(['.', '!', '?']);
  let mut spag = apply_ladder(&[
    (starts_upper && has_terminal, 2),
    (starts_upper && has_terminal && text.contains(','), 3),
  ]);

  // Copied-prompt override: enough instruction words, or hardly any text,
  // flattens everything back to 1.
  let prompt_hits = PROMPT_WORDS.iter().filter(|w| lower.contains(*w)).count();
  if prompt_hits >= 4 || words < 30 {
    ideas = 1;
    structure = 1;
    language = 1;
    spag = 1;
  }

  // Divisor 5 preserved from the source; this is not a percentage of the
  // weighted maximum.
  let weighted = u32::from(ideas) * WEIGHT_IDEAS
    + u32::from(structure) * WEIGHT_STRUCTURE
    + u32::from(language) * WEIGHT_LANGUAGE
    + u32::from(spag) * WEIGHT_SPAG;
  let overall_score = (f64::from(weighted) / 5.0).round() as u32;

  let safe_end = text.chars().count().min(30);
  let excerpt = {
    let head = first_chars(text, 30);
    if head.is_empty() { "text".to_string() } else { head }
  };
  let strength_span = |label: &str| TextSpan { text: label.to_string(), start: 0, end: safe_end };
  let evidence = || TextSpan { text: excerpt.clone(), start: 0, end: safe_end };

  let criterion = |score: u8,
                   weight: u32,
                   strength: &str,
                   issue_low: &str,
                   issue_mid: &str,
                   tip_low: &str,
                   tip_mid: &str| CriterionResult {
    score,
    weight,
    strengths: if score >= 3 { vec![strength_span(strength)] } else { vec![] },
    improvements: vec![Improvement {
      issue: if score == 1 { issue_low.to_string() } else { issue_mid.to_string() },
      evidence: evidence(),
      suggestion: if score == 1 { tip_low.to_string() } else { tip_mid.to_string() },
    }],
  };

  let criteria = Criteria {
    ideas_content: criterion(
      ideas,
      WEIGHT_IDEAS,
      "Shows some creative thinking",
      "Needs original creative ideas",
      "Needs more detailed development",
      "Write your own creative story instead of copying prompts",
      "Add more specific details and examples",
    ),
    structure_organization: criterion(
      structure,
      WEIGHT_STRUCTURE,
      "Shows some organization",
      "Needs clear structure",
      "Could improve organization",
      "Organize into clear beginning, middle, and end",
      "Use clear paragraphs and transitions",
    ),
    language_vocab: criterion(
      language,
      WEIGHT_LANGUAGE,
      "Uses appropriate vocabulary",
      "Needs more varied vocabulary",
      "Could use richer language",
      "Use your own words and more descriptive language",
      "Try using more interesting and varied words",
    ),
    spelling_punctuation_grammar: criterion(
      spag,
      WEIGHT_SPAG,
      "Generally correct mechanics",
      "Needs attention to basic mechanics",
      "Could improve punctuation",
      "Check spelling, capitalization, and punctuation",
      "Review sentence punctuation",
    ),
  };

  let narrative_structure = if text_type == "narrative" {
    Some(NarrativeStructure {
      orientation_present: words >= 30,
      complication_present: words >= 75,
      climax_present: words >= 150,
      resolution_present: paras >= 2,
      notes: if words < 50 {
        "Story needs significant development".to_string()
      } else if words < 100 {
        "Story needs more development".to_string()
      } else {
        "Adequate narrative structure".to_string()
      },
    })
  } else {
    None
  };

  info!(
    target: "feedback",
    words, sents, paras,
    ideas, structure, language, spag, overall_score,
    "Strict fallback scored essay"
  );

  ScoreReport {
    overall_score,
    criteria,
    grammar_corrections: vec![],
    vocabulary_enhancements: vec![],
    narrative_structure,
    // Placeholder latency, not measured; the LLM path measures for real.
    timings: Timings { model_latency_ms: 1500 },
    model_version: FALLBACK_MODEL_VERSION.to_string(),
    id: new_feedback_id(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Three paragraphs, 200+ words, dialogue, "then", a comma, a 7+ letter
  /// word, uppercase start, terminal punctuation. Hits the top of every
  /// ladder without tripping the copied-prompt detector.
  fn max_rule_essay() -> String {
    let para = "She walked through the garden, and the flowers gleamed. \
                Then she heard a sound. \"Hello,\" she said quietly. \
                The wind answered back. Nobody else was there.";
    let long_para = format!("{para} {para} {para}");
    format!("{long_para}\n\n{long_para}\n\n{long_para}")
  }

  fn scores(report: &ScoreReport) -> (u8, u8, u8, u8) {
    (
      report.criteria.ideas_content.score,
      report.criteria.structure_organization.score,
      report.criteria.language_vocab.score,
      report.criteria.spelling_punctuation_grammar.score,
    )
  }

  #[test]
  fn short_text_scores_all_ones() {
    let report = strict_fallback_report("The dog ran.", "narrative");
    assert_eq!(scores(&report), (1, 1, 1, 1));
    // round((1*30 + 1*25 + 1*25 + 1*20) / 5) = 20
    assert_eq!(report.overall_score, 20);
    assert_eq!(report.model_version, "strict-fallback");
  }

  #[test]
  fn empty_input_is_handled() {
    let report = strict_fallback_report("", "narrative");
    assert_eq!(scores(&report), (1, 1, 1, 1));
    assert_eq!(report.overall_score, 20);
    let ev = &report.criteria.ideas_content.improvements[0].evidence;
    assert_eq!(ev.text, "text");
    assert_eq!((ev.start, ev.end), (0, 0));
  }

  #[test]
  fn copied_prompt_override_flattens_scores() {
    // Long enough to clear the word-count short circuit on its own.
    let base = "Describe a story about what happens on an adventure. ";
    let text = base.repeat(8);
    assert!(word_count(&text) >= 30);
    let report = strict_fallback_report(&text, "narrative");
    assert_eq!(scores(&report), (1, 1, 1, 1));
  }

  #[test]
  fn ladders_top_out_at_4_4_3_3() {
    let report = strict_fallback_report(&max_rule_essay(), "narrative");
    assert_eq!(scores(&report), (4, 4, 3, 3));
    // Preserved divisor-5 formula: round((4*30 + 4*25 + 3*25 + 3*20) / 5).
    assert_eq!(report.overall_score, 71);
  }

  #[test]
  fn five_is_never_assigned() {
    for text in [
      "",
      "The dog ran.",
      &max_rule_essay(),
    ] {
      let report = strict_fallback_report(text, "narrative");
      let (a, b, c, d) = scores(&report);
      assert!(a <= 4 && b <= 4 && c <= 4 && d <= 4);
    }
  }

  #[test]
  fn scoring_is_idempotent() {
    let text = max_rule_essay();
    let a = strict_fallback_report(&text, "narrative");
    let b = strict_fallback_report(&text, "narrative");
    assert_eq!(a.criteria, b.criteria);
    assert_eq!(a.overall_score, b.overall_score);
    // Only the id is non-deterministic on this path.
    assert_ne!(a.id, b.id);
  }

  #[test]
  fn narrative_structure_tracks_word_bands() {
    let report = strict_fallback_report(&max_rule_essay(), "narrative");
    let ns = report.narrative_structure.expect("narrative structure");
    assert!(ns.orientation_present && ns.complication_present && ns.climax_present);
    assert!(ns.resolution_present);
    assert_eq!(ns.notes, "Adequate narrative structure");

    let persuasive = strict_fallback_report(&max_rule_essay(), "persuasive");
    assert!(persuasive.narrative_structure.is_none());
  }

  #[test]
  fn evidence_spans_cover_the_first_thirty_chars() {
    let report = strict_fallback_report(&max_rule_essay(), "narrative");
    for c in [
      &report.criteria.ideas_content,
      &report.criteria.structure_organization,
      &report.criteria.language_vocab,
      &report.criteria.spelling_punctuation_grammar,
    ] {
      let ev = &c.improvements[0].evidence;
      assert_eq!((ev.start, ev.end), (0, 30));
      assert_eq!(ev.text.chars().count(), 30);
    }
  }
}
