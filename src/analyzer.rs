//! Contextual analysis of newly-typed text. Runs a handful of independent
//! lexical checks against the increment only (never the whole document) and
//! stays quiet on trivial edits so the coach never nags over a few keystrokes.

use serde::Serialize;

use crate::util::sentences;

const DESCRIPTIVE_WORDS: [&str; 18] = [
  "mysterious", "shimmering", "ancient", "gleaming", "dusty", "ornate",
  "beautiful", "magnificent", "brilliant", "enormous", "tiny", "spectacular",
  "dazzling", "gloomy", "vibrant", "delicate", "towering", "sparkling",
];

const SIGHT_WORDS: [&str; 6] = ["saw", "looked", "appeared", "gleamed", "shone", "sparkled"];
const SOUND_WORDS: [&str; 6] = ["heard", "whispered", "shouted", "echoed", "rustled", "creaked"];
const TOUCH_WORDS: [&str; 7] = ["felt", "smooth", "rough", "cold", "warm", "soft", "hard"];
const SMELL_WORDS: [&str; 5] = ["smelled", "scent", "aroma", "fragrance", "stench"];
const TASTE_WORDS: [&str; 5] = ["tasted", "sweet", "bitter", "sour", "savory"];

/// Literal "telling" phrases that flag a show-don't-tell opportunity.
const TELLING_PHRASES: [&str; 14] = [
  "felt happy", "felt sad", "felt excited", "felt nervous", "felt scared",
  "was happy", "was sad", "was excited", "was nervous", "was scared",
  "felt angry", "was angry", "felt proud", "was proud",
];

const TRANSITION_WORDS: [&str; 10] = [
  "however", "furthermore", "meanwhile", "suddenly", "finally",
  "therefore", "moreover", "consequently", "nevertheless", "although",
];

const STRONG_VERBS: [&str; 10] = [
  "sprinted", "whispered", "exclaimed", "discovered", "transformed",
  "shattered", "gleamed", "trembled", "surged", "plunged",
];

/// Common words excluded from the repetition tally.
const REPETITION_STOPWORDS: [&str; 5] = ["that", "this", "then", "when", "with"];

/// Feedback on what the student just wrote. `observations` is carried for
/// the wire shape; only praise and suggestions drive behavior.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualFeedback {
  pub segment: String,
  pub word_count: usize,
  pub observations: Vec<String>,
  pub suggestions: Vec<String>,
  pub praise: Vec<String>,
}

fn first_match<'a>(haystack_lower: &str, needles: &[&'a str]) -> Option<&'a str> {
  needles.iter().copied().find(|n| haystack_lower.contains(n))
}

fn has_dialogue(text: &str) -> bool {
  // A pair of straight quote characters counts as dialogue.
  text.chars().filter(|c| *c == '"').count() >= 2
}

/// Analyze a newly-added increment of text.
///
/// Returns `None` when the trimmed increment is under 10 characters, and
/// `None` again when no check produced praise or a suggestion. Both nulls
/// are deliberate signal suppression, not errors.
pub fn analyze_increment(new_text: &str, _full_content: &str, _text_type: &str) -> Option<ContextualFeedback> {
  if new_text.trim().chars().count() < 10 {
    return None;
  }

  let lower = new_text.to_lowercase();
  let new_words: Vec<&str> = new_text.split_whitespace().collect();
  let sents = sentences(new_text);
  let segment = sents.last().copied().unwrap_or("").to_string();

  let mut feedback = ContextualFeedback {
    segment,
    word_count: new_words.len(),
    observations: vec![],
    suggestions: vec![],
    praise: vec![],
  };

  if let Some(word) = first_match(&lower, &DESCRIPTIVE_WORDS) {
    feedback.praise.push(format!("Love your use of \"{}\"! That's vivid vocabulary.", word));
  }

  if has_dialogue(new_text) {
    feedback.praise.push("Great use of dialogue to bring your story to life!".to_string());
  }

  let sensory_count = [
    &SIGHT_WORDS[..], &SOUND_WORDS[..], &TOUCH_WORDS[..], &SMELL_WORDS[..], &TASTE_WORDS[..],
  ]
  .iter()
  .flat_map(|list| list.iter())
  .filter(|w| lower.contains(**w))
  .count();
  if sensory_count > 2 {
    feedback
      .praise
      .push("Excellent use of sensory details! Your reader can really imagine the scene.".to_string());
  }

  if let Some(phrase) = first_match(&lower, &TELLING_PHRASES) {
    let emotion = phrase.split(' ').nth(1).unwrap_or(phrase);
    feedback.suggestions.push(format!(
      "Instead of telling us they \"{}\", try showing {} through actions, facial expressions, or dialogue!",
      phrase, emotion
    ));
  }

  if sents.len() > 1 {
    let lengths: Vec<usize> = sents.iter().map(|s| s.split_whitespace().count()).collect();
    let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    let all_similar = lengths.iter().all(|&len| (len as f64 - avg).abs() < 3.0);
    if all_similar && avg < 8.0 {
      feedback.suggestions.push("Try combining some short sentences for better flow.".to_string());
    } else if all_similar && avg > 15.0 {
      feedback
        .suggestions
        .push("Consider breaking long sentences into shorter ones for clarity.".to_string());
    } else if !all_similar {
      feedback.praise.push("Nice sentence variety! Your writing has good rhythm.".to_string());
    }
  }

  // Repetition tally over the increment; first-seen order breaks count ties.
  let mut freq: Vec<(String, usize)> = Vec::new();
  for word in &new_words {
    let cleaned: String = word
      .to_lowercase()
      .chars()
      .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
      .collect();
    if cleaned.len() > 3 && !REPETITION_STOPWORDS.contains(&cleaned.as_str()) {
      match freq.iter_mut().find(|(w, _)| *w == cleaned) {
        Some((_, n)) => *n += 1,
        None => freq.push((cleaned, 1)),
      }
    }
  }
  let mut top: Option<&(String, usize)> = None;
  for entry in &freq {
    // Strictly-greater keeps the first-seen word on count ties.
    if entry.1 > 2 && top.map_or(true, |t| entry.1 > t.1) {
      top = Some(entry);
    }
  }
  if let Some((word, count)) = top {
    feedback.suggestions.push(format!(
      "You used \"{}\" {} times in this section. Try finding a synonym to add variety!",
      word, count
    ));
  }

  if let Some(word) = first_match(&lower, &TRANSITION_WORDS) {
    feedback
      .praise
      .push(format!("Great transition word: \"{}\"! This helps your writing flow smoothly.", word));
  }

  if let Some(verb) = first_match(&lower, &STRONG_VERBS) {
    feedback
      .praise
      .push(format!("\"{}\" is a powerful verb choice! Much better than basic verbs.", verb));
  }

  if feedback.praise.is_empty() && feedback.suggestions.is_empty() {
    return None;
  }
  Some(feedback)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tiny_increments_are_suppressed() {
    assert!(analyze_increment("short", "short", "narrative").is_none());
    assert!(analyze_increment("  123456789  ", "x", "narrative").is_none());
  }

  #[test]
  fn matchless_increment_yields_nothing() {
    // 12 chars, one sentence, no pattern hits.
    assert!(analyze_increment("The cat sat.", "The cat sat.", "narrative").is_none());
  }

  #[test]
  fn descriptive_words_earn_praise() {
    let fb = analyze_increment("The mysterious door stood ajar.", "", "narrative").expect("feedback");
    assert!(fb.praise[0].contains("mysterious"));
    assert_eq!(fb.segment, "The mysterious door stood ajar");
  }

  #[test]
  fn telling_phrases_trigger_show_dont_tell() {
    let fb = analyze_increment("She felt happy about the trip.", "", "narrative").expect("feedback");
    assert!(fb.suggestions[0].contains("felt happy"));
    assert!(fb.suggestions[0].contains("showing happy"));
  }

  #[test]
  fn dialogue_pairs_are_noticed() {
    let fb = analyze_increment("\"Run for it,\" he yelled loudly.", "", "narrative").expect("feedback");
    assert!(fb.praise.iter().any(|p| p.contains("dialogue")));
  }

  #[test]
  fn curly_quotes_do_not_count_as_dialogue() {
    let fb = analyze_increment("\u{201C}Run for it,\u{201D} he yelled loudly.", "", "narrative");
    assert!(fb.map_or(true, |f| !f.praise.iter().any(|p| p.contains("dialogue"))));
  }

  #[test]
  fn repeated_words_report_the_top_offender() {
    let text = "The forest was dark. The forest was deep. The forest went on forever.";
    let fb = analyze_increment(text, "", "narrative").expect("feedback");
    assert!(fb
      .suggestions
      .iter()
      .any(|s| s.contains("\"forest\" 3 times")));
  }

  #[test]
  fn repetition_count_ties_surface_the_first_seen_word() {
    let text = "alpha bravo alpha bravo alpha bravo over nine words total here";
    let fb = analyze_increment(text, "", "narrative").expect("feedback");
    assert!(fb
      .suggestions
      .iter()
      .any(|s| s.contains("\"alpha\" 3 times")));
  }

  #[test]
  fn uniform_short_sentences_suggest_combining() {
    let text = "He ran fast. She ran too. They ran far. It was wild.";
    let fb = analyze_increment(text, "", "narrative").expect("feedback");
    assert!(fb
      .suggestions
      .iter()
      .any(|s| s.contains("combining some short sentences")));
  }

  #[test]
  fn varied_sentences_earn_praise() {
    let text = "He ran. The storm chased him across the broken field for what seemed like hours.";
    let fb = analyze_increment(text, "", "narrative").expect("feedback");
    assert!(fb.praise.iter().any(|p| p.contains("sentence variety")));
  }

  #[test]
  fn sensory_details_need_more_than_two_hits() {
    let two = "She saw the light and heard the bell ring.";
    let fb = analyze_increment(two, "", "narrative");
    assert!(fb.map_or(true, |f| !f.praise.iter().any(|p| p.contains("sensory"))));

    let three = "She saw the light, heard the bell, and felt the cold wind.";
    let fb = analyze_increment(three, "", "narrative").expect("feedback");
    assert!(fb.praise.iter().any(|p| p.contains("sensory")));
  }
}
