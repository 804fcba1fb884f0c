//! Small utility helpers used across modules.

use rand::Rng;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Whitespace-split word count with empty tokens excluded.
pub fn word_count(text: &str) -> usize {
  text.split_whitespace().count()
}

/// Split into sentences on runs of `.`, `!`, `?`; empty segments are dropped.
pub fn sentences(text: &str) -> Vec<&str> {
  text
    .split(['.', '!', '?'])
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect()
}

/// Count paragraphs separated by blank-line boundaries.
/// A line of only whitespace counts as a boundary.
pub fn paragraph_count(text: &str) -> usize {
  let mut count = 0usize;
  let mut in_para = false;
  for line in text.lines() {
    if line.trim().is_empty() {
      in_para = false;
    } else if !in_para {
      count += 1;
      in_para = true;
    }
  }
  count
}

/// Unique report id: `feedback-<millis>-<random>`.
pub fn new_feedback_id() -> String {
  let millis = chrono::Utc::now().timestamp_millis();
  let suffix: String = rand::thread_rng()
    .sample_iter(rand::distributions::Alphanumeric)
    .take(10)
    .map(|b| (b as char).to_ascii_lowercase())
    .collect();
  format!("feedback-{}-{}", millis, suffix)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  // Back off to a char boundary so multibyte input can't panic the logger.
  let cut = (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn word_count_ignores_empty_tokens() {
    assert_eq!(word_count("  the   dog  ran "), 3);
    assert_eq!(word_count(""), 0);
  }

  #[test]
  fn sentences_split_on_terminal_runs() {
    assert_eq!(sentences("One. Two!! Three?"), vec!["One", "Two", "Three"]);
    assert_eq!(sentences("...").len(), 0);
  }

  #[test]
  fn paragraphs_split_on_blank_lines() {
    assert_eq!(paragraph_count("a\nb\n\nc"), 2);
    assert_eq!(paragraph_count("a\n   \nb\n\n\nc"), 3);
    assert_eq!(paragraph_count(""), 0);
  }

  #[test]
  fn feedback_ids_are_unique_and_prefixed() {
    let a = new_feedback_id();
    let b = new_feedback_id();
    assert!(a.starts_with("feedback-"));
    assert_ne!(a, b);
  }
}
