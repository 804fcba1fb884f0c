//! Writing-phase and time-pace classification, plus the coaching-message
//! composer. Pure functions over word counts and elapsed time; nothing here
//! touches the network or persists anything.
//!
//! The session target is 300 words in 40 minutes (7.5 words/minute), and
//! phase breakpoints are half-open: a count exactly at a breakpoint falls
//! into the next band.

use serde::Serialize;

use crate::analyzer::ContextualFeedback;
use crate::util::word_count;

pub const SESSION_MINUTES: u64 = 40;
pub const TARGET_WORDS: u64 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
  NotStarted,
  Opening,
  Development,
  RisingAction,
  Conclusion,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingPhase {
  pub phase: PhaseKind,
  pub name: &'static str,
  pub emoji: &'static str,
  pub focus: &'static str,
  pub target_words: &'static str,
  pub guidance: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimePhase {
  Early,
  EarlyMiddle,
  Middle,
  Late,
  Final,
  Overtime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
  Low,
  Medium,
  High,
  Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaceStatus {
  Ahead,
  OnTrack,
  Behind,
  Complete,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGuidance {
  pub time_phase: TimePhase,
  pub message: &'static str,
  pub urgency: Urgency,
  pub icon: &'static str,
  pub pace_status: PaceStatus,
  pub pace_emoji: &'static str,
  pub pace_message: &'static str,
  pub time_remaining: String,
  pub expected_words: i64,
  pub words_ahead_behind: i64,
}

/// Stepwise phase classification by word count, breakpoints {0, 50, 150, 250}.
pub fn writing_phase(word_count: usize) -> WritingPhase {
  if word_count == 0 {
    return WritingPhase {
      phase: PhaseKind::NotStarted,
      name: "Getting Started",
      emoji: "🚀",
      focus: "Begin writing your opening",
      target_words: "0-50 words",
      guidance: "Hook your reader and set the scene",
    };
  }
  if word_count < 50 {
    return WritingPhase {
      phase: PhaseKind::Opening,
      name: "Opening",
      emoji: "📖",
      focus: "Hook the reader and introduce your topic",
      target_words: "0-50 words",
      guidance: "Set the scene, introduce character/topic, grab attention",
    };
  }
  if word_count < 150 {
    return WritingPhase {
      phase: PhaseKind::Development,
      name: "Development",
      emoji: "🌱",
      focus: "Develop your ideas with details",
      target_words: "50-150 words",
      guidance: "Add descriptions, examples, dialogue, or evidence",
    };
  }
  if word_count < 250 {
    return WritingPhase {
      phase: PhaseKind::RisingAction,
      name: "Rising Action",
      emoji: "⚡",
      focus: "Build tension and develop complexity",
      target_words: "150-250 words",
      guidance: "Deepen ideas, add complications, build to climax",
    };
  }
  WritingPhase {
    phase: PhaseKind::Conclusion,
    name: "Conclusion",
    emoji: "🎯",
    focus: "Wrap up your writing",
    target_words: "250+ words",
    guidance: "Provide resolution, final thoughts, satisfying ending",
  }
}

/// Pace + time-band classification. Minute breakpoints {10, 20, 30, 35, 40};
/// at 40 minutes the phase is overtime and pace is forced to complete.
pub fn time_guidance(elapsed_seconds: u64, word_count: usize) -> TimeGuidance {
  let minutes = elapsed_seconds / 60;
  let expected_words = (TARGET_WORDS as f64 / SESSION_MINUTES as f64 * minutes as f64).floor() as i64;
  let words_ahead_behind = word_count as i64 - expected_words;

  let (pace_status, pace_emoji, pace_message) = if words_ahead_behind > 50 {
    (PaceStatus::Ahead, "🚀", "Excellent pace! You're ahead of schedule.")
  } else if words_ahead_behind < -50 {
    (PaceStatus::Behind, "⏰", "Let's pick up the pace a bit!")
  } else {
    (PaceStatus::OnTrack, "✅", "You're right on track!")
  };

  let remaining = || format!("{} minutes left", SESSION_MINUTES - minutes);

  let (time_phase, message, urgency, icon) = match minutes {
    m if m < 10 => (
      TimePhase::Early,
      "Great start! Focus on getting your ideas flowing naturally.",
      Urgency::Low,
      "🌟",
    ),
    m if m < 20 => (
      TimePhase::EarlyMiddle,
      "You're making good progress. Keep developing your ideas with details.",
      Urgency::Low,
      "💪",
    ),
    m if m < 30 => (
      TimePhase::Middle,
      "Excellent! Start thinking about how to wrap up your writing.",
      Urgency::Medium,
      "🎯",
    ),
    m if m < 35 => (
      TimePhase::Late,
      "Time to focus on your conclusion! Wrap up your main ideas.",
      Urgency::Medium,
      "⏰",
    ),
    m if m < 40 => (
      TimePhase::Final,
      "Final minutes! Review and polish your work.",
      Urgency::High,
      "🔥",
    ),
    _ => {
      return TimeGuidance {
        time_phase: TimePhase::Overtime,
        message: "Time's up! Great effort!",
        urgency: Urgency::Complete,
        icon: "🏁",
        pace_status: PaceStatus::Complete,
        pace_emoji: "✨",
        pace_message: "You've completed the test!",
        time_remaining: "0 minutes left".to_string(),
        expected_words,
        words_ahead_behind,
      }
    }
  };

  TimeGuidance {
    time_phase,
    message,
    urgency,
    icon,
    pace_status,
    pace_emoji,
    pace_message,
    time_remaining: remaining(),
    expected_words,
    words_ahead_behind,
  }
}

/// The single contextual callout surfaced to the student. Praise wins over
/// a suggestion when both were detected.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualCallout {
  pub kind: &'static str,
  pub text: String,
  pub icon: &'static str,
  pub segment: String,
}

/// Short structured coaching message shown on each accepted sample.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachReply {
  pub encouragement: &'static str,
  pub phase_info: String,
  pub phase_guidance: &'static str,
  pub phase_target: &'static str,
  pub time_info: String,
  pub pace_info: String,
  pub time_message: &'static str,
  pub specific_tip: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub contextual: Option<ContextualCallout>,
  pub word_count: usize,
  pub phase: WritingPhase,
  pub time_guidance: TimeGuidance,
}

/// Combine phase, time guidance and at most one contextual item into a
/// coaching message.
pub fn compose_coach_reply(
  content: &str,
  phase: WritingPhase,
  time: TimeGuidance,
  contextual: Option<&ContextualFeedback>,
) -> CoachReply {
  let words = word_count(content);

  let encouragement = if words == 0 {
    "Ready to start? Just begin writing and I'll guide you!"
  } else if words < 50 {
    "Great start! Keep the momentum going!"
  } else if words < 100 {
    "You're building nicely! Keep developing your ideas."
  } else if words < 200 {
    "Excellent progress! You're in the flow."
  } else if words < 250 {
    "Well done! You're approaching the target word count."
  } else if words < 300 {
    "Outstanding! You've reached the target range!"
  } else {
    "Fantastic! You've written a comprehensive response!"
  };

  let specific_tip = match phase.phase {
    PhaseKind::Opening if time.urgency == Urgency::Low => {
      "Hook your reader with an interesting opening sentence or question."
    }
    PhaseKind::Development => "Add specific details, examples, or descriptions to strengthen your ideas.",
    PhaseKind::RisingAction => "Build complexity and depth. This is where your writing really develops!",
    PhaseKind::Conclusion => "Wrap up your ideas and leave your reader with a memorable final thought.",
    _ if time.urgency == Urgency::High => "Focus on finishing strong! Review for any spelling or grammar errors.",
    _ => "",
  };

  let contextual = contextual.map(|fb| {
    if let Some(praise) = fb.praise.first() {
      ContextualCallout {
        kind: "praise",
        text: praise.clone(),
        icon: "🌟",
        segment: fb.segment.clone(),
      }
    } else {
      ContextualCallout {
        kind: "suggestion",
        text: fb.suggestions.first().cloned().unwrap_or_default(),
        icon: "💡",
        segment: fb.segment.clone(),
      }
    }
  });

  CoachReply {
    encouragement,
    phase_info: format!("{} {} Phase", phase.emoji, phase.name),
    phase_guidance: phase.guidance,
    phase_target: phase.target_words,
    time_info: format!("{} {}", time.icon, time.time_remaining),
    pace_info: format!("{} {}", time.pace_emoji, time.pace_message),
    time_message: time.message,
    specific_tip,
    contextual,
    word_count: words,
    phase,
    time_guidance: time,
  }
}
