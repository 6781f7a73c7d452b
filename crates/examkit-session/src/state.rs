//! Serializable session state.

use std::fmt;

use serde::{Deserialize, Serialize};

use examkit_core::model::AnswerSheet;

/// Lifecycle phase of an exam attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Instructions,
    Questions,
    Result,
    Review,
    /// Terminal early exit.
    Closed,
}

impl Phase {
    /// Whether the attempt has been scored and can no longer change.
    pub fn is_frozen(self) -> bool {
        matches!(self, Self::Result | Self::Review)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Instructions => "instructions",
            Self::Questions => "questions",
            Self::Result => "result",
            Self::Review => "review",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Palette status of a single question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionStatus {
    #[default]
    NotVisited,
    NotAnswered,
    Answered,
    MarkedReview,
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotVisited => "not-visited",
            Self::NotAnswered => "not-answered",
            Self::Answered => "answered",
            Self::MarkedReview => "marked-review",
        };
        f.write_str(s)
    }
}

/// What caused an attempt to be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    Button,
    EscapeKey,
    TimerExpired,
}

impl fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Button => "submit button",
            Self::EscapeKey => "escape key",
            Self::TimerExpired => "timer expiry",
        };
        f.write_str(s)
    }
}

/// Everything needed to restore an attempt.
///
/// The exam itself is not part of the snapshot; it is supplied again on
/// resume and checked against the status vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    /// Index of the question currently shown.
    pub current: usize,
    pub statuses: Vec<QuestionStatus>,
    #[serde(default)]
    pub answers: AnswerSheet,
    pub remaining_secs: u64,
    #[serde(default)]
    pub submitted_by: Option<SubmitTrigger>,
}

impl SessionState {
    /// A fresh attempt for an exam with `questions` questions.
    pub fn fresh(questions: usize, duration_secs: u64) -> Self {
        Self {
            phase: Phase::Instructions,
            current: 0,
            statuses: vec![QuestionStatus::NotVisited; questions],
            answers: AnswerSheet::new(),
            remaining_secs: duration_secs,
            submitted_by: None,
        }
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for status in &self.statuses {
            match status {
                QuestionStatus::NotVisited => counts.not_visited += 1,
                QuestionStatus::NotAnswered => counts.not_answered += 1,
                QuestionStatus::Answered => counts.answered += 1,
                QuestionStatus::MarkedReview => counts.marked_review += 1,
            }
        }
        counts
    }
}

/// Per-status tally for the question palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub not_visited: usize,
    pub not_answered: usize,
    pub answered: usize,
    pub marked_review: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.not_visited + self.not_answered + self.answered + self.marked_review
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::model::SubmittedAnswer;

    #[test]
    fn fresh_state_is_unvisited() {
        let state = SessionState::fresh(4, 90);
        assert_eq!(state.phase, Phase::Instructions);
        assert_eq!(state.remaining_secs, 90);
        assert!(state.answers.is_empty());
        assert_eq!(state.status_counts().not_visited, 4);
    }

    #[test]
    fn status_counts_tally() {
        let mut state = SessionState::fresh(5, 10);
        state.statuses[0] = QuestionStatus::Answered;
        state.statuses[1] = QuestionStatus::MarkedReview;
        state.statuses[2] = QuestionStatus::NotAnswered;
        state.statuses[3] = QuestionStatus::Answered;

        let counts = state.status_counts();
        assert_eq!(counts.answered, 2);
        assert_eq!(counts.marked_review, 1);
        assert_eq!(counts.not_answered, 1);
        assert_eq!(counts.not_visited, 1);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn serde_uses_wire_names() {
        let mut state = SessionState::fresh(2, 30);
        state.phase = Phase::Questions;
        state.statuses[0] = QuestionStatus::MarkedReview;
        state.answers.insert(0, SubmittedAnswer::Text("A".into()));

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"questions\""));
        assert!(json.contains("\"marked-review\""));
        assert!(json.contains("\"not-visited\""));

        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn frozen_phases() {
        assert!(Phase::Result.is_frozen());
        assert!(Phase::Review.is_frozen());
        assert!(!Phase::Questions.is_frozen());
        assert!(!Phase::Closed.is_frozen());
    }
}
