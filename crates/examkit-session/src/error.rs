use thiserror::Error;

use crate::state::Phase;

/// Errors raised by session transitions.
///
/// None of these are fatal: the session is left untouched when a transition
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} during the {phase} phase")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("attempt already submitted, cannot {action}")]
    Frozen { action: &'static str },

    #[error("question {index} is out of range (exam has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("snapshot does not match exam: {0}")]
    SnapshotMismatch(String),
}

impl SessionError {
    /// Whether the attempt has already been scored.
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_action() {
        let err = SessionError::InvalidTransition {
            phase: Phase::Instructions,
            action: "submit",
        };
        assert_eq!(err.to_string(), "cannot submit during the instructions phase");

        let err = SessionError::Frozen { action: "answer" };
        assert!(err.is_frozen());
        assert!(err.to_string().contains("answer"));
    }

    #[test]
    fn out_of_range_reports_bounds() {
        let err = SessionError::QuestionOutOfRange { index: 7, len: 3 };
        assert_eq!(
            err.to_string(),
            "question 7 is out of range (exam has 3 questions)"
        );
        assert!(!err.is_frozen());
    }
}
