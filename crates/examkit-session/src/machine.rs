//! The exam attempt state machine.
//!
//! [`ExamSession`] owns the [`SessionState`] of one attempt and mutates it
//! only through named transitions. Scoring happens synchronously inside
//! [`ExamSession::submit`], in the same call that freezes the attempt.

use std::sync::Arc;

use tracing::{debug, info};

use examkit_core::model::{Exam, Question, SubmittedAnswer};
use examkit_core::results::ScoreResult;
use examkit_core::scoring::score_exam;

use crate::error::SessionError;
use crate::state::{Phase, QuestionStatus, SessionState, StatusCounts, SubmitTrigger};

/// Result of feeding one timer tick into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not in the questions phase; the tick was ignored.
    Idle,
    /// Time left after the decrement.
    Running(u64),
    /// The countdown reached zero and the attempt was submitted.
    Expired,
}

/// One exam attempt.
#[derive(Debug, Clone)]
pub struct ExamSession {
    exam: Arc<Exam>,
    state: SessionState,
    result: Option<ScoreResult>,
}

impl ExamSession {
    /// A new attempt waiting on the instructions screen.
    pub fn new(exam: Arc<Exam>) -> Self {
        let state = SessionState::fresh(exam.question_count(), exam.duration_secs);
        Self {
            exam,
            state,
            result: None,
        }
    }

    /// Restore an attempt from a snapshot.
    ///
    /// Frozen snapshots are re-scored from their stored answers, which yields
    /// the same result as the original submission.
    pub fn resume(exam: Arc<Exam>, state: SessionState) -> Result<Self, SessionError> {
        let len = exam.question_count();
        if state.statuses.len() != len {
            return Err(SessionError::SnapshotMismatch(format!(
                "snapshot has {} statuses but exam '{}' has {} questions",
                state.statuses.len(),
                exam.id,
                len
            )));
        }
        if len > 0 && state.current >= len {
            return Err(SessionError::SnapshotMismatch(format!(
                "current question {} is past the end of the exam",
                state.current
            )));
        }
        if let Some(index) = state.answers.keys().find(|&&i| i >= len) {
            return Err(SessionError::SnapshotMismatch(format!(
                "answer recorded for question {index} which does not exist"
            )));
        }

        let result = state
            .phase
            .is_frozen()
            .then(|| score_exam(&exam, &state.answers));

        debug!(exam = %exam.id, phase = %state.phase, "resumed session");
        Ok(Self {
            exam,
            state,
            result,
        })
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// A serializable copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn current_index(&self) -> usize {
        self.state.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.exam.questions.get(self.state.current)
    }

    pub fn current_answer(&self) -> Option<&SubmittedAnswer> {
        self.state.answers.get(&self.state.current)
    }

    pub fn status(&self, index: usize) -> Option<QuestionStatus> {
        self.state.statuses.get(index).copied()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.state.status_counts()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    /// The scored result, once the attempt has been submitted.
    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    pub fn submitted_by(&self) -> Option<SubmitTrigger> {
        self.state.submitted_by
    }

    /// Leave the instructions screen and begin answering.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state.phase != Phase::Instructions {
            return Err(self.reject("start"));
        }
        self.state = SessionState::fresh(self.exam.question_count(), self.exam.duration_secs);
        self.state.phase = Phase::Questions;
        self.visit(0);
        info!(exam = %self.exam.id, duration = self.exam.duration_secs, "attempt started");
        Ok(())
    }

    /// Record a working answer for the current question without touching its
    /// status. A blank answer removes the entry.
    pub fn answer(&mut self, value: SubmittedAnswer) -> Result<(), SessionError> {
        self.require_questions("answer")?;
        self.require_current()?;
        if value.is_blank() {
            self.state.answers.remove(&self.state.current);
        } else {
            self.state.answers.insert(self.state.current, value);
        }
        Ok(())
    }

    /// Record typed input for the current question, shaped by its type.
    pub fn answer_input(&mut self, input: &str) -> Result<(), SessionError> {
        self.require_questions("answer")?;
        let question_type = self
            .current_question()
            .map(|q| q.question_type())
            .ok_or(SessionError::QuestionOutOfRange {
                index: self.state.current,
                len: self.exam.question_count(),
            })?;
        self.answer(SubmittedAnswer::from_input(question_type, input))
    }

    /// Jump to question `index`.
    pub fn goto(&mut self, index: usize) -> Result<(), SessionError> {
        self.require_questions("navigate")?;
        let len = self.exam.question_count();
        if index >= len {
            return Err(SessionError::QuestionOutOfRange { index, len });
        }
        self.state.current = index;
        self.visit(index);
        Ok(())
    }

    /// Move forward one question. No-op on the last question.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.require_questions("navigate")?;
        self.advance();
        Ok(())
    }

    /// Move back one question. No-op on the first question.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        self.require_questions("navigate")?;
        if self.state.current > 0 {
            self.state.current -= 1;
            self.visit(self.state.current);
        }
        Ok(())
    }

    pub fn save_and_next(&mut self) -> Result<(), SessionError> {
        self.require_questions("save")?;
        if self.require_current().is_err() {
            return Ok(());
        }
        let answered = self
            .current_answer()
            .is_some_and(|answer| !answer.is_blank());
        self.set_current_status(if answered {
            QuestionStatus::Answered
        } else {
            QuestionStatus::NotAnswered
        });
        self.advance();
        Ok(())
    }

    pub fn clear_response(&mut self) -> Result<(), SessionError> {
        self.require_questions("clear")?;
        self.require_current()?;
        self.state.answers.remove(&self.state.current);
        self.set_current_status(QuestionStatus::NotAnswered);
        Ok(())
    }

    pub fn mark_for_review_and_next(&mut self) -> Result<(), SessionError> {
        self.require_questions("mark for review")?;
        if self.require_current().is_err() {
            return Ok(());
        }
        self.set_current_status(QuestionStatus::MarkedReview);
        self.advance();
        Ok(())
    }

    /// Freeze the attempt, score it once and move to the result screen.
    pub fn submit(&mut self, trigger: SubmitTrigger) -> Result<&ScoreResult, SessionError> {
        self.require_questions("submit")?;

        let result = score_exam(&self.exam, &self.state.answers);
        self.state.phase = Phase::Result;
        self.state.submitted_by = Some(trigger);
        info!(
            exam = %self.exam.id,
            trigger = %trigger,
            score = result.obtained_marks,
            verdict = %result.verdict,
            "attempt submitted"
        );
        Ok(self.result.insert(result))
    }

    /// Count down one second. Reaching zero submits the attempt; ticks
    /// outside the questions phase do nothing, so expiry fires at most once.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.phase != Phase::Questions {
            return TickOutcome::Idle;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs > 0 {
            return TickOutcome::Running(self.state.remaining_secs);
        }
        match self.submit(SubmitTrigger::TimerExpired) {
            Ok(_) => TickOutcome::Expired,
            Err(_) => TickOutcome::Idle,
        }
    }

    pub fn review(&mut self) -> Result<(), SessionError> {
        if self.state.phase != Phase::Result {
            return Err(self.reject("review"));
        }
        self.state.phase = Phase::Review;
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), SessionError> {
        if self.state.phase != Phase::Review {
            return Err(self.reject("go back"));
        }
        self.state.phase = Phase::Result;
        Ok(())
    }

    /// Discard the scored attempt and return to the instructions screen with
    /// a fresh state.
    pub fn retake(&mut self) -> Result<(), SessionError> {
        if !self.state.phase.is_frozen() {
            return Err(self.reject("retake"));
        }
        self.state = SessionState::fresh(self.exam.question_count(), self.exam.duration_secs);
        self.result = None;
        info!(exam = %self.exam.id, "retake requested");
        Ok(())
    }

    /// Leave the exam. Exiting mid-attempt abandons it without scoring.
    pub fn exit(&mut self) {
        if self.state.phase == Phase::Questions {
            info!(exam = %self.exam.id, "attempt abandoned");
        }
        self.state.phase = Phase::Closed;
    }

    fn reject(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.state.phase,
            action,
        }
    }

    fn require_questions(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state.phase {
            Phase::Questions => Ok(()),
            Phase::Result | Phase::Review => Err(SessionError::Frozen { action }),
            _ => Err(self.reject(action)),
        }
    }

    fn require_current(&self) -> Result<(), SessionError> {
        let len = self.exam.question_count();
        if self.state.current >= len {
            return Err(SessionError::QuestionOutOfRange {
                index: self.state.current,
                len,
            });
        }
        Ok(())
    }

    fn advance(&mut self) {
        if self.state.current + 1 < self.exam.question_count() {
            self.state.current += 1;
            self.visit(self.state.current);
        }
    }

    /// First visit turns not-visited into not-answered and never overwrites
    /// anything else.
    fn visit(&mut self, index: usize) {
        if let Some(status) = self.state.statuses.get_mut(index) {
            if *status == QuestionStatus::NotVisited {
                *status = QuestionStatus::NotAnswered;
            }
        }
    }

    fn set_current_status(&mut self, status: QuestionStatus) {
        if let Some(slot) = self.state.statuses.get_mut(self.state.current) {
            *slot = status;
        }
    }
}
