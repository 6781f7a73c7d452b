//! Negative-marking scoring engine.
//!
//! A single deterministic pass over the questions in exam order. Penalties
//! are accumulated in thirds of a mark so that repeated deductions stay exact
//! until the final division.

use crate::evaluator::evaluate;
use crate::model::{AnswerSheet, Exam, Question};
use crate::results::{empty_breakdown, CalculationDetails, ScoreResult, Verdict};

/// Score a submission against the questions of `exam`.
pub fn score_exam(exam: &Exam, answers: &AnswerSheet) -> ScoreResult {
    score(exam, &exam.questions, answers)
}

/// Score `answers` against `questions`, taking the pass mark from `exam`.
///
/// Pure: no I/O, no clock, no randomness. The verdict compares the unrounded
/// final score against `exam.passing_marks`.
pub fn score(exam: &Exam, questions: &[Question], answers: &AnswerSheet) -> ScoreResult {
    let mut correct_answers = Vec::new();
    let mut wrong_answers = Vec::new();
    let mut breakdown = empty_breakdown();
    let mut correct_marks: u64 = 0;
    let mut penalty_thirds: u64 = 0;
    let mut unattempted = 0usize;

    for (index, question) in questions.iter().enumerate() {
        let evaluation = evaluate(question, answers.get(&index));
        if !evaluation.attempted {
            unattempted += 1;
            continue;
        }

        let tally = breakdown.entry(question.marks.value()).or_default();
        if evaluation.correct {
            correct_marks += u64::from(question.marks.value());
            tally.correct += 1;
            correct_answers.push(question.clone());
        } else {
            penalty_thirds += u64::from(question.marks.penalty_thirds());
            tally.wrong += 1;
            wrong_answers.push(question.clone());
        }
    }

    let total_correct_marks = correct_marks as f64;
    let total_negative_marks = penalty_thirds as f64 / 3.0;
    let net_thirds = (correct_marks * 3).saturating_sub(penalty_thirds);
    let final_score = net_thirds as f64 / 3.0;

    let verdict = if final_score >= exam.passing_marks {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    tracing::debug!(
        exam = %exam.id,
        correct = correct_answers.len(),
        wrong = wrong_answers.len(),
        unattempted,
        final_score,
        %verdict,
        "scored submission"
    );

    ScoreResult {
        calculation_details: CalculationDetails {
            total_questions: questions.len(),
            correct_count: correct_answers.len(),
            wrong_count: wrong_answers.len(),
            unattempted,
            total_correct_marks,
            total_negative_marks,
            final_score,
            breakdown,
        },
        correct_answers,
        wrong_answers,
        obtained_marks: final_score,
        verdict,
    }
}
