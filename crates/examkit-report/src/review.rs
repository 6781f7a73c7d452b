//! Per-question review of a scored attempt.

use serde::Serialize;

use examkit_core::evaluator::{evaluate, Outcome};
use examkit_core::model::{AnswerSheet, Exam, QuestionKind, QuestionType};

/// One row of the review screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewEntry {
    /// Zero-based position in the exam.
    pub index: usize,
    pub question_id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub marks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// The candidate's answer, or `None` when left blank.
    pub submitted: Option<String>,
    pub correct_answer: String,
    pub outcome: Outcome,
}

/// Build the review list for an answer sheet, in exam order.
pub fn build_review(exam: &Exam, answers: &AnswerSheet) -> Vec<ReviewEntry> {
    exam.questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let answer = answers.get(&index);
            ReviewEntry {
                index,
                question_id: question.id.clone(),
                text: question.name.clone(),
                question_type: question.question_type(),
                marks: question.marks.value(),
                image: question.image.clone(),
                submitted: answer.filter(|a| !a.is_blank()).map(|a| a.to_string()),
                correct_answer: correct_answer_text(&question.kind),
                outcome: evaluate(question, answer).outcome(),
            }
        })
        .collect()
}

/// Human-readable correct answer for a question.
pub fn correct_answer_text(kind: &QuestionKind) -> String {
    match kind {
        QuestionKind::Mcq {
            options,
            correct_option,
        } => labelled(correct_option, options.get(correct_option)),
        QuestionKind::Msq {
            correct_options, ..
        } => {
            let mut letters: Vec<&str> = correct_options.iter().map(|s| s.trim()).collect();
            letters.sort_unstable();
            letters.join(", ")
        }
        QuestionKind::Nat { nat_min, nat_max } => {
            if nat_min == nat_max {
                nat_min.to_string()
            } else {
                format!("{nat_min} to {nat_max}")
            }
        }
        QuestionKind::TrueFalse { correct_option } => correct_option.clone(),
        QuestionKind::Matching {
            matching_options,
            match_correct_option,
            ..
        } => labelled(
            match_correct_option,
            matching_options.get(match_correct_option),
        ),
        QuestionKind::Malformed { reason, .. } => format!("unavailable ({reason})"),
    }
}

fn labelled(letter: &str, text: Option<&String>) -> String {
    match text {
        Some(text) if !text.is_empty() => format!("{letter}: {text}"),
        _ => letter.to_string(),
    }
}
