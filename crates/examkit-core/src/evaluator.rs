//! Per-type answer evaluation.
//!
//! Every evaluator answers two questions about one submitted answer: was the
//! question attempted, and is the answer correct. An answer whose shape or
//! content cannot be read for the question's type counts as not attempted,
//! never as wrong.

use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionKind, SubmittedAnswer};

/// Result of evaluating one answer against one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub attempted: bool,
    pub correct: bool,
}

impl Evaluation {
    pub const NOT_ATTEMPTED: Evaluation = Evaluation {
        attempted: false,
        correct: false,
    };

    fn graded(correct: bool) -> Self {
        Self {
            attempted: true,
            correct,
        }
    }

    pub fn outcome(self) -> Outcome {
        match (self.attempted, self.correct) {
            (false, _) => Outcome::NotAttempted,
            (true, true) => Outcome::Correct,
            (true, false) => Outcome::Wrong,
        }
    }
}

/// Three-way view of an [`Evaluation`], used for review display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Wrong,
    NotAttempted,
}

/// Evaluate a submitted answer for a question.
///
/// `None` means the candidate never answered.
pub fn evaluate(question: &Question, answer: Option<&SubmittedAnswer>) -> Evaluation {
    let Some(answer) = answer else {
        return Evaluation::NOT_ATTEMPTED;
    };
    if answer.is_blank() {
        return Evaluation::NOT_ATTEMPTED;
    }

    match &question.kind {
        QuestionKind::Mcq { correct_option, .. } => evaluate_letter(correct_option, answer),
        QuestionKind::TrueFalse { correct_option } => evaluate_letter(correct_option, answer),
        QuestionKind::Msq {
            correct_options, ..
        } => evaluate_selection(correct_options, answer),
        QuestionKind::Nat { nat_min, nat_max } => evaluate_numeric(*nat_min, *nat_max, answer),
        QuestionKind::Matching {
            match_correct_option,
            ..
        } => evaluate_match(match_correct_option, answer),
        QuestionKind::Malformed { .. } => Evaluation::NOT_ATTEMPTED,
    }
}

/// MCQ and TrueFalse: trimmed, case-sensitive equality.
fn evaluate_letter(correct: &str, answer: &SubmittedAnswer) -> Evaluation {
    match answer {
        SubmittedAnswer::Text(text) => Evaluation::graded(text.trim() == correct.trim()),
        _ => Evaluation::NOT_ATTEMPTED,
    }
}

/// MSQ: order-independent set equality, no partial credit.
fn evaluate_selection(correct: &[String], answer: &SubmittedAnswer) -> Evaluation {
    let SubmittedAnswer::Selection(letters) = answer else {
        return Evaluation::NOT_ATTEMPTED;
    };

    let mut submitted: Vec<&str> = letters
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if submitted.is_empty() {
        return Evaluation::NOT_ATTEMPTED;
    }
    submitted.sort_unstable();

    let mut expected: Vec<&str> = correct.iter().map(|l| l.trim()).collect();
    expected.sort_unstable();

    Evaluation::graded(submitted == expected)
}

/// NAT: inclusive range check on a finite number.
fn evaluate_numeric(min: f64, max: f64, answer: &SubmittedAnswer) -> Evaluation {
    let value = match answer {
        SubmittedAnswer::Text(text) => parse_numeric(text),
        SubmittedAnswer::Number(value) => Some(*value).filter(|v| v.is_finite()),
        _ => None,
    };

    match value {
        Some(value) => Evaluation::graded(min <= value && value <= max),
        None => Evaluation::NOT_ATTEMPTED,
    }
}

/// Matching: only the selected matching option is scored, compared
/// case-insensitively after trimming.
fn evaluate_match(correct: &str, answer: &SubmittedAnswer) -> Evaluation {
    match answer {
        SubmittedAnswer::Match { match_answer } => Evaluation::graded(
            match_answer.trim().to_lowercase() == correct.trim().to_lowercase(),
        ),
        _ => Evaluation::NOT_ATTEMPTED,
    }
}

/// Parse a NAT answer. Non-numeric and non-finite input yields `None`.
pub fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{Marks, QuestionType};

    fn question(kind: QuestionKind) -> Question {
        Question {
            id: "q".into(),
            name: String::new(),
            marks: Marks::new(1),
            image: None,
            kind,
        }
    }

    fn mcq(correct: &str) -> Question {
        question(QuestionKind::Mcq {
            options: BTreeMap::from([
                ("A".into(), "one".into()),
                ("B".into(), "two".into()),
            ]),
            correct_option: correct.into(),
        })
    }

    fn msq(correct: &[&str]) -> Question {
        question(QuestionKind::Msq {
            options: BTreeMap::new(),
            correct_options: correct.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn nat(min: f64, max: f64) -> Question {
        question(QuestionKind::Nat {
            nat_min: min,
            nat_max: max,
        })
    }

    fn text(s: &str) -> SubmittedAnswer {
        SubmittedAnswer::Text(s.into())
    }

    fn selection(letters: &[&str]) -> SubmittedAnswer {
        SubmittedAnswer::Selection(letters.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn absent_or_blank_is_not_attempted_for_every_type() {
        let questions = [
            mcq("A"),
            msq(&["A"]),
            nat(1.0, 2.0),
            question(QuestionKind::TrueFalse {
                correct_option: "True".into(),
            }),
            question(QuestionKind::Matching {
                matching_pairs: BTreeMap::new(),
                matching_options: BTreeMap::new(),
                match_correct_option: "A".into(),
            }),
        ];
        let blanks = [
            text(""),
            selection(&[]),
            text("  "),
            text(""),
            SubmittedAnswer::Match {
                match_answer: " ".into(),
            },
        ];
        for (q, blank) in questions.iter().zip(blanks.iter()) {
            assert_eq!(evaluate(q, None), Evaluation::NOT_ATTEMPTED);
            assert_eq!(evaluate(q, Some(blank)), Evaluation::NOT_ATTEMPTED);
        }
    }

    #[test]
    fn mcq_trimmed_case_sensitive() {
        let q = mcq("A");
        assert_eq!(evaluate(&q, Some(&text(" A "))).outcome(), Outcome::Correct);
        assert_eq!(evaluate(&q, Some(&text("a"))).outcome(), Outcome::Wrong);
        assert_eq!(evaluate(&q, Some(&text("B"))).outcome(), Outcome::Wrong);
    }

    #[test]
    fn true_false_exact_string() {
        let q = question(QuestionKind::TrueFalse {
            correct_option: "False".into(),
        });
        assert!(evaluate(&q, Some(&text("False"))).correct);
        assert_eq!(evaluate(&q, Some(&text("false"))).outcome(), Outcome::Wrong);
    }

    #[test]
    fn msq_order_independent_all_or_nothing() {
        let q = msq(&["A", "C"]);
        assert!(evaluate(&q, Some(&selection(&["C", "A"]))).correct);
        assert!(evaluate(&q, Some(&selection(&["A", "C"]))).correct);

        let subset = evaluate(&q, Some(&selection(&["A"])));
        assert_eq!(subset.outcome(), Outcome::Wrong);

        let superset = evaluate(&q, Some(&selection(&["A", "B", "C"])));
        assert_eq!(superset.outcome(), Outcome::Wrong);
    }

    #[test]
    fn nat_boundaries_inclusive() {
        let q = nat(5.0, 10.0);
        let eps = 1e-9;
        assert!(evaluate(&q, Some(&text("5"))).correct);
        assert!(evaluate(&q, Some(&text("10"))).correct);
        assert!(evaluate(&q, Some(&SubmittedAnswer::Number(7.25))).correct);
        assert_eq!(
            evaluate(&q, Some(&SubmittedAnswer::Number(5.0 - eps))).outcome(),
            Outcome::Wrong
        );
        assert_eq!(
            evaluate(&q, Some(&SubmittedAnswer::Number(10.0 + eps))).outcome(),
            Outcome::Wrong
        );
        assert_eq!(evaluate(&q, Some(&text("12"))).outcome(), Outcome::Wrong);
    }

    #[test]
    fn nat_unparseable_is_not_attempted() {
        let q = nat(0.0, 1.0);
        assert_eq!(evaluate(&q, Some(&text("abc"))), Evaluation::NOT_ATTEMPTED);
        assert_eq!(evaluate(&q, Some(&text("NaN"))), Evaluation::NOT_ATTEMPTED);
        assert_eq!(evaluate(&q, Some(&text("inf"))), Evaluation::NOT_ATTEMPTED);
        assert_eq!(
            evaluate(&q, Some(&selection(&["1"]))),
            Evaluation::NOT_ATTEMPTED
        );
    }

    #[test]
    fn matching_case_insensitive_selection_only() {
        let q = question(QuestionKind::Matching {
            matching_pairs: BTreeMap::from([("A1".into(), "x".into()), ("B1".into(), "y".into())]),
            matching_options: BTreeMap::from([("C".into(), "A1-B1".into())]),
            match_correct_option: "C".into(),
        });
        let answer = SubmittedAnswer::Match {
            match_answer: " c ".into(),
        };
        assert!(evaluate(&q, Some(&answer)).correct);
        assert_eq!(evaluate(&q, Some(&text("C"))), Evaluation::NOT_ATTEMPTED);
    }

    #[test]
    fn wrong_shape_is_not_attempted() {
        assert_eq!(
            evaluate(&mcq("A"), Some(&selection(&["A"]))),
            Evaluation::NOT_ATTEMPTED
        );
        assert_eq!(
            evaluate(&msq(&["A"]), Some(&text("A"))),
            Evaluation::NOT_ATTEMPTED
        );
    }

    #[test]
    fn malformed_fails_closed() {
        let q = question(QuestionKind::Malformed {
            declared: QuestionType::Mcq,
            reason: "missing correct_option".into(),
        });
        assert_eq!(evaluate(&q, Some(&text("A"))), Evaluation::NOT_ATTEMPTED);
    }
}
