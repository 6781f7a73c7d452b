//! Core data model types for examkit.
//!
//! An [`Exam`] is an ordered list of [`Question`]s. Each question carries a
//! [`QuestionKind`] holding only the fields its type needs, so evaluation can
//! dispatch with an exhaustive match instead of probing optional fields.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mark tiers an exam author normally picks from.
pub const STANDARD_TIERS: [u32; 3] = [1, 2, 5];

/// How many marks a question is worth.
///
/// Exam documents store this either as a number or as a numeric string, so
/// deserialization coerces both forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMarks", into = "u32")]
pub struct Marks(u32);

impl Marks {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Penalty for a wrong answer, in thirds of a mark.
    ///
    /// 1-mark questions lose 1/3, 2-mark questions lose 2/3, and every other
    /// tier (including 5) carries no negative marking.
    pub fn penalty_thirds(self) -> u32 {
        match self.0 {
            1 => 1,
            2 => 2,
            _ => 0,
        }
    }

    /// Whether this is one of the [`STANDARD_TIERS`].
    pub fn is_standard(self) -> bool {
        STANDARD_TIERS.contains(&self.0)
    }
}

impl From<Marks> for u32 {
    fn from(marks: Marks) -> Self {
        marks.0
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Marks {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u32>() {
            return Ok(Marks(value));
        }
        match trimmed.parse::<f64>() {
            Ok(value) => marks_from_f64(value),
            Err(_) => Err(format!("marks must be numeric, got '{s}'")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMarks {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawMarks> for Marks {
    type Error = String;

    fn try_from(raw: RawMarks) -> Result<Self, Self::Error> {
        match raw {
            RawMarks::Integer(value) => u32::try_from(value)
                .map(Marks)
                .map_err(|_| format!("marks out of range: {value}")),
            RawMarks::Float(value) => marks_from_f64(value),
            RawMarks::Text(text) => text.parse(),
        }
    }
}

fn marks_from_f64(value: f64) -> Result<Marks, String> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(Marks(value as u32))
    } else {
        Err(format!("marks must be a non-negative whole number, got {value}"))
    }
}

/// The five supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "MSQ")]
    Msq,
    #[serde(rename = "NAT")]
    Nat,
    TrueFalse,
    Matching,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "MCQ"),
            QuestionType::Msq => write!(f, "MSQ"),
            QuestionType::Nat => write!(f, "NAT"),
            QuestionType::TrueFalse => write!(f, "TrueFalse"),
            QuestionType::Matching => write!(f, "Matching"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" => Ok(QuestionType::Mcq),
            "msq" => Ok(QuestionType::Msq),
            "nat" => Ok(QuestionType::Nat),
            "truefalse" | "true_false" | "tf" => Ok(QuestionType::TrueFalse),
            "matching" => Ok(QuestionType::Matching),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Type-specific payload of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestionKind {
    #[serde(rename = "MCQ")]
    Mcq {
        options: BTreeMap<String, String>,
        correct_option: String,
    },
    #[serde(rename = "MSQ")]
    Msq {
        options: BTreeMap<String, String>,
        correct_options: Vec<String>,
    },
    /// Inclusive numeric range.
    #[serde(rename = "NAT")]
    Nat { nat_min: f64, nat_max: f64 },
    TrueFalse { correct_option: String },
    Matching {
        /// Display-only pairs keyed `A1..A4`, `B1..B4`. Never scored.
        #[serde(default)]
        matching_pairs: BTreeMap<String, String>,
        matching_options: BTreeMap<String, String>,
        match_correct_option: String,
    },
    /// A question whose document lacked a required field for its type.
    /// Always evaluates as not attempted.
    Malformed {
        declared: QuestionType,
        reason: String,
    },
}

impl QuestionKind {
    /// The declared question type, including for malformed questions.
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Mcq { .. } => QuestionType::Mcq,
            QuestionKind::Msq { .. } => QuestionType::Msq,
            QuestionKind::Nat { .. } => QuestionType::Nat,
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionKind::Matching { .. } => QuestionType::Matching,
            QuestionKind::Malformed { declared, .. } => *declared,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, QuestionKind::Malformed { .. })
    }
}

/// A single exam question. Immutable once an attempt starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    /// The question text shown to the candidate.
    #[serde(default)]
    pub name: String,
    pub marks: Marks,
    #[serde(default)]
    pub image: Option<String>,
    pub kind: QuestionKind,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }
}

/// An exam definition as supplied by the exam store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Time allowed for one attempt, in seconds.
    pub duration_secs: u64,
    /// Informational only. The score is never derived from it.
    pub total_marks: f64,
    pub passing_marks: f64,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Exam {
    /// Sum of marks over all questions, i.e. the best achievable score.
    pub fn achievable_marks(&self) -> u64 {
        self.questions.iter().map(|q| u64::from(q.marks.value())).sum()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// A candidate's answer to one question.
///
/// The shape depends on the question type: a letter for MCQ and TrueFalse, a
/// set of letters for MSQ, a numeric string (or number) for NAT, and a
/// `{ "matchAnswer": letter }` object for Matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Text(String),
    Number(f64),
    Selection(Vec<String>),
    Match {
        #[serde(rename = "matchAnswer", alias = "match_answer")]
        match_answer: String,
    },
}

impl SubmittedAnswer {
    /// Interpret free-form input (e.g. a typed line) in the shape the given
    /// question type expects. MSQ input is a comma- or space-separated list
    /// of letters.
    pub fn from_input(question_type: QuestionType, input: &str) -> Self {
        let input = input.trim();
        match question_type {
            QuestionType::Msq => SubmittedAnswer::Selection(
                input
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            QuestionType::Matching => SubmittedAnswer::Match {
                match_answer: input.to_string(),
            },
            QuestionType::Mcq | QuestionType::Nat | QuestionType::TrueFalse => {
                SubmittedAnswer::Text(input.to_string())
            }
        }
    }

    /// Whether the answer carries no usable content.
    pub fn is_blank(&self) -> bool {
        match self {
            SubmittedAnswer::Text(text) => text.trim().is_empty(),
            SubmittedAnswer::Number(value) => !value.is_finite(),
            SubmittedAnswer::Selection(letters) => letters.iter().all(|l| l.trim().is_empty()),
            SubmittedAnswer::Match { match_answer } => match_answer.trim().is_empty(),
        }
    }
}

impl fmt::Display for SubmittedAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmittedAnswer::Text(text) => write!(f, "{}", text.trim()),
            SubmittedAnswer::Number(value) => write!(f, "{value}"),
            SubmittedAnswer::Selection(letters) => write!(f, "{}", letters.join(", ")),
            SubmittedAnswer::Match { match_answer } => write!(f, "{}", match_answer.trim()),
        }
    }
}

/// Submitted answers keyed by question index.
pub type AnswerSheet = BTreeMap<usize, SubmittedAnswer>;
