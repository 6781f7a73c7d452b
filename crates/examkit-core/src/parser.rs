//! Exam document and answer sheet loading.
//!
//! Exams are read from TOML (`[exam]` header plus `[[questions]]`) or JSON
//! (a flat object as exported by the exam store, camelCase keys accepted).
//! Both go through loose intermediate records first, so a question missing a
//! field for its type becomes [`QuestionKind::Malformed`] instead of failing
//! the whole document.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerSheet, Exam, Marks, Question, QuestionKind, QuestionType, SubmittedAnswer};

/// Supported exam document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamFormat {
    Toml,
    Json,
}

impl ExamFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(ExamFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ExamFormat::Json),
            _ => anyhow::bail!(
                "unsupported exam file (expected .toml or .json): {}",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: RawExamHeader,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct JsonExamFile {
    #[serde(flatten)]
    exam: RawExamHeader,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawExamHeader {
    #[serde(alias = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(alias = "duration_secs")]
    duration: u64,
    #[serde(default, alias = "totalMarks")]
    total_marks: Option<f64>,
    #[serde(alias = "passingMarks")]
    passing_marks: f64,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default, alias = "_id")]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    question_type: String,
    marks: Marks,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    options: Option<BTreeMap<String, String>>,
    #[serde(default, alias = "correctOption")]
    correct_option: Option<String>,
    #[serde(default, alias = "correctOptions")]
    correct_options: Option<Vec<String>>,
    #[serde(default, alias = "natMin")]
    nat_min: Option<RawNumber>,
    #[serde(default, alias = "natMax")]
    nat_max: Option<RawNumber>,
    /// Older documents stored a single exact NAT answer.
    #[serde(default, alias = "natAnswer")]
    nat_answer: Option<RawNumber>,
    #[serde(default, alias = "matching", alias = "matchingPairs")]
    matching_pairs: Option<BTreeMap<String, String>>,
    #[serde(default, alias = "matchingOptions")]
    matching_options: Option<BTreeMap<String, String>>,
    #[serde(default, alias = "matchCorrectOption")]
    match_correct_option: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            RawNumber::Number(n) => Some(*n),
            RawNumber::Text(t) => t.trim().parse().ok(),
        }
        .filter(|v: &f64| v.is_finite())
    }
}

/// Parse a single exam file (`.toml` or `.json`).
pub fn parse_exam(path: &Path) -> Result<Exam> {
    let format = ExamFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, format, path)
}

/// Parse exam content held in memory (useful for testing).
pub fn parse_exam_str(content: &str, format: ExamFormat, source_path: &Path) -> Result<Exam> {
    let (header, raw_questions) = match format {
        ExamFormat::Toml => {
            let parsed: TomlExamFile = toml::from_str(content)
                .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
            (parsed.exam, parsed.questions)
        }
        ExamFormat::Json => {
            let parsed: JsonExamFile = serde_json::from_str(content)
                .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
            (parsed.exam, parsed.questions)
        }
    };

    let questions = raw_questions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| convert_question(index, raw))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    let achievable: u64 = questions.iter().map(|q| u64::from(q.marks.value())).sum();
    let exam = Exam {
        id: header.id,
        name: header.name,
        category: header.category.filter(|c| !c.trim().is_empty()),
        duration_secs: header.duration,
        total_marks: header.total_marks.unwrap_or(achievable as f64),
        passing_marks: header.passing_marks,
        questions,
    };

    tracing::debug!(
        exam = %exam.id,
        questions = exam.questions.len(),
        "loaded exam from {}",
        source_path.display()
    );

    Ok(exam)
}

fn convert_question(index: usize, raw: RawQuestion) -> Result<Question> {
    let id = raw
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("q{}", index + 1));
    let declared: QuestionType = raw
        .question_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!("question {id}: {e}"))?;

    let kind = match build_kind(declared, &raw) {
        Ok(kind) => kind,
        Err(reason) => QuestionKind::Malformed { declared, reason },
    };

    Ok(Question {
        id,
        name: raw.name,
        marks: raw.marks,
        image: raw.image.filter(|i| !i.trim().is_empty()),
        kind,
    })
}

fn build_kind(declared: QuestionType, raw: &RawQuestion) -> Result<QuestionKind, String> {
    match declared {
        QuestionType::Mcq => Ok(QuestionKind::Mcq {
            options: require_options(&raw.options, "options")?,
            correct_option: require_text(&raw.correct_option, "correct_option")?,
        }),
        QuestionType::Msq => {
            let options = require_options(&raw.options, "options")?;
            let correct_options: Vec<String> = raw
                .correct_options
                .iter()
                .flatten()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            if correct_options.is_empty() {
                return Err("missing correct_options".into());
            }
            Ok(QuestionKind::Msq {
                options,
                correct_options,
            })
        }
        QuestionType::Nat => {
            let exact = raw.nat_answer.as_ref().and_then(RawNumber::as_f64);
            let min = raw.nat_min.as_ref().and_then(RawNumber::as_f64).or(exact);
            let max = raw.nat_max.as_ref().and_then(RawNumber::as_f64).or(exact);
            match (min, max) {
                (Some(nat_min), Some(nat_max)) if nat_min <= nat_max => {
                    Ok(QuestionKind::Nat { nat_min, nat_max })
                }
                (Some(min), Some(max)) => Err(format!("empty NAT range [{min}, {max}]")),
                (None, _) => Err("missing or non-numeric nat_min".into()),
                (_, None) => Err("missing or non-numeric nat_max".into()),
            }
        }
        QuestionType::TrueFalse => {
            let correct = require_text(&raw.correct_option, "correct_option")?;
            if correct != "True" && correct != "False" {
                return Err(format!("correct_option must be True or False, got '{correct}'"));
            }
            Ok(QuestionKind::TrueFalse {
                correct_option: correct,
            })
        }
        QuestionType::Matching => Ok(QuestionKind::Matching {
            matching_pairs: raw.matching_pairs.clone().unwrap_or_default(),
            matching_options: require_options(&raw.matching_options, "matching_options")?,
            match_correct_option: require_text(&raw.match_correct_option, "match_correct_option")?,
        }),
    }
}

fn require_text(value: &Option<String>, field: &str) -> Result<String, String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("missing {field}"))
}

fn require_options(
    value: &Option<BTreeMap<String, String>>,
    field: &str,
) -> Result<BTreeMap<String, String>, String> {
    match value {
        Some(options) if !options.is_empty() => Ok(options.clone()),
        _ => Err(format!("missing {field}")),
    }
}

/// Recursively load all exam files (`.toml` / `.json`) from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<Exam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if ExamFormat::from_path(&path).is_ok() {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// Load an answer sheet from a JSON file.
pub fn parse_answer_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer sheet: {}", path.display()))?;
    parse_answer_sheet_str(&content)
        .with_context(|| format!("failed to parse answer sheet: {}", path.display()))
}

/// Parse an answer sheet.
///
/// Accepts an object keyed by question index (`{"0": "A", "2": ["A", "C"]}`)
/// or an array in question order. `null` and unreadable entries are dropped,
/// which leaves those questions not attempted.
pub fn parse_answer_sheet_str(content: &str) -> Result<AnswerSheet> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    let entries: Vec<(String, serde_json::Value)> = match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => anyhow::bail!("answer sheet must be an object or array, got {other}"),
    };

    let mut sheet = AnswerSheet::new();
    for (key, value) in entries {
        if value.is_null() {
            continue;
        }
        let Ok(index) = key.trim().parse::<usize>() else {
            tracing::warn!("ignoring answer with non-numeric key '{key}'");
            continue;
        };
        match serde_json::from_value::<SubmittedAnswer>(value) {
            Ok(answer) => {
                sheet.insert(index, answer);
            }
            Err(_) => {
                tracing::warn!("ignoring unreadable answer for question index {index}");
            }
        }
    }

    Ok(sheet)
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn exam(message: impl Into<String>) -> Self {
        Self {
            question_id: None,
            message: message.into(),
        }
    }

    fn question(question: &Question, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(question.id.clone()),
            message: message.into(),
        }
    }
}

/// Check an exam for authoring mistakes. None of these stop scoring.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning::exam("exam has no questions"));
    }
    if exam.duration_secs == 0 {
        warnings.push(ValidationWarning::exam(
            "duration is 0 seconds; attempts submit immediately",
        ));
    }

    let achievable = exam.achievable_marks() as f64;
    if exam.passing_marks > achievable {
        warnings.push(ValidationWarning::exam(format!(
            "passing marks {} exceed achievable marks {}",
            exam.passing_marks, achievable
        )));
    }
    if (exam.total_marks - achievable).abs() > f64::EPSILON {
        warnings.push(ValidationWarning::exam(format!(
            "total marks {} differ from the sum of question marks {} (informational)",
            exam.total_marks, achievable
        )));
    }

    let mut seen_ids = HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning::question(
                question,
                format!("duplicate question ID: {}", question.id),
            ));
        }

        if !question.marks.is_standard() {
            warnings.push(ValidationWarning::question(
                question,
                format!(
                    "marks {} is not a standard tier (1, 2, 5); no negative marking applies",
                    question.marks
                ),
            ));
        }

        match &question.kind {
            QuestionKind::Malformed { declared, reason } => {
                warnings.push(ValidationWarning::question(
                    question,
                    format!("malformed {declared} question ({reason}); it will never score"),
                ));
            }
            QuestionKind::Mcq {
                options,
                correct_option,
            } => {
                if !options.contains_key(correct_option) {
                    warnings.push(ValidationWarning::question(
                        question,
                        format!("correct option '{correct_option}' is not among the options"),
                    ));
                }
            }
            QuestionKind::Msq {
                options,
                correct_options,
            } => {
                for letter in correct_options {
                    if !options.contains_key(letter) {
                        warnings.push(ValidationWarning::question(
                            question,
                            format!("correct option '{letter}' is not among the options"),
                        ));
                    }
                }
            }
            QuestionKind::Matching {
                matching_options,
                match_correct_option,
                ..
            } => {
                let known = matching_options
                    .keys()
                    .any(|k| k.eq_ignore_ascii_case(match_correct_option));
                if !known {
                    warnings.push(ValidationWarning::question(
                        question,
                        format!(
                            "match correct option '{match_correct_option}' is not among the matching options"
                        ),
                    ));
                }
            }
            QuestionKind::Nat { .. } | QuestionKind::TrueFalse { .. } => {}
        }
    }

    warnings
}
