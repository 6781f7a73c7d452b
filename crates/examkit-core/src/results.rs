//! Scoring result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Question, STANDARD_TIERS};

/// Binary outcome of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Pass"),
            Verdict::Fail => write!(f, "Fail"),
        }
    }
}

/// Correct/wrong counts for one mark tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTally {
    pub correct: u32,
    pub wrong: u32,
}

/// Per-tier tallies keyed by the marks value. Tiers 1, 2 and 5 are always present.
pub type Breakdown = BTreeMap<u32, TierTally>;

pub(crate) fn empty_breakdown() -> Breakdown {
    STANDARD_TIERS
        .iter()
        .map(|&tier| (tier, TierTally::default()))
        .collect()
}

/// How the final score was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationDetails {
    pub total_questions: usize,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub unattempted: usize,
    pub total_correct_marks: f64,
    pub total_negative_marks: f64,
    /// `max(0, total_correct_marks - total_negative_marks)`, unrounded.
    pub final_score: f64,
    pub breakdown: Breakdown,
}

impl CalculationDetails {
    /// Copy with every mark value rounded to two decimals for display.
    pub fn rounded(&self) -> Self {
        Self {
            total_correct_marks: round2(self.total_correct_marks),
            total_negative_marks: round2(self.total_negative_marks),
            final_score: round2(self.final_score),
            ..self.clone()
        }
    }
}

/// The scored outcome of one exam submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub correct_answers: Vec<Question>,
    pub wrong_answers: Vec<Question>,
    /// Same value as `calculation_details.final_score`; never negative.
    pub obtained_marks: f64,
    pub verdict: Verdict,
    pub calculation_details: CalculationDetails,
}

impl ScoreResult {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Obtained marks rounded to the nearest whole mark, as the result
    /// screen shows them. Never use this for the pass/fail comparison.
    pub fn display_marks(&self) -> u64 {
        self.obtained_marks.round() as u64
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
