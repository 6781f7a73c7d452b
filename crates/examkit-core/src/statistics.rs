//! Aggregate statistics over many scored attempts of the same exam.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::results::{ScoreResult, TierTally};

/// Summary of a batch of attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub attempts: usize,
    pub passed: usize,
    /// Fraction in `[0, 1]`.
    pub pass_rate: f64,
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub per_tier: BTreeMap<u32, TierStats>,
}

/// Totals for one mark tier across the cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierStats {
    pub correct: u32,
    pub wrong: u32,
    /// `correct / (correct + wrong)`, 0.0 when the tier was never attempted.
    pub accuracy: f64,
}

/// Compute cohort statistics. An empty slice yields all-zero stats.
pub fn compute_cohort_stats(results: &[ScoreResult]) -> CohortStats {
    if results.is_empty() {
        return CohortStats {
            attempts: 0,
            passed: 0,
            pass_rate: 0.0,
            mean_score: 0.0,
            min_score: 0.0,
            max_score: 0.0,
            per_tier: BTreeMap::new(),
        };
    }

    let attempts = results.len();
    let passed = results.iter().filter(|r| r.passed()).count();
    let scores: Vec<f64> = results.iter().map(|r| r.obtained_marks).collect();
    let mean_score = scores.iter().sum::<f64>() / attempts as f64;
    let min_score = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut totals: BTreeMap<u32, TierTally> = BTreeMap::new();
    for result in results {
        for (&tier, tally) in &result.calculation_details.breakdown {
            let entry = totals.entry(tier).or_default();
            entry.correct += tally.correct;
            entry.wrong += tally.wrong;
        }
    }

    let per_tier = totals
        .into_iter()
        .map(|(tier, tally)| {
            let answered = tally.correct + tally.wrong;
            let accuracy = if answered == 0 {
                0.0
            } else {
                tally.correct as f64 / answered as f64
            };
            (
                tier,
                TierStats {
                    correct: tally.correct,
                    wrong: tally.wrong,
                    accuracy,
                },
            )
        })
        .collect();

    CohortStats {
        attempts,
        passed,
        pass_rate: passed as f64 / attempts as f64,
        mean_score,
        min_score,
        max_score,
        per_tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{empty_breakdown, CalculationDetails, Verdict};

    fn result(score: f64, verdict: Verdict, tier1: TierTally) -> ScoreResult {
        let mut breakdown = empty_breakdown();
        breakdown.insert(1, tier1);
        ScoreResult {
            correct_answers: vec![],
            wrong_answers: vec![],
            obtained_marks: score,
            verdict,
            calculation_details: CalculationDetails {
                total_questions: 0,
                correct_count: 0,
                wrong_count: 0,
                unattempted: 0,
                total_correct_marks: score,
                total_negative_marks: 0.0,
                final_score: score,
                breakdown,
            },
        }
    }

    #[test]
    fn empty_cohort() {
        let stats = compute_cohort_stats(&[]);
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.pass_rate, 0.0);
        assert!(stats.per_tier.is_empty());
    }

    #[test]
    fn mixed_cohort() {
        let results = vec![
            result(4.0, Verdict::Pass, TierTally { correct: 3, wrong: 1 }),
            result(1.0, Verdict::Fail, TierTally { correct: 1, wrong: 3 }),
        ];
        let stats = compute_cohort_stats(&results);
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.pass_rate, 0.5);
        assert_eq!(stats.mean_score, 2.5);
        assert_eq!(stats.min_score, 1.0);
        assert_eq!(stats.max_score, 4.0);

        let tier1 = stats.per_tier[&1];
        assert_eq!(tier1.correct, 4);
        assert_eq!(tier1.wrong, 4);
        assert_eq!(tier1.accuracy, 0.5);
        assert_eq!(stats.per_tier[&5].accuracy, 0.0);
    }
}
