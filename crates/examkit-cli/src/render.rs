//! Terminal rendering shared by the commands.

use comfy_table::{Cell, Table};

use examkit_core::evaluator::Outcome;
use examkit_core::model::Exam;
use examkit_core::results::ScoreResult;
use examkit_core::statistics::CohortStats;
use examkit_report::ReviewEntry;

/// Format seconds as `m:ss`.
pub fn clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn result_table(exam: &Exam, result: &ScoreResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Total Marks",
        "Obtained Marks",
        "Wrong Answers",
        "Passing Marks",
        "Verdict",
    ]);
    table.add_row(vec![
        Cell::new(exam.total_marks),
        Cell::new(result.display_marks()),
        Cell::new(result.wrong_answers.len()),
        Cell::new(exam.passing_marks),
        Cell::new(result.verdict),
    ]);
    table
}

pub fn breakdown_table(result: &ScoreResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Marks", "Correct", "Wrong"]);
    for (tier, tally) in &result.calculation_details.breakdown {
        table.add_row(vec![
            Cell::new(tier),
            Cell::new(tally.correct),
            Cell::new(tally.wrong),
        ]);
    }
    table
}

/// One-line arithmetic behind the final score.
pub fn calculation_line(result: &ScoreResult) -> String {
    let details = result.calculation_details.rounded();
    format!(
        "Score calculation: correct marks {:.2} - negative marks {:.2} = {:.2} ({} correct, {} wrong, {} not attempted)",
        details.total_correct_marks,
        details.total_negative_marks,
        details.final_score,
        details.correct_count,
        details.wrong_count,
        details.unattempted,
    )
}

pub fn print_result(exam: &Exam, result: &ScoreResult) {
    println!("{}", result_table(exam, result));
    println!("{}", calculation_line(result));
    println!("{}", breakdown_table(result));
    println!("Verdict: {}", result.verdict);
}

pub fn review_table(entries: &[ReviewEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "#",
        "Question",
        "Marks",
        "Your Answer",
        "Correct Answer",
        "Outcome",
    ]);
    for entry in entries {
        let outcome = match entry.outcome {
            Outcome::Correct => "Correct",
            Outcome::Wrong => "Wrong",
            Outcome::NotAttempted => "Not attempted",
        };
        table.add_row(vec![
            Cell::new(entry.index + 1),
            Cell::new(&entry.text),
            Cell::new(entry.marks),
            Cell::new(entry.submitted.as_deref().unwrap_or("-")),
            Cell::new(&entry.correct_answer),
            Cell::new(outcome),
        ]);
    }
    table
}

pub fn cohort_table(stats: &CohortStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Attempts", "Passed", "Pass Rate", "Mean", "Min", "Max"]);
    table.add_row(vec![
        Cell::new(stats.attempts),
        Cell::new(stats.passed),
        Cell::new(format!("{:.1}%", stats.pass_rate * 100.0)),
        Cell::new(format!("{:.2}", stats.mean_score)),
        Cell::new(format!("{:.2}", stats.min_score)),
        Cell::new(format!("{:.2}", stats.max_score)),
    ]);
    table
}

pub fn tier_table(stats: &CohortStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Marks", "Correct", "Wrong", "Accuracy"]);
    for (tier, tier_stats) in &stats.per_tier {
        table.add_row(vec![
            Cell::new(tier),
            Cell::new(tier_stats.correct),
            Cell::new(tier_stats.wrong),
            Cell::new(format!("{:.1}%", tier_stats.accuracy * 100.0)),
        ]);
    }
    table
}
