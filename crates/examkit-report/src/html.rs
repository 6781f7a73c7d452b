//! HTML result page generator.
//!
//! One standalone page per attempt; styles and the review filter script are
//! embedded.

use anyhow::{Context, Result};
use std::path::Path;

use examkit_core::evaluator::Outcome;
use examkit_core::model::{AnswerSheet, Exam};
use examkit_core::report::ExamReport;

use crate::review::{build_review, ReviewEntry};

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the result page for a stored attempt.
///
/// `answers` is the sheet the report was scored from; it drives the review
/// section.
pub fn generate_html(report: &ExamReport, exam: &Exam, answers: &AnswerSheet) -> String {
    let result = &report.result;
    let details = result.calculation_details.rounded();
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>examkit result: {}</title>\n",
        html_escape(&exam.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&exam.name)));
    html.push_str(&format!(
        "<p class=\"meta\">Candidate: <strong>{}</strong> | {} questions | {}</p>\n",
        html_escape(&report.user_id),
        exam.question_count(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Result card
    let verdict_class = if result.passed() { "pass" } else { "fail" };
    html.push_str("<section class=\"card\">\n<h2>Result</h2>\n<table class=\"summary\">\n");
    let rows = [
        ("Total Marks", format!("{}", exam.total_marks)),
        ("Obtained Marks", result.display_marks().to_string()),
        ("Wrong Answers", result.wrong_answers.len().to_string()),
        ("Passing Marks", format!("{}", exam.passing_marks)),
    ];
    for (label, value) in rows {
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>\n"));
    }
    html.push_str(&format!(
        "<tr><th>Verdict</th><td class=\"{verdict_class}\">{}</td></tr>\n",
        result.verdict
    ));
    html.push_str("</table>\n</section>\n");

    // Score calculation
    html.push_str("<section class=\"calculation\">\n<h2>Score Calculation</h2>\n");
    html.push_str(&format!(
        "<p>{} correct, {} wrong, {} not attempted. Correct marks {:.2} minus negative marks {:.2} gives <strong>{:.2}</strong>.</p>\n",
        details.correct_count,
        details.wrong_count,
        details.unattempted,
        details.total_correct_marks,
        details.total_negative_marks,
        details.final_score,
    ));
    html.push_str("<table class=\"breakdown\">\n");
    html.push_str("<thead><tr><th>Marks</th><th>Correct</th><th>Wrong</th><th>Penalty per wrong</th></tr></thead>\n<tbody>\n");
    for (tier, tally) in &details.breakdown {
        let penalty = match *tier {
            1 => "1/3",
            2 => "2/3",
            _ => "0",
        };
        html.push_str(&format!(
            "<tr><td>{tier}</td><td>{}</td><td>{}</td><td>{penalty}</td></tr>\n",
            tally.correct, tally.wrong
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Review
    html.push_str("<section class=\"review\">\n<h2>Review</h2>\n<p class=\"filters\">");
    for (kind, label) in [
        ("all", "All"),
        ("pass", "Correct"),
        ("fail", "Wrong"),
        ("skip", "Not attempted"),
    ] {
        html.push_str(&format!(
            "<button data-kind=\"{kind}\" onclick=\"showOutcome('{kind}')\">{label}</button>"
        ));
    }
    html.push_str("</p>\n<table id=\"review\">\n");
    html.push_str("<thead><tr><th>#</th><th>Question</th><th>Marks</th><th>Your Answer</th><th>Correct Answer</th><th>Outcome</th></tr></thead>\n<tbody>\n");
    for entry in build_review(exam, answers) {
        html.push_str(&review_row(&entry));
    }
    html.push_str("</tbody></table>\n</section>\n");

    html.push_str("<details>\n<summary>Stored report</summary>\n<pre>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</pre>\n</details>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

fn review_row(entry: &ReviewEntry) -> String {
    let (class, label) = match entry.outcome {
        Outcome::Correct => ("pass", "Correct"),
        Outcome::Wrong => ("fail", "Wrong"),
        Outcome::NotAttempted => ("skip", "Not attempted"),
    };
    let mut question = html_escape(&entry.text);
    if let Some(image) = &entry.image {
        question.push_str(&format!(
            "<br><img src=\"{}\" alt=\"\">",
            html_escape(image)
        ));
    }
    format!(
        "<tr class=\"{class}\"><td>{}</td><td>{question}</td><td>{}</td><td>{}</td><td>{}</td><td>{label}</td></tr>\n",
        entry.index + 1,
        entry.marks,
        html_escape(entry.submitted.as_deref().unwrap_or("-")),
        html_escape(&entry.correct_answer),
    )
}

/// Write the result page to a file.
pub fn write_html_report(
    report: &ExamReport,
    exam: &Exam,
    answers: &AnswerSheet,
    path: &Path,
) -> Result<()> {
    let html = generate_html(report, exam, answers);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
:root { --ink: #1f2937; --paper: #fafaf9; --rule: #d6d3d1; --ok: #d1fae5; --bad: #fee2e2; --blank: #f5f5f4; }
@media (prefers-color-scheme: dark) {
  :root { --ink: #e7e5e4; --paper: #1c1917; --rule: #44403c; --ok: #14532d; --bad: #7f1d1d; --blank: #292524; }
}
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1.5rem; background: var(--paper); color: var(--ink); }
header h1 { margin-bottom: 0.25rem; }
.meta { opacity: 0.7; }
section { margin-top: 2rem; }
table { border-collapse: collapse; width: 100%; }
table.summary { width: auto; min-width: 320px; }
th, td { border-bottom: 1px solid var(--rule); padding: 0.4rem 0.8rem; text-align: left; vertical-align: top; }
table.summary th { font-weight: 600; }
td.pass, tr.pass { background: var(--ok); }
td.fail, tr.fail { background: var(--bad); }
tr.skip { background: var(--blank); }
.filters button { margin-right: 0.5rem; padding: 0.25rem 0.75rem; border: 1px solid var(--rule); background: none; color: inherit; border-radius: 4px; cursor: pointer; }
.filters button.active { border-color: var(--ink); }
img { display: block; max-width: 320px; margin-top: 0.5rem; }
pre { overflow-x: auto; padding: 1rem; border: 1px solid var(--rule); font-size: 0.8rem; }
"#;

const JS: &str = r#"
function showOutcome(kind) {
  document.querySelectorAll('#review tbody tr').forEach(function (row) {
    row.style.display = kind === 'all' || row.classList.contains(kind) ? '' : 'none';
  });
  document.querySelectorAll('.filters button').forEach(function (button) {
    button.classList.toggle('active', button.dataset.kind === kind);
  });
}
"#;
