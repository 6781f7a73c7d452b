//! The `examkit score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examkit_core::parser::{parse_answer_sheet, parse_exam};
use examkit_core::report::ExamReport;
use examkit_core::scoring::score_exam;
use examkit_report::html::write_html_report;
use examkit_store::config::load_config_from;
use examkit_store::create_store;

use crate::render;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    exam_path: PathBuf,
    answers_path: PathBuf,
    user: Option<String>,
    save: bool,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let exam = parse_exam(&exam_path)?;
    let answers = parse_answer_sheet(&answers_path)?;
    let user = super::resolve_user(user, &config);

    let result = score_exam(&exam, &answers);
    let report = ExamReport::new(&exam, &user, result);

    match format.as_str() {
        "json" => match &output {
            Some(path) => {
                report.save_json(path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            None => println!("{}", serde_json::to_string_pretty(&report)?),
        },
        "html" => {
            let path = output.clone().unwrap_or_else(|| {
                let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
                config
                    .output_dir
                    .join(format!("result-{}-{timestamp}.html", exam.id))
            });
            write_html_report(&report, &exam, &answers, &path)?;
            println!("HTML report: {}", path.display());
        }
        "text" => {
            println!("Exam: {} ({} questions)", exam.name, exam.question_count());
            println!("Candidate: {user}");
            render::print_result(&exam, &report.result);
        }
        other => anyhow::bail!("unknown format: {other} (expected text, json or html)"),
    }

    if save {
        let store = create_store(&config.store).context("failed to open report store")?;
        match store.save(&report).await {
            Ok(()) => eprintln!("Saved report {} to {} store", report.id, store.name()),
            // The score stands even when it could not be stored.
            Err(e) => eprintln!("Warning: result not saved: {e:#}"),
        }
    }

    Ok(())
}
