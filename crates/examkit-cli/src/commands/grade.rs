//! The `examkit grade` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use examkit_core::model::Exam;
use examkit_core::parser::{parse_answer_sheet, parse_exam};
use examkit_core::report::ExamReport;
use examkit_core::scoring::score_exam;
use examkit_core::statistics::compute_cohort_stats;
use examkit_core::traits::ReportStore;
use examkit_store::config::load_config_from;
use examkit_store::create_store;

use crate::render;

/// One scored sheet.
struct GradedSheet {
    user: String,
    report: ExamReport,
    persisted: bool,
}

pub async fn execute(
    exam_path: PathBuf,
    answers_dir: PathBuf,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let exam = Arc::new(parse_exam(&exam_path)?);
    let store = create_store(&config.store).context("failed to open report store")?;
    let parallelism = parallelism.unwrap_or(config.parallelism).max(1);

    let sheets = answer_sheets(&answers_dir)?;
    if sheets.is_empty() {
        anyhow::bail!("no answer sheets (*.json) found in {}", answers_dir.display());
    }

    eprintln!(
        "Grading {} sheet(s) for {} ({} at a time)",
        sheets.len(),
        exam.name,
        parallelism
    );
    let start = Instant::now();

    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut pending = FuturesUnordered::new();
    for path in sheets {
        let exam = Arc::clone(&exam);
        let store = Arc::clone(&store);
        let semaphore = Arc::clone(&semaphore);
        pending.push(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => grade_sheet(&exam, store.as_ref(), &path).await,
                Err(e) => Err(anyhow::anyhow!("semaphore closed: {e}")),
            };
            (path, outcome)
        });
    }

    let mut graded = Vec::new();
    let mut failed = 0;
    while let Some((path, outcome)) = pending.next().await {
        match outcome {
            Ok(sheet) => graded.push(sheet),
            Err(e) => {
                eprintln!("  ERROR: {}: {e:#}", path.display());
                failed += 1;
            }
        }
    }
    graded.sort_by(|a, b| a.user.cmp(&b.user));

    let mut table = Table::new();
    table.set_header(vec![
        "User",
        "Obtained Marks",
        "Final Score",
        "Correct",
        "Wrong",
        "Verdict",
        "Saved",
    ]);
    for sheet in &graded {
        let result = &sheet.report.result;
        table.add_row(vec![
            Cell::new(&sheet.user),
            Cell::new(result.display_marks()),
            Cell::new(format!("{:.2}", result.obtained_marks)),
            Cell::new(result.correct_answers.len()),
            Cell::new(result.wrong_answers.len()),
            Cell::new(result.verdict),
            Cell::new(if sheet.persisted { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");

    let results: Vec<_> = graded.iter().map(|s| s.report.result.clone()).collect();
    let stats = compute_cohort_stats(&results);
    println!("{}", render::cohort_table(&stats));
    println!("{}", render::tier_table(&stats));

    let unsaved = graded.iter().filter(|s| !s.persisted).count();
    info!(
        graded = graded.len(),
        failed,
        unsaved,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "grading complete"
    );
    eprintln!(
        "\nComplete: {}/{} graded, {failed} failed, {unsaved} not saved ({:.1}s)",
        graded.len(),
        graded.len() + failed,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Every `*.json` file directly inside `dir`, sorted by name.
fn answer_sheets(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sheets = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
            sheets.push(path);
        }
    }
    sheets.sort();
    Ok(sheets)
}

async fn grade_sheet(exam: &Exam, store: &dyn ReportStore, path: &Path) -> Result<GradedSheet> {
    let user = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("answer sheet name is not valid UTF-8")?
        .to_string();
    let answers = parse_answer_sheet(path)?;
    let report = ExamReport::new(exam, &user, score_exam(exam, &answers));

    let persisted = match store.save(&report).await {
        Ok(()) => true,
        Err(e) => {
            warn!(user = %user, store = store.name(), "failed to save report: {e:#}");
            false
        }
    };

    Ok(GradedSheet {
        user,
        report,
        persisted,
    })
}
