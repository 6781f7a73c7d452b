//! The `examkit reports` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use uuid::Uuid;

use examkit_store::config::load_config_from;
use examkit_store::create_store;

pub async fn execute(user: String, delete: Option<Uuid>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = create_store(&config.store).context("failed to open report store")?;

    if let Some(id) = delete {
        store
            .delete(id)
            .await
            .with_context(|| format!("failed to delete report {id}"))?;
        println!("Deleted report {id}");
        return Ok(());
    }

    let reports = store
        .list_by_user(&user)
        .await
        .with_context(|| format!("failed to list reports for {user}"))?;

    if reports.is_empty() {
        println!("No reports for {user} in the {} store.", store.name());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Exam", "Date", "Obtained Marks", "Verdict"]);
    for report in &reports {
        table.add_row(vec![
            Cell::new(report.id),
            Cell::new(&report.exam_name),
            Cell::new(report.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(report.result.display_marks()),
            Cell::new(report.result.verdict),
        ]);
    }
    println!("{table}");
    println!("{} report(s) for {user}", reports.len());

    Ok(())
}
