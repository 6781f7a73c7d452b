//! Directory-backed report store.
//!
//! Each report is one `<uuid>.json` file. Writes go to a temporary file in
//! the same directory and are renamed into place, so readers never see a
//! partial report.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use examkit_core::error::StoreError;
use examkit_core::report::ExamReport;
use examkit_core::traits::ReportStore;

/// Stores reports as JSON files under one directory.
#[derive(Debug, Clone)]
pub struct FileReportStore {
    dir: PathBuf,
}

impl FileReportStore {
    /// Create the store, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create report directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn report_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

fn write_atomic(dir: &Path, target: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::Io(e.to_string()))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StoreError::Io(e.to_string()))?;
    tmp.persist(target)
        .map_err(|e| StoreError::Io(e.error.to_string()))?;
    Ok(())
}

fn read_all(dir: &Path) -> Result<Vec<ExamReport>, StoreError> {
    let entries = std::fs::read_dir(dir).map_err(|e| StoreError::Io(e.to_string()))?;
    let mut reports = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match ExamReport::load_json(&path) {
            Ok(report) => reports.push(report),
            Err(e) => warn!("skipping unreadable report {}: {e:#}", path.display()),
        }
    }
    Ok(reports)
}

#[async_trait]
impl ReportStore for FileReportStore {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(skip(self, report), fields(report = %report.id, user = %report.user_id))]
    async fn save(&self, report: &ExamReport) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(report).context("failed to serialize report")?;
        let dir = self.dir.clone();
        let target = self.report_path(report.id);

        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &json))
            .await
            .context("report writer task failed")??;

        debug!("report written");
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> anyhow::Result<Vec<ExamReport>> {
        let dir = self.dir.clone();
        let mut reports = tokio::task::spawn_blocking(move || read_all(&dir))
            .await
            .context("report reader task failed")??;

        reports.retain(|r| r.user_id == user_id);
        reports.sort_by_key(|r| r.created_at);
        Ok(reports)
    }

    async fn delete(&self, report_id: Uuid) -> anyhow::Result<()> {
        let path = self.report_path(report_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(report_id).into())
            }
            Err(e) => Err(StoreError::Io(e.to_string()).into()),
        }
    }
}
