//! The persisted record of one exam attempt.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Exam;
use crate::results::ScoreResult;

/// What gets handed to the report store once an attempt reaches its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamReport {
    /// Unique report identifier.
    pub id: Uuid,
    pub exam_id: String,
    /// Exam name at the time of the attempt, for listings.
    #[serde(default)]
    pub exam_name: String,
    /// Opaque identity token supplied by the caller.
    pub user_id: String,
    pub result: ScoreResult,
    pub created_at: DateTime<Utc>,
}

impl ExamReport {
    pub fn new(exam: &Exam, user_id: &str, result: ScoreResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            exam_id: exam.id.clone(),
            exam_name: exam.name.clone(),
            user_id: user_id.to_string(),
            result,
            created_at: Utc::now(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExamReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
