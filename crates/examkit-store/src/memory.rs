//! In-process report store for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use examkit_core::error::StoreError;
use examkit_core::report::ExamReport;
use examkit_core::traits::ReportStore;

/// Keeps reports in memory. Can be told to reject every save, to exercise
/// persistence-failure handling without a real backend.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<ExamReport>>,
    /// Message returned for every save when set.
    fail_with: Option<String>,
    /// Number of save calls, successful or not.
    save_count: AtomicU32,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose saves always fail with [`StoreError::Rejected`].
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::Relaxed)
    }

    /// Snapshot of every stored report, in insertion order.
    pub fn reports(&self) -> Vec<ExamReport> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ExamReport>> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, report: &ExamReport) -> anyhow::Result<()> {
        self.save_count.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = &self.fail_with {
            return Err(StoreError::Rejected(message.clone()).into());
        }
        self.lock().push(report.clone());
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> anyhow::Result<Vec<ExamReport>> {
        let mut reports: Vec<ExamReport> = self
            .lock()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by_key(|r| r.created_at);
        Ok(reports)
    }

    async fn delete(&self, report_id: Uuid) -> anyhow::Result<()> {
        let mut reports = self.lock();
        let before = reports.len();
        reports.retain(|r| r.id != report_id);
        if reports.len() == before {
            return Err(StoreError::NotFound(report_id).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::model::{AnswerSheet, Exam};
    use examkit_core::scoring::score_exam;

    fn report(user: &str) -> ExamReport {
        let exam = Exam {
            id: "e".into(),
            name: "E".into(),
            category: None,
            duration_secs: 1,
            total_marks: 0.0,
            passing_marks: 0.0,
            questions: vec![],
        };
        ExamReport::new(&exam, user, score_exam(&exam, &AnswerSheet::new()))
    }

    #[tokio::test]
    async fn save_list_delete() {
        let store = MemoryReportStore::new();
        let a = report("alice");
        store.save(&a).await.unwrap();
        store.save(&report("bob")).await.unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.list_by_user("alice").await.unwrap(), vec![a.clone()]);

        store.delete(a.id).await.unwrap();
        assert!(store.list_by_user("alice").await.unwrap().is_empty());
        assert!(store.delete(a.id).await.is_err());
        assert_eq!(store.reports().len(), 1);
    }

    #[tokio::test]
    async fn failing_store_counts_attempts() {
        let store = MemoryReportStore::failing("offline");
        let err = store.save(&report("alice")).await.unwrap_err();
        assert_eq!(err.to_string(), "report rejected: offline");
        assert_eq!(store.save_count(), 1);
        assert!(store.reports().is_empty());
    }
}
