//! Trait for the external report store.
//!
//! Implemented by the `examkit-store` crate.

use async_trait::async_trait;
use uuid::Uuid;

use crate::report::ExamReport;

/// Persistence for finished exam attempts.
///
/// Failures are returned as `anyhow::Error` wrapping a
/// [`StoreError`](crate::error::StoreError). Callers never retry
/// automatically; retry policy belongs to the store's owner.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Human-readable store name (e.g. "file").
    fn name(&self) -> &str;

    /// Persist one report.
    async fn save(&self, report: &ExamReport) -> anyhow::Result<()>;

    /// All reports of one user, oldest first.
    async fn list_by_user(&self, user_id: &str) -> anyhow::Result<Vec<ExamReport>>;

    /// Delete a report by id.
    async fn delete(&self, report_id: Uuid) -> anyhow::Result<()>;
}
