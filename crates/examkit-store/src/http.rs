//! Remote reports API store.
//!
//! Talks to a `/api/reports` service that wraps every response in a
//! `{ success, message, data }` envelope.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use examkit_core::error::StoreError;
use examkit_core::report::ExamReport;
use examkit_core::results::ScoreResult;
use examkit_core::traits::ReportStore;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Report store backed by a remote reports API.
pub struct HttpReportStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpReportStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/api/reports/{}", self.base_url, route)
    }

    /// POST `body` to `route` and unwrap the response envelope.
    async fn call<B, T>(&self, route: &str, body: &B) -> Result<Option<T>, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(route)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else if e.is_connect() {
                StoreError::Network(format!("reports API not reachable at {}", self.base_url))
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            // Error bodies usually still carry the envelope.
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .map(|env| env.message)
                .unwrap_or(body);
            return Err(StoreError::Api { status, message });
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| StoreError::Api {
            status,
            message: format!("failed to parse response: {e}"),
        })?;

        if !envelope.success {
            return Err(StoreError::Rejected(envelope.message));
        }
        Ok(envelope.data)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddReportRequest<'a> {
    id: Uuid,
    exam: &'a str,
    exam_name: &'a str,
    user: &'a str,
    result: &'a ScoreResult,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
    report_id: Uuid,
}

/// A reference that the API returns either as a bare id or populated.
#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteRef {
    Id(String),
    Populated {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        name: String,
    },
}

impl RemoteRef {
    fn id(&self) -> &str {
        match self {
            RemoteRef::Id(id) => id,
            RemoteRef::Populated { id, .. } => id,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            RemoteRef::Id(_) => None,
            RemoteRef::Populated { name, .. } => Some(name),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteReport {
    #[serde(alias = "_id")]
    id: String,
    exam: RemoteRef,
    #[serde(default)]
    exam_name: Option<String>,
    user: RemoteRef,
    result: ScoreResult,
    created_at: DateTime<Utc>,
}

impl RemoteReport {
    fn into_report(self) -> Option<ExamReport> {
        let Ok(id) = Uuid::parse_str(&self.id) else {
            warn!(id = %self.id, "skipping remote report without a UUID id");
            return None;
        };
        let exam_name = self
            .exam_name
            .or_else(|| self.exam.name().map(str::to_string))
            .unwrap_or_default();
        Some(ExamReport {
            id,
            exam_id: self.exam.id().to_string(),
            exam_name,
            user_id: self.user.id().to_string(),
            result: self.result,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl ReportStore for HttpReportStore {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, report), fields(report = %report.id, user = %report.user_id))]
    async fn save(&self, report: &ExamReport) -> anyhow::Result<()> {
        let body = AddReportRequest {
            id: report.id,
            exam: &report.exam_id,
            exam_name: &report.exam_name,
            user: &report.user_id,
            result: &report.result,
            created_at: report.created_at,
        };
        self.call::<_, serde_json::Value>("add-report", &body)
            .await?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> anyhow::Result<Vec<ExamReport>> {
        let data: Option<Vec<RemoteReport>> = self
            .call("get-all-reports-by-user", &UserQuery { user_id })
            .await?;

        let mut reports: Vec<ExamReport> = data
            .unwrap_or_default()
            .into_iter()
            .filter_map(RemoteReport::into_report)
            .filter(|r| r.user_id == user_id)
            .collect();
        reports.sort_by_key(|r| r.created_at);
        Ok(reports)
    }

    async fn delete(&self, report_id: Uuid) -> anyhow::Result<()> {
        match self
            .call::<_, serde_json::Value>("delete-report", &DeleteRequest { report_id })
            .await
        {
            Ok(_) => Ok(()),
            Err(StoreError::Api { status: 404, .. }) => Err(StoreError::NotFound(report_id).into()),
            Err(e) => Err(e.into()),
        }
    }
}
