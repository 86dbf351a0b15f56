//! Fixed-interval status polling for submitted jobs.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectorConfig;
use crate::models::job::{JobHandle, JobStatus};
use crate::models::response::{ClassifiedPayload, RawResponse};
use crate::services::classifier::{classify_document, snippet};
use crate::services::extractor::extract_completed;
use crate::services::transport::Transport;

/// Interval and attempt budget for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSettings {
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.poll_max_attempts,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 40,
        }
    }
}

/// Polls one job's status endpoint until it reaches a terminal state.
pub struct JobPoller {
    transport: Arc<dyn Transport>,
    status_url: String,
    bearer: Option<String>,
    settings: PollSettings,
}

impl JobPoller {
    pub fn new(
        transport: Arc<dyn Transport>,
        status_url: String,
        bearer: Option<String>,
        settings: PollSettings,
    ) -> Self {
        Self {
            transport,
            status_url,
            bearer,
            settings,
        }
    }

    /// Poll until the job is terminal or the attempt budget runs out.
    ///
    /// Returns `None` if `cancel` fires first; no further requests are issued
    /// after that point.
    pub async fn run(&self, job: &JobHandle, cancel: &CancellationToken) -> Option<JobStatus> {
        let mut status = JobStatus::Pending;

        for attempt in 1..=self.settings.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(job_id = %job.job_id, attempt, "Polling cancelled");
                    return None;
                }
                _ = tokio::time::sleep(self.settings.interval) => {}
            }

            metrics::counter!("tryon_poll_attempts_total").increment(1);

            let observed = match self.poll_once(job, attempt).await {
                Some(observed) => observed,
                None => continue,
            };

            tracing::debug!(
                job_id = %job.job_id,
                attempt,
                status = observed.label(),
                "Job status observed"
            );

            status = match status.transition(observed) {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!(job_id = %job.job_id, error = %e, "Illegal job status transition");
                    return None;
                }
            };

            if status.is_terminal() {
                tracing::info!(
                    job_id = %job.job_id,
                    attempt,
                    status = status.label(),
                    elapsed_ms = job.age_ms(),
                    "Job reached terminal state"
                );
                return Some(status);
            }
        }

        tracing::warn!(
            job_id = %job.job_id,
            attempts = self.settings.max_attempts,
            "Job did not finish within the attempt budget"
        );
        match status.transition(JobStatus::TimedOut) {
            Ok(timed_out) => Some(timed_out),
            Err(_) => None,
        }
    }

    /// One status request. `None` means the attempt was inconclusive.
    async fn poll_once(&self, job: &JobHandle, attempt: u32) -> Option<JobStatus> {
        let response = match self.transport.get(&self.status_url, self.bearer.as_deref()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(job_id = %job.job_id, attempt, error = %e, "Status request failed, will retry");
                return None;
            }
        };

        match status_document(response) {
            Ok(document) => Some(interpret_status(&document)),
            Err(reason) => {
                tracing::warn!(job_id = %job.job_id, attempt, reason = %reason, "Unusable status response, will retry");
                None
            }
        }
    }
}

fn status_document(response: RawResponse) -> Result<Value, String> {
    if !response.is_success() {
        return Err(format!(
            "http status {}: {}",
            response.status,
            snippet(&response.body_text())
        ));
    }

    match classify_document(response) {
        ClassifiedPayload::Json(document) => Ok(document),
        ClassifiedPayload::Binary(body) => Err(format!("binary body of {} bytes", body.len())),
        ClassifiedPayload::HtmlError(text) => Err(format!("HTML page: {}", text)),
        ClassifiedPayload::Malformed(reason) => Err(reason),
    }
}

/// Map a status document onto a [`JobStatus`].
pub fn interpret_status(document: &Value) -> JobStatus {
    let status = document
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    match status.as_str() {
        "completed" | "success" => match extract_completed(document) {
            Some(reference) => JobStatus::Completed(reference),
            None => JobStatus::CompletedWithoutResult(snippet(&document.to_string())),
        },
        "failed" | "error" => JobStatus::Failed(failure_message(document)),
        "processing" | "running" | "in_progress" => JobStatus::Processing,
        _ => JobStatus::Pending,
    }
}

fn failure_message(document: &Value) -> String {
    let text = |value: &Value| {
        value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    document
        .get("message")
        .and_then(text)
        .or_else(|| document.get("error").and_then(text))
        .or_else(|| {
            document
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(text)
        })
        .unwrap_or_else(|| "unknown error".to_string())
}
