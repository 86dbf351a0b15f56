use chrono::{DateTime, Utc};
use strum::IntoStaticStr;

/// A server-side job accepted by the async endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub created_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            created_at: Utc::now(),
        }
    }

    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.created_at).num_milliseconds()
    }
}

/// Status of a polled job.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed(String),
    /// Reported complete, but no usable result reference could be found.
    /// Carries a bounded snippet of the status body.
    CompletedWithoutResult(String),
    Failed(String),
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    pub fn label(&self) -> &'static str {
        self.into()
    }

    /// Move to `next`. Terminal states never change.
    pub fn transition(self, next: JobStatus) -> Result<JobStatus, JobStatusError> {
        if self.is_terminal() {
            return Err(JobStatusError::AlreadyTerminal {
                current: self.label(),
                requested: next.label(),
            });
        }
        Ok(next)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JobStatusError {
    #[error("job already terminal ({current}), cannot move to {requested}")]
    AlreadyTerminal {
        current: &'static str,
        requested: &'static str,
    },
}
