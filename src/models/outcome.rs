use strum::{Display, IntoStaticStr};

use crate::services::storage::StorageError;
use crate::services::transport::TransportError;

/// Category of a failed request, as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    NetworkError,
    HttpError { status: u16 },
    HtmlResponse,
    MalformedResponse,
    NoUrlFound,
    NoJobId,
    CompletedButNoUrl,
    JobFailed,
    Timeout,
    StorageError,
    InvalidRequest,
}

/// The single value handed back to a caller for each submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOutcome {
    /// A remote URL or a `file://` reference to a locally written result.
    Success(String),
    Failure { kind: FailureKind, message: String },
}

impl ResultOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultOutcome::Success(_))
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            ResultOutcome::Success(reference) => Some(reference),
            ResultOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ResultOutcome::Success(_) => None,
            ResultOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ResultOutcome::Success(_) => "success",
            ResultOutcome::Failure { kind, .. } => kind.into(),
        }
    }
}

impl From<Result<String, TryOnError>> for ResultOutcome {
    fn from(result: Result<String, TryOnError>) -> Self {
        match result {
            Ok(reference) => ResultOutcome::Success(reference),
            Err(e) => e.into(),
        }
    }
}

impl From<TryOnError> for ResultOutcome {
    fn from(error: TryOnError) -> Self {
        ResultOutcome::Failure {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Everything that can end a try-on request early.
#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    #[error("http status {status}{}", with_body(.snippet))]
    Http { status: u16, snippet: String },

    #[error("unexpected HTML response from server: {0}")]
    Html(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no url field found in response: {0}")]
    NoUrlFound(String),

    #[error("no job id in submit response: {0}")]
    NoJobId(String),

    #[error("job completed but returned no result url: {0}")]
    CompletedButNoUrl(String),

    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("job did not finish within {attempts} poll attempts")]
    Timeout { attempts: u32 },

    #[error("failed to save binary response: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn with_body(snippet: &str) -> String {
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {}", snippet)
    }
}

impl TryOnError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TryOnError::Network(_) => FailureKind::NetworkError,
            TryOnError::Http { status, .. } => FailureKind::HttpError { status: *status },
            TryOnError::Html(_) => FailureKind::HtmlResponse,
            TryOnError::Malformed(_) => FailureKind::MalformedResponse,
            TryOnError::NoUrlFound(_) => FailureKind::NoUrlFound,
            TryOnError::NoJobId(_) => FailureKind::NoJobId,
            TryOnError::CompletedButNoUrl(_) => FailureKind::CompletedButNoUrl,
            TryOnError::JobFailed(_) => FailureKind::JobFailed,
            TryOnError::Timeout { .. } => FailureKind::Timeout,
            TryOnError::Storage(_) => FailureKind::StorageError,
            TryOnError::InvalidRequest(_) => FailureKind::InvalidRequest,
        }
    }
}
