//! Submit-then-poll try-on: `Submitting -> Polling -> {Completed, Failed, TimedOut}`.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectorConfig;
use crate::models::job::{JobHandle, JobStatus};
use crate::models::outcome::{ResultOutcome, TryOnError};
use crate::models::request::{ImagePart, OutfitSource, UploadRequest};
use crate::models::response::ClassifiedPayload;
use crate::services::classifier::{classify_document, ensure_success, snippet};
use crate::services::extractor::extract_job_id;
use crate::services::poller::{JobPoller, PollSettings};
use crate::services::transport::{MultipartForm, Transport};
use crate::services::validation::check_request;

#[derive(Clone)]
pub struct AsyncJobHandler {
    transport: Arc<dyn Transport>,
    config: Arc<ConnectorConfig>,
    settings: PollSettings,
}

/// An accepted submission, ready to be polled.
struct Submission {
    job: JobHandle,
    bearer: String,
}

impl AsyncJobHandler {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<ConnectorConfig>) -> Self {
        let settings = PollSettings::from_config(&config);
        Self {
            transport,
            config,
            settings,
        }
    }

    /// Submit and poll to completion. `None` means `cancel` fired first and no
    /// outcome should be delivered.
    pub async fn run(&self, request: &UploadRequest, cancel: &CancellationToken) -> Option<ResultOutcome> {
        let submission = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            submitted = self.submit(request) => submitted,
        };

        let Submission { job, bearer } = match submission {
            Ok(submission) => submission,
            Err(e) => {
                tracing::warn!(error = %e, "Job submission failed");
                return Some(e.into());
            }
        };

        tracing::info!(job_id = %job.job_id, "Job accepted, polling for status");

        let status_url = match self.config.status_url(&job.job_id) {
            Ok(url) => url,
            Err(e) => return Some(TryOnError::InvalidRequest(e.to_string()).into()),
        };
        let poller = JobPoller::new(self.transport.clone(), status_url, Some(bearer), self.settings);

        let status = poller.run(&job, cancel).await?;
        Some(status_result(status, self.settings.max_attempts).into())
    }

    async fn submit(&self, request: &UploadRequest) -> Result<Submission, TryOnError> {
        check_request(request)?;

        let garment = match &request.outfit {
            OutfitSource::Image(garment) => garment,
            OutfitSource::Remote(_) => {
                return Err(TryOnError::InvalidRequest(
                    "job submission requires the garment as an uploaded image".to_string(),
                ))
            }
        };

        let bearer = request
            .bearer()
            .or(self.config.bearer())
            .map(str::to_string)
            .ok_or_else(|| {
                TryOnError::InvalidRequest("job submission requires a bearer token".to_string())
            })?;

        tracing::info!(
            endpoint = %self.config.async_submit_url,
            person = %request.person.file_name,
            garment = %garment.file_name,
            "Submitting try-on job"
        );

        let form = build_form(request, garment);
        let response = self
            .transport
            .post_multipart(&self.config.async_submit_url, form, Some(&bearer))
            .await?;

        ensure_success(&response)?;

        let job = match classify_document(response) {
            ClassifiedPayload::Json(document) => extract_job_id(&document)
                .map(JobHandle::new)
                .ok_or_else(|| TryOnError::NoJobId(snippet(&document.to_string())))?,
            ClassifiedPayload::Binary(body) => {
                return Err(TryOnError::Malformed(format!(
                    "expected a JSON job receipt, got {} bytes of binary data",
                    body.len()
                )))
            }
            ClassifiedPayload::HtmlError(text) => return Err(TryOnError::Html(text)),
            ClassifiedPayload::Malformed(reason) => return Err(TryOnError::Malformed(reason)),
        };

        Ok(Submission { job, bearer })
    }
}

/// Multipart body for the job submission endpoint.
pub fn build_form(request: &UploadRequest, garment: &ImagePart) -> MultipartForm {
    let form = MultipartForm::new()
        .file("person_images", &request.person)
        .file("garment_images", garment);

    request
        .extra_fields
        .iter()
        .fold(form, |form, (name, value)| form.text(name.as_str(), value.as_str()))
}

/// Final result for a terminal job status.
fn status_result(status: JobStatus, max_attempts: u32) -> Result<String, TryOnError> {
    match status {
        JobStatus::Completed(reference) => Ok(reference),
        JobStatus::CompletedWithoutResult(body) => Err(TryOnError::CompletedButNoUrl(body)),
        JobStatus::Failed(message) => Err(TryOnError::JobFailed(message)),
        JobStatus::TimedOut | JobStatus::Pending | JobStatus::Processing => Err(TryOnError::Timeout {
            attempts: max_attempts,
        }),
    }
}
