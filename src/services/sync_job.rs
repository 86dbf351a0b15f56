use std::sync::Arc;

use crate::config::ConnectorConfig;
use crate::models::outcome::{ResultOutcome, TryOnError};
use crate::models::request::{OutfitSource, UploadRequest};
use crate::models::response::{ClassifiedPayload, RawResponse};
use crate::services::classifier::{classify, ensure_success, snippet};
use crate::services::extractor::extract;
use crate::services::storage::ScratchStore;
use crate::services::transport::{MultipartForm, Transport};
use crate::services::validation::check_request;

/// Single request/response try-on: one POST, answered with JSON or image bytes.
#[derive(Clone)]
pub struct SyncJobHandler {
    transport: Arc<dyn Transport>,
    endpoint: String,
    default_bearer: Option<String>,
    store: Arc<ScratchStore>,
}

impl SyncJobHandler {
    pub fn new(transport: Arc<dyn Transport>, config: &ConnectorConfig, store: Arc<ScratchStore>) -> Self {
        Self {
            transport,
            endpoint: config.sync_endpoint.clone(),
            default_bearer: config.bearer().map(str::to_string),
            store,
        }
    }

    pub async fn run(&self, request: &UploadRequest) -> ResultOutcome {
        self.execute(request).await.into()
    }

    async fn execute(&self, request: &UploadRequest) -> Result<String, TryOnError> {
        check_request(request)?;

        let bearer = request.bearer().or(self.default_bearer.as_deref());
        let form = build_form(request);

        tracing::info!(
            endpoint = %self.endpoint,
            person = %request.person.file_name,
            remote_outfit = matches!(request.outfit, OutfitSource::Remote(_)),
            "Submitting try-on request"
        );

        let response = self
            .transport
            .post_multipart(&self.endpoint, form, bearer)
            .await?;

        resolve_response(response, &self.store).await
    }
}

/// Multipart body for the single-call endpoint.
pub fn build_form(request: &UploadRequest) -> MultipartForm {
    let form = MultipartForm::new().file("user_image", &request.person);

    let form = match &request.outfit {
        OutfitSource::Image(outfit) => form.file("outfit_image", outfit),
        OutfitSource::Remote(reference) => form.text("outfit_image_url", reference.trim()),
    };

    request
        .extra_fields
        .iter()
        .fold(form.text("preserve_color", "true"), |form, (name, value)| {
            form.text(name.as_str(), value.as_str())
        })
}

async fn resolve_response(response: RawResponse, store: &ScratchStore) -> Result<String, TryOnError> {
    ensure_success(&response)?;

    tracing::debug!(
        status = response.status,
        content_type = response.content_type.as_deref().unwrap_or(""),
        size = response.body.len(),
        "Try-on response received"
    );

    match classify(response) {
        ClassifiedPayload::Json(document) => match extract(&document) {
            Some(reference) => {
                tracing::info!(reference = %reference, "Result url found");
                Ok(reference)
            }
            None => Err(TryOnError::NoUrlFound(snippet(&document.to_string()))),
        },
        ClassifiedPayload::Binary(body) if body.is_empty() => {
            Err(TryOnError::Malformed("empty response body".to_string()))
        }
        ClassifiedPayload::Binary(body) => {
            let reference = store.persist(&body).await?;
            tracing::info!(reference = %reference, "Binary result saved");
            Ok(reference)
        }
        ClassifiedPayload::HtmlError(text) => Err(TryOnError::Html(text)),
        ClassifiedPayload::Malformed(reason) => Err(TryOnError::Malformed(reason)),
    }
}
