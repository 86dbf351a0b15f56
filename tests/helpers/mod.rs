//! Test helper utilities shared by the flow tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tryon_connector::models::response::RawResponse;
use tryon_connector::services::transport::{MultipartForm, Transport, TransportError};
use tryon_connector::{CallerContext, ConnectorConfig, ImagePart, ResultOutcome, UploadRequest};

use crate::fixtures::{GARMENT_BYTES, PERSON_BYTES};

/// Config pointed at a mock server, with fast polling.
pub fn mock_config(base_url: &str, scratch_dir: &Path) -> ConnectorConfig {
    ConnectorConfig {
        sync_endpoint: format!("{}/tryon", base_url),
        async_submit_url: format!("{}/api/v1/tryon", base_url),
        async_status_url: format!("{}/api/v1/tryon/status/{{job_id}}", base_url),
        api_token: None,
        request_timeout_secs: 5,
        connect_timeout_secs: 1,
        poll_interval_ms: 5,
        poll_max_attempts: 40,
        scratch_dir: scratch_dir.to_path_buf(),
    }
}

pub fn person() -> ImagePart {
    ImagePart::new("person.png", PERSON_BYTES.to_vec())
}

pub fn garment() -> ImagePart {
    ImagePart::new("garment.png", GARMENT_BYTES.to_vec())
}

pub fn file_request() -> UploadRequest {
    UploadRequest::with_outfit_image(person(), garment())
}

/// Collects delivered outcomes in callback order.
#[derive(Clone, Default)]
pub struct OutcomeLog {
    entries: Arc<Mutex<Vec<(usize, ResultOutcome)>>>,
}

impl OutcomeLog {
    pub fn callback(&self, tag: usize) -> impl FnOnce(ResultOutcome) + Send + 'static {
        let entries = self.entries.clone();
        move |outcome: ResultOutcome| entries.lock().unwrap().push((tag, outcome))
    }

    pub fn entries(&self) -> Vec<(usize, ResultOutcome)> {
        self.entries.lock().unwrap().clone()
    }
}

/// Dispatch exactly one delivery on `context` and return the outcome it carried.
pub async fn next_outcome(context: &mut CallerContext, log: &OutcomeLog) -> ResultOutcome {
    tokio::time::timeout(Duration::from_secs(10), context.dispatch_next())
        .await
        .expect("timed out waiting for a result")
        .expect("context torn down");
    log.entries().last().cloned().expect("callback did not run").1
}

/// In-memory transport answering each POST after a delay derived from the
/// uploaded person file name (`person-<n>.png` waits `(total - n) * step`),
/// so later submissions complete first.
pub struct ReverseOrderTransport {
    pub total: usize,
    pub step: Duration,
    pub posts: AtomicUsize,
}

impl ReverseOrderTransport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            step: Duration::from_millis(15),
            posts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transport for ReverseOrderTransport {
    async fn post_multipart(
        &self,
        _url: &str,
        form: MultipartForm,
        _bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        self.posts.fetch_add(1, Ordering::SeqCst);

        let index = match form.part("user_image") {
            Some(tryon_connector::services::transport::FormPart::File { file_name, .. }) => file_name
                .trim_start_matches("person-")
                .trim_end_matches(".png")
                .parse::<usize>()
                .map_err(|e| TransportError::Request(e.to_string()))?,
            _ => return Err(TransportError::Request("missing user_image".into())),
        };

        tokio::time::sleep(self.step * (self.total - index) as u32).await;

        let body = format!(r#"{{"result_url": "https://cdn.test/result-{}.png"}}"#, index);
        Ok(RawResponse::new(200, Some("application/json"), body.into_bytes()))
    }

    async fn get(&self, _url: &str, _bearer: Option<&str>) -> Result<RawResponse, TransportError> {
        Err(TransportError::Request("no status endpoint".into()))
    }
}

/// Transport that never answers; used to observe cancellation.
pub struct HangingTransport {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Transport for HangingTransport {
    async fn post_multipart(
        &self,
        _url: &str,
        _form: MultipartForm,
        _bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn get(&self, _url: &str, _bearer: Option<&str>) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// In-memory job service whose bodies are JSON but carry no content type.
/// Records every status URL it is asked for.
pub struct UnlabelledJsonTransport {
    pub submit_body: String,
    pub status_body: String,
    pub status_urls: Mutex<Vec<String>>,
}

impl UnlabelledJsonTransport {
    pub fn new(submit: serde_json::Value, status: serde_json::Value) -> Self {
        Self {
            submit_body: submit.to_string(),
            status_body: status.to_string(),
            status_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn status_urls(&self) -> Vec<String> {
        self.status_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for UnlabelledJsonTransport {
    async fn post_multipart(
        &self,
        _url: &str,
        _form: MultipartForm,
        _bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(200, None, self.submit_body.clone().into_bytes()))
    }

    async fn get(&self, url: &str, _bearer: Option<&str>) -> Result<RawResponse, TransportError> {
        self.status_urls.lock().unwrap().push(url.to_string());
        Ok(RawResponse::new(200, None, self.status_body.clone().into_bytes()))
    }
}
