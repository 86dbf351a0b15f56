use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{Handle, TryCurrentError};

use crate::config::ConnectorConfig;
use crate::models::outcome::ResultOutcome;
use crate::models::request::UploadRequest;
use crate::services::{
    async_job::AsyncJobHandler,
    dispatch::{ContextHandle, PendingCallback, RequestId},
    storage::ScratchStore,
    sync_job::SyncJobHandler,
    transport::{HttpTransport, Transport, TransportError},
};

/// Shared entry point for try-on submissions.
///
/// One transport (and its connection pool) serves every submission and poll.
/// Each submission runs on its own task; its outcome comes back through the
/// [`ContextHandle`] it was submitted with.
///
/// Tasks are spawned on the Tokio runtime the connector was built in, so
/// submitting does not itself need to happen inside a runtime.
#[derive(Clone)]
pub struct TryOnConnector {
    runtime: Handle,
    sync_jobs: SyncJobHandler,
    async_jobs: AsyncJobHandler,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("connector must be built inside a Tokio runtime: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

impl TryOnConnector {
    pub fn new(config: ConnectorConfig) -> Result<Self, ConnectorError> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: ConnectorConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConnectorError> {
        let runtime = Handle::try_current()?;
        let store = Arc::new(ScratchStore::new(config.scratch_dir.clone()));
        let config = Arc::new(config);

        Ok(Self {
            runtime,
            sync_jobs: SyncJobHandler::new(transport.clone(), &config, store),
            async_jobs: AsyncJobHandler::new(transport, config),
        })
    }

    /// Single-call try-on. `callback` runs once, on the context behind `context`.
    pub fn submit_sync<F>(&self, context: &ContextHandle, request: UploadRequest, callback: F) -> RequestId
    where
        F: FnOnce(ResultOutcome) + Send + 'static,
    {
        let pending = context.register(callback);
        let request_id = pending.request_id();
        let handler = self.sync_jobs.clone();

        metrics::counter!("tryon_submissions_total", "mode" => "sync").increment(1);
        tracing::debug!(request_id = %request_id, "Queued synchronous try-on");

        self.runtime.spawn(async move {
            let cancel = pending.cancellation();
            let started = Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(request_id = %request_id, "Context torn down, abandoning request");
                    return;
                }
                outcome = handler.run(&request) => outcome,
            };
            finish(pending, "sync", started, outcome);
        });

        request_id
    }

    /// Submit-then-poll try-on. `callback` runs once, on the context behind `context`.
    pub fn submit_async<F>(&self, context: &ContextHandle, request: UploadRequest, callback: F) -> RequestId
    where
        F: FnOnce(ResultOutcome) + Send + 'static,
    {
        let pending = context.register(callback);
        let request_id = pending.request_id();
        let handler = self.async_jobs.clone();

        metrics::counter!("tryon_submissions_total", "mode" => "async").increment(1);
        tracing::debug!(request_id = %request_id, "Queued try-on job");

        self.runtime.spawn(async move {
            let cancel = pending.cancellation();
            let started = Instant::now();
            match handler.run(&request, &cancel).await {
                Some(outcome) => finish(pending, "async", started, outcome),
                None => {
                    tracing::debug!(request_id = %request_id, "Context torn down, abandoning job")
                }
            }
        });

        request_id
    }
}

fn finish(pending: PendingCallback, mode: &'static str, started: Instant, outcome: ResultOutcome) {
    let request_id = pending.request_id();

    metrics::histogram!("tryon_request_duration_seconds", "mode" => mode)
        .record(started.elapsed().as_secs_f64());
    metrics::counter!("tryon_outcomes_total", "mode" => mode, "result" => outcome.label())
        .increment(1);

    match &outcome {
        ResultOutcome::Success(reference) => {
            tracing::info!(request_id = %request_id, mode, reference = %reference, "Try-on succeeded")
        }
        ResultOutcome::Failure { kind, message } => {
            tracing::warn!(request_id = %request_id, mode, kind = %kind, error = %message, "Try-on failed")
        }
    }

    pending.complete(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outcome::FailureKind;
    use crate::models::request::ImagePart;
    use crate::models::response::RawResponse;
    use crate::services::dispatch::CallerContext;
    use crate::services::transport::MultipartForm;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RefusingTransport;

    #[async_trait]
    impl Transport for RefusingTransport {
        async fn post_multipart(
            &self,
            _url: &str,
            _form: MultipartForm,
            _bearer: Option<&str>,
        ) -> Result<RawResponse, TransportError> {
            Err(TransportError::Connect("connection refused".into()))
        }

        async fn get(&self, _url: &str, _bearer: Option<&str>) -> Result<RawResponse, TransportError> {
            Err(TransportError::Connect("connection refused".into()))
        }
    }

    fn request() -> UploadRequest {
        UploadRequest::with_outfit_image(
            ImagePart::new("person.png", vec![1, 2, 3]),
            ImagePart::new("garment.png", vec![4, 5, 6]),
        )
    }

    #[test]
    fn test_building_outside_runtime_is_an_error() {
        let result = TryOnConnector::with_transport(ConnectorConfig::default(), Arc::new(RefusingTransport));
        assert!(matches!(result, Err(ConnectorError::NoRuntime(_))));
    }

    #[test]
    fn test_submit_from_plain_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let connector = {
            let _guard = runtime.enter();
            TryOnConnector::with_transport(ConnectorConfig::default(), Arc::new(RefusingTransport)).unwrap()
        };

        let mut context = CallerContext::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let id = connector.submit_sync(&context.handle(), request(), move |outcome: ResultOutcome| {
            *sink.lock().unwrap() = Some(outcome);
        });

        assert_eq!(runtime.block_on(context.dispatch_next()), Some(id));
        let outcome = seen.lock().unwrap().take().unwrap();
        assert_eq!(outcome.failure_kind(), Some(FailureKind::NetworkError));
    }
}
