use tracing_subscriber::EnvFilter;

/// Structured JSON logging, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}

/// Register descriptions for the connector's metrics.
pub fn describe_metrics() {
    metrics::describe_counter!("tryon_submissions_total", "Try-on submissions by mode");
    metrics::describe_counter!(
        "tryon_outcomes_total",
        "Try-on outcomes by mode and result kind"
    );
    metrics::describe_counter!("tryon_poll_attempts_total", "Job status requests issued");
    metrics::describe_histogram!(
        "tryon_request_duration_seconds",
        "Time from submission to outcome"
    );
}
