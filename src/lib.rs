//! Virtual try-on connector
//!
//! Client for third-party try-on image services. Supports a single
//! request/response call (JSON or raw image bytes back) and a submit-then-poll
//! job workflow, normalizing the many response shapes those services produce
//! into one [`ResultOutcome`](models::outcome::ResultOutcome).

pub mod config;
pub mod connector;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::ConnectorConfig;
pub use connector::{ConnectorError, TryOnConnector};
pub use models::outcome::{FailureKind, ResultOutcome};
pub use models::request::{ImagePart, OutfitSource, UploadRequest};
pub use services::dispatch::{CallerContext, ContextHandle, RequestId};
