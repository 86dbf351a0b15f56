pub mod async_job;
pub mod classifier;
pub mod dispatch;
pub mod extractor;
pub mod poller;
pub mod storage;
pub mod sync_job;
pub mod transport;
pub mod validation;
