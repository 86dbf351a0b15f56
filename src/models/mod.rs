pub mod job;
pub mod outcome;
pub mod request;
pub mod response;
