use serde_json::Value;

/// An HTTP response as received from the transport. Never mutated after receipt.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The shape a response body turned out to have.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedPayload {
    Json(Value),
    Binary(Vec<u8>),
    HtmlError(String),
    Malformed(String),
}
