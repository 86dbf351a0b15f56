//! Buckets raw HTTP responses into the shapes the connector knows how to handle.
//!
//! Order of checks: status code, declared content type, HTML sniff, JSON parse.
//! Declared content types are often wrong, so every text branch sniffs for an
//! HTML document before attempting to decode JSON.

use crate::models::outcome::TryOnError;
use crate::models::response::{ClassifiedPayload, RawResponse};

/// Upper bound on body text carried in errors and logs.
pub const SNIPPET_MAX_CHARS: usize = 800;

pub fn classify(response: RawResponse) -> ClassifiedPayload {
    if !response.is_success() {
        return ClassifiedPayload::Malformed(format!("http status {}", response.status));
    }

    let declared = response
        .content_type
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if declares_json(&declared) {
        return decode_text(&response.body, Fallback::ParseError);
    }

    if declares_binary(&declared) {
        return ClassifiedPayload::Binary(response.body);
    }

    decode_text(&response.body, Fallback::Unexpected)
}

/// Classify a response from an endpoint that only ever answers with JSON.
///
/// The declared content type is not trusted to mean binary here: a body
/// labelled `octet-stream`, or not labelled at all, still goes through the
/// HTML sniff and JSON decode.
pub fn classify_document(response: RawResponse) -> ClassifiedPayload {
    match classify(response) {
        ClassifiedPayload::Binary(body) => decode_text(&body, Fallback::Unexpected),
        other => other,
    }
}

/// Turn a non-2xx response into an `Http` error carrying a bounded body snippet.
pub fn ensure_success(response: &RawResponse) -> Result<(), TryOnError> {
    if response.is_success() {
        return Ok(());
    }

    let body = snippet(response.body_text().trim());
    tracing::warn!(status = response.status, body = %body, "Request not successful");
    Err(TryOnError::Http {
        status: response.status,
        snippet: body,
    })
}

fn declares_json(content_type: &str) -> bool {
    content_type.contains("json") || content_type.contains("text/plain")
}

fn declares_binary(content_type: &str) -> bool {
    content_type.is_empty()
        || content_type.starts_with("image/")
        || content_type.contains("octet-stream")
}

enum Fallback {
    /// Content type promised JSON; report the parser's complaint.
    ParseError,
    /// Content type was unrecognised; report the body itself.
    Unexpected,
}

fn decode_text(body: &[u8], fallback: Fallback) -> ClassifiedPayload {
    let text = String::from_utf8_lossy(body);

    if looks_like_html(&text) {
        return ClassifiedPayload::HtmlError(snippet(&text));
    }

    match serde_json::from_str(&text) {
        Ok(document) => ClassifiedPayload::Json(document),
        Err(e) => match fallback {
            Fallback::ParseError => ClassifiedPayload::Malformed(format!("invalid JSON: {}", e)),
            Fallback::Unexpected => ClassifiedPayload::Malformed(format!(
                "unexpected response format, body: {}",
                snippet(&text)
            )),
        },
    }
}

/// True when the body is (or embeds) an HTML document.
pub fn looks_like_html(body: &str) -> bool {
    let lowered = body.trim().to_lowercase();
    lowered.contains("<!doctype") || lowered.contains("<html")
}

/// First [`SNIPPET_MAX_CHARS`] characters of `text`, marked when cut.
pub fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
