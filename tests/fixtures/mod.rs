//! Canned images and upstream response bodies

#![allow(dead_code)]

/// Minimal PNG signature followed by an IHDR tag; enough for format sniffing.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRtryon";

/// ASCII stand-ins for uploads, so request bodies stay matchable as text.
pub const PERSON_BYTES: &[u8] = b"person-photo-bytes";
pub const GARMENT_BYTES: &[u8] = b"garment-photo-bytes";

/// A JSON response shape an upstream service might return, and the reference
/// the connector should pull out of it.
#[derive(Debug, Clone)]
pub struct ResponseShapeFixture {
    pub description: &'static str,
    pub body: &'static str,
    pub expected: Option<&'static str>,
}

pub const RESPONSE_SHAPES: &[ResponseShapeFixture] = &[
    ResponseShapeFixture {
        description: "flat result_url",
        body: r#"{"result_url": "https://cdn.test/flat.png"}"#,
        expected: Some("https://cdn.test/flat.png"),
    },
    ResponseShapeFixture {
        description: "result_url beats url",
        body: r#"{"url": "https://cdn.test/low.png", "result_url": "https://cdn.test/high.png"}"#,
        expected: Some("https://cdn.test/high.png"),
    },
    ResponseShapeFixture {
        description: "placeholder under a priority key",
        body: r#"{"result_url": "null", "output": "https://cdn.test/output.png"}"#,
        expected: Some("https://cdn.test/output.png"),
    },
    ResponseShapeFixture {
        description: "data object",
        body: r#"{"data": {"output_url": "https://cdn.test/data.png"}}"#,
        expected: Some("https://cdn.test/data.png"),
    },
    ResponseShapeFixture {
        description: "data array of objects",
        body: r#"{"data": [{"image_url": "https://cdn.test/first.png"}]}"#,
        expected: Some("https://cdn.test/first.png"),
    },
    ResponseShapeFixture {
        description: "data array of strings",
        body: r#"{"data": ["https://cdn.test/scalar.png"]}"#,
        expected: Some("https://cdn.test/scalar.png"),
    },
    ResponseShapeFixture {
        description: "outputs array",
        body: r#"{"outputs": [{"url": "https://cdn.test/outputs.png"}]}"#,
        expected: Some("https://cdn.test/outputs.png"),
    },
    ResponseShapeFixture {
        description: "nested result object",
        body: r#"{"result": {"url": "https://cdn.test/nested.png"}}"#,
        expected: Some("https://cdn.test/nested.png"),
    },
    ResponseShapeFixture {
        description: "content uri",
        body: r#"{"url": "content://media/external/images/7"}"#,
        expected: Some("content://media/external/images/7"),
    },
    ResponseShapeFixture {
        description: "no usable key",
        body: r#"{"status": "ok", "message": "done"}"#,
        expected: None,
    },
];

pub const HTML_ERROR_PAGE: &str = "<!DOCTYPE html>\n<html><head><title>502 Bad Gateway</title></head>\
<body><h1>Bad Gateway</h1></body></html>";
