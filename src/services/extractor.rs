//! Prioritized path search over semi-structured JSON documents.
//!
//! Upstream services report results under many different keys. Each lookup
//! here is an ordered list of key paths; the first path that resolves to a
//! string accepted by the caller's predicate wins.

use serde_json::Value;
use std::sync::OnceLock;

/// One step into a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Key(&'static str),
    Index(usize),
}

pub type KeyPath = Vec<Segment>;

/// Keys that may hold a result reference, highest priority first.
pub const RESULT_KEYS: [&str; 6] = ["result_url", "result", "url", "image_url", "output_url", "output"];

/// Keys that may hold a job identifier, highest priority first.
pub const JOB_ID_KEYS: [&str; 3] = ["job_id", "jobId", "id"];

static RESULT_PATHS: OnceLock<Vec<KeyPath>> = OnceLock::new();
static COMPLETED_PATHS: OnceLock<Vec<KeyPath>> = OnceLock::new();

/// Paths searched in a synchronous response document.
pub fn result_paths() -> &'static [KeyPath] {
    RESULT_PATHS.get_or_init(|| {
        use Segment::{Index, Key};

        let mut paths: Vec<KeyPath> = RESULT_KEYS.iter().map(|k| vec![Key(*k)]).collect();
        paths.extend(RESULT_KEYS.iter().map(|k| vec![Key("data"), Key(*k)]));
        paths.extend(RESULT_KEYS.iter().map(|k| vec![Key("data"), Index(0), Key(*k)]));
        paths.push(vec![Key("data"), Index(0)]);
        paths.push(vec![Key("outputs"), Index(0), Key("url")]);
        paths.push(vec![Key("result"), Key("url")]);
        paths
    })
}

/// Paths searched in a completed job's status document.
pub fn completed_paths() -> &'static [KeyPath] {
    COMPLETED_PATHS.get_or_init(|| {
        use Segment::{Index, Key};

        vec![
            vec![Key("output_url")],
            vec![Key("result"), Key("renderedImageUrl")],
            vec![Key("result"), Key("url")],
            vec![Key("result")],
            vec![Key("outputs"), Index(0)],
            vec![Key("outputs"), Index(0), Key("url")],
        ]
    })
}

/// Walk `path` from `document`, yielding whatever value sits at its end.
pub fn resolve<'a>(document: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    path.iter().try_fold(document, |value, segment| match segment {
        Segment::Key(key) => value.get(*key),
        Segment::Index(index) => value.get(*index),
    })
}

/// First string along `paths` that `accept` approves, trimmed.
pub fn find_first<'a, F>(document: &'a Value, paths: &[KeyPath], accept: F) -> Option<&'a str>
where
    F: Fn(&str) -> bool,
{
    paths
        .iter()
        .filter_map(|path| resolve(document, path))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|candidate| accept(*candidate))
}

/// Locate a result reference in a synchronous response.
pub fn extract(document: &Value) -> Option<String> {
    find_first(document, result_paths(), looks_like_url).map(str::to_string)
}

/// Locate a result reference in a completed job's status document.
pub fn extract_completed(document: &Value) -> Option<String> {
    find_first(document, completed_paths(), looks_like_remote_url).map(str::to_string)
}

/// Locate a job identifier. Numeric identifiers are accepted and rendered as text.
pub fn extract_job_id(document: &Value) -> Option<String> {
    JOB_ID_KEYS
        .iter()
        .filter_map(|key| document.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

pub fn looks_like_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    ["http://", "https://", "file://", "content://"]
        .iter()
        .any(|scheme| candidate.starts_with(scheme))
}

pub fn looks_like_remote_url(candidate: &str) -> bool {
    candidate.trim().starts_with("http")
}
