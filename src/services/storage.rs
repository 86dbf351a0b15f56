use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;

/// Local scratch area for results that arrive as raw image bytes.
pub struct ScratchStore {
    root: PathBuf,
}

impl ScratchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` to a fresh timestamped file and return its `file://` reference.
    pub async fn persist(&self, bytes: &[u8]) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.root.join(file_name(bytes));
        tokio::fs::write(&path, bytes).await?;

        let absolute = tokio::fs::canonicalize(&path).await?;
        tracing::debug!(path = %absolute.display(), size = bytes.len(), "Saved binary result");

        Ok(format!("file://{}", absolute.display()))
    }
}

fn file_name(bytes: &[u8]) -> String {
    let extension = image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png");
    let suffix = Uuid::new_v4().simple().to_string();

    format!(
        "tryon_result_{}_{}.{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        extension
    )
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("response body was empty")]
    Empty,
}
