use garde::Validate;
use std::collections::BTreeMap;

/// An image file attached to a multipart upload.
#[derive(Debug, Clone, Validate)]
pub struct ImagePart {
    #[garde(length(min = 1, max = 255))]
    pub file_name: String,

    #[garde(length(min = 1))]
    pub bytes: Vec<u8>,
}

impl ImagePart {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// MIME type sniffed from the leading bytes, falling back to a generic stream type.
    pub fn content_type(&self) -> &'static str {
        image::guess_format(&self.bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream")
    }
}

/// Where the garment image comes from.
#[derive(Debug, Clone)]
pub enum OutfitSource {
    /// Uploaded alongside the person image.
    Image(ImagePart),
    /// Fetched by the service itself.
    Remote(String),
}

/// A single try-on submission.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub person: ImagePart,
    pub outfit: OutfitSource,
    pub auth_token: Option<String>,
    pub extra_fields: BTreeMap<String, String>,
}

impl UploadRequest {
    pub fn with_outfit_image(person: ImagePart, outfit: ImagePart) -> Self {
        Self {
            person,
            outfit: OutfitSource::Image(outfit),
            auth_token: None,
            extra_fields: BTreeMap::new(),
        }
    }

    pub fn with_outfit_url(person: ImagePart, outfit_url: impl Into<String>) -> Self {
        Self {
            person,
            outfit: OutfitSource::Remote(outfit_url.into()),
            auth_token: None,
            extra_fields: BTreeMap::new(),
        }
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.insert(name.into(), value.into());
        self
    }

    /// The request's own token, trimmed, if it carries a usable one.
    pub fn bearer(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
