use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

use crate::config::ConnectorConfig;
use crate::models::request::ImagePart;
use crate::models::response::RawResponse;

/// HTTP operations the connector needs. Implementations must be safe to share
/// between concurrent submissions and poll loops.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_multipart(
        &self,
        url: &str,
        form: MultipartForm,
        bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError>;

    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<RawResponse, TransportError>;
}

/// Ordered multipart body, kept inspectable until it reaches the wire.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: impl Into<String>, image: &ImagePart) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: image.file_name.clone(),
            content_type: image.content_type(),
            bytes: image.bytes.clone(),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|part| part.name() == name)
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.part(name)? {
            FormPart::Text { value, .. } => Some(value),
            FormPart::File { .. } => None,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(FormPart::name).collect()
    }

    fn into_reqwest(self) -> Result<Form, TransportError> {
        self.parts.into_iter().try_fold(Form::new(), |form, part| {
            Ok(match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(content_type)?;
                    form.part(name, part)
                }
            })
        })
    }
}

/// Pooled reqwest-backed transport.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(config: &ConnectorConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(concat!("tryon-connector/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self { http })
    }

    async fn read(response: reqwest::Response) -> Result<RawResponse, TransportError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_multipart(
        &self,
        url: &str,
        form: MultipartForm,
        bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.http.post(url).multipart(form.into_reqwest()?);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        Self::read(response).await
    }

    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<RawResponse, TransportError> {
        let mut request = self.http.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        Self::read(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}
