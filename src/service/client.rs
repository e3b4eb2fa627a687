use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::screen::screen_model::{AnalysisRequest, FieldAnswer, FormFieldDescriptor};
use crate::service::error::{Result, ServiceError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";

/// The external analysis service: form analysis, chat, document upload.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Answers for the fields of one snapshot. `None` means the service
    /// declined the form; an empty list means it had nothing to propose.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Option<Vec<FieldAnswer>>>;

    async fn chat(&self, message: &str) -> Result<ChatReply>;

    async fn upload(&self, documents: &[UploadDocument], comment: &str) -> Result<()>;
}

// ============================================================================
// Wire types
// ============================================================================

/// Body of `/analyze-form` as the service reads it: fields keyed
/// `id`/`name`/`type` and the overview flattened to its text summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeFormBody<'a> {
    pub form_fields: Vec<FormFieldBody<'a>>,
    pub website_overview: String,
    pub url: &'a str,
    pub comment: &'a str,
}

#[derive(Debug, Serialize)]
pub struct FormFieldBody<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

impl<'a> From<&'a FormFieldDescriptor> for FormFieldBody<'a> {
    fn from(field: &'a FormFieldDescriptor) -> Self {
        Self {
            id: &field.identifier,
            name: &field.label,
            kind: &field.kind,
        }
    }
}

impl<'a> From<&'a AnalysisRequest> for AnalyzeFormBody<'a> {
    fn from(request: &'a AnalysisRequest) -> Self {
        Self {
            form_fields: request.fields.iter().map(FormFieldBody::from).collect(),
            website_overview: request.overview.summary(),
            url: &request.url,
            comment: &request.comment,
        }
    }
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(rename = "fieldValues", default)]
    field_values: Option<Vec<FieldAnswer>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Chat answer; the service returns either plain text or a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: Value,
}

impl ChatReply {
    /// Text as shown in the chat log; objects are pretty-printed.
    pub fn render(&self) -> String {
        match &self.response {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

/// One file for `/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDocument {
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadDocument {
    pub fn new(filename: &str, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.to_string(),
            content: content.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path).await.map_err(|source| ServiceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self { filename, content })
    }
}

// ============================================================================
// HTTP backend
// ============================================================================

/// Talks to the local analysis service over plain HTTP. No auth, no retries.
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAnalysisService {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build().map_err(ServiceError::Client)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, endpoint: &str, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(|source| ServiceError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| ServiceError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ServiceError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Option<Vec<FieldAnswer>>> {
        let endpoint = self.endpoint("/analyze-form");
        debug!(%endpoint, fields = request.fields.len(), "requesting analysis");

        let payload = AnalyzeFormBody::from(request);
        let body = self.send(&endpoint, self.client.post(&endpoint).json(&payload)).await?;
        let parsed: AnalyzeResponse = decode(&endpoint, &body)?;

        match &parsed.field_values {
            Some(answers) => info!(answers = answers.len(), "analysis service answered"),
            None => info!("analysis service declined the form"),
        }
        Ok(parsed.field_values)
    }

    async fn chat(&self, message: &str) -> Result<ChatReply> {
        let endpoint = self.endpoint("/chat");
        let body = self
            .send(&endpoint, self.client.post(&endpoint).json(&ChatRequest { message }))
            .await?;
        decode(&endpoint, &body)
    }

    async fn upload(&self, documents: &[UploadDocument], comment: &str) -> Result<()> {
        let endpoint = self.endpoint("/upload");

        let mut form = Form::new();
        for doc in documents {
            form = form.part(
                "documents",
                Part::bytes(doc.content.clone()).file_name(doc.filename.clone()),
            );
        }
        form = form.text("comment", comment.to_string());

        self.send(&endpoint, self.client.post(&endpoint).multipart(form)).await?;
        info!(documents = documents.len(), "documents uploaded");
        Ok(())
    }
}
