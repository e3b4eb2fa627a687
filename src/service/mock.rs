use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::screen::screen_model::{AnalysisRequest, FieldAnswer};
use crate::service::client::{AnalysisService, ChatReply, UploadDocument};
use crate::service::error::{Result, ServiceError};

/// Offline stand-in for the analysis service. Records what it was sent.
pub struct MockAnalysisService {
    answers: Option<Vec<FieldAnswer>>,
    failure: Option<String>,
    requests: Mutex<Vec<AnalysisRequest>>,
    uploads: Mutex<Vec<(Vec<String>, String)>>,
}

impl MockAnalysisService {
    pub fn answering(answers: Vec<FieldAnswer>) -> Self {
        Self {
            answers: Some(answers),
            failure: None,
            requests: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Analysis replies `fieldValues: null`, as for a form the service
    /// judges not worth filling.
    pub fn declining() -> Self {
        Self {
            answers: None,
            ..Self::answering(Vec::new())
        }
    }

    /// Every call fails as if the service were unreachable.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::answering(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// `(filenames, comment)` per upload call.
    pub fn uploads(&self) -> Vec<(Vec<String>, String)> {
        self.uploads.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(ServiceError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Option<Vec<FieldAnswer>>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.check()?;
        Ok(self.answers.clone())
    }

    async fn chat(&self, message: &str) -> Result<ChatReply> {
        self.check()?;
        Ok(ChatReply {
            response: Value::String(format!("echo: {message}")),
        })
    }

    async fn upload(&self, documents: &[UploadDocument], comment: &str) -> Result<()> {
        self.check()?;
        self.uploads.lock().unwrap_or_else(PoisonError::into_inner).push((
            documents.iter().map(|d| d.filename.clone()).collect(),
            comment.to_string(),
        ));
        Ok(())
    }
}
