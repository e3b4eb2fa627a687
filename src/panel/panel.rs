use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    bridge::{
        channel::{Endpoint, Incoming, Responder},
        error::BridgeError,
        message::{AnalysisOutcome, BridgeMessage, FillReport},
    },
    panel::status::{ChatEntry, PanelControls},
    screen::screen_model::AnalysisRequest,
    service::{
        client::{AnalysisService, ChatReply, UploadDocument},
        error::ServiceError,
    },
};

pub const FILL_SUCCESS: &str = "Forms filled successfully!";
pub const FILL_ERROR: &str = "Error filling forms.";
pub const UPLOAD_SUCCESS: &str = "Documents uploaded successfully!";
pub const UPLOAD_ERROR: &str = "Error uploading documents.";
pub const CHAT_ERROR: &str = "Sorry, there was an error processing your message.";

/// The privileged side: talks to the analysis service on the page's behalf.
pub struct Panel {
    endpoint: Endpoint,
    service: Arc<dyn AnalysisService>,
    comment: String,
    controls: PanelControls,
    last_report: Option<FillReport>,
}

impl Panel {
    pub fn new(endpoint: Endpoint, service: Arc<dyn AnalysisService>) -> Self {
        Self {
            endpoint,
            service,
            comment: String::new(),
            controls: PanelControls::default(),
            last_report: None,
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn controls(&self) -> &PanelControls {
        &self.controls
    }

    pub fn last_report(&self) -> Option<&FillReport> {
        self.last_report.as_ref()
    }

    /// Ask the page to start a fill invocation.
    pub fn trigger_fill(&self) -> Result<(), BridgeError> {
        self.endpoint.notify(&BridgeMessage::FillForms)
    }

    /// Trigger a fill and serve the page until it reports back.
    pub async fn fill(&mut self) -> Result<FillReport, BridgeError> {
        self.trigger_fill()?;
        loop {
            let incoming = self.endpoint.recv().await.ok_or(BridgeError::Disconnected)?;
            if let Some(report) = self.handle(incoming).await {
                return Ok(report);
            }
        }
    }

    /// Handle one message from the page. Returns the report once an
    /// invocation completes; refused overlapping triggers are not reports.
    pub async fn handle(&mut self, incoming: Incoming) -> Option<FillReport> {
        match incoming.message {
            BridgeMessage::PostData(request) => {
                match incoming.responder {
                    Some(responder) => self.handle_post_data(request, responder).await,
                    None => warn!("postData arrived without a reply handle; dropping"),
                }
                None
            }
            BridgeMessage::FormsFilled(report) if report.rejected => {
                debug!("page refused an overlapping fill trigger");
                None
            }
            BridgeMessage::FormsFilled(report) => {
                info!(success = report.success, filled = report.filled, "page finished filling");
                self.last_report = Some(report.clone());
                Some(report)
            }
            BridgeMessage::FillForms => {
                debug!("panel ignores fillForms");
                None
            }
        }
    }

    pub async fn handle_post_data(&mut self, request: AnalysisRequest, responder: Responder) {
        let outcome = self.analyze(request).await;
        if let Err(e) = responder.reply(&outcome) {
            warn!(error = %e, "could not deliver analysis to the page");
        }
    }

    /// Forward a snapshot to the service with the operator comment merged in.
    /// An empty field list never reaches the network.
    pub async fn analyze(&mut self, request: AnalysisRequest) -> AnalysisOutcome {
        if !request.has_fields() {
            debug!(url = %request.url, "no fields to analyze");
            return AnalysisOutcome::NoFields;
        }

        let request = request.with_comment(&self.comment);
        self.controls.fill_button.begin();
        let outcome = match self.service.analyze(&request).await {
            Ok(Some(field_values)) => {
                self.controls.status.success(FILL_SUCCESS);
                AnalysisOutcome::Answered { field_values }
            }
            Ok(None) => {
                info!(url = %request.url, "service returned no answers");
                self.controls.status.error(FILL_ERROR);
                AnalysisOutcome::NoAnswers
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                self.controls.status.error(FILL_ERROR);
                AnalysisOutcome::Failed { error: e.to_string() }
            }
        };
        self.controls.fill_button.end();
        outcome
    }

    /// Send one chat message; both sides of the exchange land in the chat log.
    pub async fn chat(&mut self, message: &str) -> Result<ChatReply, ServiceError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ServiceError::InvalidInput("empty chat message".to_string()));
        }

        self.controls.chat_log.push(ChatEntry {
            from_user: true,
            text: message.to_string(),
        });

        match self.service.chat(message).await {
            Ok(reply) => {
                self.controls.chat_log.push(ChatEntry {
                    from_user: false,
                    text: reply.render(),
                });
                Ok(reply)
            }
            Err(e) => {
                warn!(error = %e, "chat failed");
                self.controls.chat_log.push(ChatEntry {
                    from_user: false,
                    text: CHAT_ERROR.to_string(),
                });
                Err(e)
            }
        }
    }

    pub async fn upload(&mut self, documents: &[UploadDocument], comment: &str) -> Result<(), ServiceError> {
        if documents.is_empty() {
            return Err(ServiceError::InvalidInput("no documents selected".to_string()));
        }

        self.controls.upload_button.begin();
        let result = self.service.upload(documents, comment).await;
        match &result {
            Ok(()) => self.controls.status.success(UPLOAD_SUCCESS),
            Err(e) => {
                warn!(error = %e, "upload failed");
                self.controls.status.error(UPLOAD_ERROR);
            }
        }
        self.controls.upload_button.end();
        result
    }
}
