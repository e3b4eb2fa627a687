use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::{
    agent::{error::AgentError, page_agent::PageAgent},
    bridge::{
        channel::{DEFAULT_REPLY_TIMEOUT, channel_with_timeout},
        message::FillReport,
    },
    panel::{panel::Panel, status::Status},
    screen::dom::Document,
    service::client::AnalysisService,
    trace::logger::TraceLogger,
};

pub mod agent;
pub mod bridge;
pub mod cli;
pub mod panel;
pub mod screen;
pub mod service;
pub mod trace;

/// Knobs for one end-to-end fill.
pub struct FillOptions {
    pub comment: String,
    pub reply_timeout: Duration,
    pub tracer: TraceLogger,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            comment: String::new(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            tracer: TraceLogger::disabled(),
        }
    }
}

#[derive(Debug)]
pub struct FillOutput {
    pub report: FillReport,
    /// The page after injection.
    pub document: Document,
    /// Last status line the panel showed, if any.
    pub status: Option<Status>,
}

/// Run one fill over `document`: the page agent and the panel each get their
/// own task-side context and talk only through the bridge.
pub async fn fill_page(
    document: Document,
    service: Arc<dyn AnalysisService>,
    options: FillOptions,
) -> Result<FillOutput, AgentError> {
    let (page_side, panel_side) = channel_with_timeout(options.reply_timeout);

    let agent = PageAgent::new(document, page_side).with_tracer(options.tracer);
    let page_task = tokio::spawn(agent.run());

    let mut panel = Panel::new(panel_side, service).with_comment(&options.comment);
    let result = panel.fill().await;
    let status = panel.controls().status.current().cloned();

    // Closing the panel side stops the page agent.
    drop(panel);
    let document = page_task
        .await
        .map_err(|e| AgentError::Runtime(format!("page agent task failed: {}", e)))?;

    let report = result?;
    info!(success = report.success, filled = report.filled, "fill finished");

    Ok(FillOutput {
        report,
        document,
        status,
    })
}
