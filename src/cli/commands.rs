use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::channel::channel;
use crate::bridge::message::FillReport;
use crate::cli::config::AppConfig;
use crate::panel::panel::Panel;
use crate::screen::page_source::{load_page, save_page};
use crate::screen::snapshot::build_request;
use crate::service::client::{AnalysisService, HttpAnalysisService, UploadDocument};
use crate::trace::logger::TraceLogger;
use crate::{FillOptions, fill_page};

/// Build the HTTP client for the configured service.
pub fn build_service(config: &AppConfig) -> Result<Arc<dyn AnalysisService>, Box<dyn std::error::Error>> {
    let timeout = config.service.timeout_secs.map(Duration::from_secs);
    let service = HttpAnalysisService::new(&config.service.base_url, timeout)?;
    Ok(Arc::new(service))
}

// ============================================================================
// snapshot subcommand
// ============================================================================

pub fn cmd_snapshot(page: &str) -> Result<(), Box<dyn std::error::Error>> {
    let document = load_page(page)?;
    let request = build_request(&document);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Fill a page file and return the page's report.
pub async fn cmd_fill(
    page: &str,
    comment: &str,
    output: Option<&str>,
    reply_timeout_secs: Option<u64>,
    config: &AppConfig,
    verbose: u8,
) -> Result<FillReport, Box<dyn std::error::Error>> {
    let document = load_page(page)?;
    let service = build_service(config)?;

    if verbose > 0 {
        eprintln!("Filling {} via {}...", document.url(), config.service.base_url);
    }

    let tracer = match &config.trace.path {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };
    let options = FillOptions {
        comment: comment.to_string(),
        reply_timeout: Duration::from_secs(
            reply_timeout_secs.unwrap_or(config.bridge.reply_timeout_secs),
        ),
        tracer,
    };

    let filled = fill_page(document, service, options).await?;

    if let Some(status) = &filled.status {
        eprintln!("{}", status.message);
    }
    if let Some(path) = output {
        save_page(&filled.document, path)?;
        if verbose > 0 {
            eprintln!("  Wrote: {}", path);
        }
    }

    println!("{}", serde_json::to_string_pretty(&filled.report)?);
    Ok(filled.report)
}

// ============================================================================
// chat subcommand
// ============================================================================

pub async fn cmd_chat(message: &str, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (_page_side, panel_side) = channel();
    let mut panel = Panel::new(panel_side, build_service(config)?);

    let reply = panel.chat(message).await?;
    println!("{}", reply.render());
    Ok(())
}

// ============================================================================
// upload subcommand
// ============================================================================

pub async fn cmd_upload(
    files: &[String],
    comment: &str,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        documents.push(UploadDocument::from_path(Path::new(file)).await?);
    }

    let (_page_side, panel_side) = channel();
    let mut panel = Panel::new(panel_side, build_service(config)?);

    let result = panel.upload(&documents, comment).await;
    if let Some(status) = panel.controls().status.current() {
        println!("{}", status.message);
    }
    result?;
    Ok(())
}
