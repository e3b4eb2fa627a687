mod common;

use std::sync::Arc;
use std::time::Duration;

use common::pages::{profile_page, signup_page};
use form_filler::agent::page_agent::PageAgent;
use form_filler::bridge::channel::{channel, channel_with_timeout};
use form_filler::bridge::message::{AnalysisOutcome, BridgeMessage, FillReport};
use form_filler::panel::panel::{FILL_ERROR, FILL_SUCCESS, Panel, UPLOAD_ERROR, UPLOAD_SUCCESS};
use form_filler::panel::status::Severity;
use form_filler::screen::dom::{Document, EventKind};
use form_filler::screen::screen_model::FieldAnswer;
use form_filler::service::client::{HttpAnalysisService, UploadDocument};
use form_filler::service::mock::MockAnalysisService;
use form_filler::trace::logger::TraceLogger;
use form_filler::{FillOptions, fill_page};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// End-to-end fill
// ============================================================================

#[tokio::test]
async fn test_fill_writes_answers_and_reports_success() {
    let (doc, email) = signup_page();
    let service = Arc::new(MockAnalysisService::answering(vec![FieldAnswer::new("email", "a@b.com")]));

    let output = fill_page(doc, service.clone(), FillOptions::default()).await.unwrap();

    assert_eq!(output.report, FillReport::success(1));
    assert_eq!(output.document.value(email), "a@b.com");
    let kinds: Vec<EventKind> = output.document.events_for(email).iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Input, EventKind::Change]);

    let status = output.status.unwrap();
    assert_eq!(status.message, FILL_SUCCESS);
    assert_eq!(status.severity, Severity::Info);

    let sent = service.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].fields.len(), 1);
    assert_eq!(sent[0].url, "https://example.com/signup");
}

#[tokio::test]
async fn test_fill_merges_operator_comment() {
    let (doc, _) = signup_page();
    let service = Arc::new(MockAnalysisService::answering(vec![]));
    let options = FillOptions {
        comment: "use the billing address".into(),
        ..Default::default()
    };

    let output = fill_page(doc, service.clone(), options).await.unwrap();

    assert!(output.report.success);
    assert_eq!(output.report.filled, 0);
    assert_eq!(service.requests()[0].comment, "use the billing address");
}

#[tokio::test]
async fn test_service_failure_reports_failure_without_mutation() {
    let page = profile_page();
    let before = page.doc.clone();
    let service = Arc::new(MockAnalysisService::failing("connection refused"));

    let output = fill_page(page.doc, service, FillOptions::default()).await.unwrap();

    assert!(!output.report.success);
    assert!(output.report.error.as_deref().unwrap().contains("connection refused"));
    assert_eq!(output.document, before);
    assert!(output.document.events().is_empty());

    let status = output.status.unwrap();
    assert_eq!(status.message, FILL_ERROR);
    assert_eq!(status.severity, Severity::Error);
}

#[tokio::test]
async fn test_page_without_fields_never_calls_service() {
    let doc = Document::new("https://example.com/empty", "Empty");
    let service = Arc::new(MockAnalysisService::answering(vec![FieldAnswer::new("x", "y")]));

    let output = fill_page(doc, service.clone(), FillOptions::default()).await.unwrap();

    assert!(!output.report.success);
    assert!(service.requests().is_empty());
    assert!(output.status.is_none());
}

#[tokio::test]
async fn test_declined_form_reports_failure_without_mutation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze-form"))
        .and(body_partial_json(json!({"formFields": [{"id": "email", "type": "text"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fieldValues": null})))
        .expect(1)
        .mount(&server)
        .await;
    let service = Arc::new(HttpAnalysisService::new(&server.uri(), Some(Duration::from_secs(5))).unwrap());

    let (doc, email) = signup_page();
    let output = fill_page(doc, service, FillOptions::default()).await.unwrap();

    assert!(!output.report.success);
    assert_eq!(output.report.filled, 0);
    assert!(output.report.error.is_some());
    assert_eq!(output.document.value(email), "");
    assert!(output.document.events().is_empty());

    let status = output.status.unwrap();
    assert_eq!(status.message, FILL_ERROR);
    assert_eq!(status.severity, Severity::Error);
}

#[tokio::test]
async fn test_declined_form_traces_no_answers() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.jsonl");
    let (doc, _) = signup_page();
    let options = FillOptions {
        tracer: TraceLogger::new(trace_path.to_str().unwrap()),
        ..Default::default()
    };

    let output = fill_page(doc, Arc::new(MockAnalysisService::declining()), options).await.unwrap();
    assert!(!output.report.success);

    let content = std::fs::read_to_string(&trace_path).unwrap();
    let states: Vec<String> = content
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["state"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        states,
        vec!["Idle", "SnapshotBuilt", "RequestSent", "NoAnswers", "Completed { success: false }"]
    );
}

#[tokio::test]
async fn test_unmatched_answers_are_dropped() {
    let page = profile_page();
    let service = Arc::new(MockAnalysisService::answering(vec![
        FieldAnswer::new("ghost", "boo"),
        FieldAnswer::new("country", "France"),
        FieldAnswer::new("newsletter", "true"),
    ]));

    let output = fill_page(page.doc, service, FillOptions::default()).await.unwrap();

    assert_eq!(output.report, FillReport::success(2));
    assert_eq!(output.document.value(page.country), "fr");
    assert!(output.document.is_checked(page.newsletter));
}

#[tokio::test]
async fn test_trace_written_per_state() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.jsonl");
    let (doc, _) = signup_page();
    let service = Arc::new(MockAnalysisService::answering(vec![FieldAnswer::new("email", "a@b.com")]));
    let options = FillOptions {
        tracer: TraceLogger::new(trace_path.to_str().unwrap()),
        ..Default::default()
    };

    fill_page(doc, service, options).await.unwrap();

    let content = std::fs::read_to_string(&trace_path).unwrap();
    let states: Vec<String> = content
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["state"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        states,
        vec![
            "Idle",
            "SnapshotBuilt",
            "RequestSent",
            "AnswersReceived",
            "Injected",
            "Completed { success: true }",
        ]
    );
}

// ============================================================================
// Page agent over a raw bridge
// ============================================================================

#[tokio::test]
async fn test_trace_flushed_when_invocation_completes() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.jsonl");
    let (page_side, panel_side) = channel();
    let (doc, _) = signup_page();
    let agent = PageAgent::new(doc, page_side).with_tracer(TraceLogger::new(trace_path.to_str().unwrap()));
    let agent = tokio::spawn(agent.run());

    let service = Arc::new(MockAnalysisService::answering(vec![FieldAnswer::new("email", "a@b.com")]));
    let mut panel = Panel::new(panel_side, service);
    panel.fill().await.unwrap();

    // agent still running: the completed invocation is already on disk
    let content = std::fs::read_to_string(&trace_path).unwrap();
    assert_eq!(content.lines().count(), 6);
    assert!(content.lines().last().unwrap().contains("Completed"));

    drop(panel);
    agent.await.unwrap();
}

#[tokio::test]
async fn test_overlapping_trigger_rejected_as_busy() {
    let (page_side, mut panel_side) = channel();
    let (doc, email) = signup_page();
    let agent = tokio::spawn(PageAgent::new(doc, page_side).run());

    panel_side.notify(&BridgeMessage::FillForms).unwrap();
    panel_side.notify(&BridgeMessage::FillForms).unwrap();

    let post = panel_side.recv().await.unwrap();
    assert!(matches!(post.message, BridgeMessage::PostData(_)));

    let busy = panel_side.recv().await.unwrap();
    assert_eq!(busy.message, BridgeMessage::FormsFilled(FillReport::busy()));

    post.responder
        .unwrap()
        .reply(&AnalysisOutcome::Answered {
            field_values: vec![FieldAnswer::new("email", "a@b.com")],
        })
        .unwrap();

    let done = panel_side.recv().await.unwrap();
    assert_eq!(done.message, BridgeMessage::FormsFilled(FillReport::success(1)));

    drop(panel_side);
    let doc = agent.await.unwrap();
    assert_eq!(doc.value(email), "a@b.com");
    assert_eq!(doc.events_for(email).len(), 2);
}

#[tokio::test]
async fn test_agent_times_out_waiting_for_panel() {
    let (page_side, mut panel_side) = channel_with_timeout(Duration::from_millis(50));
    let (doc, _) = signup_page();
    let agent = tokio::spawn(PageAgent::new(doc, page_side).run());

    panel_side.notify(&BridgeMessage::FillForms).unwrap();
    let unanswered = panel_side.recv().await.unwrap();

    let done = panel_side.recv().await.unwrap();
    match done.message {
        BridgeMessage::FormsFilled(report) => {
            assert!(!report.success);
            assert!(report.error.unwrap().contains("postData"));
        }
        other => panic!("unexpected {:?}", other),
    }

    // the pending responder also holds the panel side open
    drop(unanswered);
    drop(panel_side);
    let doc = agent.await.unwrap();
    assert!(doc.events().is_empty());
}

#[tokio::test]
async fn test_agent_answers_each_trigger_once() {
    let (page_side, page_panel) = channel();
    let (doc, _) = signup_page();
    let agent = tokio::spawn(PageAgent::new(doc, page_side).run());

    let service = Arc::new(MockAnalysisService::answering(vec![FieldAnswer::new("email", "a@b.com")]));
    let mut panel = Panel::new(page_panel, service.clone());

    let first = panel.fill().await.unwrap();
    let second = panel.fill().await.unwrap();
    assert!(first.success && second.success);
    assert_eq!(service.requests().len(), 2);
    assert_eq!(panel.last_report(), Some(&second));

    drop(panel);
    agent.await.unwrap();
}

// ============================================================================
// Panel operations
// ============================================================================

#[tokio::test]
async fn test_panel_chat_log() {
    let (_page, panel_side) = channel();
    let mut panel = Panel::new(panel_side, Arc::new(MockAnalysisService::answering(vec![])));

    let reply = panel.chat("  hello  ").await.unwrap();
    assert_eq!(reply.render(), "echo: hello");

    let log = &panel.controls().chat_log;
    assert_eq!(log.len(), 2);
    assert!(log[0].from_user);
    assert_eq!(log[0].text, "hello");
    assert_eq!(log[1].text, "echo: hello");

    assert!(panel.chat("   ").await.is_err());
    assert_eq!(panel.controls().chat_log.len(), 2);
}

#[tokio::test]
async fn test_panel_chat_failure_apologises() {
    let (_page, panel_side) = channel();
    let mut panel = Panel::new(panel_side, Arc::new(MockAnalysisService::failing("down")));

    assert!(panel.chat("hello").await.is_err());
    let log = &panel.controls().chat_log;
    assert_eq!(log.last().unwrap().text, "Sorry, there was an error processing your message.");
}

#[tokio::test]
async fn test_panel_upload_status() {
    let (_page, panel_side) = channel();
    let service = Arc::new(MockAnalysisService::answering(vec![]));
    let mut panel = Panel::new(panel_side, service.clone());

    let docs = vec![UploadDocument::new("cv.pdf", b"%PDF".to_vec())];
    panel.upload(&docs, "latest cv").await.unwrap();

    assert_eq!(panel.controls().status.current().unwrap().message, UPLOAD_SUCCESS);
    assert!(!panel.controls().upload_button.is_busy());
    assert_eq!(service.uploads(), vec![(vec!["cv.pdf".to_string()], "latest cv".to_string())]);

    assert!(panel.upload(&[], "nothing").await.is_err());
}

#[tokio::test]
async fn test_panel_upload_failure_status() {
    let (_page, panel_side) = channel();
    let mut panel = Panel::new(panel_side, Arc::new(MockAnalysisService::failing("down")));

    let docs = vec![UploadDocument::new("cv.pdf", b"%PDF".to_vec())];
    assert!(panel.upload(&docs, "").await.is_err());

    let status = panel.controls().status.current().unwrap();
    assert_eq!(status.message, UPLOAD_ERROR);
    assert_eq!(status.severity, Severity::Error);
}
