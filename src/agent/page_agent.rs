use tracing::{debug, info, warn};

use crate::{
    agent::agent_model::FillState,
    bridge::{
        channel::{Endpoint, Incoming, Sender},
        error::BridgeError,
        message::{AnalysisOutcome, BridgeMessage, FillReport},
    },
    screen::{dom::Document, inject::inject_answers, snapshot::build_request},
    trace::{logger::TraceLogger, trace::TraceEvent},
};

/// The page-embedded side: owns the document and runs fill invocations when
/// the panel asks for them.
pub struct PageAgent {
    document: Document,
    endpoint: Endpoint,
    tracer: TraceLogger,
    invocations: u64,
}

impl PageAgent {
    pub fn new(document: Document, endpoint: Endpoint) -> Self {
        Self {
            document,
            endpoint,
            tracer: TraceLogger::disabled(),
            invocations: 0,
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serve panel messages until the panel goes away, then hand the page back.
    pub async fn run(mut self) -> Document {
        while let Some(incoming) = self.endpoint.recv().await {
            match incoming.message {
                BridgeMessage::FillForms => {
                    let report = self.fill_forms().await;
                    debug!(success = report.success, filled = report.filled, "fill invocation done");
                }
                other => debug!(action = other.action(), "page ignores message"),
            }
        }
        debug!(invocations = self.invocations, "panel disconnected, page agent stopping");
        self.document
    }

    /// One complete invocation: snapshot, ask the panel, inject, report.
    ///
    /// Always ends with exactly one `formsFilled` notification. `fillForms`
    /// triggers arriving while the reply is outstanding are refused.
    pub async fn fill_forms(&mut self) -> FillReport {
        self.invocations += 1;
        let mut invocation = Invocation::new(self.invocations, &self.tracer);

        let request = build_request(&self.document);
        invocation.advance(FillState::SnapshotBuilt, |e| {
            e.with_url(&request.url).with_fields(request.fields.len())
        });

        let sender = self.endpoint.sender();
        let message = BridgeMessage::PostData(request);
        invocation.advance(FillState::RequestSent, |e| e);

        let reply = sender.request::<AnalysisOutcome>(&message);
        tokio::pin!(reply);
        let outcome = loop {
            tokio::select! {
                result = &mut reply => break result,
                incoming = self.endpoint.recv() => match incoming {
                    Some(Incoming { message: BridgeMessage::FillForms, .. }) => reject_busy(&sender),
                    Some(other) => debug!(action = other.message.action(), "ignored while awaiting analysis"),
                    None => break Err(BridgeError::Disconnected),
                },
            }
        };

        let report = match outcome {
            Ok(AnalysisOutcome::Answered { field_values }) => {
                invocation.advance(FillState::AnswersReceived, |e| e.with_answers(field_values.len()));
                match inject_answers(&mut self.document, &field_values) {
                    Ok(injection) => {
                        invocation.advance(FillState::Injected, |e| {
                            e.with_filled(injection.applied.len(), &injection.missed)
                        });
                        FillReport::success(injection.applied.len())
                    }
                    Err(e) => {
                        warn!(error = %e, "injection aborted");
                        FillReport::failure(e.to_string())
                    }
                }
            }
            Ok(AnalysisOutcome::NoFields) => {
                invocation.advance(FillState::NoAnswers, |e| e.with_detail("no fillable fields"));
                FillReport::failure("no fillable fields on the page")
            }
            Ok(AnalysisOutcome::NoAnswers) => {
                invocation.advance(FillState::NoAnswers, |e| e.with_detail("service returned no answers"));
                FillReport::failure("the analysis service returned no answers")
            }
            Ok(AnalysisOutcome::Failed { error }) => {
                invocation.advance(FillState::TransportFailed, |e| e.with_detail(&error));
                FillReport::failure(error)
            }
            Err(e) => {
                invocation.advance(FillState::TransportFailed, |ev| ev.with_detail(&e));
                FillReport::failure(e.to_string())
            }
        };

        invocation.advance(
            FillState::Completed {
                success: report.success,
            },
            |e| match &report.error {
                Some(error) => e.with_detail(error),
                None => e,
            },
        );

        if let Err(e) = sender.notify(&BridgeMessage::FormsFilled(report.clone())) {
            warn!(error = %e, "could not report completion to the panel");
        }
        info!(success = report.success, filled = report.filled, "forms filled");
        report
    }
}

/// Refuse an overlapping trigger without touching the document.
fn reject_busy(sender: &Sender) {
    warn!("fillForms received while an invocation is in flight; rejecting");
    if let Err(e) = sender.notify(&BridgeMessage::FormsFilled(FillReport::busy())) {
        warn!(error = %e, "could not report rejection to the panel");
    }
}

/// State tracking and tracing for one invocation.
struct Invocation<'a> {
    id: u64,
    state: FillState,
    tracer: &'a TraceLogger,
}

impl<'a> Invocation<'a> {
    fn new(id: u64, tracer: &'a TraceLogger) -> Self {
        tracer.log(&TraceEvent::now(id, FillState::Idle));
        Self {
            id,
            state: FillState::Idle,
            tracer,
        }
    }

    fn advance(&mut self, next: FillState, annotate: impl FnOnce(TraceEvent) -> TraceEvent) {
        if !self.state.can_advance_to(next) {
            warn!(invocation = self.id, from = ?self.state, to = ?next, "unexpected fill state transition");
        }
        debug!(invocation = self.id, from = ?self.state, to = ?next, "fill state");
        self.state = next;
        self.tracer.log(&annotate(TraceEvent::now(self.id, next)));
        if next.is_terminal() {
            self.tracer.end_invocation(self.id);
        }
    }
}
