use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::agent::agent_model::FillState;

#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub invocation: u64,

    pub state: String,

    pub url: Option<String>,
    pub fields: Option<usize>,
    pub answers: Option<usize>,
    pub filled: Option<usize>,
    pub missed: Vec<String>,

    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(invocation: u64, state: FillState) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            invocation,
            state: format!("{:?}", state),
            url: None,
            fields: None,
            answers: None,
            filled: None,
            missed: vec![],
            detail: None,
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_fields(mut self, count: usize) -> Self {
        self.fields = Some(count);
        self
    }

    pub fn with_answers(mut self, count: usize) -> Self {
        self.answers = Some(count);
        self
    }

    pub fn with_filled(mut self, filled: usize, missed: &[String]) -> Self {
        self.filled = Some(filled);
        self.missed = missed.to_vec();
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
