use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::trace::trace::TraceEvent;

pub const DEFAULT_TRACE_PATH: &str = "fill_trace.jsonl";

/// JSONL record of fill invocations, one line per state transition.
///
/// Lines are buffered while an invocation runs and flushed when it ends, so
/// each invocation lands in the file as one contiguous block.
pub struct TraceLogger {
    sink: Option<Mutex<BufWriter<File>>>,
}

impl TraceLogger {
    pub fn new(path: &str) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                sink: Some(Mutex::new(BufWriter::new(file))),
            },
            Err(e) => {
                warn!(path, error = %e, "could not open trace file; fill tracing disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Buffer one transition.
    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else { return };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(invocation = event.invocation, error = %e, "failed to serialize trace event");
                return;
            }
        };

        let mut writer = sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{}", line) {
            warn!(invocation = event.invocation, error = %e, "failed to write trace event");
        }
    }

    /// Flush everything buffered for a finished invocation.
    pub fn end_invocation(&self, invocation: u64) {
        let Some(sink) = &self.sink else { return };

        let mut writer = sink.lock().unwrap_or_else(PoisonError::into_inner);
        match writer.flush() {
            Ok(()) => debug!(invocation, "fill trace flushed"),
            Err(e) => warn!(invocation, error = %e, "failed to flush fill trace"),
        }
    }
}
