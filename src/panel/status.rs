use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

/// The panel's one-line status banner.
#[derive(Debug, Default, Clone)]
pub struct StatusLine {
    current: Option<Status>,
}

impl StatusLine {
    pub fn show(&mut self, message: &str, severity: Severity) {
        let status = Status {
            message: message.to_string(),
            severity,
        };
        self.current = Some(status);
    }

    pub fn success(&mut self, message: &str) {
        self.show(message, Severity::Info);
    }

    pub fn error(&mut self, message: &str) {
        self.show(message, Severity::Error);
    }

    pub fn current(&self) -> Option<&Status> {
        self.current.as_ref()
    }
}

/// Spinner state of one panel button.
#[derive(Debug, Default, Clone)]
pub struct BusyFlag {
    busy: bool,
}

impl BusyFlag {
    pub fn begin(&mut self) {
        self.busy = true;
    }

    pub fn end(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub from_user: bool,
    pub text: String,
}

/// Everything the panel renders, owned by the panel itself.
#[derive(Debug, Default, Clone)]
pub struct PanelControls {
    pub status: StatusLine,
    pub fill_button: BusyFlag,
    pub upload_button: BusyFlag,
    pub chat_log: Vec<ChatEntry>,
}
