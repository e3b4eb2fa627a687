use serde::Serialize;

/// Stages of one fill invocation.
///
/// `Idle -> SnapshotBuilt -> RequestSent -> (AnswersReceived | NoAnswers |
/// TransportFailed) -> Injected -> Completed`. `Injected` is skipped when there
/// is nothing to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FillState {
    Idle,
    SnapshotBuilt,
    RequestSent,
    AnswersReceived,
    NoAnswers,
    TransportFailed,
    Injected,
    Completed { success: bool },
}

impl FillState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FillState::Completed { .. })
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: FillState) -> bool {
        use FillState::*;
        matches!(
            (self, next),
            (Idle, SnapshotBuilt)
                | (SnapshotBuilt, RequestSent)
                | (RequestSent, AnswersReceived | NoAnswers | TransportFailed)
                | (AnswersReceived, Injected)
                | (AnswersReceived | Injected | NoAnswers | TransportFailed, Completed { .. })
        )
    }
}
