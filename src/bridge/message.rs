use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::screen::screen_model::{AnalysisRequest, FieldAnswer};

/// Messages exchanged between the page agent and the panel, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum BridgeMessage {
    /// panel -> page: start one fill invocation.
    FillForms,
    /// page -> panel: snapshot; expects one [`AnalysisOutcome`] reply.
    PostData(AnalysisRequest),
    /// page -> panel: invocation finished.
    FormsFilled(FillReport),
}

impl BridgeMessage {
    pub fn action(&self) -> &'static str {
        match self {
            BridgeMessage::FillForms => "fillForms",
            BridgeMessage::PostData(_) => "postData",
            BridgeMessage::FormsFilled(_) => "formsFilled",
        }
    }
}

/// Reply to `postData`. Keeps "nothing to fill" and "the call failed" apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AnalysisOutcome {
    Answered {
        #[serde(rename = "fieldValues")]
        field_values: Vec<FieldAnswer>,
    },
    NoFields,
    /// The service looked at the fields and returned no answer list.
    NoAnswers,
    Failed {
        error: String,
    },
}

impl AnalysisOutcome {
    /// The answer list, or `None` when there is nothing to inject.
    pub fn field_values(&self) -> Option<&[FieldAnswer]> {
        match self {
            AnalysisOutcome::Answered { field_values } => Some(field_values),
            AnalysisOutcome::NoFields | AnalysisOutcome::NoAnswers | AnalysisOutcome::Failed { .. } => None,
        }
    }
}

/// Payload of `formsFilled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    pub success: bool,
    #[serde(default)]
    pub filled: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the trigger was refused because another fill was in flight.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rejected: bool,
}

impl FillReport {
    pub fn success(filled: usize) -> Self {
        Self {
            success: true,
            filled,
            error: None,
            rejected: false,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            filled: 0,
            error: Some(error.into()),
            rejected: false,
        }
    }

    pub fn busy() -> Self {
        Self {
            rejected: true,
            ..Self::failure("a fill is already in progress")
        }
    }
}

/// What actually crosses the context boundary, serialized to a JSON string.
///
/// Requests carry `id`; replies carry `replyTo` and put their payload in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn message(id: Option<u64>, message: &BridgeMessage) -> Result<Self, serde_json::Error> {
        let mut value = serde_json::to_value(message)?;
        Ok(Self {
            id,
            reply_to: None,
            action: value.get("action").and_then(Value::as_str).map(str::to_string),
            data: value.get_mut("data").map(Value::take),
        })
    }

    pub fn reply<T: Serialize>(reply_to: u64, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: None,
            reply_to: Some(reply_to),
            action: None,
            data: Some(serde_json::to_value(payload)?),
        })
    }

    pub fn into_message(self) -> Result<BridgeMessage, serde_json::Error> {
        let mut object = serde_json::Map::new();
        if let Some(action) = self.action {
            object.insert("action".into(), Value::String(action));
        }
        if let Some(data) = self.data {
            object.insert("data".into(), data);
        }
        serde_json::from_value(Value::Object(object))
    }
}
