use serde::{Deserialize, Serialize};

/// One fillable control as it is described to the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFieldDescriptor {
    /// Element id, or the element name when it has no id.
    pub identifier: String,
    pub label: String,
    /// Normalized (lower-cased) control type, e.g. `text`, `checkbox`, `select-one`.
    pub kind: String,
}

/// Best-effort page identity. Missing parts stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOverview {
    pub title: String,
    pub description: String,
    pub headline: String,
}

impl PageOverview {
    /// Plain-text block for prompts.
    pub fn summary(&self) -> String {
        format!(
            "Title: {}\nDescription: {}\nMain Heading: {}",
            self.title, self.description, self.headline
        )
    }
}

/// Everything the analysis service needs about one page, sent as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub overview: PageOverview,
    pub fields: Vec<FormFieldDescriptor>,
    pub url: String,
    #[serde(default)]
    pub comment: String,
}

impl AnalysisRequest {
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Null,
}

impl AnswerValue {
    /// Checkbox/radio semantics: only `true` and `"true"` tick the box.
    pub fn is_truthy(&self) -> bool {
        match self {
            AnswerValue::Bool(b) => *b,
            AnswerValue::Text(s) => s == "true",
            AnswerValue::Number(_) | AnswerValue::Null => false,
        }
    }

    /// The string written into a value-bearing control.
    pub fn as_text(&self) -> String {
        match self {
            AnswerValue::Bool(b) => b.to_string(),
            AnswerValue::Number(n) => n.to_string(),
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Null => String::new(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::Text(s)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        AnswerValue::Bool(b)
    }
}

/// A value the service proposes for one field, keyed by the field identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAnswer {
    #[serde(alias = "id")]
    pub identifier: String,
    #[serde(default, alias = "name")]
    pub label: String,
    #[serde(default = "null_answer")]
    pub answer: AnswerValue,
}

fn null_answer() -> AnswerValue {
    AnswerValue::Null
}

impl FieldAnswer {
    pub fn new(identifier: &str, answer: impl Into<AnswerValue>) -> Self {
        Self {
            identifier: identifier.to_string(),
            label: String::new(),
            answer: answer.into(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }
}
