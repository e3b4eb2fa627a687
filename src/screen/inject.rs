use serde::Serialize;
use tracing::debug;

use crate::screen::dom::{Document, DomError, EventKind, NodeId};
use crate::screen::screen_model::{AnswerValue, FieldAnswer};

/// Which identifiers were written and which matched no element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InjectionReport {
    pub applied: Vec<String>,
    pub missed: Vec<String>,
}

/// How a value reaches a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePath {
    /// checkbox / radio: checked state
    Toggle,
    /// select: option selection
    Choice,
    /// everything else: native value setter
    Value,
}

pub fn write_path(doc: &Document, node: NodeId) -> WritePath {
    if doc.tag(node) == Some("select") {
        return WritePath::Choice;
    }
    match doc.control_type(node).as_str() {
        "checkbox" | "radio" => WritePath::Toggle,
        _ => WritePath::Value,
    }
}

/// Element by id, else the first element carrying that name.
pub fn resolve_target(doc: &Document, identifier: &str) -> Option<NodeId> {
    doc.element_by_id(identifier)
        .or_else(|| doc.elements_by_name(identifier).into_iter().next())
}

/// Write every answer into the page. Answers that resolve to no element are
/// skipped without aborting the rest.
pub fn inject_answers(doc: &mut Document, answers: &[FieldAnswer]) -> Result<InjectionReport, DomError> {
    let mut report = InjectionReport::default();

    for answer in answers {
        let Some(target) = resolve_target(doc, &answer.identifier) else {
            debug!(identifier = %answer.identifier, "no element for answer, skipping");
            report.missed.push(answer.identifier.clone());
            continue;
        };

        apply_answer(doc, target, &answer.answer)?;
        debug!(
            identifier = %answer.identifier,
            label = %answer.label,
            value = %answer.answer.as_text(),
            "filled field"
        );
        report.applied.push(answer.identifier.clone());
    }

    Ok(report)
}

/// Apply one answer through the write path of the control, then raise the
/// bubbling `input` and `change` events frameworks listen for.
pub fn apply_answer(doc: &mut Document, target: NodeId, answer: &AnswerValue) -> Result<(), DomError> {
    match write_path(doc, target) {
        WritePath::Toggle => doc.set_checked(target, answer.is_truthy())?,
        WritePath::Choice => {
            let wanted = answer.as_text();
            let option = doc
                .options(target)
                .into_iter()
                .find(|&o| doc.option_value(o) == wanted || doc.option_text(o) == wanted);
            // No matching option leaves the selection as it was.
            if let Some(option) = option {
                doc.select_option(target, option)?;
            }
        }
        WritePath::Value => doc.set_native_value(target, &answer.as_text())?,
    }

    doc.dispatch_event(target, EventKind::Input, true)?;
    doc.dispatch_event(target, EventKind::Change, true)
}
