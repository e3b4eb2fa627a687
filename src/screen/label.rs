use crate::screen::dom::{Document, NodeId};

pub const UNLABELED_FIELD: &str = "Unlabeled Field";

/// Derive the human-readable label of a control.
///
/// Strategies run in priority order and the first non-empty result wins:
/// 1. a `label[for=<id>]` anywhere in the document
/// 2. a wrapping `<label>`, minus the control's own current value
/// 3. the text node immediately before the control
/// 4. `name`, then `placeholder`, then [`UNLABELED_FIELD`]
pub fn resolve_label(doc: &Document, control: NodeId) -> String {
    explicit_label(doc, control)
        .or_else(|| wrapping_label(doc, control))
        .or_else(|| preceding_text(doc, control))
        .unwrap_or_else(|| fallback_label(doc, control))
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn explicit_label(doc: &Document, control: NodeId) -> Option<String> {
    let id = doc.element(control)?.id()?;
    let label = doc.label_for(id)?;
    non_empty(&doc.text_content(label))
}

fn wrapping_label(doc: &Document, control: NodeId) -> Option<String> {
    let label = doc.closest(control, "label")?;
    let text = doc.text_content(label);
    let text = text.trim();

    let value = doc.value(control);
    if value.is_empty() {
        return non_empty(text);
    }
    non_empty(&text.replacen(value.as_str(), "", 1))
}

fn preceding_text(doc: &Document, control: NodeId) -> Option<String> {
    let sibling = doc.previous_sibling(control)?;
    non_empty(doc.text(sibling)?)
}

fn fallback_label(doc: &Document, control: NodeId) -> String {
    let Some(el) = doc.element(control) else {
        return UNLABELED_FIELD.to_string();
    };
    [el.name(), el.placeholder()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(UNLABELED_FIELD)
        .to_string()
}
