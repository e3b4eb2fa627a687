use crate::screen::dom::{Document, LayoutBox, NodeId};

/// Name fragments that mark framework plumbing rather than user data.
const EXCLUDED_NAME_FRAGMENTS: [&str; 4] = ["csrf", "token", "_token", "captcha"];

/// Whether the element is a control a user can type into, pick, or tick.
pub fn is_input_capable(doc: &Document, node: NodeId) -> bool {
    matches!(
        doc.tag(node),
        Some("input") | Some("select") | Some("textarea") | Some("button")
    )
}

/// Lower-cased platform type of the control.
pub fn normalized_type(doc: &Document, node: NodeId) -> String {
    doc.control_type(node).to_lowercase()
}

/// Whether a control belongs in the snapshot. Each rule is independent.
pub fn is_relevant(doc: &Document, node: NodeId) -> bool {
    let name = doc.element(node).map(|el| el.name()).unwrap_or("");

    !is_excluded_type(&normalized_type(doc, node))
        && !has_excluded_name(name)
        && is_visible(&doc.layout(node))
}

pub fn is_excluded_type(kind: &str) -> bool {
    match kind.to_lowercase().as_str() {
        // Explicit non-inputs
        "hidden" | "submit" | "reset" | "button" | "image" => true,
        _ => false,
    }
}

/// Case-insensitive substring match against the name denylist.
pub fn has_excluded_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXCLUDED_NAME_FRAGMENTS.iter().any(|f| lower.contains(f))
}

/// Rendered when it has width, height, or at least one client rectangle.
pub fn is_visible(layout: &LayoutBox) -> bool {
    layout.width > 0.0 || layout.height > 0.0 || layout.client_rects > 0
}
