use std::collections::HashSet;

use tracing::debug;

use crate::screen::classifier::{is_input_capable, is_relevant, normalized_type};
use crate::screen::dom::{Document, NodeId};
use crate::screen::label::resolve_label;
use crate::screen::screen_model::{AnalysisRequest, FormFieldDescriptor, PageOverview};

/// Take a snapshot of the page: overview, relevant fields, and URL.
/// The comment is left empty; the panel supplies it.
pub fn build_request(doc: &Document) -> AnalysisRequest {
    AnalysisRequest {
        overview: page_overview(doc),
        fields: collect_fields(doc),
        url: doc.url().to_string(),
        comment: String::new(),
    }
}

/// Relevant fields of every form, in document order of forms and then of
/// controls within each form.
pub fn collect_fields(doc: &Document) -> Vec<FormFieldDescriptor> {
    let fields: Vec<FormFieldDescriptor> = doc
        .forms()
        .into_iter()
        .flat_map(|form| doc.form_elements(form))
        .filter(|&node| is_input_capable(doc, node) && is_relevant(doc, node))
        .map(|node| describe_field(doc, node))
        .collect();

    let mut seen = HashSet::new();
    for field in &fields {
        if field.identifier.is_empty() {
            debug!(label = %field.label, "field has neither id nor name; answers cannot target it");
        } else if !seen.insert(field.identifier.as_str()) {
            debug!(identifier = %field.identifier, "duplicate field identifier; injection targets the first match");
        }
    }

    fields
}

pub fn describe_field(doc: &Document, node: NodeId) -> FormFieldDescriptor {
    FormFieldDescriptor {
        identifier: field_identifier(doc, node),
        label: resolve_label(doc, node),
        kind: normalized_type(doc, node),
    }
}

/// Element id, else element name.
pub fn field_identifier(doc: &Document, node: NodeId) -> String {
    match doc.element(node) {
        Some(el) => el.id().unwrap_or(el.name()).to_string(),
        None => String::new(),
    }
}

/// Title, meta description and first `<h1>`, each optional.
pub fn page_overview(doc: &Document) -> PageOverview {
    PageOverview {
        title: doc.title(),
        description: doc.meta_content("description").unwrap_or("").to_string(),
        headline: doc
            .first_by_tag("h1")
            .map(|h| doc.text_content(h).trim().to_string())
            .unwrap_or_default(),
    }
}
