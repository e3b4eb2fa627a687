use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::screen::dom::{Document, DomError, LayoutBox, NodeId, NodeKind};

/// Serialized page: what a DOM capture produces and what `fill` writes back.
///
/// ```json
/// { "url": "https://example.com/signup", "title": "Sign up",
///   "body": [ { "tag": "form", "children": [
///       { "tag": "input", "attrs": { "id": "email", "placeholder": "Email" } } ] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSource {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub head: Vec<NodeSpec>,
    #[serde(default)]
    pub body: Vec<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text { text: String },
    Element(ElementSpec),
}

/// Element with its attributes and, optionally, live state that differs from
/// what the attributes imply (a value the user already typed, a ticked box).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl PageSource {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new(self.url.clone(), self.title.clone());
        let (head, body) = (doc.head(), doc.body());
        for spec in &self.head {
            build_node(&mut doc, head, spec);
        }
        for spec in &self.body {
            build_node(&mut doc, body, spec);
        }
        doc
    }

    pub fn from_document(doc: &Document) -> Self {
        let export_children = |parent: NodeId| -> Vec<NodeSpec> {
            doc.children(parent)
                .iter()
                .filter_map(|&c| export_node(doc, c))
                .collect()
        };

        Self {
            url: doc.url().to_string(),
            title: doc.raw_title().to_string(),
            head: export_children(doc.head()),
            body: export_children(doc.body()),
        }
    }
}

fn build_node(doc: &mut Document, parent: NodeId, spec: &NodeSpec) {
    match spec {
        NodeSpec::Text { text } => {
            doc.append_text(parent, text);
        }
        NodeSpec::Element(el) => {
            let attrs: Vec<(&str, &str)> = el
                .attrs
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let id = doc.append_element(parent, &el.tag, &attrs);
            for child in &el.children {
                build_node(doc, id, child);
            }

            // Live state is applied after children so it overrides textarea text.
            if let Ok(element) = doc.element_mut(id) {
                if el.layout.is_some() {
                    element.layout = el.layout;
                }
                if let Some(value) = &el.value {
                    element.value = value.clone();
                }
                if let Some(checked) = el.checked {
                    element.checked = checked;
                }
                if let Some(selected) = el.selected {
                    element.selected = selected;
                }
            }
        }
    }
}

fn export_node(doc: &Document, id: NodeId) -> Option<NodeSpec> {
    match &doc.node(id)?.kind {
        NodeKind::Text(text) => Some(NodeSpec::Text { text: text.clone() }),
        NodeKind::Element(el) => {
            let control_type = doc.control_type(id);
            let is_toggle = matches!(control_type.as_str(), "checkbox" | "radio");
            let has_value = matches!(el.tag.as_str(), "input" | "textarea") && !is_toggle;

            Some(NodeSpec::Element(ElementSpec {
                tag: el.tag.clone(),
                attrs: el.attrs.iter().cloned().collect(),
                layout: el.layout,
                value: has_value.then(|| el.value.clone()),
                checked: is_toggle.then_some(el.checked),
                selected: (el.tag == "option").then_some(el.selected),
                children: doc
                    .children(id)
                    .iter()
                    .filter_map(|&c| export_node(doc, c))
                    .collect(),
            }))
        }
    }
}

/// Read a page capture from a JSON file.
pub fn load_page(path: &str) -> Result<Document, DomError> {
    let content = std::fs::read_to_string(path).map_err(|source| DomError::Io {
        path: path.to_string(),
        source,
    })?;
    let source: PageSource = serde_json::from_str(&content)?;
    Ok(source.to_document())
}

/// Write the live page (including injected state) back to a JSON file.
pub fn save_page(doc: &Document, path: &str) -> Result<(), DomError> {
    let json = serde_json::to_string_pretty(&PageSource::from_document(doc))?;
    std::fs::write(path, json).map_err(|source| DomError::Io {
        path: path.to_string(),
        source,
    })
}
