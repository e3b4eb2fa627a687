use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Live page model: an arena of nodes addressed by `NodeId`
// ============================================================================

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum DomError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("failed to access page file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid page JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Rendered geometry of an element, as the layout engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, rename = "clientRects")]
    pub client_rects: usize,
}

impl LayoutBox {
    pub const ZERO: LayoutBox = LayoutBox::new(0.0, 0.0, 0);

    pub const fn new(width: f64, height: f64, client_rects: usize) -> Self {
        Self {
            width,
            height,
            client_rects,
        }
    }

    /// Box used for elements that are laid out but carry no explicit geometry.
    pub const fn rendered() -> Self {
        Self::new(160.0, 24.0, 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Live value (the `value` property), separate from the `value` attribute.
    pub value: String,
    pub checked: bool,
    pub selected: bool,
    pub layout: Option<LayoutBox>,
}

impl Element {
    pub fn new(tag: &str, attrs: &[(&str, &str)]) -> Self {
        let mut element = Self {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            value: String::new(),
            checked: false,
            selected: false,
            layout: None,
        };

        if element.tag == "input" {
            // toggles without a value attribute submit "on"
            let toggle = element
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio"));
            let default = if toggle { "on" } else { "" };
            element.value = element.attr("value").unwrap_or(default).to_string();
        }
        element.checked = element.has_attr("checked");
        element.selected = element.has_attr("selected");
        element
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    /// The `id` attribute, treating an empty id as absent.
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn name(&self) -> &str {
        self.attr("name").unwrap_or("")
    }

    pub fn placeholder(&self) -> &str {
        self.attr("placeholder").unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
        }
    }
}

/// One synthetic event as it travelled through the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
    /// Target first, then every ancestor the event reached.
    pub path: Vec<NodeId>,
}

/// A state change a mounted reactive framework actually picked up.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkChange {
    pub target: NodeId,
    pub event: EventKind,
    pub value: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct TrackedState {
    value: String,
    checked: bool,
}

/// Root-delegated listener plus per-control value trackers, the way reactive
/// UI libraries intercept property writes. A property assignment refreshes the
/// tracker, so the next input event looks like a no-op to the framework.
#[derive(Debug, Clone, PartialEq)]
struct Framework {
    root: NodeId,
    trackers: HashMap<NodeId, TrackedState>,
    changes: Vec<FrameworkChange>,
}

// ============================================================================
// Document
// ============================================================================

const ROOT: NodeId = NodeId(0);

const LISTED_TAGS: [&str; 7] = [
    "button", "fieldset", "input", "object", "output", "select", "textarea",
];

const INPUT_TYPES: [&str; 22] = [
    "hidden",
    "text",
    "search",
    "tel",
    "url",
    "email",
    "password",
    "date",
    "month",
    "week",
    "time",
    "datetime-local",
    "number",
    "range",
    "color",
    "checkbox",
    "radio",
    "file",
    "submit",
    "image",
    "reset",
    "button",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    url: String,
    title: String,
    nodes: Vec<Node>,
    head: NodeId,
    body: NodeId,
    events: Vec<DispatchedEvent>,
    framework: Option<Framework>,
}

impl Document {
    /// Empty `html > head + body` document.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let mut doc = Self {
            url: url.into(),
            title: title.into(),
            nodes: Vec::new(),
            head: ROOT,
            body: ROOT,
            events: Vec::new(),
            framework: None,
        };
        let root = doc.push(None, NodeKind::Element(Element::new("html", &[])));
        doc.head = doc.push(Some(root), NodeKind::Element(Element::new("head", &[])));
        doc.body = doc.push(Some(root), NodeKind::Element(Element::new("body", &[])));
        doc
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// `document.title`: the first `<title>` element's text, else the title
    /// the page was created with.
    pub fn title(&self) -> String {
        match self.first_by_tag("title") {
            Some(t) => collapse_whitespace(&self.text_content(t)),
            None => self.title.clone(),
        }
    }

    pub(crate) fn raw_title(&self) -> &str {
        &self.title
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push(Some(parent), NodeKind::Element(Element::new(tag, attrs)))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        // textarea default value is its text content
        if let Ok(el) = self.element_mut(parent) {
            if el.tag == "textarea" {
                el.value.push_str(text);
            }
        }
        self.push(Some(parent), NodeKind::Text(text.to_string()))
    }

    pub fn set_layout(&mut self, node: NodeId, layout: LayoutBox) -> Result<(), DomError> {
        self.element_mut(node)?.layout = Some(layout);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match self.nodes.get_mut(id.0) {
            Some(Node {
                kind: NodeKind::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    /// Data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Pre-order (document order) traversal of the subtree, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every element in document order.
    pub fn all_elements(&self) -> Vec<NodeId> {
        std::iter::once(ROOT)
            .chain(self.descendants(ROOT))
            .filter(|&n| self.element(n).is_some())
            .collect()
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.all_elements()
            .into_iter()
            .filter(|&n| self.tag(n) == Some(tag))
            .collect()
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.all_elements()
            .into_iter()
            .find(|&n| self.tag(n) == Some(tag))
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Concatenated data of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.tag(n) == Some(tag))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.all_elements()
            .into_iter()
            .find(|&n| self.element(n).and_then(Element::id) == Some(id))
    }

    pub fn elements_by_name(&self, name: &str) -> Vec<NodeId> {
        if name.is_empty() {
            return Vec::new();
        }
        self.all_elements()
            .into_iter()
            .filter(|&n| self.element(n).and_then(|el| el.attr("name")) == Some(name))
            .collect()
    }

    /// First `label[for=id]` in document order.
    pub fn label_for(&self, id: &str) -> Option<NodeId> {
        self.elements_by_tag("label")
            .into_iter()
            .find(|&n| self.element(n).and_then(|el| el.attr("for")) == Some(id))
    }

    /// `content` of the first `meta[name=...]`.
    pub fn meta_content(&self, name: &str) -> Option<&str> {
        let meta = self
            .elements_by_tag("meta")
            .into_iter()
            .find(|&n| self.element(n).and_then(|el| el.attr("name")) == Some(name))?;
        Some(self.element(meta)?.attr("content").unwrap_or(""))
    }

    // ------------------------------------------------------------------------
    // Forms
    // ------------------------------------------------------------------------

    pub fn forms(&self) -> Vec<NodeId> {
        self.elements_by_tag("form")
    }

    /// Form a control belongs to: the form named by its `form` attribute,
    /// else its nearest form ancestor.
    pub fn form_owner(&self, control: NodeId) -> Option<NodeId> {
        let el = self.element(control)?;
        if let Some(form_id) = el.attr("form") {
            return self
                .element_by_id(form_id)
                .filter(|&f| self.tag(f) == Some("form"));
        }
        self.ancestors(control)
            .into_iter()
            .find(|&a| self.tag(a) == Some("form"))
    }

    /// The form's registered controls (`form.elements`), in document order.
    pub fn form_elements(&self, form: NodeId) -> Vec<NodeId> {
        self.all_elements()
            .into_iter()
            .filter(|&n| self.tag(n).is_some_and(|t| LISTED_TAGS.contains(&t)))
            .filter(|&n| self.form_owner(n) == Some(form))
            .collect()
    }

    /// The platform `type` property of a control.
    pub fn control_type(&self, id: NodeId) -> String {
        let Some(el) = self.element(id) else {
            return String::new();
        };
        let declared = el.attr("type").unwrap_or("").trim().to_ascii_lowercase();
        match el.tag.as_str() {
            "input" if INPUT_TYPES.contains(&declared.as_str()) => declared,
            "input" => "text".to_string(),
            "button" => match declared.as_str() {
                "reset" | "button" => declared,
                _ => "submit".to_string(),
            },
            "select" if el.has_attr("multiple") => "select-multiple".to_string(),
            "select" => "select-one".to_string(),
            "textarea" | "fieldset" | "output" => el.tag.clone(),
            _ => String::new(),
        }
    }

    /// Geometry after layout: hidden subtrees collapse to a zero box.
    pub fn layout(&self, id: NodeId) -> LayoutBox {
        let Some(el) = self.element(id) else {
            return LayoutBox::ZERO;
        };
        if el.tag == "input" && self.control_type(id) == "hidden" {
            return LayoutBox::ZERO;
        }
        let hidden = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|n| self.element(n))
            .any(|el| el.has_attr("hidden") || is_display_none(el));
        if hidden {
            return LayoutBox::ZERO;
        }
        el.layout.unwrap_or_else(LayoutBox::rendered)
    }

    // ------------------------------------------------------------------------
    // Control state
    // ------------------------------------------------------------------------

    pub fn value(&self, id: NodeId) -> String {
        match self.tag(id) {
            Some("select") => self
                .selected_option(id)
                .map(|o| self.option_value(o))
                .unwrap_or_default(),
            Some(_) => self.element(id).map(|el| el.value.clone()).unwrap_or_default(),
            None => String::new(),
        }
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.checked)
    }

    pub fn is_selected(&self, option: NodeId) -> bool {
        self.element(option).is_some_and(|el| el.selected)
    }

    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|&n| self.tag(n) == Some("option"))
            .collect()
    }

    pub fn option_value(&self, option: NodeId) -> String {
        match self.element(option).and_then(|el| el.attr("value")) {
            Some(v) => v.to_string(),
            None => self.option_text(option),
        }
    }

    pub fn option_text(&self, option: NodeId) -> String {
        collapse_whitespace(&self.text_content(option))
    }

    fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        let multiple = self.element(select).is_some_and(|el| el.has_attr("multiple"));
        options
            .iter()
            .copied()
            .find(|&o| self.is_selected(o))
            .or_else(|| if multiple { None } else { options.first().copied() })
    }

    /// Property assignment (`el.value = v`). A mounted framework's tracker sees
    /// this write, so it will not report a change for it later.
    pub fn assign_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        self.write_value(id, value)?;
        let current = self.value(id);
        if let Some(tracked) = self
            .framework
            .as_mut()
            .and_then(|fw| fw.trackers.get_mut(&id))
        {
            tracked.value = current;
        }
        Ok(())
    }

    /// The base platform value setter; bypasses any framework tracker.
    pub fn set_native_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        self.write_value(id, value)
    }

    fn write_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        if self.tag(id) == Some("select") {
            let target = self
                .options(id)
                .into_iter()
                .find(|&o| self.option_value(o) == value);
            for option in self.options(id) {
                self.element_mut(option)?.selected = Some(option) == target;
            }
            return Ok(());
        }
        self.element_mut(id)?.value = value.to_string();
        Ok(())
    }

    /// Set the checked state; checking a radio unchecks the rest of its group.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), DomError> {
        self.element_mut(id)?.checked = checked;
        if !checked || self.control_type(id) != "radio" {
            return Ok(());
        }

        let name = self
            .element(id)
            .map(|el| el.name().to_string())
            .unwrap_or_default();
        let owner = self.form_owner(id);
        for other in self.elements_by_name(&name) {
            if other != id && self.control_type(other) == "radio" && self.form_owner(other) == owner {
                self.element_mut(other)?.checked = false;
            }
        }
        Ok(())
    }

    pub fn select_option(&mut self, select: NodeId, option: NodeId) -> Result<(), DomError> {
        let multiple = self.element(select).is_some_and(|el| el.has_attr("multiple"));
        if !multiple {
            for other in self.options(select) {
                if other != option {
                    self.element_mut(other)?.selected = false;
                }
            }
        }
        self.element_mut(option)?.selected = true;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Events and framework observation
    // ------------------------------------------------------------------------

    /// Attach a reactive framework at `root`; every control below it gets a
    /// tracker seeded with its current state.
    pub fn mount_framework(&mut self, root: NodeId) {
        let trackers = std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|&n| matches!(self.tag(n), Some("input" | "select" | "textarea")))
            .map(|n| {
                (
                    n,
                    TrackedState {
                        value: self.value(n),
                        checked: self.is_checked(n),
                    },
                )
            })
            .collect();

        self.framework = Some(Framework {
            root,
            trackers,
            changes: Vec::new(),
        });
    }

    pub fn framework_changes(&self) -> &[FrameworkChange] {
        self.framework
            .as_ref()
            .map(|fw| fw.changes.as_slice())
            .unwrap_or(&[])
    }

    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind, bubbles: bool) -> Result<(), DomError> {
        if self.node(target).is_none() {
            return Err(DomError::UnknownNode(target));
        }

        let mut path = vec![target];
        if bubbles {
            path.extend(self.ancestors(target));
        }

        let value = self.value(target);
        let checked = self.is_checked(target);
        if let Some(fw) = self.framework.as_mut() {
            if path.contains(&fw.root) {
                if let Some(tracked) = fw.trackers.get_mut(&target) {
                    if tracked.value != value || tracked.checked != checked {
                        tracked.value = value.clone();
                        tracked.checked = checked;
                        fw.changes.push(FrameworkChange {
                            target,
                            event: kind,
                            value,
                            checked,
                        });
                    }
                }
            }
        }

        self.events.push(DispatchedEvent {
            target,
            kind,
            bubbles,
            path,
        });
        Ok(())
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn events_for(&self, target: NodeId) -> Vec<&DispatchedEvent> {
        self.events.iter().filter(|e| e.target == target).collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

fn is_display_none(el: &Element) -> bool {
    el.attr("style").is_some_and(|style| {
        style.split(';').any(|decl| match decl.split_once(':') {
            Some((prop, value)) => {
                prop.trim().eq_ignore_ascii_case("display") && value.trim().eq_ignore_ascii_case("none")
            }
            None => false,
        })
    })
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
