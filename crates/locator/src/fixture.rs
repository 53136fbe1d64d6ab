//! In-memory document parsed from HTML markup.
//!
//! Holds the same page state the browser would: element tree, focus,
//! selection, text field values, location and history. Markup is parsed with
//! `scraper` and copied into a small arena so it can be mutated afterwards.

use std::cell::RefCell;
use std::collections::HashMap;

use scraper::{ElementRef, Html, Node as HtmlNode};
use tracing::debug;

use pastefocus_core::{Error, Result};

use crate::dom::{inline_style_value, Document, ElementState, MutationBatch};
use crate::patterns::CandidatePattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A collapsed document selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub container: NodeId,
    pub offset: usize,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tags whose subtree never gets a layout box.
const UNRENDERED_TAGS: &[&str] = &["head", "script", "style", "template", "noscript"];

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<Node>,
    location: String,
    history: Vec<String>,
    active: Option<NodeId>,
    selection: Option<Caret>,
    field_selections: HashMap<NodeId, (usize, usize)>,
    values: HashMap<NodeId, String>,
    mutations: MutationBatch,
}

pub struct FixtureDocument {
    inner: RefCell<Inner>,
}

impl FixtureDocument {
    pub fn parse(url: &str, markup: &str) -> Result<Self> {
        let mut inner = Inner {
            location: url.to_string(),
            history: vec![url.to_string()],
            ..Inner::default()
        };
        let root = inner.push(NodeKind::Document, None);
        let html = Html::parse_document(markup);
        inner.import(html.root_element(), root);

        let doc = Self { inner: RefCell::new(inner) };
        if doc.find_tag("body").is_none() {
            return Err(Error::Markup("document has no <body>".to_string()));
        }
        debug!(url, nodes = doc.inner.borrow().nodes.len(), "Fixture document parsed");
        Ok(doc)
    }

    pub fn body(&self) -> NodeId {
        // `parse` guarantees a body exists.
        self.find_tag("body").unwrap_or(NodeId(0))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner.descendants(NodeId(0)).into_iter().find(|node| {
            inner
                .attrs(*node)
                .is_some_and(|attrs| attrs.iter().any(|(n, v)| n == "id" && v == id))
        })
    }

    fn find_tag(&self, tag: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner
            .descendants(NodeId(0))
            .into_iter()
            .find(|node| inner.tag(*node) == Some(tag))
    }

    /// Move focus the way a user click would, without any caret side effects.
    pub fn set_active(&self, element: Option<NodeId>) {
        self.inner.borrow_mut().active = element;
    }

    pub fn selection(&self) -> Option<Caret> {
        self.inner.borrow().selection
    }

    pub fn selection_range(&self, element: NodeId) -> Option<(usize, usize)> {
        self.inner.borrow().field_selections.get(&element).copied()
    }

    pub fn value(&self, element: NodeId) -> Option<String> {
        self.inner.borrow().values.get(&element).cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.inner.borrow().history.clone()
    }

    /// `history.pushState`: changes the URL without touching the tree.
    pub fn push_state(&self, url: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.location = url.to_string();
        inner.history.push(url.to_string());
    }

    /// Swap the body's content for freshly parsed markup, as a client-side
    /// router would. Old nodes are detached and focus falls back to the body.
    pub fn replace_body(&self, markup: &str) -> Result<()> {
        let body = self.body();
        let html = Html::parse_document(markup);
        let new_body = html
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .ok_or_else(|| Error::Markup("replacement has no <body>".to_string()))?;

        let mut inner = self.inner.borrow_mut();
        let removed = std::mem::take(&mut inner.node_mut(body).children);
        for child in &removed {
            inner.node_mut(*child).parent = None;
        }
        let before = inner.nodes.len();
        inner.import_children(new_body, body);
        let added = inner.node(body).children.len();

        if inner.active.is_some_and(|active| !inner.is_attached(active)) {
            inner.active = None;
        }
        if inner.selection.is_some_and(|caret| !inner.is_attached(caret.container)) {
            inner.selection = None;
        }
        inner.mutations.records += 1;
        inner.mutations.added += added;
        inner.mutations.removed += removed.len();
        debug!(removed = removed.len(), created = inner.nodes.len() - before, "Body replaced");
        Ok(())
    }

    /// Drain the mutations recorded since the last call, like one
    /// `MutationObserver` callback.
    pub fn take_mutations(&self) -> MutationBatch {
        std::mem::take(&mut self.inner.borrow_mut().mutations)
    }
}

impl Inner {
    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, parent, children: Vec::new() });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn import(&mut self, element: ElementRef<'_>, parent: NodeId) -> NodeId {
        let value = element.value();
        let tag = value.name().to_ascii_lowercase();
        let attrs: Vec<(String, String)> = value
            .attrs()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect();

        let field_value = match tag.as_str() {
            "textarea" => Some(element.text().collect::<String>()),
            "input" => Some(value.attr("value").unwrap_or_default().to_string()),
            _ => None,
        };

        let id = self.push(NodeKind::Element { tag, attrs }, Some(parent));
        if let Some(field_value) = field_value {
            self.values.insert(id, field_value);
        }
        self.import_children(element, id);
        id
    }

    fn import_children(&mut self, element: ElementRef<'_>, parent: NodeId) {
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.import(child_element, parent);
            } else if let HtmlNode::Text(text) = child.value() {
                self.push(NodeKind::Text(String::from(&**text)), Some(parent));
            }
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn attrs(&self, id: NodeId) -> Option<&[(String, String)]> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => Some(attrs.as_slice()),
            _ => None,
        }
    }

    fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)?
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Elements under `root` in document order, `root` excluded.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if matches!(self.node(id).kind, NodeKind::Element { .. }) {
                out.push(id);
                stack.extend(self.node(id).children.iter().rev().copied());
            }
        }
        out
    }

    fn ancestors_and_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |node| self.node(*node).parent)
    }

    fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors_and_self(id).last() == Some(NodeId(0))
    }

    /// `<input type="hidden">` never gets a layout box.
    fn is_hidden_input(&self, id: NodeId) -> bool {
        self.tag(id) == Some("input")
            && self
                .attr(id, "type")
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("hidden"))
    }

    fn is_rendered(&self, id: NodeId) -> bool {
        self.is_attached(id)
            && self.ancestors_and_self(id).all(|node| {
                let hidden_attr = self.attr(node, "hidden").is_some();
                let display_none = self
                    .attr(node, "style")
                    .and_then(|style| inline_style_value(style, "display"))
                    .is_some_and(|display| display == "none");
                let unrendered_tag = self.tag(node).is_some_and(|t| UNRENDERED_TAGS.contains(&t));
                !hidden_attr && !display_none && !unrendered_tag && !self.is_hidden_input(node)
            })
    }
}

impl Document for FixtureDocument {
    type Element = NodeId;

    fn location(&self) -> String {
        self.inner.borrow().location.clone()
    }

    fn query_all(&self, pattern: &CandidatePattern) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        inner
            .descendants(NodeId(0))
            .into_iter()
            .filter(|node| match &inner.node(*node).kind {
                NodeKind::Element { tag, attrs } => pattern.matches(tag, attrs),
                _ => false,
            })
            .collect()
    }

    fn state(&self, element: &NodeId) -> ElementState {
        let inner = self.inner.borrow();
        let tag = inner.tag(*element).unwrap_or_default();
        let style = inner.attr(*element, "style").unwrap_or_default();
        ElementState {
            rendered: inner.is_rendered(*element),
            disabled: matches!(tag, "input" | "textarea" | "select" | "button")
                && inner.attr(*element, "disabled").is_some(),
            read_only: matches!(tag, "input" | "textarea")
                && inner.attr(*element, "readonly").is_some(),
            inline_display: inline_style_value(style, "display"),
            inline_visibility: inline_style_value(style, "visibility"),
        }
    }

    fn tag_name(&self, element: &NodeId) -> String {
        self.inner.borrow().tag(*element).unwrap_or_default().to_string()
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.inner.borrow().attr(*element, name).map(str::to_string)
    }

    fn is_content_editable(&self, element: &NodeId) -> bool {
        self.inner
            .borrow()
            .attr(*element, "contenteditable")
            .is_some_and(|value| value.is_empty() || value.eq_ignore_ascii_case("true"))
    }

    fn active_element(&self) -> Option<NodeId> {
        let active = {
            let inner = self.inner.borrow();
            inner.active.filter(|node| inner.is_attached(*node))
        };
        active.or_else(|| Some(self.body()))
    }

    fn focus(&self, element: &NodeId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.is_attached(*element) {
            return Err(Error::Dom("cannot focus a detached element".to_string()));
        }
        inner.active = Some(*element);
        Ok(())
    }

    fn child_count(&self, element: &NodeId) -> usize {
        self.inner.borrow().node(*element).children.len()
    }

    fn append_empty_text(&self, element: &NodeId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.tag(*element).is_none() {
            return Err(Error::Dom("text can only be appended to an element".to_string()));
        }
        inner.push(NodeKind::Text(String::new()), Some(*element));
        inner.mutations.records += 1;
        inner.mutations.added += 1;
        Ok(())
    }

    fn collapse_selection_to_end(&self, element: &NodeId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.is_attached(*element) {
            return Err(Error::Dom("cannot select inside a detached element".to_string()));
        }
        let offset = inner.node(*element).children.len();
        inner.selection = Some(Caret { container: *element, offset });
        Ok(())
    }

    fn value_len(&self, element: &NodeId) -> Option<usize> {
        self.inner
            .borrow()
            .values
            .get(element)
            .map(|value| value.encode_utf16().count())
    }

    fn set_selection_range(&self, element: &NodeId, start: usize, end: usize) -> Result<()> {
        let len = self
            .value_len(element)
            .ok_or_else(|| Error::Dom("element has no text value".to_string()))?;
        let end = end.min(len);
        let start = start.min(end);
        self.inner
            .borrow_mut()
            .field_selections
            .insert(*element, (start, end));
        Ok(())
    }
}
