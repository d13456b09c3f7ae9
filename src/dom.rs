//! Mutable in-memory document the page runtime operates on.
//!
//! [`Document`] owns a [`scraper::Html`] and edits its `ego_tree` in place:
//! elements can be created, appended, detached and have their attributes or
//! class lists changed, which is what the navigation controller and the feed
//! loader need. Queries go through [`scraper::Selector`], and serialization
//! through html5ever's serializer, so whatever the parser accepted is written
//! back out the same way.

use ego_tree::NodeId;
use html5ever::serialize::{Serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, QualName, ns};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

/// A parsed, editable HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            html: Html::new_document(),
        }
    }
}

impl Document {
    /// Parse a complete HTML document.
    ///
    /// Parsing never fails: html5ever recovers from malformed markup the way
    /// browsers do, adding the implied `html`, `head` and `body` elements.
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        if !html.errors.is_empty() {
            debug!(errors = html.errors.len(), "Host page parsed with recoverable errors");
        }
        Self { html }
    }

    pub fn root(&self) -> NodeId {
        self.html.tree.root().id()
    }

    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        ElementRef::wrap(self.html.tree.get(id)?)
    }

    /// Create a detached HTML element; attach it with [`Document::append_child`].
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(name.to_ascii_lowercase()));
        self.html
            .tree
            .orphan(Node::Element(Element::new(name, Vec::new())))
            .id()
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.html
            .tree
            .orphan(Node::Text(Text {
                text: StrTendril::from_slice(text),
            }))
            .id()
    }

    /// Move `child` (and its subtree) to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.is_ancestor(child, parent) {
            return;
        }
        if let Some(mut node) = self.html.tree.get_mut(parent) {
            node.append_id(child);
        }
    }

    /// Detach `id` from its parent. The node keeps its own subtree.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.html.tree.get(id)?.parent().map(|parent| parent.id())
    }

    /// Whether `id` is still connected to the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.root();
        id == root || self.is_ancestor(root, id)
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.html
            .tree
            .get(id)
            .is_some_and(|node| node.ancestors().any(|a| a.id() == ancestor))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.value().attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.edit_attrs(id, |attrs| set_attr_value(attrs, name, value));
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            self.toggle_class(id, class);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            self.toggle_class(id, class);
        }
    }

    /// Flip `class` and return whether it is present afterwards.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        self.edit_attrs(id, |attrs| {
            let current = attr_value(attrs, "class").unwrap_or("");
            let mut list = current.split_ascii_whitespace().collect::<Vec<_>>();
            let present = list.contains(&class);
            if present {
                list.retain(|c| *c != class);
            } else {
                list.push(class);
            }
            let joined = list.join(" ");
            set_attr_value(attrs, "class", &joined);
            !present
        })
        .unwrap_or(false)
    }

    /// Run `edit` over the attributes of element `id` and rebuild the element,
    /// which also refreshes scraper's cached id and class set.
    fn edit_attrs<R>(&mut self, id: NodeId, edit: impl FnOnce(&mut Vec<Attribute>) -> R) -> Option<R> {
        let mut node = self.html.tree.get_mut(id)?;
        let Node::Element(element) = node.value() else {
            return None;
        };
        let mut attrs = element
            .attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: name.clone(),
                value: value.clone(),
            })
            .collect::<Vec<_>>();
        let result = edit(&mut attrs);
        *element = Element::new(element.name.clone(), attrs);
        Some(result)
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.html.tree.get(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|n| n.value().as_text().map(|text| &**text))
            .collect()
    }

    /// Replace every child of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node);
        }
    }

    /// All elements below `scope` (excluding `scope`) matching `selector`, in
    /// document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = parse_selector(selector)?;
        Ok(self.select(scope, &selector))
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector = parse_selector(selector)?;
        Ok(self.select(scope, &selector).into_iter().next())
    }

    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let Some(scope) = self.html.tree.get(scope) else {
            return Vec::new();
        };
        match ElementRef::wrap(scope) {
            Some(element) => element.select(selector).map(|found| found.id()).collect(),
            // `Html::select` walks every node in the arena, detached ones
            // included, so the document root walks its own descendants.
            None => scope
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|element| selector.matches(element))
                .map(|element| element.id())
                .collect(),
        }
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().id() == Some(id))
            .map(|element| element.id())
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        serialize(&self.html, TraversalScope::IncludeNode)
    }

    /// Markup of element `id` including the element itself; empty for
    /// anything that is not an element.
    pub fn outer_html(&self, id: NodeId) -> String {
        self.element(id)
            .map(|element| serialize(&element, TraversalScope::IncludeNode))
            .unwrap_or_default()
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        self.element(id)
            .map(|element| serialize(&element, TraversalScope::ChildrenOnly(None)))
            .unwrap_or_default()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, DomError> {
    Selector::parse(selector).map_err(|e| DomError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn attr_value<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| attr.name.ns == ns!() && &*attr.name.local == name)
        .map(|attr| &*attr.value)
}

fn set_attr_value(attrs: &mut Vec<Attribute>, name: &str, value: &str) {
    let value = StrTendril::from_slice(value);
    match attrs
        .iter_mut()
        .find(|attr| attr.name.ns == ns!() && &*attr.name.local == name)
    {
        Some(existing) => existing.value = value,
        None => attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value,
        }),
    }
}

/// html5ever serialization with scripting enabled, matching how the parser
/// treated `<noscript>` content (as raw text).
fn serialize<T: Serialize>(node: &T, traversal_scope: TraversalScope) -> String {
    let opts = SerializeOpts {
        scripting_enabled: true,
        traversal_scope,
        create_missing_parent: false,
    };
    let mut buf = Vec::new();
    if let Err(e) = html5ever::serialize(&mut buf, node, opts) {
        warn!(error = %e, "HTML serialization stopped early");
    }
    String::from_utf8_lossy(&buf).into_owned()
}
