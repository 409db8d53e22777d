//! Render-tree model.
//!
//! [`Document`] owns the tree through strong `Rc` links from parent to
//! child. Everything else (parent back-links, the id index, the dedup
//! engine's seen set) holds `Weak` handles, so removing a subtree from its
//! parent is enough to reclaim it.
//!
//! Selectors are chains of [`Marker`]s joined by the descendant combinator,
//! which is the only combinator the chat surface's contract needs.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node id: {0}")]
    UnknownNode(String),

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("cannot remove the document root")]
    RemoveRoot,
}

// ─── NodeSpec ────────────────────────────────────────────────────

/// Serializable description of a subtree, as delivered by the host bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Host-assigned id, needed only for nodes that later mutations or UI
    /// events refer to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Text owned directly by this node (children carry their own).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

// ─── Marker ──────────────────────────────────────────────────────

/// One compound selector step: optional tag name plus attribute equalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub tag: Option<&'static str>,
    pub attrs: &'static [(&'static str, &'static str)],
}

impl Marker {
    /// Any element carrying all of `attrs`.
    pub const fn any(attrs: &'static [(&'static str, &'static str)]) -> Self {
        Self { tag: None, attrs }
    }

    /// A `tag` element carrying all of `attrs`.
    pub const fn tag(tag: &'static str, attrs: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            tag: Some(tag),
            attrs,
        }
    }
}

// ─── Element ─────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Element {
    id: Option<String>,
    tag: String,
    attrs: RefCell<BTreeMap<String, String>>,
    text: RefCell<String>,
    /// Current value of form controls.
    value: RefCell<String>,
    parent: RefCell<Weak<Element>>,
    children: RefCell<Vec<Rc<Element>>>,
}

impl Element {
    fn build(spec: &NodeSpec, parent: Weak<Element>) -> Rc<Element> {
        let element = Rc::new(Element {
            id: spec.id.clone(),
            tag: spec.tag.to_ascii_lowercase(),
            attrs: RefCell::new(spec.attrs.clone()),
            text: RefCell::new(spec.text.clone()),
            value: RefCell::new(spec.attrs.get("value").cloned().unwrap_or_default()),
            parent: RefCell::new(parent),
            children: RefCell::new(Vec::with_capacity(spec.children.len())),
        });
        let children: Vec<Rc<Element>> = spec
            .children
            .iter()
            .map(|child| Element::build(child, Rc::downgrade(&element)))
            .collect();
        *element.children.borrow_mut() = children;
        element
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.attrs.borrow().get(name).cloned()
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        self.attrs
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    pub fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_owned();
    }

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    pub fn set_value(&self, value: &str) {
        *self.value.borrow_mut() = value.to_owned();
    }

    pub fn parent(&self) -> Option<Rc<Element>> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> Vec<Rc<Element>> {
        self.children.borrow().clone()
    }

    /// Own text followed by every descendant's text, in document order.
    pub fn text_content(&self) -> String {
        let mut out = self.text.borrow().clone();
        for child in self.children.borrow().iter() {
            out.push_str(&child.text_content());
        }
        out
    }

    /// Text owned directly by this node.
    pub fn own_text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn matches(&self, marker: &Marker) -> bool {
        if let Some(tag) = marker.tag {
            if !self.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        let attrs = self.attrs.borrow();
        marker
            .attrs
            .iter()
            .all(|(name, value)| attrs.get(*name).is_some_and(|v| v.as_str() == *value))
    }

    /// Whether this element matches a descendant-combinator selector chain.
    ///
    /// The last marker must match `self`; earlier markers are matched
    /// greedily against ancestors, right to left.
    pub fn matches_chain(&self, selector: &[Marker]) -> bool {
        let Some((last, rest)) = selector.split_last() else {
            return false;
        };
        if !self.matches(last) {
            return false;
        }
        let mut remaining = rest.len();
        let mut cursor = self.parent();
        while remaining > 0 {
            let Some(ancestor) = cursor else {
                return false;
            };
            if ancestor.matches(&rest[remaining - 1]) {
                remaining -= 1;
            }
            cursor = ancestor.parent();
        }
        true
    }

    /// All descendants (excluding `self`) in document order.
    pub fn descendants(&self) -> Vec<Rc<Element>> {
        let mut out = Vec::new();
        let mut stack: Vec<Rc<Element>> = self.children.borrow().iter().rev().cloned().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children.borrow().iter().rev().cloned());
            out.push(node);
        }
        out
    }

    /// Descendants matching `selector`, in document order.
    pub fn query_all(&self, selector: &[Marker]) -> Vec<Rc<Element>> {
        self.descendants()
            .into_iter()
            .filter(|el| el.matches_chain(selector))
            .collect()
    }

    /// First descendant matching `selector`.
    pub fn query_first(&self, selector: &[Marker]) -> Option<Rc<Element>> {
        self.descendants()
            .into_iter()
            .find(|el| el.matches_chain(selector))
    }
}

// ─── Document ────────────────────────────────────────────────────

/// The live render tree.
#[derive(Debug)]
pub struct Document {
    root: Rc<Element>,
    index: HashMap<String, Weak<Element>>,
}

impl Document {
    /// An empty document with a bare `body` root.
    pub fn new() -> Self {
        Self {
            root: Element::build(&NodeSpec::new("body"), Weak::new()),
            index: HashMap::new(),
        }
    }

    /// Build a document from a full snapshot of the tree.
    pub fn from_spec(spec: &NodeSpec) -> Result<Self, DomError> {
        let mut doc = Self {
            root: Element::build(spec, Weak::new()),
            index: HashMap::new(),
        };
        let root = Rc::clone(&doc.root);
        doc.index_subtrees(&[root])?;
        Ok(doc)
    }

    pub fn root(&self) -> &Rc<Element> {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<Rc<Element>> {
        self.index.get(id).and_then(Weak::upgrade)
    }

    fn require(&self, id: &str) -> Result<Rc<Element>, DomError> {
        self.get(id)
            .ok_or_else(|| DomError::UnknownNode(id.to_owned()))
    }

    /// Elements matching `selector`, the root included, in document order.
    pub fn query_all(&self, selector: &[Marker]) -> Vec<Rc<Element>> {
        let mut out = Vec::new();
        if self.root.matches_chain(selector) {
            out.push(Rc::clone(&self.root));
        }
        out.extend(self.root.query_all(selector));
        out
    }

    pub fn query_first(&self, selector: &[Marker]) -> Option<Rc<Element>> {
        if self.root.matches_chain(selector) {
            return Some(Rc::clone(&self.root));
        }
        self.root.query_first(selector)
    }

    /// Append subtrees under `parent_id` (the root when `None`).
    ///
    /// Returns the newly attached subtree roots in the given order. All or
    /// nothing: on a duplicate id no node is attached.
    pub fn append(
        &mut self,
        parent_id: Option<&str>,
        specs: &[NodeSpec],
    ) -> Result<Vec<Rc<Element>>, DomError> {
        let parent = match parent_id {
            Some(id) => self.require(id)?,
            None => Rc::clone(&self.root),
        };
        let added: Vec<Rc<Element>> = specs
            .iter()
            .map(|spec| Element::build(spec, Rc::downgrade(&parent)))
            .collect();
        self.index_subtrees(&added)?;
        parent
            .children
            .borrow_mut()
            .extend(added.iter().map(Rc::clone));
        Ok(added)
    }

    /// Detach a subtree. Once the caller drops any handles it holds, the
    /// subtree is freed.
    pub fn remove(&mut self, id: &str) -> Result<(), DomError> {
        let element = self.require(id)?;
        let parent = element.parent().ok_or(DomError::RemoveRoot)?;
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, &element));
        self.unindex_subtree(&element);
        Ok(())
    }

    pub fn set_attr(&self, id: &str, name: &str, value: &str) -> Result<(), DomError> {
        self.require(id)?.set_attr(name, value);
        Ok(())
    }

    pub fn set_text(&self, id: &str, text: &str) -> Result<(), DomError> {
        self.require(id)?.set_text(text);
        Ok(())
    }

    pub fn set_value(&self, id: &str, value: &str) -> Result<(), DomError> {
        self.require(id)?.set_value(value);
        Ok(())
    }

    /// Index every id under `roots`. Nothing is indexed when an id is
    /// already live or appears twice among `roots`.
    fn index_subtrees(&mut self, roots: &[Rc<Element>]) -> Result<(), DomError> {
        let mut nodes = Vec::new();
        for root in roots {
            nodes.push(Rc::clone(root));
            nodes.extend(root.descendants());
        }
        let mut fresh: HashMap<&str, &Rc<Element>> = HashMap::new();
        for node in &nodes {
            let Some(id) = node.id() else { continue };
            if self.get(id).is_some() || fresh.insert(id, node).is_some() {
                return Err(DomError::DuplicateId(id.to_owned()));
            }
        }
        for (id, node) in fresh {
            self.index.insert(id.to_owned(), Rc::downgrade(node));
        }
        Ok(())
    }

    fn unindex_subtree(&mut self, element: &Rc<Element>) {
        let mut nodes = vec![Rc::clone(element)];
        nodes.extend(element.descendants());
        for node in nodes {
            if let Some(id) = node.id() {
                self.index.remove(id);
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: Marker = Marker::any(&[("data-kind", "row")]);
    const LABEL: Marker = Marker::tag("span", &[("data-kind", "label")]);

    fn sample() -> Document {
        let spec = NodeSpec::new("body").child(
            NodeSpec::new("div")
                .with_id("list")
                .child(
                    NodeSpec::new("div")
                        .with_id("r1")
                        .attr("data-kind", "row")
                        .child(NodeSpec::new("span").attr("data-kind", "label").text("one")),
                )
                .child(NodeSpec::new("span").attr("data-kind", "label").text("loose")),
        );
        Document::from_spec(&spec).expect("valid tree")
    }

    #[test]
    fn query_all_respects_descendant_chain() {
        let doc = sample();
        let labels = doc.query_all(&[ROW, LABEL]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text_content(), "one");

        assert_eq!(doc.query_all(&[LABEL]).len(), 2);
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        let doc = Document::from_spec(&NodeSpec::new("body").child(NodeSpec::new("SPAN").attr(
            "data-kind",
            "label",
        )))
        .expect("valid tree");
        assert!(doc.query_first(&[LABEL]).is_some());
    }

    #[test]
    fn text_content_concatenates_in_document_order() {
        let doc = Document::from_spec(
            &NodeSpec::new("body").child(
                NodeSpec::new("p")
                    .with_id("p")
                    .text("a")
                    .child(NodeSpec::new("b").text("b"))
                    .child(NodeSpec::new("i").text("c")),
            ),
        )
        .expect("valid tree");
        assert_eq!(doc.get("p").expect("indexed").text_content(), "abc");
    }

    #[test]
    fn append_attaches_under_parent_and_indexes_ids() {
        let mut doc = sample();
        let added = doc
            .append(
                Some("list"),
                &[NodeSpec::new("div").with_id("r2").attr("data-kind", "row")],
            )
            .expect("append");
        assert_eq!(added.len(), 1);
        let r2 = doc.get("r2").expect("indexed");
        assert!(Rc::ptr_eq(&r2, &added[0]));
        assert_eq!(r2.parent().and_then(|p| p.id().map(str::to_owned)), Some("list".into()));
    }

    #[test]
    fn append_to_unknown_parent_fails() {
        let mut doc = sample();
        let err = doc
            .append(Some("nope"), &[NodeSpec::new("div")])
            .expect_err("unknown parent");
        assert_eq!(err, DomError::UnknownNode("nope".into()));
    }

    #[test]
    fn duplicate_live_id_rejected() {
        let mut doc = sample();
        let err = doc
            .append(None, &[NodeSpec::new("div").with_id("r1")])
            .expect_err("duplicate");
        assert_eq!(err, DomError::DuplicateId("r1".into()));
    }

    #[test]
    fn failed_append_attaches_nothing() {
        let mut doc = sample();
        let err = doc
            .append(
                Some("list"),
                &[
                    NodeSpec::new("div").with_id("m1").attr("data-kind", "row"),
                    NodeSpec::new("div").with_id("r1"),
                ],
            )
            .expect_err("duplicate");
        assert_eq!(err, DomError::DuplicateId("r1".into()));
        assert!(doc.get("m1").is_none());
        assert_eq!(doc.get("list").expect("list").children().len(), 2);
        assert_eq!(doc.query_all(&[ROW]).len(), 1);
    }

    #[test]
    fn duplicate_id_within_one_append_rejected() {
        let mut doc = sample();
        let err = doc
            .append(
                None,
                &[NodeSpec::new("div")
                    .with_id("x")
                    .child(NodeSpec::new("span").with_id("x"))],
            )
            .expect_err("duplicate in subtree");
        assert_eq!(err, DomError::DuplicateId("x".into()));

        let err = doc
            .append(
                None,
                &[NodeSpec::new("div").with_id("y"), NodeSpec::new("div").with_id("y")],
            )
            .expect_err("duplicate across siblings");
        assert_eq!(err, DomError::DuplicateId("y".into()));
        assert!(doc.get("x").is_none());
        assert!(doc.get("y").is_none());
    }

    #[test]
    fn snapshot_with_duplicate_ids_rejected() {
        let spec = NodeSpec::new("body")
            .child(NodeSpec::new("div").with_id("a"))
            .child(NodeSpec::new("p").with_id("a"));
        assert_eq!(
            Document::from_spec(&spec).map(|_| ()),
            Err(DomError::DuplicateId("a".into()))
        );
    }

    #[test]
    fn removed_subtree_is_reclaimed() {
        let mut doc = sample();
        let weak = Rc::downgrade(&doc.get("r1").expect("indexed"));
        doc.remove("r1").expect("remove");
        assert!(weak.upgrade().is_none());
        assert!(doc.get("r1").is_none());
    }

    #[test]
    fn removing_root_is_an_error() {
        let mut doc = Document::from_spec(&NodeSpec::new("body").with_id("root")).expect("tree");
        assert_eq!(doc.remove("root"), Err(DomError::RemoveRoot));
    }

    #[test]
    fn set_attr_changes_matching() {
        let doc = sample();
        doc.set_attr("list", "data-kind", "row").expect("set");
        // The list itself now matches ROW, so the loose label is inside a row too.
        assert_eq!(doc.query_all(&[ROW, LABEL]).len(), 2);
    }

    #[test]
    fn node_spec_deserializes_with_defaults() {
        let spec: NodeSpec =
            serde_json::from_str(r#"{"tag":"div","attrs":{"role":"radio"}}"#).expect("json");
        assert_eq!(spec.tag, "div");
        assert_eq!(spec.attrs.get("role").map(String::as_str), Some("radio"));
        assert!(spec.children.is_empty());
        assert!(spec.id.is_none());
    }
}
