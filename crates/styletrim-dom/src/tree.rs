//! Arena-backed element tree for one rendered page snapshot.
//!
//! A snapshot is immutable once built: nodes are appended in document order
//! and linked by index, so a [`NodeId`] stays valid for the lifetime of the
//! tree.
//!
//! # Example
//!
//! ```
//! use styletrim_dom::{Element, ElementTree};
//!
//! let mut tree = ElementTree::new();
//! let body = tree.append(tree.root(), Element::new("body"));
//! let link = tree.append(body, Element::new("a").with_attr("href", "/home"));
//!
//! assert_eq!(tree.parent(link), Some(body));
//! assert_eq!(tree.path(link), vec![0, 0]);
//! ```

use std::fmt;

/// Index of a node inside an [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The document root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Raw index into the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// An element's name, identity and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Value of the `id` attribute.
    pub id: Option<String>,
    /// Whitespace-separated entries of the `class` attribute.
    pub classes: Vec<String>,
    /// All other attributes, in source order.
    pub attrs: Vec<(String, String)>,
}

impl Element {
    /// Create an element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Set the element id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add an attribute. `id` and `class` are routed to their dedicated fields.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match name.as_str() {
            "id" => self.id = Some(value),
            "class" => self
                .classes
                .extend(value.split_ascii_whitespace().map(str::to_string)),
            _ => self.attrs.push((name, value)),
        }
        self
    }

    /// Look up a plain attribute value. `class` is only available through
    /// [`Element::attr_value`].
    pub fn attr(&self, name: &str) -> Option<&str> {
        match name {
            "id" => self.id.as_deref(),
            "class" => None,
            _ => self
                .attrs
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
        }
    }

    /// Attribute value as the DOM would report it (`class` joined by spaces).
    pub fn attr_value(&self, name: &str) -> Option<String> {
        if name == "class" {
            if self.classes.is_empty() {
                return None;
            }
            return Some(self.classes.join(" "));
        }
        self.attr(name).map(str::to_string)
    }

    /// Returns true if the element carries the attribute at all.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr_value(name).is_some()
    }

    /// Returns true if the element has the given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        Ok(())
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic document node above `<html>`.
    Document,
    /// A regular element.
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Position in the parent's child list.
    index_in_parent: u32,
}

/// Element tree of one page snapshot.
#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<Node>,
}

impl ElementTree {
    /// Create a tree holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: vec![],
                index_in_parent: 0,
            }],
        }
    }

    /// The document node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Append an element as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let index_in_parent = self.nodes[parent.index()].children.len() as u32;
        self.nodes.push(Node {
            kind: NodeKind::Element(element),
            parent: Some(parent),
            children: vec![],
            index_in_parent,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Number of nodes, document node included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds only the document node.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Node payload, if the id is in range.
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.index()).map(|n| &n.kind)
    }

    /// Element payload; `None` for the document node.
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node)? {
            NodeKind::Element(e) => Some(e),
            NodeKind::Document => None,
        }
    }

    /// Returns true for the synthetic document node.
    pub fn is_document(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Document))
    }

    /// Parent node (the document node has none).
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index())?.parent
    }

    /// Parent if it is an element, skipping the document node.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|p| !self.is_document(*p))
    }

    /// Child nodes in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Siblings before `node`, nearest first.
    pub fn preceding_siblings(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let (siblings, index) = self.sibling_slice(node);
        siblings[..index].iter().rev().copied()
    }

    /// Siblings after `node`, nearest first.
    pub fn following_siblings(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let (siblings, index) = self.sibling_slice(node);
        siblings[(index + 1).min(siblings.len())..].iter().copied()
    }

    /// The sibling immediately before `node`.
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.preceding_siblings(node).next()
    }

    /// Ancestors from the parent up to (and including) the document node.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |n| self.parent(*n))
    }

    /// Element ancestors from the parent up to the root element, skipping the
    /// document node.
    pub fn ancestor_elements(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.ancestors(node).filter(move |n| !self.is_document(*n))
    }

    /// Structural path: child indices from the document node down to `node`.
    pub fn path(&self, node: NodeId) -> Vec<u32> {
        let mut path = vec![];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            path.push(self.nodes[current.index()].index_in_parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// All nodes in document order, document node first.
    pub fn descendants(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![NodeId::ROOT];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(self.children(node).iter().rev().copied());
            Some(node)
        })
    }

    fn sibling_slice(&self, node: NodeId) -> (&[NodeId], usize) {
        match self.nodes.get(node.index()) {
            Some(n) => match n.parent {
                Some(parent) => (
                    self.nodes[parent.index()].children.as_slice(),
                    n.index_in_parent as usize,
                ),
                None => (&[], 0),
            },
            None => (&[], 0),
        }
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ElementTree, NodeId, NodeId, NodeId) {
        let mut tree = ElementTree::new();
        let html = tree.append(tree.root(), Element::new("html"));
        let first = tree.append(html, Element::new("p").with_class("lead"));
        let second = tree.append(html, Element::new("p").with_attr("class", "a b"));
        (tree, html, first, second)
    }

    #[test]
    fn navigation() {
        let (tree, html, first, second) = sample();

        assert_eq!(tree.parent(first), Some(html));
        assert_eq!(tree.parent_element(html), None);
        assert_eq!(tree.previous_sibling(second), Some(first));
        assert_eq!(tree.previous_sibling(first), None);
        assert_eq!(tree.following_siblings(first).collect::<Vec<_>>(), vec![second]);
        assert_eq!(tree.ancestors(second).collect::<Vec<_>>(), vec![html, NodeId::ROOT]);
        assert_eq!(tree.ancestor_elements(second).collect::<Vec<_>>(), vec![html]);
        assert_eq!(tree.parent_element(first), Some(html));
    }

    #[test]
    fn structural_path() {
        let (tree, _, first, second) = sample();
        assert_eq!(tree.path(first), vec![0, 0]);
        assert_eq!(tree.path(second), vec![0, 1]);
        assert!(tree.path(tree.root()).is_empty());
    }

    #[test]
    fn class_attribute_is_split() {
        let (tree, _, _, second) = sample();
        let el = tree.element(second).unwrap();
        assert!(el.has_class("a"));
        assert!(el.has_class("b"));
        assert_eq!(el.attr_value("class").as_deref(), Some("a b"));
    }

    #[test]
    fn descendants_in_document_order() {
        let (tree, html, first, second) = sample();
        let order: Vec<_> = tree.descendants().collect();
        assert_eq!(order, vec![NodeId::ROOT, html, first, second]);
    }
}
