//! Selector querying over a snapshot.
//!
//! The optimizer only needs "which nodes does this selector select", so the
//! query engine sits behind [`SelectorQuery`] and can be swapped for a real
//! browser-backed implementation.

use tracing::trace;

use crate::error::Result;
use crate::selector::{SelectorMatcher, parse_selector};
use crate::tree::{ElementTree, NodeId};

/// Runs selector text against an element tree.
pub trait SelectorQuery {
    /// Every node `selector` selects, in document order.
    ///
    /// The document node is included when the selector matches it (only `*`
    /// does). Fails on selector text the engine cannot parse.
    fn select(&self, tree: &ElementTree, selector: &str) -> Result<Vec<NodeId>>;
}

/// The built-in query engine, backed by [`SelectorMatcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeQuery;

impl TreeQuery {
    pub fn new() -> Self {
        Self
    }
}

impl SelectorQuery for TreeQuery {
    fn select(&self, tree: &ElementTree, selector: &str) -> Result<Vec<NodeId>> {
        let parsed = parse_selector(selector)?;
        let nodes: Vec<NodeId> = tree
            .descendants()
            .filter(|node| SelectorMatcher::matches(&parsed, tree, *node))
            .collect();
        trace!(selector, count = nodes.len(), "selector query");
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectorError;
    use crate::tree::Element;

    #[test]
    fn selects_in_document_order() {
        let mut tree = ElementTree::new();
        let html = tree.append(tree.root(), Element::new("html"));
        let a = tree.append(html, Element::new("p").with_class("x"));
        let b = tree.append(a, Element::new("p").with_class("x"));
        let _c = tree.append(html, Element::new("div"));

        let found = TreeQuery.select(&tree, "p.x").unwrap();
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn universal_selects_document() {
        let mut tree = ElementTree::new();
        tree.append(tree.root(), Element::new("html"));
        let found = TreeQuery.select(&tree, "*").unwrap();
        assert_eq!(found.first(), Some(&tree.root()));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn document_node_is_never_an_ancestor() {
        let mut tree = ElementTree::new();
        let html = tree.append(tree.root(), Element::new("html"));
        let body = tree.append(html, Element::new("body"));
        let foo = tree.append(body, Element::new("p").with_class("foo"));

        assert!(TreeQuery.select(&tree, "* html .foo").unwrap().is_empty());
        assert!(TreeQuery.select(&tree, "* > html").unwrap().is_empty());
        assert_eq!(TreeQuery.select(&tree, "* .foo").unwrap(), vec![foo]);
        assert_eq!(TreeQuery.select(&tree, "html > *").unwrap(), vec![body]);
    }

    #[test]
    fn reports_bad_selectors() {
        let tree = ElementTree::new();
        assert!(matches!(
            TreeQuery.select(&tree, "p >"),
            Err(SelectorError::UnexpectedToken { .. })
        ));
        assert_eq!(TreeQuery.select(&tree, "  "), Err(SelectorError::Empty));
    }
}
