//! Selector matching algorithm.
//!
//! State pseudo-classes (`:hover`, `:checked`, ...) cannot be decided from a
//! static snapshot and always match here; callers that care apply their own
//! compatibility checks on top.

use super::{Combinator, ComplexSelector, Compound, NthExpr, PseudoClass, TypeSelector};
use crate::tree::{Element, ElementTree, NodeId};

/// Selector matching engine.
pub struct SelectorMatcher;

impl SelectorMatcher {
    /// Check if a full selector matches `node`, considering combinators.
    ///
    /// Walks the selector from right to left and backtracks over every
    /// candidate ancestor or sibling, so `a b c` matches whenever any chain
    /// of elements satisfies it.
    pub fn matches(selector: &ComplexSelector, tree: &ElementTree, node: NodeId) -> bool {
        if selector.compounds.is_empty() {
            return false;
        }
        Self::matches_from(selector, selector.compounds.len() - 1, tree, node)
    }

    /// Match `selector.compounds[..=index]` with `compounds[index]` anchored
    /// at `node`.
    pub fn matches_from(
        selector: &ComplexSelector,
        index: usize,
        tree: &ElementTree,
        node: NodeId,
    ) -> bool {
        if !Self::compound_matches(&selector.compounds[index], tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        // Combinators only ever reach elements; the document node can stand
        // in for nothing but the subject.
        let next = index - 1;
        match selector.combinators[next] {
            Combinator::Child => tree
                .parent_element(node)
                .is_some_and(|parent| Self::matches_from(selector, next, tree, parent)),
            Combinator::Descendant => tree
                .ancestor_elements(node)
                .any(|ancestor| Self::matches_from(selector, next, tree, ancestor)),
            Combinator::AdjacentSibling => tree
                .previous_sibling(node)
                .is_some_and(|sibling| Self::matches_from(selector, next, tree, sibling)),
            Combinator::GeneralSibling => tree
                .preceding_siblings(node)
                .any(|sibling| Self::matches_from(selector, next, tree, sibling)),
        }
    }

    /// Check if a single compound matches `node`.
    ///
    /// The synthetic document node only matches compounds without
    /// constraints (`*`), and only as the subject of a selector.
    pub fn compound_matches(compound: &Compound, tree: &ElementTree, node: NodeId) -> bool {
        match tree.element(node) {
            Some(element) => Self::element_matches(compound, tree, node, element),
            None => tree.is_document(node) && compound.is_universal_only(),
        }
    }

    fn element_matches(
        compound: &Compound,
        tree: &ElementTree,
        node: NodeId,
        element: &Element,
    ) -> bool {
        // Check type selector
        if let Some(TypeSelector::Type(name)) = &compound.type_selector
            && !name.eq_ignore_ascii_case(&element.tag)
        {
            return false;
        }

        // Check ID selector
        if let Some(id) = &compound.id
            && element.id.as_deref() != Some(id.as_str())
        {
            return false;
        }

        // Check class selectors (all must match)
        if !compound.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }

        // Check attribute selectors
        if !compound
            .attributes
            .iter()
            .all(|a| a.matches_value(element.attr_value(&a.name).as_deref()))
        {
            return false;
        }

        compound
            .pseudo_classes
            .iter()
            .all(|p| Self::pseudo_matches(p, tree, node, element))
    }

    fn pseudo_matches(
        pseudo: &PseudoClass,
        tree: &ElementTree,
        node: NodeId,
        element: &Element,
    ) -> bool {
        let siblings = || SiblingInfo::of(tree, node, None);
        let typed = || SiblingInfo::of(tree, node, Some(&element.tag));

        match pseudo {
            PseudoClass::FirstChild => siblings().is_first(),
            PseudoClass::LastChild => siblings().is_last(),
            PseudoClass::OnlyChild => siblings().is_only(),
            PseudoClass::FirstOfType => typed().is_first(),
            PseudoClass::LastOfType => typed().is_last(),
            PseudoClass::OnlyOfType => typed().is_only(),
            PseudoClass::NthChild(expr) => siblings().nth(expr),
            PseudoClass::NthLastChild(expr) => siblings().nth_last(expr),
            PseudoClass::NthOfType(expr) => typed().nth(expr),
            PseudoClass::NthLastOfType(expr) => typed().nth_last(expr),
            PseudoClass::Empty => tree.children(node).is_empty(),
            PseudoClass::Root => tree.parent(node).is_some_and(|p| tree.is_document(p)),
            PseudoClass::Not(inner) => !Self::element_matches(inner, tree, node, element),
            PseudoClass::State(_) => true,
            PseudoClass::Unknown(_) => false,
        }
    }
}

/// Sibling position information.
#[derive(Debug, Clone, Copy)]
struct SiblingInfo {
    /// Zero-based index among siblings.
    index: usize,
    /// Total number of siblings (including self).
    count: usize,
}

impl SiblingInfo {
    /// Position among element siblings, optionally only those with `tag`.
    fn of(tree: &ElementTree, node: NodeId, tag: Option<&str>) -> Self {
        let Some(parent) = tree.parent(node) else {
            return Self { index: 0, count: 1 };
        };
        let mut index = 0;
        let mut count = 0;
        for sibling in tree.children(parent) {
            let Some(element) = tree.element(*sibling) else {
                continue;
            };
            if tag.is_some_and(|t| t != element.tag) {
                continue;
            }
            if *sibling == node {
                index = count;
            }
            count += 1;
        }
        Self { index, count }
    }

    fn is_first(&self) -> bool {
        self.index == 0
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.count
    }

    fn is_only(&self) -> bool {
        self.count == 1
    }

    fn nth(&self, expr: &NthExpr) -> bool {
        expr.matches(self.index)
    }

    fn nth_last(&self, expr: &NthExpr) -> bool {
        expr.matches(self.count - 1 - self.index)
    }
}
