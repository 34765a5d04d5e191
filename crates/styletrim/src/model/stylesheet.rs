//! Stylesheets and their rule trees.

use super::{MediaList, RuleId};

/// Where a stylesheet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StylesheetKind {
    /// Linked with `<link rel="stylesheet">`.
    #[default]
    External,
    /// Collected from `<style>` elements.
    Embedded,
}

/// A node of a stylesheet's rule tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    /// A style rule.
    Style(RuleId),
    /// An `@media` block and its nested rules.
    Media {
        queries: MediaList,
        children: Vec<RuleNode>,
    },
    /// Any other at-rule, kept as written.
    Verbatim(String),
}

/// A parsed stylesheet.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    /// URL or synthetic key of the source.
    pub key: String,
    pub kind: StylesheetKind,
    /// Cascade tie-breaker: higher wins.
    pub discovery_order: u32,
    pub nodes: Vec<RuleNode>,
    /// Human-readable parse errors.
    pub parse_errors: Vec<String>,
}

impl Stylesheet {
    /// Create an empty stylesheet.
    pub fn new(key: impl Into<String>, kind: StylesheetKind, discovery_order: u32) -> Self {
        Self {
            key: key.into(),
            kind,
            discovery_order,
            nodes: vec![],
            parse_errors: vec![],
        }
    }

    /// Style rules in source order, descending into media blocks.
    pub fn rules(&self) -> Vec<RuleId> {
        let mut out = vec![];
        collect_rules(&self.nodes, &mut out);
        out
    }

    /// Keep only the style rules for which `keep` returns true and drop
    /// media blocks left empty. Returns the number of style rules removed.
    pub fn retain_rules(&mut self, mut keep: impl FnMut(RuleId) -> bool) -> usize {
        retain_nodes(&mut self.nodes, &mut keep)
    }
}

fn collect_rules(nodes: &[RuleNode], out: &mut Vec<RuleId>) {
    for node in nodes {
        match node {
            RuleNode::Style(id) => out.push(*id),
            RuleNode::Media { children, .. } => collect_rules(children, out),
            RuleNode::Verbatim(_) => {}
        }
    }
}

fn retain_nodes(nodes: &mut Vec<RuleNode>, keep: &mut impl FnMut(RuleId) -> bool) -> usize {
    let mut removed = 0;
    nodes.retain_mut(|node| match node {
        RuleNode::Style(id) => {
            let kept = keep(*id);
            if !kept {
                removed += 1;
            }
            kept
        }
        RuleNode::Media { children, .. } => {
            removed += retain_nodes(children, keep);
            !children.is_empty()
        }
        RuleNode::Verbatim(_) => true,
    });
    removed
}
