//! Combinator tightening: `a b` becomes `a > b` and `a ~ b` becomes
//! `a + b` wherever every matched element is reached without a detour.
//!
//! For each matched element the selector is walked right to left, taking
//! the nearest satisfying parent or sibling at every loose combinator. A
//! combinator that needed a farther ancestor or sibling on any element
//! stays loose. The candidate rewrite is then matched against every
//! snapshot the selector matched in and kept only if it selects the same
//! elements as before.

use std::collections::{BTreeMap, BTreeSet};

use styletrim_dom::selector::{Combinator, ComplexSelector, SelectorMatcher};
use styletrim_dom::{ElementTree, NodeId};
use tracing::{debug, info, trace};

use crate::context::AnalysisContext;
use crate::model::{SelectorId, SnapshotId, StyleModel};

/// Outcome of one tightening run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TightenSummary {
    /// Combinators rewritten.
    pub combinators: usize,
    /// (old, new) selector keys of every rewrite.
    pub rewritten: Vec<(SelectorId, SelectorId)>,
}

/// Tighten loose combinators of every matched selector.
///
/// Rewritten selectors replace the original in their rule and in the
/// match index.
pub fn tighten_combinators(
    model: &mut StyleModel,
    ctx: &mut AnalysisContext,
    trees: &BTreeMap<SnapshotId, ElementTree>,
) -> TightenSummary {
    let mut summary = TightenSummary::default();

    for id in model.all_selectors() {
        let Some((ast, tightened)) = plan(model, id, trees) else {
            continue;
        };
        let Some(selector) = model.selectors.get(id) else {
            continue;
        };

        let raw = ast.to_string();
        debug!(from = %selector.raw, to = %raw, combinators = tightened, "selector tightened");
        let replacement = selector.rewritten(ast, raw);
        let new = model.selectors.insert(replacement);
        model.replace_selector(id, new);
        ctx.index.retarget(id, new);

        summary.combinators += tightened;
        summary.rewritten.push((id, new));
    }

    info!(
        selectors = summary.rewritten.len(),
        combinators = summary.combinators,
        "combinators tightened"
    );
    summary
}

/// The tightened selector and the number of combinators changed, if any
/// combinator can be tightened.
fn plan(
    model: &StyleModel,
    id: SelectorId,
    trees: &BTreeMap<SnapshotId, ElementTree>,
) -> Option<(ComplexSelector, usize)> {
    let selector = model.selectors.get(id)?;
    if selector.ignored || selector.matches.is_empty() {
        return None;
    }
    let ast = selector.ast.as_ref()?;
    if !ast.has_loose_combinator() {
        return None;
    }
    let walked = ast.filtered();

    let mut detour = vec![false; walked.combinators.len()];
    for matched in &selector.matches {
        let tree = trees.get(&matched.key.snapshot)?;
        if !witness_walk(&walked, tree, matched.key.node, &mut detour) {
            trace!(selector = %selector.raw, element = %matched.key, "no witness chain");
            return None;
        }
    }

    let candidates: Vec<usize> = walked
        .combinators
        .iter()
        .enumerate()
        .filter(|(i, c)| c.tightened().is_some() && !detour[*i])
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let snapshots: BTreeSet<SnapshotId> =
        selector.matches.iter().map(|m| m.key.snapshot).collect();
    let verify = |tightened: &ComplexSelector| {
        snapshots
            .iter()
            .filter_map(|s| trees.get(s))
            .all(|tree| same_matches(&walked, &tightened.filtered(), tree))
    };

    let all = with_tightened(ast, &candidates);
    if verify(&all) {
        return Some((all, candidates.len()));
    }

    // Fall back to the combinators that verify one at a time.
    let mut accepted: Vec<usize> = vec![];
    for index in candidates {
        let mut trial = accepted.clone();
        trial.push(index);
        if verify(&with_tightened(ast, &trial)) {
            accepted = trial;
        }
    }
    if accepted.is_empty() {
        return None;
    }
    Some((with_tightened(ast, &accepted), accepted.len()))
}

/// Walk one element's witness chain. Marks every loose combinator that
/// needed a detour. Returns false if the selector has no chain at `node`.
fn witness_walk(
    selector: &ComplexSelector,
    tree: &ElementTree,
    node: NodeId,
    detour: &mut [bool],
) -> bool {
    let mut node = node;
    for i in (0..selector.combinators.len()).rev() {
        let satisfies = |n: &NodeId| SelectorMatcher::matches_from(selector, i, tree, *n);
        let next = match selector.combinators[i] {
            Combinator::Child => tree.parent_element(node).filter(satisfies),
            Combinator::AdjacentSibling => tree.previous_sibling(node).filter(satisfies),
            Combinator::Descendant => match tree.parent_element(node).filter(satisfies) {
                Some(parent) => Some(parent),
                None => {
                    detour[i] = true;
                    tree.ancestor_elements(node).find(satisfies)
                }
            },
            Combinator::GeneralSibling => match tree.previous_sibling(node).filter(satisfies) {
                Some(sibling) => Some(sibling),
                None => {
                    detour[i] = true;
                    tree.preceding_siblings(node).find(satisfies)
                }
            },
        };
        match next {
            Some(n) => node = n,
            None => return false,
        }
    }
    true
}

fn with_tightened(ast: &ComplexSelector, indexes: &[usize]) -> ComplexSelector {
    let mut ast = ast.clone();
    for &i in indexes {
        if let Some(tight) = ast.combinators.get(i).and_then(|c| c.tightened()) {
            ast.combinators[i] = tight;
        }
    }
    ast
}

fn same_matches(
    original: &ComplexSelector,
    tightened: &ComplexSelector,
    tree: &ElementTree,
) -> bool {
    tree.descendants().all(|node| {
        SelectorMatcher::matches(original, tree, node)
            == SelectorMatcher::matches(tightened, tree, node)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptimizerConfig;
    use crate::matching::{Snapshot, match_snapshot};
    use crate::model::StylesheetKind;
    use crate::parser::parse_stylesheet;
    use styletrim_dom::{Element, TreeQuery};

    fn run(css: &str, tree: ElementTree) -> (StyleModel, TightenSummary) {
        let mut model = StyleModel::new();
        let sheet = parse_stylesheet(
            &mut model,
            "t.css",
            css,
            StylesheetKind::External,
            0,
            &OptimizerConfig::default(),
        );
        let mut ctx = AnalysisContext::new();
        let snapshot = Snapshot::new(SnapshotId(0), tree);
        match_snapshot(&mut model, &mut ctx, &snapshot, &[sheet], &TreeQuery::new());

        let mut trees = BTreeMap::new();
        trees.insert(snapshot.id, snapshot.tree);
        let summary = tighten_combinators(&mut model, &mut ctx, &trees);
        (model, summary)
    }

    fn raws(model: &StyleModel) -> Vec<String> {
        model
            .all_selectors()
            .into_iter()
            .map(|s| model.selectors[s].raw.clone())
            .collect()
    }

    /// `<div class="a"><p class="b"/><section><p class="b"/></section></div>`
    fn nested() -> ElementTree {
        let mut tree = ElementTree::new();
        let div = tree.append(tree.root(), Element::new("div").with_class("a"));
        tree.append(div, Element::new("p").with_class("b"));
        let section = tree.append(div, Element::new("section"));
        tree.append(section, Element::new("p").with_class("b"));
        tree
    }

    #[test]
    fn direct_parent_is_tightened() {
        let mut tree = ElementTree::new();
        let div = tree.append(tree.root(), Element::new("div").with_class("a"));
        tree.append(div, Element::new("p").with_class("b"));

        let (model, summary) = run(".a .b { color: red }", tree);
        assert_eq!(summary.combinators, 1);
        assert_eq!(raws(&model), vec![".a > .b"]);
    }

    #[test]
    fn detour_keeps_descendant() {
        let (model, summary) = run(".a .b { color: red }", nested());
        assert_eq!(summary.combinators, 0);
        assert_eq!(raws(&model), vec![".a .b"]);
    }

    #[test]
    fn partial_tightening() {
        let (model, _) = run(".a section .b { color: red }", nested());
        assert_eq!(raws(&model), vec![".a > section > .b"]);
    }

    #[test]
    fn general_sibling_becomes_adjacent() {
        let mut tree = ElementTree::new();
        let body = tree.append(tree.root(), Element::new("body"));
        tree.append(body, Element::new("h1"));
        tree.append(body, Element::new("p"));

        let (model, summary) = run("h1 ~ p { margin: 0 }", tree);
        assert_eq!(summary.combinators, 1);
        assert_eq!(raws(&model), vec!["h1 + p"]);
    }

    #[test]
    fn rewrite_keeps_declarations_and_pseudo_element() {
        let mut tree = ElementTree::new();
        let ul = tree.append(tree.root(), Element::new("ul"));
        tree.append(ul, Element::new("li"));

        let (model, _) = run("ul li::before { content: 'x' }", tree);
        let id = model.all_selectors()[0];
        assert_eq!(model.selectors[id].raw, "ul > li::before");
        assert_eq!(model.declarations_of(id).count(), 1);
        assert!(model.declarations_of(id).all(|(_, d)| d.selector == id));
    }
}
