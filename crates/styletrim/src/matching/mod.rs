//! Selector-to-element matching and the match index.

mod compat;
mod index;

use styletrim_dom::{ElementTree, SelectorQuery};
use tracing::{debug, trace, warn};

use crate::context::AnalysisContext;
use crate::model::{ElementKey, MatchedElement, SheetId, SnapshotId, StyleModel};

pub use compat::state_compatible;
pub use index::MatchIndex;

/// One rendered page state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub tree: ElementTree,
    /// Stylesheets the page references, external ones in document order
    /// followed by the embedded-style key.
    pub stylesheet_keys: Vec<String>,
}

impl Snapshot {
    pub fn new(id: SnapshotId, tree: ElementTree) -> Self {
        Self {
            id,
            tree,
            stylesheet_keys: vec![],
        }
    }

    /// Add a referenced stylesheet key.
    pub fn with_stylesheet(mut self, key: impl Into<String>) -> Self {
        self.stylesheet_keys.push(key.into());
        self
    }
}

/// Match every analysable selector of `sheets` against one snapshot and
/// register the hits. Returns the number of new registrations.
///
/// A selector the query engine rejects is skipped for this snapshot only.
pub fn match_snapshot(
    model: &mut StyleModel,
    ctx: &mut AnalysisContext,
    snapshot: &Snapshot,
    sheets: &[SheetId],
    query: &dyn SelectorQuery,
) -> usize {
    let tree = &snapshot.tree;
    let mut registered = 0;

    for &sheet in sheets {
        let Some(discovery_order) = model.sheets.get(sheet).map(|s| s.discovery_order) else {
            continue;
        };

        for id in model.selectors_of(sheet) {
            let Some(selector) = model.selectors.get_mut(id) else {
                continue;
            };
            if selector.ignored {
                continue;
            }

            let nodes = match query.select(tree, &selector.filtered) {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!(
                        selector = %selector.raw,
                        snapshot = %snapshot.id,
                        "selector query failed: {}",
                        e
                    );
                    ctx.stats.query_errors += 1;
                    continue;
                }
            };

            let state = selector.ast.as_ref().and_then(|ast| ast.subject_state_pseudo());
            for node in nodes {
                if tree.is_document(node) {
                    debug!(selector = %selector.raw, "matched the document node");
                    ctx.stats.document_root_matches += 1;
                    selector.matched = true;
                    selector.matched_document = true;
                    continue;
                }
                if let (Some(state), Some(element)) = (state, tree.element(node))
                    && !state_compatible(state, element)
                {
                    trace!(selector = %selector.raw, element = %element, "state not reachable");
                    continue;
                }

                let key = ElementKey::new(snapshot.id, node);
                if ctx.index.register(key, discovery_order, id) {
                    selector.matched = true;
                    selector.matches.push(MatchedElement {
                        key,
                        path: tree.path(node),
                    });
                    registered += 1;
                }
            }
        }
    }

    debug!(snapshot = %snapshot.id, registered, "snapshot matched");
    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptimizerConfig;
    use crate::model::StylesheetKind;
    use crate::parser::parse_stylesheet;
    use styletrim_dom::{Element, TreeQuery};

    fn setup(css: &str) -> (StyleModel, SheetId) {
        let mut model = StyleModel::new();
        let sheet = parse_stylesheet(
            &mut model,
            "t.css",
            css,
            StylesheetKind::External,
            0,
            &OptimizerConfig::default(),
        );
        (model, sheet)
    }

    fn links() -> Snapshot {
        let mut tree = ElementTree::new();
        let body = tree.append(tree.root(), Element::new("body"));
        tree.append(body, Element::new("a").with_attr("href", "/"));
        tree.append(body, Element::new("a"));
        Snapshot::new(SnapshotId(0), tree)
    }

    #[test]
    fn registers_every_match() {
        let (mut model, sheet) = setup("a { color: red }\nbody a { top: 0 }");
        let mut ctx = AnalysisContext::new();
        let registered =
            match_snapshot(&mut model, &mut ctx, &links(), &[sheet], &TreeQuery::new());

        assert_eq!(registered, 4);
        assert_eq!(ctx.index.len(), 2);
        let first = model.selectors_of(sheet)[0];
        assert!(model.selectors[first].matched);
        assert_eq!(model.selectors[first].matches[0].path, vec![0, 0]);
    }

    #[test]
    fn state_compatibility_filters_elements() {
        let (mut model, sheet) = setup("a:visited { color: red }");
        let mut ctx = AnalysisContext::new();
        match_snapshot(&mut model, &mut ctx, &links(), &[sheet], &TreeQuery::new());

        let id = model.selectors_of(sheet)[0];
        assert_eq!(model.selectors[id].matches.len(), 1);
    }

    #[test]
    fn matching_twice_registers_nothing_new() {
        let (mut model, sheet) = setup("a { color: red }");
        let mut ctx = AnalysisContext::new();
        let snapshot = links();
        match_snapshot(&mut model, &mut ctx, &snapshot, &[sheet], &TreeQuery::new());
        let again = match_snapshot(&mut model, &mut ctx, &snapshot, &[sheet], &TreeQuery::new());
        assert_eq!(again, 0);
        assert_eq!(ctx.index.registrations(), 2);
    }

    #[test]
    fn document_match_is_flagged() {
        let (mut model, sheet) = setup("* { margin: 0 }");
        let mut ctx = AnalysisContext::new();
        let snapshot = Snapshot::new(SnapshotId(0), ElementTree::new());
        match_snapshot(&mut model, &mut ctx, &snapshot, &[sheet], &TreeQuery::new());

        let id = model.selectors_of(sheet)[0];
        assert!(model.selectors[id].matched_document);
        assert!(model.selectors[id].always_effective());
        assert_eq!(ctx.stats.document_root_matches, 1);
    }
}
