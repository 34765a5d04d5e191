//! Cascade resolution: which declarations win on at least one element.
//!
//! For every indexed element the matching selectors are ranked with
//! [`cascade_order`] and walked from the winner down. Each declaration not
//! already overridden in the current generation becomes effective and
//! overrides same-named declarations further down the list, subject to the
//! [`Gate`] between the two selectors. `!important` further down flips the
//! comparison.
//!
//! The effective flag is per declaration, not per (element, declaration):
//! a declaration that wins on any element is effective.

use tracing::{debug, info};

use super::{Gate, cascade_order};
use crate::context::{AnalysisContext, Generation};
use crate::model::{DeclStatus, SelectorId, StyleModel};

/// Outcome of one cascade run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    /// Elements resolved.
    pub elements: usize,
    pub effective: usize,
    pub ineffective: usize,
}

/// Resolve the cascade over every element of the match index.
///
/// Flags are reset first, so running the resolver twice over the same
/// index gives the same result.
pub fn resolve_cascade(model: &mut StyleModel, ctx: &mut AnalysisContext) -> CascadeSummary {
    reset(model);

    let elements: Vec<_> = ctx.index.elements().copied().collect();
    for element in &elements {
        let candidates = cascade_order(model, ctx.index.selectors_for(element));
        let generation = ctx.next_generation();
        debug!(%element, selectors = candidates.len(), "resolving element");
        resolve_element(model, &candidates, generation);
    }

    let effective = model.declarations.values().filter(|d| d.effective).count();
    let summary = CascadeSummary {
        elements: elements.len(),
        effective,
        ineffective: model.declarations.len() - effective,
    };
    info!(
        elements = summary.elements,
        effective = summary.effective,
        ineffective = summary.ineffective,
        "cascade resolved"
    );
    summary
}

/// Declarations of always-effective selectors start effective, everything
/// else starts ineffective and pending.
fn reset(model: &mut StyleModel) {
    for selector in model.selectors.values() {
        let always = selector.always_effective();
        for id in &selector.declarations {
            if let Some(decl) = model.declarations.get_mut(*id) {
                decl.effective = always;
                decl.status = DeclStatus::Pending;
            }
        }
    }
}

fn resolve_element(model: &mut StyleModel, candidates: &[SelectorId], generation: Generation) {
    let overridden = DeclStatus::Overridden(generation);

    for (i, &current) in candidates.iter().enumerate() {
        let Some(current_sel) = model.selectors.get(current) else {
            continue;
        };

        for &id in &current_sel.declarations {
            let Some(decl) = model.declarations.get_mut(id) else {
                continue;
            };
            if decl.status == overridden {
                continue;
            }

            let was_effective = decl.effective;
            decl.effective = true;
            let name = decl.name.clone();
            let value = decl.value.clone();
            let important = decl.important;

            'scan: for &next in &candidates[i + 1..] {
                let Some(next_sel) = model.selectors.get(next) else {
                    continue;
                };
                let gate = Gate::between(current_sel, next_sel);
                if gate == Gate::Skip {
                    continue;
                }

                for other_id in &next_sel.declarations {
                    let Some(other) = model.declarations.get_mut(*other_id) else {
                        continue;
                    };
                    if !gate.conflicts(&name, &value, other) {
                        continue;
                    }

                    if other.important && !important {
                        if !was_effective {
                            let decl = &mut model.declarations[id];
                            decl.effective = false;
                            decl.status = overridden;
                        }
                        break 'scan;
                    }
                    other.status = overridden;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKey, SnapshotId, StylesheetKind};
    use crate::parser::parse_stylesheet;
    use crate::OptimizerConfig;
    use styletrim_dom::NodeId;

    /// Parse `css` and register every selector as matching one element.
    fn setup(css: &str) -> (StyleModel, AnalysisContext) {
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
        let element = ElementKey::new(SnapshotId(0), NodeId(1));
        for id in model.selectors_of(sheet) {
            if !model.selectors[id].ignored {
                ctx.index.register(element, 0, id);
                model.selectors[id].matched = true;
            }
        }
        (model, ctx)
    }

    fn effective(model: &StyleModel) -> Vec<String> {
        let mut out: Vec<_> = model
            .all_selectors()
            .into_iter()
            .flat_map(|s| {
                model
                    .declarations_of(s)
                    .filter(|(_, d)| d.effective)
                    .map(move |(_, d)| format!("{} {{{}}}", model.selectors[s].raw, d))
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn more_specific_wins() {
        let (mut model, mut ctx) = setup("p { color: red; margin: 0 } .x { color: blue }");
        resolve_cascade(&mut model, &mut ctx);
        assert_eq!(effective(&model), vec![".x {color: blue}", "p {margin: 0}"]);
    }

    #[test]
    fn later_rule_wins_on_tie() {
        let (mut model, mut ctx) = setup(".a { color: red }\n.b { color: blue }");
        resolve_cascade(&mut model, &mut ctx);
        assert_eq!(effective(&model), vec![".b {color: blue}"]);
    }

    #[test]
    fn grouped_selectors_tie_break_on_ordinal() {
        let (mut model, mut ctx) = setup(".a, .b { color: red }");
        resolve_cascade(&mut model, &mut ctx);
        assert_eq!(effective(&model), vec![".b {color: red}"]);
    }

    #[test]
    fn important_beats_specificity() {
        let (mut model, mut ctx) = setup("#b { color: red }\n.a { color: blue !important }");
        resolve_cascade(&mut model, &mut ctx);
        assert_eq!(effective(&model), vec![".a {color: blue !important}"]);
    }

    #[test]
    fn media_scoped_rules_only_conflict_on_equal_values() {
        let (mut model, mut ctx) =
            setup("@media print { p { color: red; margin: 0 } }\n#x { color: blue; margin: 0 }");
        resolve_cascade(&mut model, &mut ctx);
        assert_eq!(
            effective(&model),
            vec!["#x {color: blue}", "#x {margin: 0}", "p {color: red}"]
        );
    }

    #[test]
    fn pseudo_elements_do_not_interact_with_elements() {
        let (mut model, mut ctx) = setup("p::before { color: red }\n.x { color: blue }");
        resolve_cascade(&mut model, &mut ctx);
        assert_eq!(effective(&model).len(), 2);
    }

    #[test]
    fn state_pseudo_compares_by_value() {
        let (mut model, mut ctx) =
            setup("a { color: red; top: 0 }\n.x:hover { color: blue; top: 0 }");
        resolve_cascade(&mut model, &mut ctx);
        assert_eq!(
            effective(&model),
            vec![".x:hover {color: blue}", ".x:hover {top: 0}", "a {color: red}"]
        );
    }

    #[test]
    fn lower_important_spares_a_winner_from_another_element() {
        let mut model = StyleModel::new();
        let sheet = parse_stylesheet(
            &mut model,
            "t.css",
            ".a { color: red }\np { color: blue !important }",
            StylesheetKind::External,
            0,
            &OptimizerConfig::default(),
        );
        let ids = model.selectors_of(sheet);
        let (a, p) = (ids[0], ids[1]);
        let div = ElementKey::new(SnapshotId(0), NodeId(1));
        let para = ElementKey::new(SnapshotId(0), NodeId(2));

        let mut ctx = AnalysisContext::new();
        ctx.index.register(div, 0, a);
        ctx.index.register(para, 0, a);
        ctx.index.register(para, 0, p);
        model.selectors[a].matched = true;
        model.selectors[p].matched = true;

        let summary = resolve_cascade(&mut model, &mut ctx);
        assert_eq!(summary.ineffective, 0);
        assert_eq!(
            effective(&model),
            vec![".a {color: red}", "p {color: blue !important}"]
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let (mut model, mut ctx) =
            setup("p { color: red } .x { color: blue !important } #y { color: green; top: 1px }");
        let first = resolve_cascade(&mut model, &mut ctx);
        let flags: Vec<_> = model.declarations.values().map(|d| d.effective).collect();
        let second = resolve_cascade(&mut model, &mut ctx);
        let again: Vec<_> = model.declarations.values().map(|d| d.effective).collect();
        assert_eq!(first, second);
        assert_eq!(flags, again);
    }
}
