//! Mixin mining: declaration templates shared by several selectors of one
//! stylesheet are pulled out into named mixins.
//!
//! Templates are grouped into clone sets (one template, every selector
//! carrying it). Clone sets over the same selector set merge into one
//! candidate mixin. The template declarations are extracted from their
//! selectors, the candidate is scored, and rejected candidates hand the
//! declarations back.
//!
//! An `@include` is written ahead of the declarations a selector keeps, so
//! a candidate is also rejected when that would move a related declaration
//! (same property, or a shorthand and its longhand) across an extracted one.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::model::{DeclId, DeclTemplate, Declaration, SelectorId, SheetId, StyleModel};
use crate::resolve::related;

/// One declaration template and every selector that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneSet {
    pub template: DeclTemplate,
    /// Sorted, at least two entries.
    pub selectors: Vec<SelectorId>,
}

/// A named group of templates included by a fixed set of selectors.
#[derive(Debug, Clone)]
pub struct Mixin {
    pub name: String,
    pub sheet: SheetId,
    pub templates: Vec<DeclTemplate>,
    pub selectors: Vec<SelectorId>,
    /// Declarations removed from the selectors when the mixin was formed.
    pub extracted: Vec<Declaration>,
}

impl Mixin {
    /// Estimated declarations saved by including the mixin instead of
    /// repeating its body.
    ///
    /// Each distinct (line, ordinal) group the selectors span saves
    /// `templates - 1` declarations.
    pub fn savings(&self, model: &StyleModel) -> usize {
        let mut groups: Vec<(u32, u32)> = self
            .selectors
            .iter()
            .filter_map(|id| model.selectors.get(*id))
            .map(|s| (s.line, s.ordinal))
            .collect();
        groups.sort_unstable();
        groups.dedup();
        self.templates.len().saturating_sub(1) * groups.len()
    }

    /// Body of the mixin as the first selector wrote it, in template order.
    pub fn body(&self) -> impl Iterator<Item = &Declaration> + '_ {
        let first = self.selectors.first().copied();
        self.templates.iter().filter_map(move |t| {
            self.extracted
                .iter()
                .find(|d| Some(d.selector) == first && d.template() == *t)
        })
    }

    /// Worth keeping when the savings at least pay for the mixin body.
    pub fn is_worthwhile(&self, model: &StyleModel) -> bool {
        self.savings(model) >= self.templates.len()
    }
}

/// Accepted mixins of one run.
#[derive(Debug, Clone, Default)]
pub struct MixinSet {
    pub mixins: Vec<Mixin>,
}

impl MixinSet {
    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mixins.len()
    }

    /// Mixins of one stylesheet, in creation order.
    pub fn for_sheet(&self, sheet: SheetId) -> impl Iterator<Item = &Mixin> + '_ {
        self.mixins.iter().filter(move |m| m.sheet == sheet)
    }

    /// Mixins included by `selector`.
    pub fn for_selector(&self, selector: SelectorId) -> impl Iterator<Item = &Mixin> + '_ {
        self.mixins
            .iter()
            .filter(move |m| m.selectors.contains(&selector))
    }

    /// Follow a selector rewrite.
    pub fn retarget(&mut self, old: SelectorId, new: SelectorId) {
        for mixin in &mut self.mixins {
            for slot in mixin.selectors.iter_mut().filter(|s| **s == old) {
                *slot = new;
            }
            for decl in mixin.extracted.iter_mut().filter(|d| d.selector == old) {
                decl.selector = new;
            }
        }
    }
}

/// Counters of one mining run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiningSummary {
    pub clone_sets: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Mine every stylesheet. Mixin names are `{prefix}-{n}`, numbered from 1
/// across the whole run.
pub fn mine_mixins(model: &mut StyleModel, prefix: &str) -> (MixinSet, MiningSummary) {
    let mut set = MixinSet::default();
    let mut summary = MiningSummary::default();

    for sheet in model.sheets_in_order() {
        let clone_sets = clone_sets(model, sheet);
        summary.clone_sets += clone_sets.len();

        for (selectors, templates) in group_by_selectors(clone_sets) {
            let extracted = extract(model, &selectors, &templates);
            let mut mixin = Mixin {
                name: format!("{}-{}", prefix, set.len() + 1),
                sheet,
                templates: source_ordered(templates, &extracted, selectors[0]),
                extracted,
                selectors,
            };

            if mixin.is_worthwhile(model) && !reorders(model, &set, &mixin) {
                debug!(
                    name = %mixin.name,
                    templates = mixin.templates.len(),
                    selectors = mixin.selectors.len(),
                    "mixin accepted"
                );
                summary.accepted += 1;
                set.mixins.push(mixin);
            } else {
                summary.rejected += 1;
                for decl in std::mem::take(&mut mixin.extracted) {
                    restore(model, decl);
                }
            }
        }
    }

    info!(
        clone_sets = summary.clone_sets,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "mixin mining finished"
    );
    (set, summary)
}

/// Templates carried by at least two non-ignored selectors of `sheet`.
pub fn clone_sets(model: &StyleModel, sheet: SheetId) -> Vec<CloneSet> {
    let mut by_template: BTreeMap<DeclTemplate, Vec<SelectorId>> = BTreeMap::new();
    for selector in model.selectors_of(sheet) {
        if model.selectors.get(selector).is_none_or(|s| s.ignored) {
            continue;
        }
        for (_, decl) in model.declarations_of(selector) {
            let carriers = by_template.entry(decl.template()).or_default();
            if !carriers.contains(&selector) {
                carriers.push(selector);
            }
        }
    }

    by_template
        .into_iter()
        .filter(|(_, selectors)| selectors.len() >= 2)
        .map(|(template, mut selectors)| {
            selectors.sort_unstable();
            CloneSet {
                template,
                selectors,
            }
        })
        .collect()
}

fn group_by_selectors(
    clone_sets: Vec<CloneSet>,
) -> BTreeMap<Vec<SelectorId>, Vec<DeclTemplate>> {
    let mut groups: BTreeMap<Vec<SelectorId>, Vec<DeclTemplate>> = BTreeMap::new();
    for set in clone_sets {
        groups.entry(set.selectors).or_default().push(set.template);
    }
    groups
}

fn extract(
    model: &mut StyleModel,
    selectors: &[SelectorId],
    templates: &[DeclTemplate],
) -> Vec<Declaration> {
    let ids: Vec<DeclId> = selectors
        .iter()
        .flat_map(|s| model.declarations_of(*s))
        .filter(|(_, d)| templates.contains(&d.template()))
        .map(|(id, _)| id)
        .collect();
    ids.into_iter()
        .filter_map(|id| model.remove_declaration(id))
        .collect()
}

/// Order templates the way `selector` declared them.
fn source_ordered(
    mut templates: Vec<DeclTemplate>,
    extracted: &[Declaration],
    selector: SelectorId,
) -> Vec<DeclTemplate> {
    let position = |t: &DeclTemplate| {
        extracted
            .iter()
            .find(|d| d.selector == selector && d.template() == *t)
            .map_or(u32::MAX, |d| d.position)
    };
    templates.sort_by_cached_key(position);
    templates
}

/// Returns true if writing `mixin` as an `@include` would change which of
/// two related declarations comes last on one of its selectors.
///
/// The include lands after the includes of `accepted` mixins and before
/// the declarations the selector keeps.
fn reorders(model: &StyleModel, accepted: &MixinSet, mixin: &Mixin) -> bool {
    let slot = |t: &DeclTemplate| mixin.templates.iter().position(|o| o == t);

    mixin.extracted.iter().any(|decl| {
        let selector = decl.selector;
        let kept_before = model
            .declarations_of(selector)
            .any(|(_, d)| d.position < decl.position && related(&d.name, &decl.name));
        let included_after = accepted
            .for_selector(selector)
            .flat_map(|m| m.extracted.iter())
            .filter(|d| d.selector == selector)
            .any(|d| d.position > decl.position && related(&d.name, &decl.name));
        let body_swapped = mixin.extracted.iter().any(|d| {
            d.selector == selector
                && d.position < decl.position
                && related(&d.name, &decl.name)
                && slot(&d.template()) > slot(&decl.template())
        });
        kept_before || included_after || body_swapped
    })
}

/// Put a declaration back at its source position, unless the selector
/// already carries the same template.
fn restore(model: &mut StyleModel, decl: Declaration) {
    let selector = decl.selector;
    let template = decl.template();
    if model.declarations_of(selector).any(|(_, d)| d.template() == template) {
        return;
    }
    let position = decl.position;
    let id = model.declarations.insert(decl);
    let Some(sel) = model.selectors.get_mut(selector) else {
        model.declarations.remove(id);
        return;
    };
    let at = sel
        .declarations
        .iter()
        .position(|d| model.declarations.get(*d).is_some_and(|d| d.position > position))
        .unwrap_or(sel.declarations.len());
    sel.declarations.insert(at, id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptimizerConfig;
    use crate::model::StylesheetKind;
    use crate::parser::parse_stylesheet;

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

    fn block(model: &StyleModel, selector: SelectorId) -> Vec<String> {
        model
            .declarations_of(selector)
            .map(|(_, d)| d.to_string())
            .collect()
    }

    #[test]
    fn clone_sets_need_two_carriers() {
        let (model, sheet) = setup(".a { color: red; top: 0 }\n.b { color: red }\n.c { top: 1px }");
        let sets = clone_sets(&model, sheet);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].template.to_string(), "color: red");
        assert_eq!(sets[0].selectors.len(), 2);
    }

    #[test]
    fn shared_block_becomes_mixin() {
        let (mut model, sheet) = setup(
            ".a { color: red; margin: 0; top: 1px }\n.b { color: red; margin: 0 }\n.c { left: 0 }",
        );
        let (set, summary) = mine_mixins(&mut model, "mixin");
        assert_eq!(summary.accepted, 1);
        assert_eq!(set.len(), 1);

        let mixin = &set.mixins[0];
        assert_eq!(mixin.name, "mixin-1");
        assert_eq!(mixin.templates.len(), 2);
        assert_eq!(mixin.extracted.len(), 4);

        let selectors = model.selectors_of(sheet);
        assert_eq!(block(&model, selectors[0]), vec!["top: 1px"]);
        assert!(block(&model, selectors[1]).is_empty());
        assert_eq!(set.for_selector(selectors[1]).count(), 1);
        assert_eq!(set.for_selector(selectors[2]).count(), 0);
    }

    #[test]
    fn single_declaration_mixin_is_restored() {
        let css = ".a { top: 1px; color: red; left: 0 }\n.b { color: red }";
        let (mut model, sheet) = setup(css);
        let before: Vec<_> = model
            .selectors_of(sheet)
            .into_iter()
            .map(|s| block(&model, s))
            .collect();

        let (set, summary) = mine_mixins(&mut model, "m");
        assert!(set.is_empty());
        assert_eq!(summary.rejected, 1);

        let after: Vec<_> = model
            .selectors_of(sheet)
            .into_iter()
            .map(|s| block(&model, s))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn mixin_keeps_longhand_before_shorthand() {
        let css = ".a { margin-top: 5px; margin: 3px; color: red }\n\
                   .b { margin-top: 7px; margin: 3px; color: red }";
        let (mut model, sheet) = setup(css);
        let before: Vec<_> = model
            .selectors_of(sheet)
            .into_iter()
            .map(|s| block(&model, s))
            .collect();

        let (set, summary) = mine_mixins(&mut model, "m");
        assert!(set.is_empty());
        assert_eq!(summary.rejected, 1);

        let after: Vec<_> = model
            .selectors_of(sheet)
            .into_iter()
            .map(|s| block(&model, s))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn longhand_after_shorthand_still_mined() {
        let css = ".a { margin: 3px; color: red; margin-top: 5px }\n\
                   .b { margin: 3px; color: red; margin-top: 7px }";
        let (mut model, sheet) = setup(css);
        let (set, summary) = mine_mixins(&mut model, "m");
        assert_eq!(summary.accepted, 1);
        let selectors = model.selectors_of(sheet);
        assert_eq!(block(&model, selectors[0]), vec!["margin-top: 5px"]);
        assert_eq!(set.mixins[0].templates.len(), 2);
    }

    #[test]
    fn templates_follow_source_order() {
        let css = ".a { border-top: 1px; border: 0; color: red }\n\
                   .b { border-top: 1px; border: 0; color: red }";
        let (mut model, _) = setup(css);
        let (set, _) = mine_mixins(&mut model, "m");
        assert_eq!(set.len(), 1);
        let names: Vec<_> = set.mixins[0].templates.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["border-top: 1px", "border: 0", "color: red"]);
    }

    #[test]
    fn retarget_follows_rewrites() {
        let (mut model, sheet) = setup(".a { color: red; top: 0 }\n.b { color: red; top: 0 }");
        let (mut set, _) = mine_mixins(&mut model, "m");
        let old = model.selectors_of(sheet)[0];
        let new = model.selectors.insert(model.selectors[old].clone());
        set.retarget(old, new);
        assert_eq!(set.for_selector(new).count(), 1);
        assert_eq!(set.for_selector(old).count(), 0);
        assert_eq!(set.mixins[0].extracted.iter().filter(|d| d.selector == new).count(), 2);
    }
}
