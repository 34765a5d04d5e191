//! Same-name declarations inside one selector.

use std::collections::HashSet;

use tracing::{info, trace};

use crate::model::{DeclId, SelectorId, StyleModel};

/// Collapse repeated property names within each selector. Returns the
/// number of declarations removed.
///
/// The later declaration is kept unless only the earlier one is
/// `!important`. Vendor-prefixed declarations are never treated as
/// duplicates.
pub fn eliminate_duplicates(model: &mut StyleModel) -> usize {
    let selectors: Vec<SelectorId> = model.selectors.keys().collect();
    let mut removed = 0;

    for selector in selectors {
        for id in duplicates_in(model, selector) {
            if let Some(decl) = model.remove_declaration(id) {
                trace!(declaration = %decl, "duplicate removed");
                removed += 1;
            }
        }
    }

    info!(removed, "duplicate declarations eliminated");
    removed
}

fn duplicates_in(model: &StyleModel, selector: SelectorId) -> Vec<DeclId> {
    let ids: Vec<DeclId> = model.declarations_of(selector).map(|(id, _)| id).collect();
    let mut dropped: HashSet<DeclId> = HashSet::new();

    for (i, &earlier_id) in ids.iter().enumerate() {
        if dropped.contains(&earlier_id) {
            continue;
        }
        let earlier = &model.declarations[earlier_id];
        if earlier.vendor.is_some() {
            continue;
        }
        for &later_id in &ids[i + 1..] {
            if dropped.contains(&later_id) {
                continue;
            }
            let later = &model.declarations[later_id];
            if later.name != earlier.name || later.vendor.is_some() {
                continue;
            }
            if earlier.important && !later.important {
                dropped.insert(later_id);
            } else {
                dropped.insert(earlier_id);
                break;
            }
        }
    }

    ids.into_iter().filter(|id| dropped.contains(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptimizerConfig;
    use crate::model::StylesheetKind;
    use crate::parser::parse_stylesheet;

    fn run(css: &str) -> Vec<String> {
        let mut model = StyleModel::new();
        let sheet = parse_stylesheet(
            &mut model,
            "t.css",
            css,
            StylesheetKind::External,
            0,
            &OptimizerConfig::default(),
        );
        eliminate_duplicates(&mut model);
        let selector = model.selectors_of(sheet)[0];
        model
            .declarations_of(selector)
            .map(|(_, d)| d.to_string())
            .collect()
    }

    #[test]
    fn later_declaration_wins() {
        assert_eq!(run("p { color: red; color: blue }"), vec!["color: blue"]);
        assert_eq!(
            run("p { color: red; top: 0; color: blue; color: green }"),
            vec!["top: 0", "color: green"]
        );
    }

    #[test]
    fn earlier_important_wins() {
        assert_eq!(run("p { color: red !important; color: blue }"), vec!["color: red !important"]);
        assert_eq!(
            run("p { color: red !important; color: blue !important }"),
            vec!["color: blue !important"]
        );
    }

    #[test]
    fn vendor_variants_are_kept() {
        assert_eq!(
            run("p { display: -webkit-box; display: flex }"),
            vec!["display: -webkit-box", "display: flex"]
        );
    }
}
