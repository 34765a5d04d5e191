//! Detection of declarations that reset a property to its default without
//! anything to reset.
//!
//! A default-valued declaration is kept if it is `!important`, if its own
//! selector sets a companion property that it completes (the other sides of
//! a split `margin`, a `border-style` beside a zero `border-width`), or if
//! on some element a less specific, interacting selector sets the same or a
//! covering property to a different effective value. Everything else is an
//! invalid undo.

use std::collections::HashSet;

use tracing::{debug, info};

use super::{Gate, cascade_order};
use crate::context::AnalysisContext;
use crate::model::{DeclId, Declaration, Selector, SelectorId, StyleModel};

const SIDES: &[&str] = &["-top", "-right", "-bottom", "-left"];

/// Families whose non-default value makes a default-valued declaration of
/// the first family meaningful.
const COMPANIONS: &[(&str, &str)] = &[
    ("border-width", "border-style"),
    ("border-width", "border"),
    ("border-style", "border-width"),
    ("border-style", "border-color"),
    ("outline-width", "outline-style"),
    ("outline-style", "outline-width"),
    ("background-image", "background-color"),
    ("background-color", "background-image"),
    ("list-style-image", "list-style-type"),
];

/// Default values of a property, in normalized form.
fn default_values(name: &str) -> &'static [&'static str] {
    match family(name).as_str() {
        "margin" | "padding" | "border-width" | "border-radius" | "outline-width"
        | "text-indent" | "outline-offset" => &["0"],
        "border" | "outline" => &["none", "0"],
        "border-style" | "outline-style" => &["none"],
        "background" => &["none", "transparent"],
        "background-color" => &["transparent"],
        "background-image" | "list-style-image" | "box-shadow" | "text-shadow" | "transform"
        | "filter" | "text-decoration" | "max-width" | "max-height" | "float" | "clear"
        | "text-transform" => &["none"],
        "position" => &["static"],
        "top" | "right" | "bottom" | "left" | "width" | "height" | "z-index" => &["auto"],
        "min-width" | "min-height" => &["0", "auto"],
        "font-style" | "font-variant" | "letter-spacing" | "word-spacing" | "white-space" => {
            &["normal"]
        }
        "font-weight" => &["normal", "400"],
        "opacity" => &["1"],
        "visibility" => &["visible"],
        "vertical-align" => &["baseline"],
        _ => &[],
    }
}

/// Returns true if `value` is a default of property `name`.
pub fn is_default_value(name: &str, value: &str) -> bool {
    default_values(name)
        .iter()
        .any(|d| d.eq_ignore_ascii_case(value))
}

/// Property name with side qualifiers removed
/// (`border-top-left-radius` → `border-radius`).
fn family(name: &str) -> String {
    let mut family = name.to_string();
    for side in SIDES {
        if let Some(pos) = family.find(side) {
            let end = pos + side.len();
            if end == family.len() || family[end..].starts_with('-') {
                family.replace_range(pos..end, "");
            }
        }
    }
    family
}

/// Returns true if `shorthand` sets `longhand`.
fn covers(shorthand: &str, longhand: &str) -> bool {
    if shorthand == longhand {
        return false;
    }
    longhand
        .strip_prefix(shorthand)
        .is_some_and(|rest| rest.starts_with('-'))
        || family(longhand) == shorthand
}

/// Returns true if the two properties set a common longhand.
pub(crate) fn related(a: &str, b: &str) -> bool {
    a == b || covers(a, b) || covers(b, a)
}

/// What undo detection removed.
#[derive(Debug, Clone, Default)]
pub struct UndoSummary {
    /// The removed declarations, flagged `invalid_undo`.
    pub removed: Vec<Declaration>,
    pub selectors_removed: usize,
    pub rules_removed: usize,
}

/// Flag and remove invalid undos across every indexed element.
///
/// A candidate is removed only if no element justifies it.
pub fn detect_invalid_undo(model: &mut StyleModel, ctx: &AnalysisContext) -> UndoSummary {
    let mut candidates: Vec<DeclId> = vec![];
    let mut seen: HashSet<DeclId> = HashSet::new();
    let mut justified: HashSet<DeclId> = HashSet::new();

    for element in ctx.index.elements() {
        let order = cascade_order(model, ctx.index.selectors_for(element));
        for (i, &current) in order.iter().enumerate() {
            let Some(selector) = model.selectors.get(current) else {
                continue;
            };
            if selector.always_effective() {
                continue;
            }

            for (id, decl) in model.declarations_of(current) {
                if !decl.effective || !is_candidate(model, selector, id, decl) {
                    continue;
                }
                if seen.insert(id) {
                    candidates.push(id);
                }
                if justified.contains(&id) {
                    continue;
                }
                if order[i + 1..]
                    .iter()
                    .any(|next| justifies(model, selector, decl, *next))
                {
                    justified.insert(id);
                }
            }
        }
    }

    let mut summary = UndoSummary::default();
    for id in candidates.into_iter().filter(|id| !justified.contains(id)) {
        if let Some(mut decl) = model.remove_declaration(id) {
            decl.invalid_undo = true;
            debug!(
                selector = model.selectors.get(decl.selector).map(|s| s.raw.as_str()),
                declaration = %decl,
                "invalid undo"
            );
            summary.removed.push(decl);
        }
    }
    summary.selectors_removed = model.remove_empty_selectors();
    summary.rules_removed = model.remove_empty_rules();

    info!(
        removed = summary.removed.len(),
        selectors = summary.selectors_removed,
        "invalid undo detection finished"
    );
    summary
}

fn is_candidate(model: &StyleModel, selector: &Selector, id: DeclId, decl: &Declaration) -> bool {
    if decl.important || !is_default_value(&decl.name, &decl.value) {
        return false;
    }
    let own_family = family(&decl.name);
    let has_companion = selector.declarations.iter().any(|other_id| {
        let Some(other) = model.declarations.get(*other_id) else {
            return false;
        };
        if *other_id == id || is_default_value(&other.name, &other.value) {
            return false;
        }
        let other_family = family(&other.name);
        other_family == own_family
            || COMPANIONS
                .iter()
                .any(|(a, b)| *a == own_family && *b == other_family)
    });
    !has_companion
}

/// A less specific selector that interacts with `current` and sets a
/// related property to a different value.
fn justifies(
    model: &StyleModel,
    current: &Selector,
    decl: &Declaration,
    next: SelectorId,
) -> bool {
    let Some(next_sel) = model.selectors.get(next) else {
        return false;
    };
    if Gate::between(current, next_sel) == Gate::Skip {
        return false;
    }
    model
        .declarations_of(next)
        .any(|(_, other)| {
            other.effective && related(&decl.name, &other.name) && other.value != decl.value
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptimizerConfig;
    use crate::model::{ElementKey, SnapshotId, StylesheetKind};
    use crate::parser::parse_stylesheet;
    use crate::resolve::resolve_cascade;
    use styletrim_dom::NodeId;

    /// Parse `css`, match every selector on one element, then resolve and
    /// detect undos.
    fn detect(css: &str) -> UndoSummary {
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
            ctx.index.register(element, 0, id);
            model.selectors[id].matched = true;
        }
        resolve_cascade(&mut model, &mut ctx);
        detect_invalid_undo(&mut model, &ctx)
    }

    fn removed(summary: &UndoSummary) -> Vec<String> {
        summary.removed.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn families_strip_sides() {
        assert_eq!(family("margin-top"), "margin");
        assert_eq!(family("border-top-width"), "border-width");
        assert_eq!(family("border-top-left-radius"), "border-radius");
        assert_eq!(family("top"), "top");
        assert_eq!(family("padding"), "padding");
    }

    #[test]
    fn shorthand_coverage() {
        assert!(covers("border-width", "border-top-width"));
        assert!(covers("border", "border-top-width"));
        assert!(covers("margin", "margin-left"));
        assert!(covers("background", "background-image"));
        assert!(!covers("border-top", "border-bottom-width"));
        assert!(!covers("margin", "margin"));
    }

    #[test]
    fn defaults_table() {
        assert!(is_default_value("margin-top", "0"));
        assert!(is_default_value("border-style", "none"));
        assert!(is_default_value("float", "NONE"));
        assert!(is_default_value("background-image", "none"));
        assert!(is_default_value("border-top-width", "0"));
        assert!(!is_default_value("margin-top", "10px"));
        assert!(!is_default_value("color", "black"));
    }

    #[test]
    fn lone_default_is_an_invalid_undo() {
        let summary = detect("div { margin-top: 0 }");
        assert_eq!(removed(&summary), vec!["margin-top: 0"]);
        assert!(summary.removed[0].invalid_undo);
        assert_eq!(summary.selectors_removed, 1);
    }

    #[test]
    fn important_defaults_are_exempt() {
        let summary = detect("div { margin-top: 0 !important }");
        assert!(summary.removed.is_empty());
    }

    #[test]
    fn companion_in_same_selector_keeps_default() {
        assert!(detect("div { border-width: 0; border-style: solid }").removed.is_empty());
        assert!(detect("div { border-style: none; border-width: 2px }").removed.is_empty());
        assert!(detect("div { margin-top: 0; margin-left: 4px }").removed.is_empty());

        let summary = detect("div { border-width: 0; color: red }");
        assert_eq!(removed(&summary), vec!["border-width: 0"]);
        assert_eq!(summary.selectors_removed, 0);
    }
}
