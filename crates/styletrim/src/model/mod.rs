//! Arena-backed style model.
//!
//! Stylesheets own rules, rules own selectors, and selectors own their
//! declarations. Everything lives in a [`SlotMap`] and is referenced by key,
//! so derived structures (the match index, clone sets, mixins) never hold
//! references into the model. A removed entity's key simply stops
//! resolving.

mod declaration;
mod element;
mod media;
mod rule;
mod selector;
mod stylesheet;

use slotmap::{SlotMap, new_key_type};

pub use declaration::{DeclStatus, DeclTemplate, Declaration, VendorPrefix};
pub use element::{ElementKey, MatchedElement, SnapshotId};
pub use media::{MediaList, MediaQuery};
pub use rule::Rule;
pub use selector::Selector;
pub use stylesheet::{RuleNode, Stylesheet, StylesheetKind};

new_key_type! {
    /// Key of a [`Stylesheet`].
    pub struct SheetId;
    /// Key of a [`Rule`].
    pub struct RuleId;
    /// Key of a [`Selector`].
    pub struct SelectorId;
    /// Key of a [`Declaration`].
    pub struct DeclId;
}

/// Every stylesheet of one optimization run.
#[derive(Debug, Clone, Default)]
pub struct StyleModel {
    pub sheets: SlotMap<SheetId, Stylesheet>,
    pub rules: SlotMap<RuleId, Rule>,
    pub selectors: SlotMap<SelectorId, Selector>,
    pub declarations: SlotMap<DeclId, Declaration>,
}

impl StyleModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stylesheets sorted by discovery order.
    pub fn sheets_in_order(&self) -> Vec<SheetId> {
        let mut ids: Vec<_> = self.sheets.keys().collect();
        ids.sort_by_key(|id| self.sheets[*id].discovery_order);
        ids
    }

    /// Look up a stylesheet by its source key.
    pub fn sheet_by_key(&self, key: &str) -> Option<SheetId> {
        self.sheets
            .iter()
            .find(|(_, sheet)| sheet.key == key)
            .map(|(id, _)| id)
    }

    /// Selectors of a stylesheet in source order.
    pub fn selectors_of(&self, sheet: SheetId) -> Vec<SelectorId> {
        let Some(sheet) = self.sheets.get(sheet) else {
            return vec![];
        };
        sheet
            .rules()
            .into_iter()
            .filter_map(|rule| self.rules.get(rule))
            .flat_map(|rule| rule.selectors.iter().copied())
            .collect()
    }

    /// Every selector of every stylesheet, in discovery then source order.
    pub fn all_selectors(&self) -> Vec<SelectorId> {
        self.sheets_in_order()
            .into_iter()
            .flat_map(|sheet| self.selectors_of(sheet))
            .collect()
    }

    /// Discovery order of the stylesheet owning `selector`.
    pub fn discovery_order(&self, selector: SelectorId) -> u32 {
        self.selectors
            .get(selector)
            .and_then(|s| self.sheets.get(s.sheet))
            .map(|sheet| sheet.discovery_order)
            .unwrap_or(0)
    }

    /// Declarations of a selector in block order.
    pub fn declarations_of(
        &self,
        selector: SelectorId,
    ) -> impl Iterator<Item = (DeclId, &Declaration)> + '_ {
        self.selectors
            .get(selector)
            .map(|s| s.declarations.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |id| self.declarations.get(*id).map(|d| (*id, d)))
    }

    /// Add a declaration to the end of a selector's block.
    pub fn push_declaration(&mut self, declaration: Declaration) -> DeclId {
        let selector = declaration.selector;
        let id = self.declarations.insert(declaration);
        if let Some(sel) = self.selectors.get_mut(selector) {
            sel.declarations.push(id);
        }
        id
    }

    /// Remove one declaration from its selector and the arena.
    pub fn remove_declaration(&mut self, id: DeclId) -> Option<Declaration> {
        let decl = self.declarations.remove(id)?;
        if let Some(sel) = self.selectors.get_mut(decl.selector) {
            sel.declarations.retain(|d| *d != id);
        }
        Some(decl)
    }

    /// Remove a selector, its declarations, and its slot in the rule.
    pub fn remove_selector(&mut self, id: SelectorId) -> Option<Selector> {
        let selector = self.selectors.remove(id)?;
        for decl in &selector.declarations {
            self.declarations.remove(*decl);
        }
        if let Some(rule) = self.rules.get_mut(selector.rule) {
            rule.selectors.retain(|s| *s != id);
        }
        Some(selector)
    }

    /// Remove selectors left without declarations, except ignored ones.
    /// Returns the number removed.
    pub fn remove_empty_selectors(&mut self) -> usize {
        let empty: Vec<SelectorId> = self
            .selectors
            .iter()
            .filter(|(_, s)| !s.ignored && s.declarations.is_empty())
            .map(|(id, _)| id)
            .collect();
        for id in &empty {
            self.remove_selector(*id);
        }
        empty.len()
    }

    /// Remove rules left without selectors, then media blocks left without
    /// rules. Returns the number of rules removed.
    pub fn remove_empty_rules(&mut self) -> usize {
        let rules = &mut self.rules;
        let mut removed = 0;
        for sheet in self.sheets.values_mut() {
            removed += sheet.retain_rules(|id| {
                let keep = rules.get(id).is_some_and(|r| !r.is_empty());
                if !keep {
                    rules.remove(id);
                }
                keep
            });
        }
        removed
    }

    /// Put `new` at the position of `old` in the owning rule and remove
    /// `old`. The new selector takes over the old one's declarations.
    pub fn replace_selector(&mut self, old: SelectorId, new: SelectorId) {
        let Some(old_sel) = self.selectors.remove(old) else {
            return;
        };
        if let Some(rule) = self.rules.get_mut(old_sel.rule)
            && let Some(slot) = rule.selectors.iter_mut().find(|s| **s == old)
        {
            *slot = new;
        }
        for decl in &old_sel.declarations {
            if let Some(d) = self.declarations.get_mut(*decl) {
                d.selector = new;
            }
        }
        if let Some(sel) = self.selectors.get_mut(new) {
            sel.declarations = old_sel.declarations;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specificity::Specificity;

    fn selector(model: &mut StyleModel, rule: RuleId, raw: &str) -> SelectorId {
        let sheet = model.rules[rule].sheet;
        let id = model.selectors.insert(Selector {
            rule,
            sheet,
            raw: raw.to_string(),
            filtered: raw.to_string(),
            ast: None,
            specificity: Specificity::ZERO,
            ignored: false,
            key_pseudo_class: None,
            key_pseudo_element: None,
            ordinal: 0,
            line: 1,
            media: MediaList::default(),
            matched: false,
            matched_document: false,
            matches: vec![],
            declarations: vec![],
        });
        model.rules[rule].selectors.push(id);
        id
    }

    fn sample() -> (StyleModel, SheetId, RuleId, SelectorId, SelectorId) {
        let mut model = StyleModel::new();
        let sheet = model
            .sheets
            .insert(Stylesheet::new("a.css", StylesheetKind::External, 0));
        let rule = model.rules.insert(Rule::new(sheet, 1, MediaList::default()));
        model.sheets[sheet].nodes.push(RuleNode::Media {
            queries: MediaList::parse("print"),
            children: vec![RuleNode::Style(rule)],
        });
        let a = selector(&mut model, rule, "a");
        let b = selector(&mut model, rule, "b");
        model.push_declaration(Declaration::new(a, "color", "red", "red", false, 0));
        (model, sheet, rule, a, b)
    }

    #[test]
    fn selectors_in_source_order() {
        let (model, sheet, _, a, b) = sample();
        assert_eq!(model.selectors_of(sheet), vec![a, b]);
        assert_eq!(model.sheet_by_key("a.css"), Some(sheet));
    }

    #[test]
    fn pruning_cascades_upwards() {
        let (mut model, sheet, rule, a, b) = sample();

        assert_eq!(model.remove_empty_selectors(), 1);
        assert!(model.selectors.get(b).is_none());
        assert_eq!(model.remove_empty_rules(), 0);

        let decl = model.selectors[a].declarations[0];
        model.remove_declaration(decl);
        assert_eq!(model.remove_empty_selectors(), 1);
        assert_eq!(model.remove_empty_rules(), 1);
        assert!(model.rules.get(rule).is_none());
        assert!(model.sheets[sheet].nodes.is_empty());
    }

    #[test]
    fn vendor_marker_from_name_or_value() {
        let (mut model, _, _, a, _) = sample();
        let appearance = Declaration::new(a, "-moz-appearance", "none", "none", false, 1);
        let by_name = model.push_declaration(appearance);
        let by_value = model.push_declaration(Declaration::new(
            a,
            "display",
            "-webkit-box",
            "-webkit-box",
            false,
            2,
        ));
        assert_eq!(model.declarations[by_name].vendor, Some(VendorPrefix::Moz));
        assert_eq!(model.declarations[by_value].vendor, Some(VendorPrefix::Webkit));
    }
}
