//! Cascade resolution and the passes built on its result.

mod cascade;
mod gate;
mod prune;
mod undo;

use std::cmp::Reverse;

use crate::model::{SelectorId, StyleModel};

pub use cascade::{CascadeSummary, resolve_cascade};
pub use gate::Gate;
pub use prune::{PruneSummary, prune_ineffective};
pub use undo::{UndoSummary, detect_invalid_undo, is_default_value};
pub(crate) use undo::related;

/// Sort selectors matching one element from the one that wins to the one
/// that loses: specificity, then stylesheet discovery order, then source
/// line, then position within the rule, all descending. Rules sharing a
/// line fall back to parse order. Keys that no longer resolve are dropped.
pub fn cascade_order(model: &StyleModel, selectors: Vec<SelectorId>) -> Vec<SelectorId> {
    let mut ranked: Vec<_> = selectors
        .into_iter()
        .filter_map(|id| {
            let sel = model.selectors.get(id)?;
            let order = model.discovery_order(id);
            Some((id, (sel.specificity, order, sel.line, sel.ordinal, id)))
        })
        .collect();
    ranked.sort_by_key(|(_, key)| Reverse(*key));
    ranked.into_iter().map(|(id, _)| id).collect()
}
