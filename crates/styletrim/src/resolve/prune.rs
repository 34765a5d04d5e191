//! Removal of declarations the cascade found ineffective.

use tracing::info;

use crate::model::{DeclId, StyleModel};

/// What pruning removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub declarations_removed: usize,
    pub selectors_removed: usize,
    pub rules_removed: usize,
}

/// Drop ineffective declarations, then selectors left empty (unless
/// ignored), then rules left without selectors and empty media blocks.
pub fn prune_ineffective(model: &mut StyleModel) -> PruneSummary {
    let dead: Vec<DeclId> = model
        .declarations
        .iter()
        .filter(|(_, d)| {
            !d.effective
                && !model
                    .selectors
                    .get(d.selector)
                    .is_some_and(|s| s.always_effective())
        })
        .map(|(id, _)| id)
        .collect();

    for id in &dead {
        model.remove_declaration(*id);
    }

    let summary = PruneSummary {
        declarations_removed: dead.len(),
        selectors_removed: model.remove_empty_selectors(),
        rules_removed: model.remove_empty_rules(),
    };
    info!(
        declarations = summary.declarations_removed,
        selectors = summary.selectors_removed,
        rules = summary.rules_removed,
        "pruned ineffective declarations"
    );
    summary
}
