//! Counters exposed to reporting layers after each phase.

use std::fmt;

use serde::Serialize;

/// Run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Selectors parsed across all stylesheets.
    pub selectors_total: usize,
    /// Selectors matched by at least one element (or the document).
    pub selectors_matched: usize,
    /// Selectors excluded from analysis.
    pub selectors_ignored: usize,
    /// Declarations left effective by the cascade.
    pub declarations_effective: usize,
    /// Declarations the cascade found overridden or unmatched.
    pub declarations_ineffective: usize,
    /// Selectors dropped because they ended up empty.
    pub selectors_removed: usize,
    /// Rules dropped because they ended up without selectors.
    pub rules_removed: usize,
    /// Same-name declarations collapsed within a selector.
    pub duplicates_removed: usize,
    /// Declarations removed as invalid undos.
    pub invalid_undo: usize,
    /// Clone sets found by the mixin miner.
    pub clone_sets: usize,
    /// Mixins kept for output.
    pub mixins_accepted: usize,
    /// Mixins rejected and restored.
    pub mixins_rejected: usize,
    /// Combinators rewritten to their stricter form.
    pub combinators_tightened: usize,
    /// Selector queries that failed.
    pub query_errors: usize,
    /// Matches against the synthetic document node.
    pub document_root_matches: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "selectors: {} total, {} matched, {} ignored, {} removed",
            self.selectors_total,
            self.selectors_matched,
            self.selectors_ignored,
            self.selectors_removed
        )?;
        writeln!(
            f,
            "declarations: {} effective, {} ineffective, {} duplicates, {} invalid undo",
            self.declarations_effective,
            self.declarations_ineffective,
            self.duplicates_removed,
            self.invalid_undo
        )?;
        writeln!(f, "rules removed: {}", self.rules_removed)?;
        writeln!(
            f,
            "mixins: {} clone sets, {} accepted, {} rejected",
            self.clone_sets, self.mixins_accepted, self.mixins_rejected
        )?;
        write!(
            f,
            "combinators tightened: {}, query errors: {}, document matches: {}",
            self.combinators_tightened, self.query_errors, self.document_root_matches
        )
    }
}
