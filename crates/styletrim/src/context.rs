//! Explicit analysis context threaded through the passes.

use crate::matching::MatchIndex;
use crate::stats::Stats;

/// Monotonic marker for one cascade walk over one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

/// State shared by the passes of one optimization run.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    pub index: MatchIndex,
    pub stats: Stats,
    generation: u64,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh generation.
    pub fn next_generation(&mut self) -> Generation {
        self.generation += 1;
        Generation(self.generation)
    }
}
