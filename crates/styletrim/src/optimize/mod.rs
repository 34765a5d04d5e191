//! Rewriting passes that run on top of the resolved cascade.

mod duplicates;
mod mixins;
mod tighten;

pub use duplicates::eliminate_duplicates;
pub use mixins::{CloneSet, MiningSummary, Mixin, MixinSet, clone_sets, mine_mixins};
pub use tighten::{TightenSummary, tighten_combinators};
