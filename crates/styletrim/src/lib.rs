//! Static CSS optimization for Horizon Analytic tooling.
//!
//! Given the stylesheets of a site and snapshots of its rendered pages,
//! this crate works out which declarations actually take effect and
//! rewrites the stylesheets accordingly:
//!
//! - **Cascade**: specificity, source order and `!important` resolved per element
//! - **Pruning**: overridden and unmatched declarations are dropped
//! - **Undo detection**: resets to a property default with nothing to reset
//! - **Duplicates and mixins**: repeated declarations collapsed or extracted
//! - **Tightening**: `a b` rewritten to `a > b` where the pages allow it
//!
//! The output is plain CSS or SCSS with `@mixin`/`@include`.
//!
//! # Example
//!
//! ```
//! use styletrim::prelude::*;
//! use styletrim_dom::{Element, ElementTree};
//!
//! let mut optimizer = Optimizer::new(OptimizerConfig::default());
//! optimizer.add_stylesheet("app.css", "div p { color: red }\nh1 { color: blue }", StylesheetKind::External);
//!
//! let mut tree = ElementTree::new();
//! let div = tree.append(tree.root(), Element::new("div"));
//! tree.append(div, Element::new("p"));
//! optimizer.process_snapshot(Snapshot::new(SnapshotId(0), tree)).unwrap();
//!
//! let output = optimizer.run();
//! assert_eq!(output.stats.combinators_tightened, 1);
//! assert_eq!(output.render_sheet("app.css").unwrap(), "div > p {\n  color: red;\n}\n");
//! ```

pub mod config;
pub mod context;
pub mod matching;
pub mod model;
pub mod optimize;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod specificity;
pub mod stats;

mod error;

pub use config::{OptimizerConfig, OutputFormat};
pub use error::{Error, Result};
pub use matching::Snapshot;
pub use pipeline::{OptimizationOutput, Optimizer};
pub use stats::Stats;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::{OptimizerConfig, OutputFormat};
    pub use crate::matching::Snapshot;
    pub use crate::model::{SnapshotId, StyleModel, StylesheetKind};
    pub use crate::optimize::{Mixin, MixinSet};
    pub use crate::pipeline::{OptimizationOutput, Optimizer};
    pub use crate::render::CssWriter;
    pub use crate::specificity::Specificity;
    pub use crate::stats::Stats;
    pub use crate::{Error, Result};
}
