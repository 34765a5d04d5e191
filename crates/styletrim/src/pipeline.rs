//! The pipeline driver.
//!
//! Stylesheets are added first, snapshots are matched one at a time as
//! they arrive, and [`Optimizer::run`] executes the post-passes once over
//! the complete match index.
//!
//! ```
//! use styletrim::prelude::*;
//! use styletrim_dom::{Element, ElementTree};
//!
//! let mut optimizer = Optimizer::new(OptimizerConfig::default());
//! optimizer.add_stylesheet("site.css", "p { color: red } .x { color: blue } h1 { top: 0 }", StylesheetKind::External);
//!
//! let mut tree = ElementTree::new();
//! let body = tree.append(tree.root(), Element::new("body"));
//! tree.append(body, Element::new("p").with_class("x"));
//!
//! optimizer.process_snapshot(Snapshot::new(SnapshotId(0), tree).with_stylesheet("site.css")).unwrap();
//! let output = optimizer.run();
//!
//! assert_eq!(output.render_sheet("site.css").unwrap(), ".x {\n  color: blue;\n}\n");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use styletrim_dom::{ElementTree, SelectorQuery, TreeQuery};
use tracing::{info, warn};

use crate::config::{OptimizerConfig, OutputFormat};
use crate::context::AnalysisContext;
use crate::matching::{Snapshot, match_snapshot};
use crate::model::{SheetId, SnapshotId, StyleModel, StylesheetKind};
use crate::optimize::{MixinSet, eliminate_duplicates, mine_mixins, tighten_combinators};
use crate::parser::parse_stylesheet;
use crate::render::CssWriter;
use crate::resolve::{detect_invalid_undo, prune_ineffective, resolve_cascade};
use crate::stats::Stats;
use crate::{Error, Result};

/// Drives one optimization run.
pub struct Optimizer {
    config: OptimizerConfig,
    model: StyleModel,
    ctx: AnalysisContext,
    trees: BTreeMap<SnapshotId, ElementTree>,
    next_order: u32,
    query: Box<dyn SelectorQuery>,
}

impl Optimizer {
    /// Create a driver using the built-in [`TreeQuery`] engine.
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            model: StyleModel::new(),
            ctx: AnalysisContext::new(),
            trees: BTreeMap::new(),
            next_order: 0,
            query: Box::new(TreeQuery::new()),
        }
    }

    /// Replace the selector query engine.
    pub fn with_query(mut self, query: impl SelectorQuery + 'static) -> Self {
        self.query = Box::new(query);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn model(&self) -> &StyleModel {
        &self.model
    }

    /// Counters collected so far.
    pub fn stats(&self) -> &Stats {
        &self.ctx.stats
    }

    /// Parse and register a stylesheet. Discovery order follows call order.
    ///
    /// Malformed rules are recorded on the stylesheet and skipped.
    pub fn add_stylesheet(&mut self, key: &str, css: &str, kind: StylesheetKind) -> SheetId {
        let order = self.next_order;
        self.next_order += 1;
        let sheet = parse_stylesheet(&mut self.model, key, css, kind, order, &self.config);
        info!(
            key,
            discovery_order = order,
            selectors = self.model.selectors_of(sheet).len(),
            "stylesheet added"
        );
        sheet
    }

    /// Read and register an external stylesheet. The path is its key.
    pub fn add_stylesheet_file(&mut self, path: impl AsRef<Path>) -> Result<SheetId> {
        let path = path.as_ref();
        let css = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(self.add_stylesheet(&path.display().to_string(), &css, StylesheetKind::External))
    }

    /// Look up a registered stylesheet by key.
    pub fn stylesheet(&self, key: &str) -> Result<SheetId> {
        self.model
            .sheet_by_key(key)
            .ok_or_else(|| Error::unknown_stylesheet(key))
    }

    /// Match a snapshot against the stylesheets it references and retain
    /// its tree. Returns the number of new (element, selector) pairs.
    ///
    /// Unknown stylesheet keys are logged and skipped. A snapshot without
    /// any keys is matched against every stylesheet.
    pub fn process_snapshot(&mut self, snapshot: Snapshot) -> Result<usize> {
        if self.trees.contains_key(&snapshot.id) {
            return Err(Error::DuplicateSnapshot(snapshot.id.0));
        }

        let sheets: Vec<SheetId> = if snapshot.stylesheet_keys.is_empty() {
            self.model.sheets_in_order()
        } else {
            snapshot
                .stylesheet_keys
                .iter()
                .filter_map(|key| match self.stylesheet(key) {
                    Ok(sheet) => Some(sheet),
                    Err(e) => {
                        warn!(snapshot = %snapshot.id, "skipping stylesheet: {}", e);
                        None
                    }
                })
                .collect()
        };

        let registered = match_snapshot(
            &mut self.model,
            &mut self.ctx,
            &snapshot,
            &sheets,
            self.query.as_ref(),
        );
        info!(
            snapshot = %snapshot.id,
            sheets = sheets.len(),
            registered,
            "snapshot matched"
        );
        self.trees.insert(snapshot.id, snapshot.tree);
        Ok(registered)
    }

    /// Run the post-passes over the complete match index.
    pub fn run(self) -> OptimizationOutput {
        let Optimizer {
            config,
            mut model,
            mut ctx,
            trees,
            ..
        } = self;

        ctx.stats.selectors_total = model.selectors.len();
        ctx.stats.selectors_ignored = model.selectors.values().filter(|s| s.ignored).count();
        ctx.stats.selectors_matched = model
            .selectors
            .values()
            .filter(|s| s.matched || s.matched_document)
            .count();

        if config.eliminate_duplicates {
            ctx.stats.duplicates_removed = eliminate_duplicates(&mut model);
        }

        if config.remove_ineffective || config.detect_undo {
            let cascade = resolve_cascade(&mut model, &mut ctx);
            ctx.stats.declarations_effective = cascade.effective;
            ctx.stats.declarations_ineffective = cascade.ineffective;
        }

        if config.remove_ineffective {
            let pruned = prune_ineffective(&mut model);
            ctx.stats.selectors_removed += pruned.selectors_removed;
            ctx.stats.rules_removed += pruned.rules_removed;
        }

        if config.detect_undo {
            let undo = detect_invalid_undo(&mut model, &ctx);
            ctx.stats.invalid_undo = undo.removed.len();
            ctx.stats.selectors_removed += undo.selectors_removed;
            ctx.stats.rules_removed += undo.rules_removed;
        }

        let mut mixins = MixinSet::default();
        if config.mine_mixins {
            let (set, mining) = mine_mixins(&mut model, &config.mixin_prefix);
            mixins = set;
            ctx.stats.clone_sets = mining.clone_sets;
            ctx.stats.mixins_accepted = mining.accepted;
            ctx.stats.mixins_rejected = mining.rejected;
        }

        if config.tighten_combinators {
            let tightened = tighten_combinators(&mut model, &mut ctx, &trees);
            for (old, new) in &tightened.rewritten {
                mixins.retarget(*old, *new);
            }
            ctx.stats.combinators_tightened = tightened.combinators;
        }

        let parse_errors = model
            .sheets_in_order()
            .into_iter()
            .filter_map(|id| model.sheets.get(id))
            .flat_map(|sheet| {
                sheet
                    .parse_errors
                    .iter()
                    .map(|e| (sheet.key.clone(), e.clone()))
            })
            .collect();

        info!(
            selectors_removed = ctx.stats.selectors_removed,
            duplicates = ctx.stats.duplicates_removed,
            invalid_undo = ctx.stats.invalid_undo,
            mixins = ctx.stats.mixins_accepted,
            combinators = ctx.stats.combinators_tightened,
            "optimization finished"
        );

        OptimizationOutput {
            model,
            mixins,
            stats: ctx.stats,
            parse_errors,
            format: config.output,
        }
    }
}

/// Result of [`Optimizer::run`].
#[derive(Debug)]
pub struct OptimizationOutput {
    pub model: StyleModel,
    pub mixins: MixinSet,
    pub stats: Stats,
    /// `(stylesheet key, message)` for every malformed rule.
    pub parse_errors: Vec<(String, String)>,
    /// Format used by the render helpers.
    pub format: OutputFormat,
}

impl OptimizationOutput {
    /// A writer over the final model.
    pub fn writer(&self) -> CssWriter<'_> {
        CssWriter::new(&self.model, &self.mixins, self.format)
    }

    /// Render one stylesheet by key.
    pub fn render_sheet(&self, key: &str) -> Result<String> {
        let sheet = self
            .model
            .sheet_by_key(key)
            .ok_or_else(|| Error::unknown_stylesheet(key))?;
        Ok(self.writer().render_sheet(sheet))
    }

    /// Render every stylesheet as `(key, text)` pairs.
    pub fn render_all(&self) -> Vec<(String, String)> {
        self.writer().render_all()
    }
}
