//! Rendering of the optimized model back to stylesheet text.
//!
//! Selectors of one rule may no longer share a declaration block after the
//! passes, so consecutive selectors with identical bodies are regrouped
//! and the rest are written as separate rules in place.

use std::fmt::{self, Write};
use std::path::Path;

use tracing::error;

use crate::config::OutputFormat;
use crate::model::{Declaration, RuleId, RuleNode, SelectorId, SheetId, StyleModel};
use crate::optimize::MixinSet;
use crate::{Error, Result};

const INDENT: &str = "  ";

/// Writes stylesheets of a [`StyleModel`] as CSS or SCSS.
pub struct CssWriter<'a> {
    model: &'a StyleModel,
    mixins: &'a MixinSet,
    format: OutputFormat,
}

impl<'a> CssWriter<'a> {
    pub fn new(model: &'a StyleModel, mixins: &'a MixinSet, format: OutputFormat) -> Self {
        Self {
            model,
            mixins,
            format,
        }
    }

    /// Render one stylesheet.
    pub fn render_sheet(&self, sheet: SheetId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_sheet(&mut out, sheet);
        out
    }

    /// Render every stylesheet in discovery order as `(key, text)` pairs.
    pub fn render_all(&self) -> Vec<(String, String)> {
        self.model
            .sheets_in_order()
            .into_iter()
            .filter_map(|id| {
                let sheet = self.model.sheets.get(id)?;
                Some((sheet.key.clone(), self.render_sheet(id)))
            })
            .collect()
    }

    /// Render one stylesheet into a file.
    pub fn write_to_file(&self, sheet: SheetId, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render_sheet(sheet)).map_err(|e| Error::io(path, e))
    }

    /// Write one stylesheet to any formatter sink.
    pub fn write_sheet(&self, out: &mut impl Write, sheet: SheetId) -> fmt::Result {
        let Some(stylesheet) = self.model.sheets.get(sheet) else {
            return Ok(());
        };
        if self.format == OutputFormat::Scss {
            for mixin in self.mixins.for_sheet(sheet) {
                writeln!(out, "@mixin {} {{", mixin.name)?;
                for decl in mixin.body() {
                    writeln!(out, "{INDENT}{};", decl)?;
                }
                writeln!(out, "}}")?;
            }
        }
        self.write_nodes(out, &stylesheet.nodes, 0)
    }

    fn write_nodes(&self, out: &mut impl Write, nodes: &[RuleNode], depth: usize) -> fmt::Result {
        let indent = INDENT.repeat(depth);
        for node in nodes {
            match node {
                RuleNode::Style(rule) => self.write_rule(out, *rule, depth)?,
                RuleNode::Media { queries, children } => {
                    writeln!(out, "{indent}@media {} {{", queries)?;
                    self.write_nodes(out, children, depth + 1)?;
                    writeln!(out, "{indent}}}")?;
                }
                RuleNode::Verbatim(text) => writeln!(out, "{indent}{}", text)?,
            }
        }
        Ok(())
    }

    fn write_rule(&self, out: &mut impl Write, rule: RuleId, depth: usize) -> fmt::Result {
        let Some(rule) = self.model.rules.get(rule) else {
            return Ok(());
        };
        self.check_media(rule.line, &rule.selectors);

        let mut groups: Vec<(Vec<&str>, Vec<String>)> = vec![];
        for &id in &rule.selectors {
            let Some(selector) = self.model.selectors.get(id) else {
                continue;
            };
            let body = self.body(id);
            if body.is_empty() && !selector.ignored {
                continue;
            }
            match groups.last_mut() {
                Some((selectors, last)) if *last == body => selectors.push(&selector.raw),
                _ => groups.push((vec![&selector.raw], body)),
            }
        }

        let indent = INDENT.repeat(depth);
        for (selectors, body) in groups {
            writeln!(out, "{indent}{} {{", selectors.join(", "))?;
            for line in body {
                writeln!(out, "{indent}{INDENT}{};", line)?;
            }
            writeln!(out, "{indent}}}")?;
        }
        Ok(())
    }

    /// Body lines of one selector, without the trailing semicolons.
    fn body(&self, selector: SelectorId) -> Vec<String> {
        let own = self.model.declarations_of(selector).map(|(_, d)| d);
        match self.format {
            OutputFormat::Scss => self
                .mixins
                .for_selector(selector)
                .map(|m| format!("@include {}", m.name))
                .chain(own.map(Declaration::to_string))
                .collect(),
            OutputFormat::Css => {
                let mut decls: Vec<&Declaration> = own
                    .chain(
                        self.mixins
                            .for_selector(selector)
                            .flat_map(|m| m.extracted.iter())
                            .filter(|d| d.selector == selector),
                    )
                    .collect();
                decls.sort_by_key(|d| d.position);
                decls.into_iter().map(Declaration::to_string).collect()
            }
        }
    }

    /// Selectors of one rule are expected to share a media set. A
    /// disagreement is reported and the block the rule sits in wins.
    fn check_media(&self, line: u32, selectors: &[SelectorId]) {
        let mut sets = selectors
            .iter()
            .filter_map(|id| self.model.selectors.get(*id))
            .map(|s| &s.media);
        let Some(first) = sets.next() else {
            return;
        };
        if let Some(other) = sets.find(|m| !m.equivalent(first)) {
            error!(
                line,
                first = %first,
                other = %other,
                "selectors of one rule disagree on media queries"
            );
        }
    }
}
