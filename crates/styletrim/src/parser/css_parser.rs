//! Stylesheet parser using the `cssparser` crate.
//!
//! The parser walks the token stream the same way for top-level rules and
//! for the contents of `@media` blocks. Each qualified rule is split into
//! one [`Selector`] per comma-separated selector, and every selector gets
//! its own copy of the declaration block so later passes can drop
//! declarations per selector.
//!
//! # Error Recovery
//!
//! Errors in one rule or declaration never fail the stylesheet. The parser
//! records a message in [`Stylesheet::parse_errors`], logs it via
//! `tracing::warn!`, skips to the end of the offending rule or declaration
//! and continues.

use cssparser::{Delimiter, ParseError, ParseErrorKind, Parser, ParserInput, Token};
use styletrim_dom::selector::split_selector_list;
use tracing::{debug, warn};

use super::normalize::normalize_value;
use super::selector::analyse_selector;
use crate::Error;
use crate::config::OptimizerConfig;
use crate::model::{
    Declaration, MediaList, Rule, RuleId, RuleNode, Selector, SheetId, StyleModel, Stylesheet,
    StylesheetKind,
};

type PResult<'i, T> = std::result::Result<T, ParseError<'i, String>>;

/// A declaration as read from a block, before it is attached to a selector.
#[derive(Debug, Clone)]
struct ParsedDeclaration {
    name: String,
    raw_value: String,
    value: String,
    important: bool,
}

/// Parse `css` into a new stylesheet of `model`.
///
/// Never fails: malformed rules are skipped and reported through the
/// stylesheet's parse errors.
///
/// # Example
///
/// ```
/// use styletrim::model::{StyleModel, StylesheetKind};
/// use styletrim::parser::parse_stylesheet;
/// use styletrim::OptimizerConfig;
///
/// let mut model = StyleModel::new();
/// let sheet = parse_stylesheet(
///     &mut model,
///     "site.css",
///     "h1, h2 { margin: 0PX } @media print { nav { display: none } }",
///     StylesheetKind::External,
///     0,
///     &OptimizerConfig::default(),
/// );
///
/// let selectors = model.selectors_of(sheet);
/// assert_eq!(selectors.len(), 3);
/// assert!(model.sheets[sheet].parse_errors.is_empty());
/// ```
pub fn parse_stylesheet(
    model: &mut StyleModel,
    key: &str,
    css: &str,
    kind: StylesheetKind,
    discovery_order: u32,
    config: &OptimizerConfig,
) -> SheetId {
    let sheet = model
        .sheets
        .insert(Stylesheet::new(key, kind, discovery_order));

    let mut builder = SheetBuilder {
        model: &mut *model,
        sheet,
        key,
        normalize: config.normalize_values,
        errors: vec![],
    };

    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let nodes = builder.parse_rule_list(&mut parser, &MediaList::default());
    let errors = std::mem::take(&mut builder.errors);

    let stylesheet = &mut model.sheets[sheet];
    stylesheet.nodes = nodes;
    stylesheet.parse_errors = errors;

    debug!(
        key,
        rules = stylesheet.rules().len(),
        errors = stylesheet.parse_errors.len(),
        "stylesheet parsed"
    );
    sheet
}

struct SheetBuilder<'a> {
    model: &'a mut StyleModel,
    sheet: SheetId,
    key: &'a str,
    normalize: bool,
    errors: Vec<String>,
}

impl SheetBuilder<'_> {
    /// Parse rules until the parser is exhausted.
    fn parse_rule_list<'i>(
        &mut self,
        parser: &mut Parser<'i, '_>,
        media: &MediaList,
    ) -> Vec<RuleNode> {
        let mut nodes = vec![];

        loop {
            // Skip whitespace and comments
            parser.skip_whitespace();

            if parser.is_exhausted() {
                break;
            }

            let location = parser.current_source_location();
            let line = location.line + 1;
            let start = parser.state();

            match parser.next().cloned() {
                Ok(Token::AtKeyword(name)) => {
                    if let Some(node) = self.parse_at_rule(parser, &name, &start, line, media) {
                        nodes.push(node);
                    }
                }
                Ok(Token::CDO | Token::CDC) => {}
                Ok(_) => {
                    parser.reset(&start);
                    if let Some(node) =
                        self.parse_style_rule(parser, line, location.column, media)
                    {
                        nodes.push(node);
                    }
                }
                Err(_) => break,
            }
        }

        nodes
    }

    /// `@media` recurses; every other at-rule is kept as written.
    fn parse_at_rule<'i>(
        &mut self,
        parser: &mut Parser<'i, '_>,
        name: &str,
        start: &cssparser::ParserState,
        line: u32,
        media: &MediaList,
    ) -> Option<RuleNode> {
        let prelude_start = parser.position();
        let _ = parser.parse_until_before(
            Delimiter::CurlyBracketBlock | Delimiter::Semicolon,
            consume_all,
        );
        let prelude = parser.slice_from(prelude_start).trim().to_string();

        if name.eq_ignore_ascii_case("media") {
            if !matches!(parser.next(), Ok(Token::CurlyBracketBlock)) {
                self.error(format!("expected '{{' after '@media {}'", prelude), line, 1);
                return None;
            }
            let queries = MediaList::parse(&prelude);
            let scoped = media.nested(&queries);
            let children = parser
                .parse_nested_block(|p| {
                    Ok::<_, ParseError<'i, String>>(self.parse_rule_list(p, &scoped))
                })
                .unwrap_or_default();
            return Some(RuleNode::Media { queries, children });
        }

        let has_block = matches!(parser.next(), Ok(Token::CurlyBracketBlock));
        if has_block {
            let _ = parser.parse_nested_block(consume_all);
        }
        Some(RuleNode::Verbatim(
            parser.slice_from(start.position()).trim().to_string(),
        ))
    }

    /// Parse a qualified rule: `selector, selector { declarations }`.
    fn parse_style_rule<'i>(
        &mut self,
        parser: &mut Parser<'i, '_>,
        line: u32,
        column: u32,
        media: &MediaList,
    ) -> Option<RuleNode> {
        let prelude_start = parser.position();
        let _ = parser.parse_until_before(Delimiter::CurlyBracketBlock, consume_all);
        let prelude = parser.slice_from(prelude_start).trim().to_string();

        if !matches!(parser.next(), Ok(Token::CurlyBracketBlock)) {
            self.error(format!("expected '{{' after '{}'", prelude), line, column);
            return None;
        }

        let block = parser
            .parse_nested_block(|p| Ok::<_, ParseError<'i, String>>(self.parse_declarations(p)))
            .unwrap_or_default();

        let texts: Vec<String> = split_selector_list(&prelude)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if texts.is_empty() {
            self.error("rule without a selector", line, column);
            return None;
        }

        let rule = self
            .model
            .rules
            .insert(Rule::new(self.sheet, line, media.clone()));
        for (ordinal, text) in texts.into_iter().enumerate() {
            self.add_selector(rule, text, ordinal as u32, line, media, &block);
        }
        Some(RuleNode::Style(rule))
    }

    fn add_selector(
        &mut self,
        rule: RuleId,
        raw: String,
        ordinal: u32,
        line: u32,
        media: &MediaList,
        block: &[ParsedDeclaration],
    ) {
        let info = analyse_selector(&raw);
        let id = self.model.selectors.insert(Selector {
            rule,
            sheet: self.sheet,
            raw,
            filtered: info.filtered,
            ast: info.ast,
            specificity: info.specificity,
            ignored: info.ignored,
            key_pseudo_class: info.key_pseudo_class,
            key_pseudo_element: info.key_pseudo_element,
            ordinal,
            line,
            media: media.clone(),
            matched: false,
            matched_document: false,
            matches: vec![],
            declarations: vec![],
        });
        self.model.rules[rule].selectors.push(id);

        for (position, decl) in block.iter().enumerate() {
            self.model.push_declaration(Declaration::new(
                id,
                decl.name.clone(),
                decl.raw_value.clone(),
                decl.value.clone(),
                decl.important,
                position as u32,
            ));
        }
    }

    /// Parse the contents of a declaration block.
    fn parse_declarations<'i>(&mut self, parser: &mut Parser<'i, '_>) -> Vec<ParsedDeclaration> {
        let mut declarations = vec![];

        loop {
            parser.skip_whitespace();

            if parser.is_exhausted() {
                break;
            }

            let location = parser.current_source_location();
            match parser.parse_until_after(Delimiter::Semicolon, parse_declaration) {
                Ok((name, raw_value, important)) => {
                    let value = self.normalized(&name, &raw_value);
                    declarations.push(ParsedDeclaration {
                        name,
                        raw_value,
                        value,
                        important,
                    });
                }
                Err(e) => {
                    self.error(
                        format!("invalid declaration: {}", describe(&e)),
                        location.line + 1,
                        location.column,
                    );
                }
            }
        }

        declarations
    }

    /// Normalized form of a value, or the value as written when it cannot
    /// be normalized. Custom properties are never touched.
    fn normalized(&self, name: &str, raw: &str) -> String {
        if !self.normalize || name.starts_with("--") {
            return raw.to_string();
        }
        match normalize_value(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(sheet = self.key, property = name, "keeping value as written: {}", e);
                raw.to_string()
            }
        }
    }

    fn error(&mut self, message: impl Into<String>, line: u32, column: u32) {
        let error = Error::parse(message, line, column);
        warn!(sheet = self.key, "{}", error);
        self.errors.push(error.to_string());
    }
}

/// Parse `name: value [!important]` up to the end of the delimited input.
fn parse_declaration<'i>(parser: &mut Parser<'i, '_>) -> PResult<'i, (String, String, bool)> {
    let name = parser.expect_ident()?.to_string();
    let name = if name.starts_with("--") {
        name
    } else {
        name.to_ascii_lowercase()
    };
    parser.expect_colon()?;

    let start = parser.position();
    let mut end = start;
    let mut important = false;

    while !parser.is_exhausted() {
        let token = parser.next()?.clone();
        if let Token::Delim('!') = token {
            parser.expect_ident_matching("important")?;
            important = true;
            break;
        }
        end = parser.position();
    }

    let raw_value = parser.slice(start..end).trim().to_string();
    if raw_value.is_empty() {
        return Err(parser.new_custom_error(format!("empty value for '{}'", name)));
    }
    Ok((name, raw_value, important))
}

fn consume_all<'i>(parser: &mut Parser<'i, '_>) -> PResult<'i, ()> {
    while parser.next().is_ok() {}
    Ok(())
}

fn describe(error: &ParseError<'_, String>) -> String {
    match &error.kind {
        ParseErrorKind::Custom(message) => message.clone(),
        ParseErrorKind::Basic(kind) => format!("{:?}", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specificity::Specificity;

    fn parse(css: &str) -> (StyleModel, SheetId) {
        let mut model = StyleModel::new();
        let sheet = parse_stylesheet(
            &mut model,
            "test.css",
            css,
            StylesheetKind::External,
            0,
            &OptimizerConfig::default(),
        );
        (model, sheet)
    }

    fn decls(model: &StyleModel, selector: crate::model::SelectorId) -> Vec<String> {
        model
            .declarations_of(selector)
            .map(|(_, d)| d.template().to_string())
            .collect()
    }

    #[test]
    fn parse_simple_rule() {
        let (model, sheet) = parse("div { color: RED; margin-top: 0px }");
        let selectors = model.selectors_of(sheet);
        assert_eq!(selectors.len(), 1);

        let sel = &model.selectors[selectors[0]];
        assert_eq!(sel.raw, "div");
        assert_eq!(sel.line, 1);
        assert_eq!(sel.specificity, Specificity(1));
        assert_eq!(decls(&model, selectors[0]), vec!["color: RED", "margin-top: 0"]);

        let written: Vec<_> = model
            .declarations_of(selectors[0])
            .map(|(_, d)| d.to_string())
            .collect();
        assert_eq!(written, vec!["color: RED", "margin-top: 0px"]);
    }

    #[test]
    fn selector_lists_copy_the_block() {
        let (model, sheet) = parse("\n\na, .b , #c { color: blue !important; }");
        let selectors = model.selectors_of(sheet);
        assert_eq!(selectors.len(), 3);

        for (ordinal, id) in selectors.iter().enumerate() {
            let sel = &model.selectors[*id];
            assert_eq!(sel.ordinal, ordinal as u32);
            assert_eq!(sel.line, 3);
            assert_eq!(decls(&model, *id), vec!["color: blue !important"]);
        }
        assert_eq!(model.declarations.len(), 3);
    }

    #[test]
    fn media_blocks_scope_rules() {
        let (model, sheet) = parse(
            "@media screen { @media (min-width: 10em) { p { color: red } } a { color: blue } }",
        );
        let selectors = model.selectors_of(sheet);
        assert_eq!(selectors.len(), 2);
        assert_eq!(model.selectors[selectors[0]].media.0.len(), 2);
        assert_eq!(model.selectors[selectors[1]].media.to_string(), "screen");

        match &model.sheets[sheet].nodes[0] {
            RuleNode::Media { queries, children } => {
                assert_eq!(queries.to_string(), "screen");
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected media block, got {:?}", other),
        }
    }

    #[test]
    fn other_at_rules_are_verbatim() {
        let (model, sheet) = parse(
            "@import url(base.css);\n\
             @font-face { font-family: X; src: url(x.woff) }\n\
             p { color: red }",
        );
        let nodes = &model.sheets[sheet].nodes;
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], RuleNode::Verbatim("@import url(base.css);".to_string()));
        assert!(matches!(&nodes[1], RuleNode::Verbatim(text) if text.starts_with("@font-face {")));
        assert_eq!(model.selectors[model.selectors_of(sheet)[0]].line, 3);
    }

    #[test]
    fn recovers_from_bad_declarations() {
        let (model, sheet) = parse("p { color: ; : x; width: 10px; height 5px; top: 0 }");
        let selectors = model.selectors_of(sheet);
        assert_eq!(decls(&model, selectors[0]), vec!["width: 10px", "top: 0"]);
        assert_eq!(model.sheets[sheet].parse_errors.len(), 3);
    }

    #[test]
    fn recovers_from_unterminated_rule() {
        let (model, sheet) = parse("p { color: red } div");
        assert_eq!(model.selectors_of(sheet).len(), 1);
        assert_eq!(model.sheets[sheet].parse_errors.len(), 1);
        assert!(model.sheets[sheet].parse_errors[0].contains("line 1"));
    }

    #[test]
    fn unnormalizable_values_are_kept() {
        let (model, sheet) = parse("p { font-family: \"Open; }");
        assert_eq!(model.selectors_of(sheet).len(), 1);
    }

    #[test]
    fn ignored_selectors_are_marked() {
        let (model, sheet) = parse("a:not(.x), input[checked] { color: red }");
        for id in model.selectors_of(sheet) {
            assert!(model.selectors[id].ignored);
        }
    }
}
