//! Selector text parser built on the `cssparser` tokenizer.

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};

use super::types::{
    AttrOperator, AttrSelector, Combinator, ComplexSelector, Compound, LEGACY_PSEUDO_ELEMENTS,
    NthExpr, PseudoClass, PseudoElement, TypeSelector,
};
use crate::error::{Result, SelectorError};

type PResult<'i, T> = std::result::Result<T, ParseError<'i, SelectorError>>;

/// Parse a single complex selector (no top-level commas).
///
/// # Example
///
/// ```
/// use styletrim_dom::selector::{parse_selector, Combinator};
///
/// let sel = parse_selector("nav ul > li.active a:hover").unwrap();
/// assert_eq!(sel.compounds.len(), 4);
/// assert_eq!(sel.combinators[1], Combinator::Child);
/// ```
pub fn parse_selector(text: &str) -> Result<ComplexSelector> {
    if text.trim().is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);

    parser
        .parse_entirely(|p| parse_complex(p))
        .map_err(|e| into_selector_error(e, text))
}

/// Split a selector list at top-level commas, respecting brackets and strings.
pub fn split_selector_list(text: &str) -> Vec<String> {
    let mut parts = vec![];
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                current.push(ch);
            }
            '"' | '\'' if quote.is_none() => {
                quote = Some(ch);
                current.push(ch);
            }
            c if quote == Some(c) => {
                quote = None;
                current.push(ch);
            }
            '(' | '[' if quote.is_none() => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' if quote.is_none() => {
                depth -= 1;
                current.push(ch);
            }
            ',' if quote.is_none() && depth == 0 => {
                parts.push(std::mem::take(&mut current).trim().to_string());
            }
            _ => current.push(ch),
        }
    }
    parts.push(current.trim().to_string());
    parts.retain(|p| !p.is_empty());
    parts
}

fn into_selector_error(error: ParseError<'_, SelectorError>, text: &str) -> SelectorError {
    match error.kind {
        ParseErrorKind::Custom(e) => e.with_selector(text),
        ParseErrorKind::Basic(basic) => SelectorError::unexpected(text, format!("{:?}", basic)),
    }
}

fn unexpected<'i>(
    parser: &Parser<'i, '_>,
    message: impl Into<String>,
) -> ParseError<'i, SelectorError> {
    parser.new_custom_error(SelectorError::unexpected("", message))
}

fn unsupported<'i>(
    parser: &Parser<'i, '_>,
    message: impl Into<String>,
) -> ParseError<'i, SelectorError> {
    parser.new_custom_error(SelectorError::unsupported("", message))
}

/// Parse compounds and combinators until the input is exhausted.
fn parse_complex<'i>(parser: &mut Parser<'i, '_>) -> PResult<'i, ComplexSelector> {
    let mut compounds = vec![];
    let mut combinators = vec![];
    let mut current = Compound::default();
    let mut pending: Option<Combinator> = None;
    let mut saw_whitespace = false;

    parser.skip_whitespace();

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        let combinator = match &token {
            Token::WhiteSpace(_) => {
                saw_whitespace = true;
                continue;
            }
            Token::Delim('>') => Some(Combinator::Child),
            Token::Delim('+') => Some(Combinator::AdjacentSibling),
            Token::Delim('~') => Some(Combinator::GeneralSibling),
            Token::Comma => return Err(unsupported(parser, "selector lists must be split first")),
            _ => None,
        };

        if let Some(combinator) = combinator {
            if current.pseudo_element.is_some() {
                return Err(unexpected(parser, "a pseudo-element must end the selector"));
            }
            if !current.is_empty() {
                compounds.push(std::mem::take(&mut current));
            } else if compounds.is_empty() || pending.is_some() {
                return Err(unexpected(parser, "combinator without a left-hand compound"));
            }
            pending = Some(combinator);
            saw_whitespace = false;
            continue;
        }

        // A simple selector starts here; close the previous compound if needed.
        if let Some(combinator) = pending.take() {
            combinators.push(combinator);
        } else if saw_whitespace && !current.is_empty() {
            if current.pseudo_element.is_some() {
                return Err(unexpected(parser, "a pseudo-element must end the selector"));
            }
            compounds.push(std::mem::take(&mut current));
            combinators.push(Combinator::Descendant);
        }
        saw_whitespace = false;

        if current.pseudo_element.is_some() {
            return Err(unexpected(parser, "nothing may follow a pseudo-element"));
        }

        match token {
            Token::Ident(name) => {
                if !current.is_empty() {
                    let message = format!("type selector '{}' must come first", name);
                    return Err(unexpected(parser, message));
                }
                current.type_selector = Some(TypeSelector::Type(name.to_ascii_lowercase()));
            }

            Token::Delim('*') => {
                if !current.is_empty() {
                    return Err(unexpected(parser, "'*' must come first"));
                }
                current.type_selector = Some(TypeSelector::Universal);
            }

            Token::Delim('|') => return Err(unsupported(parser, "namespace prefixes")),

            Token::Delim('.') => {
                let class = match parser.next_including_whitespace()?.clone() {
                    Token::Ident(class) => class.to_string(),
                    _ => return Err(unexpected(parser, "expected class name after '.'")),
                };
                current.classes.push(class);
            }

            Token::IDHash(id) => {
                if current.id.is_some() {
                    return Err(unsupported(parser, "multiple ids in one compound"));
                }
                current.id = Some(id.to_string());
            }

            Token::SquareBracketBlock => {
                let attr = parser.parse_nested_block(|p| parse_attribute(p))?;
                current.attributes.push(attr);
            }

            Token::Colon => parse_pseudo(parser, &mut current)?,

            other => return Err(unexpected(parser, format!("unexpected token {:?}", other))),
        }
    }

    if pending.is_some() {
        return Err(unexpected(parser, "dangling combinator"));
    }
    if !current.is_empty() {
        compounds.push(current);
    }
    if compounds.is_empty() {
        return Err(parser.new_custom_error(SelectorError::Empty));
    }

    Ok(ComplexSelector {
        compounds,
        combinators,
    })
}

/// Parse the contents of `[...]`.
fn parse_attribute<'i>(parser: &mut Parser<'i, '_>) -> PResult<'i, AttrSelector> {
    let name = parser.expect_ident()?.to_ascii_lowercase();

    parser.skip_whitespace();
    if parser.is_exhausted() {
        return Ok(AttrSelector::exists(name));
    }

    let operator = match parser.next()?.clone() {
        Token::Delim('=') => AttrOperator::Equals,
        Token::IncludeMatch => AttrOperator::Includes,
        Token::DashMatch => AttrOperator::DashMatch,
        Token::PrefixMatch => AttrOperator::Prefix,
        Token::SuffixMatch => AttrOperator::Suffix,
        Token::SubstringMatch => AttrOperator::Substring,
        Token::Delim('|') => return Err(unsupported(parser, "namespace prefixes")),
        other => return Err(unexpected(parser, format!("bad attribute operator {:?}", other))),
    };

    let value = match parser.next()?.clone() {
        Token::Ident(v) | Token::QuotedString(v) => v.to_string(),
        other => return Err(unexpected(parser, format!("bad attribute value {:?}", other))),
    };

    let mut attr = AttrSelector::with_value(name, operator, value);

    parser.skip_whitespace();
    if !parser.is_exhausted() {
        let flag = parser.expect_ident()?.to_ascii_lowercase();
        match flag.as_str() {
            "i" => attr.case_insensitive = true,
            "s" => {}
            _ => return Err(unexpected(parser, format!("unknown attribute flag '{}'", flag))),
        }
    }

    Ok(attr)
}

/// Parse what follows a `:` in a compound.
fn parse_pseudo<'i>(parser: &mut Parser<'i, '_>, current: &mut Compound) -> PResult<'i, ()> {
    match parser.next_including_whitespace()?.clone() {
        Token::Colon => {
            let name = match parser.next_including_whitespace()?.clone() {
                Token::Ident(name) => name.to_ascii_lowercase(),
                Token::Function(name) => {
                    let message = format!("functional pseudo-element ::{}()", name);
                    return Err(unsupported(parser, message));
                }
                other => return Err(unexpected(parser, format!("bad pseudo-element {:?}", other))),
            };
            current.pseudo_element = Some(PseudoElement::new(name, false));
        }

        Token::Ident(name) => {
            let name = name.to_ascii_lowercase();
            if LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
                current.pseudo_element = Some(PseudoElement::new(name, true));
            } else {
                current.pseudo_classes.push(PseudoClass::from_css(&name));
            }
        }

        Token::Function(name) => {
            let name = name.to_ascii_lowercase();
            let pseudo = match name.as_str() {
                "nth-child" => PseudoClass::NthChild(parser.parse_nested_block(|p| parse_nth(p))?),
                "nth-last-child" => {
                    PseudoClass::NthLastChild(parser.parse_nested_block(|p| parse_nth(p))?)
                }
                "nth-of-type" => {
                    PseudoClass::NthOfType(parser.parse_nested_block(|p| parse_nth(p))?)
                }
                "nth-last-of-type" => {
                    PseudoClass::NthLastOfType(parser.parse_nested_block(|p| parse_nth(p))?)
                }
                "not" => {
                    let inner = parser.parse_nested_block(|p| {
                        let mut sel = parse_complex(p)?;
                        if sel.compounds.len() != 1 {
                            return Err(unsupported(p, ":not() with a complex argument"));
                        }
                        Ok(sel.compounds.remove(0))
                    })?;
                    PseudoClass::Not(Box::new(inner))
                }
                _ => {
                    let start = parser.position();
                    parser.parse_nested_block(|p| {
                        while p.next().is_ok() {}
                        Ok::<_, ParseError<'i, SelectorError>>(())
                    })?;
                    PseudoClass::Unknown(format!("{}({}", name, parser.slice_from(start)))
                }
            };
            current.pseudo_classes.push(pseudo);
        }

        other => return Err(unexpected(parser, format!("bad pseudo-class {:?}", other))),
    }
    Ok(())
}

fn parse_nth<'i>(parser: &mut Parser<'i, '_>) -> PResult<'i, NthExpr> {
    let (a, b) = cssparser::parse_nth(parser).map_err(|_| {
        parser.new_custom_error(SelectorError::InvalidNth {
            selector: String::new(),
        })
    })?;
    Ok(NthExpr::new(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::StatePseudo;

    #[test]
    fn parse_descendant_and_child() {
        let sel = parse_selector("div  p > a").unwrap();
        assert_eq!(sel.compounds.len(), 3);
        assert_eq!(sel.combinators, vec![Combinator::Descendant, Combinator::Child]);
        assert_eq!(sel.to_string(), "div p > a");
    }

    #[test]
    fn parse_compound_parts() {
        let sel = parse_selector("input#name.wide.big[type=\"text\"]:focus").unwrap();
        let subject = sel.subject().unwrap();
        assert_eq!(subject.type_selector, Some(TypeSelector::Type("input".into())));
        assert_eq!(subject.id.as_deref(), Some("name"));
        assert_eq!(subject.classes, vec!["wide".to_string(), "big".to_string()]);
        assert_eq!(subject.attributes[0].value.as_deref(), Some("text"));
        assert_eq!(subject.pseudo_classes, vec![PseudoClass::State(StatePseudo::Focus)]);
    }

    #[test]
    fn parse_pseudo_elements() {
        let sel = parse_selector("p::first-line").unwrap();
        assert_eq!(sel.pseudo_element(), Some(&PseudoElement::new("first-line", false)));

        let sel = parse_selector("a:after").unwrap();
        assert_eq!(sel.pseudo_element(), Some(&PseudoElement::new("after", true)));
        assert_eq!(sel.to_string(), "a:after");
    }

    #[test]
    fn parse_nth_variants() {
        let sel = parse_selector("li:nth-child(2n+1)").unwrap();
        assert_eq!(
            sel.subject().unwrap().pseudo_classes,
            vec![PseudoClass::NthChild(NthExpr::new(2, 1))]
        );

        let sel = parse_selector("tr:nth-of-type(even)").unwrap();
        assert_eq!(
            sel.subject().unwrap().pseudo_classes,
            vec![PseudoClass::NthOfType(NthExpr::new(2, 0))]
        );
    }

    #[test]
    fn parse_negation_and_unknown() {
        let sel = parse_selector("a:not(.x)").unwrap();
        assert!(matches!(sel.subject().unwrap().pseudo_classes[0], PseudoClass::Not(_)));
        assert!(sel.uses_unsupported_constructs());

        let sel = parse_selector("div:has(> img)").unwrap();
        assert!(matches!(
            &sel.subject().unwrap().pseudo_classes[0],
            PseudoClass::Unknown(t) if t.starts_with("has(")
        ));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_selector("  "), Err(SelectorError::Empty));
        assert!(parse_selector("> a").is_err());
        assert!(parse_selector("a >").is_err());
        assert!(parse_selector("svg|rect").is_err());
        assert!(parse_selector("a, b").is_err());
        assert!(parse_selector("p::before span").is_err());
    }

    #[test]
    fn split_list() {
        assert_eq!(
            split_selector_list("a, b:not(.c, .d) , [title=\"x,y\"]"),
            vec!["a".to_string(), "b:not(.c, .d)".to_string(), "[title=\"x,y\"]".to_string()]
        );
    }
}
