//! Declaration value normalization.
//!
//! Values are compared textually by the cascade, undo detection and mixin
//! mining, so equivalent spellings are folded to one form first. The
//! normalized form is a comparison key only; output keeps the value as
//! written.

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, SourcePosition, ToCss, Token};

const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "pt", "pc", "cm", "mm", "in", "q", "vh", "vw", "vmin", "vmax",
];

const WIDE_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

/// Errors from [`normalize_value`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// A string literal was not closed.
    #[error("unterminated string in '{0}'")]
    UnterminatedString(String),
    /// Parentheses or brackets do not pair up.
    #[error("unbalanced brackets in '{0}'")]
    Unbalanced(String),
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    UnterminatedString,
    Unbalanced,
}

/// Normalize a declaration value.
///
/// Comments are dropped and whitespace is collapsed. Zero lengths lose
/// their unit, units, function names, hex colours and CSS-wide keywords
/// are lowercased. Other identifiers keep their case, since animation,
/// grid and counter names are case-sensitive.
///
/// ```
/// use styletrim::parser::normalize_value;
///
/// assert_eq!(normalize_value("0PX  /* gap */ Auto").unwrap(), "0 Auto");
/// assert_eq!(normalize_value("#FFF URL(A.PNG) INHERIT").unwrap(), "#fff url(A.PNG) inherit");
/// ```
pub fn normalize_value(raw: &str) -> Result<String, NormalizeError> {
    let mut input = ParserInput::new(raw.trim());
    let mut parser = Parser::new(&mut input);
    let mut writer = Writer::default();
    write_tokens(&mut parser, &mut writer).map_err(|e| match e.kind {
        ParseErrorKind::Custom(Fault::UnterminatedString) => {
            NormalizeError::UnterminatedString(raw.to_string())
        }
        _ => NormalizeError::Unbalanced(raw.to_string()),
    })?;
    Ok(writer.out)
}

/// Output buffer that collapses whitespace runs into one space.
#[derive(Default)]
struct Writer {
    out: String,
    space: bool,
}

impl Writer {
    fn push(&mut self, text: &str) {
        if self.space && !self.out.is_empty() && !self.out.ends_with(['(', '[', '{']) {
            self.out.push(' ');
        }
        self.space = false;
        self.out.push_str(text);
    }

    fn comma(&mut self) {
        self.out.push(',');
        self.space = true;
    }

    fn close(&mut self, ch: char) {
        self.space = false;
        self.out.push(ch);
    }
}

fn write_tokens<'i>(
    parser: &mut Parser<'i, '_>,
    out: &mut Writer,
) -> Result<(), ParseError<'i, Fault>> {
    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };

        match &token {
            Token::WhiteSpace(_) => out.space = true,
            Token::Comma => out.comma(),
            Token::Ident(name) if is_wide_keyword(name) => out.push(&name.to_ascii_lowercase()),
            Token::Hash(value) | Token::IDHash(value) => {
                out.push(&format!("#{}", value.to_ascii_lowercase()))
            }
            Token::Number { value, .. } if *value == 0.0 => out.push("0"),
            Token::Dimension { value, unit, .. } if *value == 0.0 && is_length_unit(unit) => {
                out.push("0")
            }
            Token::Dimension {
                has_sign,
                value,
                int_value,
                unit,
            } => {
                let lowered = Token::Dimension {
                    has_sign: *has_sign,
                    value: *value,
                    int_value: *int_value,
                    unit: unit.to_ascii_lowercase().into(),
                };
                out.push(&lowered.to_css_string());
            }
            Token::QuotedString(_) => {
                if !is_closed_string(parser.slice_from(start)) {
                    return Err(parser.new_custom_error(Fault::UnterminatedString));
                }
                out.push(&token.to_css_string());
            }
            Token::Function(name) => {
                out.push(&format!("{}(", name.to_ascii_lowercase()));
                write_block(parser, start, ')', out)?;
            }
            Token::ParenthesisBlock => {
                out.push("(");
                write_block(parser, start, ')', out)?;
            }
            Token::SquareBracketBlock => {
                out.push("[");
                write_block(parser, start, ']', out)?;
            }
            Token::CurlyBracketBlock => {
                out.push("{");
                write_block(parser, start, '}', out)?;
            }
            Token::BadString(_) => {
                return Err(parser.new_custom_error(Fault::UnterminatedString));
            }
            Token::BadUrl(_)
            | Token::CloseParenthesis
            | Token::CloseSquareBracket
            | Token::CloseCurlyBracket => {
                return Err(parser.new_custom_error(Fault::Unbalanced));
            }
            other => out.push(&other.to_css_string()),
        }
    }
}

/// Write the block just opened at `start`. The tokenizer closes blocks at
/// end of input on its own, so a missing `close` is checked in the source.
fn write_block<'i>(
    parser: &mut Parser<'i, '_>,
    start: SourcePosition,
    close: char,
    out: &mut Writer,
) -> Result<(), ParseError<'i, Fault>> {
    parser.parse_nested_block(|block| write_tokens(block, out))?;
    if !parser.slice_from(start).ends_with(close) {
        return Err(parser.new_custom_error(Fault::Unbalanced));
    }
    out.close(close);
    Ok(())
}

fn is_wide_keyword(ident: &str) -> bool {
    WIDE_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(ident))
}

fn is_length_unit(unit: &str) -> bool {
    LENGTH_UNITS.iter().any(|u| u.eq_ignore_ascii_case(unit))
}

/// Source text of a quoted string ends with an unescaped copy of its
/// opening quote.
fn is_closed_string(text: &str) -> bool {
    let Some(quote) = text.chars().next() else {
        return false;
    };
    let Some(body) = text[quote.len_utf8()..].strip_suffix(quote) else {
        return false;
    };
    let escapes = body.chars().rev().take_while(|c| *c == '\\').count();
    escapes % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_comments() {
        assert_eq!(normalize_value("  1px   solid\n red ").unwrap(), "1px solid red");
        assert_eq!(normalize_value("rgba( 0 , 0 , 0 , .5 )").unwrap(), "rgba(0, 0, 0, 0.5)");
        assert_eq!(normalize_value("0 /* A */ 0").unwrap(), "0 0");
    }

    #[test]
    fn zero_lengths_drop_units() {
        assert_eq!(normalize_value("0px").unwrap(), "0");
        assert_eq!(normalize_value("0E0PX").unwrap(), "0");
        assert_eq!(normalize_value("-0.0em 10PX").unwrap(), "0 10px");
        assert_eq!(normalize_value("0s").unwrap(), "0s");
        assert_eq!(normalize_value("0%").unwrap(), "0%");
        assert_eq!(normalize_value("10px").unwrap(), "10px");
    }

    #[test]
    fn identifier_case_is_kept() {
        assert_eq!(normalize_value("FadeIn 2S").unwrap(), "FadeIn 2s");
        assert_eq!(normalize_value("MainArea").unwrap(), "MainArea");
        assert_eq!(normalize_value("Inherit").unwrap(), "inherit");
        assert_eq!(normalize_value("CALC(1px + 2PX)").unwrap(), "calc(1px + 2px)");
    }

    #[test]
    fn hex_colours_lowercase() {
        assert_eq!(normalize_value("#AbCdEf").unwrap(), "#abcdef");
    }

    #[test]
    fn strings_and_urls_are_preserved() {
        assert_eq!(
            normalize_value("\"Helvetica Neue\", Arial").unwrap(),
            "\"Helvetica Neue\", Arial"
        );
        assert_eq!(normalize_value("URL(Img/A.PNG)").unwrap(), "url(Img/A.PNG)");
        assert_eq!(normalize_value("url('X).png')").unwrap(), "url(\"X).png\")");
        assert_eq!(normalize_value("'a' \"a\"").unwrap(), "\"a\" \"a\"");
    }

    #[test]
    fn unbalanced_input_fails() {
        assert!(matches!(
            normalize_value("calc(1px + 2px"),
            Err(NormalizeError::Unbalanced(_))
        ));
        assert!(matches!(normalize_value("foo)"), Err(NormalizeError::Unbalanced(_))));
        assert!(matches!(
            normalize_value("'open"),
            Err(NormalizeError::UnterminatedString(_))
        ));
    }
}
