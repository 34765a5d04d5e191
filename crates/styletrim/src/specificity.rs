//! Selector specificity as a single ordinal score.

use std::fmt;

use cssparser::{Parser, ParserInput, Token};
use styletrim_dom::selector::parse_selector;

use crate::Result;

/// Weight of one ID selector.
pub const ID_WEIGHT: u32 = 10_000;
/// Weight of one class, attribute, or pseudo-class selector.
pub const CLASS_WEIGHT: u32 = 100;
/// Weight of one type selector or pseudo-element.
pub const TYPE_WEIGHT: u32 = 1;

/// Specificity folded into one integer.
///
/// Each band is wide enough that a higher band always dominates realistic
/// counts in the lower ones: `#x` (10000) > `.a.b.c` (300) > `div span a` (3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32);

impl Specificity {
    /// Zero specificity (universal selector).
    pub const ZERO: Self = Self(0);

    /// Score selector text.
    ///
    /// IDs, classes, attribute selectors, and type selectors are counted from
    /// `text`. Pseudo-classes (including structural ones still present in the
    /// text) are skipped while scanning and counted through `pseudo_classes`
    /// instead. Scanning stops at the first token that cannot appear in a
    /// selector, leaving the remainder unscored.
    pub fn calculate(text: &str, pseudo_classes: u32, has_pseudo_element: bool) -> Self {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        let mut score = 0u32;
        let mut after_colon = false;

        while let Ok(token) = parser.next().cloned() {
            if after_colon {
                // Pseudo name or function; `::` keeps the flag set.
                after_colon = matches!(token, Token::Colon);
                continue;
            }
            match token {
                Token::IDHash(_) => score += ID_WEIGHT,
                Token::Delim('.') => {
                    if matches!(parser.next_including_whitespace(), Ok(Token::Ident(_))) {
                        score += CLASS_WEIGHT;
                    } else {
                        break;
                    }
                }
                Token::SquareBracketBlock => score += CLASS_WEIGHT,
                Token::Ident(_) => score += TYPE_WEIGHT,
                Token::Colon => after_colon = true,
                Token::Delim('*' | '>' | '+' | '~' | '|') | Token::Comma => {}
                _ => break,
            }
        }

        score += pseudo_classes * CLASS_WEIGHT;
        if has_pseudo_element {
            score += TYPE_WEIGHT;
        }
        Self(score)
    }

    /// Score a single selector, rejecting text that does not parse.
    ///
    /// ```
    /// use styletrim::specificity::Specificity;
    ///
    /// assert_eq!(Specificity::of("ul li.active::before").unwrap(), Specificity(103));
    /// assert!(Specificity::of("p >").is_err());
    /// ```
    pub fn of(selector: &str) -> Result<Self> {
        let ast = parse_selector(selector)?;
        Ok(Self::calculate(
            &ast.filtered().to_string(),
            ast.pseudo_class_count(),
            ast.pseudo_element().is_some(),
        ))
    }

    /// Get the ID selector count.
    pub fn ids(&self) -> u32 {
        self.0 / ID_WEIGHT
    }

    /// Get the class/attribute/pseudo-class count.
    pub fn classes(&self) -> u32 {
        (self.0 % ID_WEIGHT) / CLASS_WEIGHT
    }

    /// Get the type/pseudo-element count.
    pub fn types(&self) -> u32 {
        self.0 % CLASS_WEIGHT
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str) -> u32 {
        Specificity::calculate(text, 0, false).0
    }

    #[test]
    fn bands() {
        assert_eq!(score("#x"), 10_000);
        assert_eq!(score(".a.b.c"), 300);
        assert_eq!(score("div span a"), 3);
        assert_eq!(score("*"), 0);
        assert_eq!(score("a[href]"), 101);
        assert_eq!(score("ul > li + li ~ li"), 4);
    }

    #[test]
    fn id_beats_any_class_count() {
        let id = Specificity::calculate("#x", 0, false);
        let classes = Specificity::calculate(".a.b.c.d.e.f.g.h.i div div", 2, true);
        assert!(id > classes);
    }

    #[test]
    fn pseudo_counts_are_added() {
        let s = Specificity::calculate("li:first-child", 2, true);
        assert_eq!(s.0, 1 + 200 + 1);
        assert_eq!(s.classes(), 2);
        assert_eq!(s.types(), 2);
    }

    #[test]
    fn pseudo_names_are_not_types() {
        assert_eq!(score("a:hover"), 1);
        assert_eq!(score("p::before"), 1);
        assert_eq!(score("li:nth-child(2n+1)"), 1);
    }

    #[test]
    fn unparseable_selector_is_an_error() {
        let err = Specificity::of("p >").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidSelector { .. }));
        assert_eq!(Specificity::of("#a:hover").unwrap(), Specificity(10_100));
    }

    #[test]
    fn malformed_remainder_is_unscored() {
        assert_eq!(score("#a . b"), 10_000);
        assert_eq!(score(".a { .b"), 100);
    }
}
