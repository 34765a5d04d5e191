//! Selectors: the unit of matching and cascade ranking.

use styletrim_dom::selector::{ComplexSelector, StatePseudo};

use super::{DeclId, MatchedElement, MediaList, RuleId, SheetId};
use crate::specificity::Specificity;

/// A single selector of a rule, with its own copy of the declaration block.
#[derive(Debug, Clone)]
pub struct Selector {
    /// Owning rule.
    pub rule: RuleId,
    /// Owning stylesheet.
    pub sheet: SheetId,
    /// Selector text as written (whitespace-trimmed).
    pub raw: String,
    /// Text used for querying: state pseudo-classes and pseudo-elements removed.
    pub filtered: String,
    /// Parsed form, when the text could be parsed.
    pub ast: Option<ComplexSelector>,
    pub specificity: Specificity,
    /// Excluded from analysis and always kept.
    pub ignored: bool,
    /// Right-most non-structural pseudo-class.
    pub key_pseudo_class: Option<StatePseudo>,
    /// Pseudo-element name, without colons.
    pub key_pseudo_element: Option<String>,
    /// Position within the rule's selector list.
    pub ordinal: u32,
    /// 1-based source line of the rule.
    pub line: u32,
    pub media: MediaList,
    pub matched: bool,
    /// Matched the synthetic document node.
    pub matched_document: bool,
    pub matches: Vec<MatchedElement>,
    pub declarations: Vec<DeclId>,
}

impl Selector {
    /// Returns true if the selector carries a non-structural pseudo-class.
    pub fn has_state_pseudo(&self) -> bool {
        self.key_pseudo_class.is_some()
    }

    /// Returns true if the selector targets a pseudo-element.
    pub fn has_pseudo_element(&self) -> bool {
        self.key_pseudo_element.is_some()
    }

    /// Declarations of this selector are never compared in the cascade.
    ///
    /// Holds for ignored selectors and for selectors whose only match was
    /// the document node.
    pub fn always_effective(&self) -> bool {
        self.ignored || (self.matched_document && self.matches.is_empty())
    }

    /// Same text, same specificity, new combinators.
    pub fn rewritten(&self, ast: ComplexSelector, raw: String) -> Selector {
        Selector {
            filtered: ast.filtered().to_string(),
            raw,
            ast: Some(ast),
            declarations: vec![],
            ..self.clone()
        }
    }
}
