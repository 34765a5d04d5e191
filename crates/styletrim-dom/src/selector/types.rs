//! Selector type definitions.

use std::fmt;

/// A complex selector (e.g., `ul.menu > li a:hover::after`).
///
/// A selector consists of one or more compounds connected by combinators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComplexSelector {
    /// Compound selectors, left to right. The last one is the subject.
    pub compounds: Vec<Compound>,
    /// Combinators between compounds (length = compounds.len() - 1).
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    pub combinators: Vec<Combinator>,
}

impl ComplexSelector {
    /// Create a selector from a single compound.
    pub fn simple(compound: Compound) -> Self {
        Self {
            compounds: vec![compound],
            combinators: vec![],
        }
    }

    /// Create a simple type selector.
    pub fn type_selector(tag: impl Into<String>) -> Self {
        Self::simple(Compound::type_only(tag))
    }

    /// Append a compound joined by the given combinator.
    pub fn join(mut self, combinator: Combinator, compound: Compound) -> Self {
        if !self.compounds.is_empty() {
            self.combinators.push(combinator);
        }
        self.compounds.push(compound);
        self
    }

    /// Add a descendant compound.
    pub fn descendant(self, compound: Compound) -> Self {
        self.join(Combinator::Descendant, compound)
    }

    /// Add a child compound.
    pub fn child(self, compound: Compound) -> Self {
        self.join(Combinator::Child, compound)
    }

    /// Get the rightmost (subject) compound.
    pub fn subject(&self) -> Option<&Compound> {
        self.compounds.last()
    }

    /// Returns true if any combinator can be tightened
    /// (descendant or general sibling).
    pub fn has_loose_combinator(&self) -> bool {
        self.combinators.iter().any(|c| c.tightened().is_some())
    }

    /// Total number of pseudo-classes across all compounds.
    pub fn pseudo_class_count(&self) -> u32 {
        self.compounds
            .iter()
            .map(|c| c.pseudo_classes.len() as u32)
            .sum()
    }

    /// The pseudo-element of the right-most compound carrying one.
    pub fn pseudo_element(&self) -> Option<&PseudoElement> {
        self.compounds
            .iter()
            .rev()
            .find_map(|c| c.pseudo_element.as_ref())
    }

    /// The last state (non-structural) pseudo-class, scanning from the right.
    pub fn key_state_pseudo(&self) -> Option<StatePseudo> {
        self.compounds.iter().rev().find_map(|c| {
            c.pseudo_classes.iter().rev().find_map(|p| match p {
                PseudoClass::State(s) => Some(*s),
                _ => None,
            })
        })
    }

    /// The last state pseudo-class of the subject compound itself.
    pub fn subject_state_pseudo(&self) -> Option<StatePseudo> {
        self.subject()?.pseudo_classes.iter().rev().find_map(|p| match p {
            PseudoClass::State(s) => Some(*s),
            _ => None,
        })
    }

    /// Returns true if the selector uses constructs a static analysis cannot
    /// reason about (negation, unknown pseudo-classes, dynamic-state
    /// attributes).
    pub fn uses_unsupported_constructs(&self) -> bool {
        self.compounds.iter().any(|c| {
            c.pseudo_classes
                .iter()
                .any(|p| matches!(p, PseudoClass::Not(_) | PseudoClass::Unknown(_)))
                || c.attributes.iter().any(AttrSelector::is_state_attribute)
        })
    }

    /// Copy of this selector suitable for querying a static tree: state
    /// pseudo-classes and pseudo-elements are removed, and compounds left
    /// empty become `*`.
    pub fn filtered(&self) -> ComplexSelector {
        let compounds = self
            .compounds
            .iter()
            .map(|c| {
                let mut c = c.clone();
                c.pseudo_classes
                    .retain(|p| !matches!(p, PseudoClass::State(_)));
                c.pseudo_element = None;
                if c.is_empty() {
                    c.type_selector = Some(TypeSelector::Universal);
                }
                c
            })
            .collect();
        ComplexSelector {
            compounds,
            combinators: self.combinators.clone(),
        }
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.compounds.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.combinators[i - 1])?;
            }
            write!(f, "{}", compound)?;
        }
        Ok(())
    }
}

/// A compound selector (e.g., `input.large[type=text]:focus`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Compound {
    /// Type selector (tag name or universal).
    pub type_selector: Option<TypeSelector>,
    /// ID selector (#id).
    pub id: Option<String>,
    /// Class selectors (.class).
    pub classes: Vec<String>,
    /// Attribute selectors ([attr=value]).
    pub attributes: Vec<AttrSelector>,
    /// Pseudo-class selectors (:hover, :first-child, ...).
    pub pseudo_classes: Vec<PseudoClass>,
    /// Trailing pseudo-element (::before, :after, ...).
    pub pseudo_element: Option<PseudoElement>,
}

impl Compound {
    /// Create a new empty compound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a type-only compound.
    pub fn type_only(tag: impl Into<String>) -> Self {
        Self {
            type_selector: Some(TypeSelector::Type(tag.into())),
            ..Default::default()
        }
    }

    /// Create a class-only compound.
    pub fn class_only(class: impl Into<String>) -> Self {
        Self {
            classes: vec![class.into()],
            ..Default::default()
        }
    }

    /// Add a class selector.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add a pseudo-class selector.
    pub fn with_pseudo(mut self, pseudo: PseudoClass) -> Self {
        self.pseudo_classes.push(pseudo);
        self
    }

    /// Add an attribute selector.
    pub fn with_attr(mut self, attr: AttrSelector) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Returns true if the compound has no constraints at all.
    pub fn is_empty(&self) -> bool {
        self.type_selector.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty()
            && self.pseudo_element.is_none()
    }

    /// Returns true if this compound matches anything (`*` or nothing at all).
    pub fn is_universal_only(&self) -> bool {
        matches!(self.type_selector, None | Some(TypeSelector::Universal))
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self
                .pseudo_classes
                .iter()
                .all(|p| matches!(p, PseudoClass::State(_)))
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_selector {
            Some(TypeSelector::Universal) => write!(f, "*")?,
            Some(TypeSelector::Type(t)) => write!(f, "{}", t)?,
            None => {}
        }

        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }

        for class in &self.classes {
            write!(f, ".{}", class)?;
        }

        for attr in &self.attributes {
            write!(f, "{}", attr)?;
        }

        for pseudo in &self.pseudo_classes {
            write!(f, ":{}", pseudo)?;
        }

        if let Some(element) = &self.pseudo_element {
            write!(f, "{}", element)?;
        }

        Ok(())
    }
}

/// Type selector - matches the element's tag name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSelector {
    /// Universal selector (*) - matches any element.
    Universal,
    /// Tag name (lowercase).
    Type(String),
}

/// Combinator between compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Descendant combinator (space): matches any descendant.
    Descendant,
    /// Child combinator (>): matches direct child only.
    Child,
    /// Adjacent sibling (+): matches immediately following sibling.
    AdjacentSibling,
    /// General sibling (~): matches any following sibling.
    GeneralSibling,
}

impl Combinator {
    /// The stricter combinator this one can be rewritten to, if any.
    pub fn tightened(self) -> Option<Combinator> {
        match self {
            Combinator::Descendant => Some(Combinator::Child),
            Combinator::GeneralSibling => Some(Combinator::AdjacentSibling),
            Combinator::Child | Combinator::AdjacentSibling => None,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Descendant => write!(f, " "),
            Combinator::Child => write!(f, " > "),
            Combinator::AdjacentSibling => write!(f, " + "),
            Combinator::GeneralSibling => write!(f, " ~ "),
        }
    }
}

/// Attribute selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOperator {
    /// `[attr]`
    Exists,
    /// `[attr=value]`
    Equals,
    /// `[attr~=value]`
    Includes,
    /// `[attr|=value]`
    DashMatch,
    /// `[attr^=value]`
    Prefix,
    /// `[attr$=value]`
    Suffix,
    /// `[attr*=value]`
    Substring,
}

impl AttrOperator {
    fn symbol(self) -> &'static str {
        match self {
            AttrOperator::Exists => "",
            AttrOperator::Equals => "=",
            AttrOperator::Includes => "~=",
            AttrOperator::DashMatch => "|=",
            AttrOperator::Prefix => "^=",
            AttrOperator::Suffix => "$=",
            AttrOperator::Substring => "*=",
        }
    }
}

/// An attribute selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrSelector {
    /// Lowercase attribute name.
    pub name: String,
    /// Comparison operator.
    pub operator: AttrOperator,
    /// Comparison value (`None` for [`AttrOperator::Exists`]).
    pub value: Option<String>,
    /// `i` flag.
    pub case_insensitive: bool,
}

/// Attributes that mirror interactive state rather than markup.
const STATE_ATTRIBUTES: &[&str] = &["disabled", "checked", "selected"];

impl AttrSelector {
    /// Create an `[attr]` selector.
    pub fn exists(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: AttrOperator::Exists,
            value: None,
            case_insensitive: false,
        }
    }

    /// Create an `[attr=value]`-style selector.
    pub fn with_value(
        name: impl Into<String>,
        operator: AttrOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            operator,
            value: Some(value.into()),
            case_insensitive: false,
        }
    }

    /// Returns true for attributes the page toggles at runtime.
    pub fn is_state_attribute(&self) -> bool {
        STATE_ATTRIBUTES.contains(&self.name.as_str())
    }

    /// Test an attribute value against this selector.
    pub fn matches_value(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some(expected) = self.value.as_deref() else {
            return true;
        };

        let (actual, expected) = if self.case_insensitive {
            (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
        } else {
            (actual.to_string(), expected.to_string())
        };

        match self.operator {
            AttrOperator::Exists => true,
            AttrOperator::Equals => actual == expected,
            AttrOperator::Includes => actual.split_ascii_whitespace().any(|w| w == expected),
            AttrOperator::DashMatch => {
                actual == expected || actual.starts_with(&format!("{}-", expected))
            }
            AttrOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOperator::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

impl fmt::Display for AttrSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.name)?;
        if let Some(value) = &self.value {
            write!(f, "{}\"{}\"", self.operator.symbol(), value.replace('"', "\\\""))?;
            if self.case_insensitive {
                write!(f, " i")?;
            }
        }
        write!(f, "]")
    }
}

/// Pseudo-classes that depend on user interaction or document state and
/// cannot be observed in a static snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatePseudo {
    Link,
    Visited,
    Hover,
    Active,
    Focus,
    FocusWithin,
    FocusVisible,
    Checked,
    Disabled,
    Enabled,
    Target,
    Indeterminate,
    Required,
    Optional,
    Valid,
    Invalid,
}

impl StatePseudo {
    /// Parse a state pseudo-class name.
    pub fn from_css(name: &str) -> Option<Self> {
        let pseudo = match name {
            "link" => Self::Link,
            "visited" => Self::Visited,
            "hover" => Self::Hover,
            "active" => Self::Active,
            "focus" => Self::Focus,
            "focus-within" => Self::FocusWithin,
            "focus-visible" => Self::FocusVisible,
            "checked" => Self::Checked,
            "disabled" => Self::Disabled,
            "enabled" => Self::Enabled,
            "target" => Self::Target,
            "indeterminate" => Self::Indeterminate,
            "required" => Self::Required,
            "optional" => Self::Optional,
            "valid" => Self::Valid,
            "invalid" => Self::Invalid,
            _ => return None,
        };
        Some(pseudo)
    }

    /// CSS name without the leading colon.
    pub fn name(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Visited => "visited",
            Self::Hover => "hover",
            Self::Active => "active",
            Self::Focus => "focus",
            Self::FocusWithin => "focus-within",
            Self::FocusVisible => "focus-visible",
            Self::Checked => "checked",
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
            Self::Target => "target",
            Self::Indeterminate => "indeterminate",
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for StatePseudo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pseudo-class selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    /// :first-child
    FirstChild,
    /// :last-child
    LastChild,
    /// :only-child
    OnlyChild,
    /// :first-of-type
    FirstOfType,
    /// :last-of-type
    LastOfType,
    /// :only-of-type
    OnlyOfType,
    /// :nth-child(An+B)
    NthChild(NthExpr),
    /// :nth-last-child(An+B)
    NthLastChild(NthExpr),
    /// :nth-of-type(An+B)
    NthOfType(NthExpr),
    /// :nth-last-of-type(An+B)
    NthLastOfType(NthExpr),
    /// :empty - has no children.
    Empty,
    /// :root - the document element.
    Root,
    /// :not(compound) - negation.
    Not(Box<Compound>),
    /// Interaction or document state (:hover, :checked, ...).
    State(StatePseudo),
    /// Anything else, kept verbatim (without the colon).
    Unknown(String),
}

impl PseudoClass {
    /// Parse a non-functional pseudo-class name.
    pub fn from_css(name: &str) -> Self {
        match name {
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "only-child" => Self::OnlyChild,
            "first-of-type" => Self::FirstOfType,
            "last-of-type" => Self::LastOfType,
            "only-of-type" => Self::OnlyOfType,
            "empty" => Self::Empty,
            "root" => Self::Root,
            other => match StatePseudo::from_css(other) {
                Some(state) => Self::State(state),
                None => Self::Unknown(other.to_string()),
            },
        }
    }

    /// Returns true for pseudo-classes decided purely by tree structure.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::State(_) | Self::Not(_) | Self::Unknown(_))
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PseudoClass::FirstChild => write!(f, "first-child"),
            PseudoClass::LastChild => write!(f, "last-child"),
            PseudoClass::OnlyChild => write!(f, "only-child"),
            PseudoClass::FirstOfType => write!(f, "first-of-type"),
            PseudoClass::LastOfType => write!(f, "last-of-type"),
            PseudoClass::OnlyOfType => write!(f, "only-of-type"),
            PseudoClass::NthChild(expr) => write!(f, "nth-child({})", expr),
            PseudoClass::NthLastChild(expr) => write!(f, "nth-last-child({})", expr),
            PseudoClass::NthOfType(expr) => write!(f, "nth-of-type({})", expr),
            PseudoClass::NthLastOfType(expr) => write!(f, "nth-last-of-type({})", expr),
            PseudoClass::Empty => write!(f, "empty"),
            PseudoClass::Root => write!(f, "root"),
            PseudoClass::Not(inner) => write!(f, "not({})", inner),
            PseudoClass::State(state) => write!(f, "{}", state),
            PseudoClass::Unknown(text) => write!(f, "{}", text),
        }
    }
}

/// Pseudo-element (::before, ::-webkit-scrollbar, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PseudoElement {
    /// Lowercase name without colons.
    pub name: String,
    /// Written with a single colon (`:before`).
    pub legacy: bool,
}

/// Pseudo-elements that CSS2 allowed with a single colon.
pub const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

/// Standard pseudo-elements besides the legacy ones.
const STANDARD_PSEUDO_ELEMENTS: &[&str] = &[
    "selection",
    "placeholder",
    "marker",
    "backdrop",
    "file-selector-button",
    "cue",
];

impl PseudoElement {
    /// Create a pseudo-element.
    pub fn new(name: impl Into<String>, legacy: bool) -> Self {
        Self {
            name: name.into(),
            legacy,
        }
    }

    /// Returns true for standard and vendor-prefixed pseudo-elements.
    pub fn is_known(&self) -> bool {
        let name = self.name.as_str();
        LEGACY_PSEUDO_ELEMENTS.contains(&name)
            || STANDARD_PSEUDO_ELEMENTS.contains(&name)
            || name.starts_with("-webkit-")
            || name.starts_with("-moz-")
            || name.starts_with("-ms-")
    }
}

impl fmt::Display for PseudoElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.legacy {
            write!(f, ":{}", self.name)
        } else {
            write!(f, "::{}", self.name)
        }
    }
}

/// Expression for :nth-child (An+B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NthExpr {
    /// Coefficient (A in An+B).
    pub a: i32,
    /// Offset (B in An+B).
    pub b: i32,
}

impl NthExpr {
    /// Create a new nth expression.
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Check if a 0-indexed position matches this expression.
    pub fn matches(&self, index: usize) -> bool {
        let n = index as i32 + 1; // Convert to 1-indexed
        if self.a == 0 {
            n == self.b
        } else {
            let diff = n - self.b;
            if self.a > 0 {
                diff >= 0 && diff % self.a == 0
            } else {
                diff <= 0 && diff % self.a == 0
            }
        }
    }
}

impl fmt::Display for NthExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.a, self.b) {
            (2, 1) => write!(f, "odd"),
            (2, 0) => write!(f, "even"),
            (0, b) => write!(f, "{}", b),
            (1, 0) => write!(f, "n"),
            (a, 0) => write!(f, "{}n", a),
            (1, b) if b > 0 => write!(f, "n+{}", b),
            (1, b) => write!(f, "n{}", b),
            (a, b) if b > 0 => write!(f, "{}n+{}", a, b),
            (a, b) => write!(f, "{}n{}", a, b),
        }
    }
}
