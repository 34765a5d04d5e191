//! Declarations and their cascade state.

use std::fmt;

use super::SelectorId;
use crate::context::Generation;

/// Vendor prefix carried by a property name or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorPrefix {
    Webkit,
    Moz,
    Ms,
    O,
}

impl VendorPrefix {
    /// The prefix `text` starts with, if any.
    pub fn detect(text: &str) -> Option<Self> {
        if text.starts_with("-webkit-") {
            Some(Self::Webkit)
        } else if text.starts_with("-moz-") {
            Some(Self::Moz)
        } else if text.starts_with("-ms-") {
            Some(Self::Ms)
        } else if text.starts_with("-o-") {
            Some(Self::O)
        } else {
            None
        }
    }

    /// The literal prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webkit => "-webkit-",
            Self::Moz => "-moz-",
            Self::Ms => "-ms-",
            Self::O => "-o-",
        }
    }
}

/// Processing mark that keeps the cascade from revisiting a declaration
/// within one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclStatus {
    #[default]
    Pending,
    /// Overridden while resolving the element of this generation.
    Overridden(Generation),
}

/// One `name: value` pair owned by a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Owning selector.
    pub selector: SelectorId,
    /// Lowercase property name.
    pub name: String,
    /// Value as written, without `!important`.
    pub raw_value: String,
    /// Normalized value used for comparisons.
    pub value: String,
    pub important: bool,
    /// Set by cascade resolution.
    pub effective: bool,
    pub status: DeclStatus,
    /// Removed as a no-op reset.
    pub invalid_undo: bool,
    pub vendor: Option<VendorPrefix>,
    /// Position inside the original declaration block.
    pub position: u32,
}

impl Declaration {
    /// Create a declaration for `selector`; the vendor marker is derived
    /// from the name and value.
    pub fn new(
        selector: SelectorId,
        name: impl Into<String>,
        raw_value: impl Into<String>,
        value: impl Into<String>,
        important: bool,
        position: u32,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        let vendor = VendorPrefix::detect(&name).or_else(|| VendorPrefix::detect(&value));
        Self {
            selector,
            name,
            raw_value: raw_value.into(),
            value,
            important,
            effective: false,
            status: DeclStatus::Pending,
            invalid_undo: false,
            vendor,
            position,
        }
    }

    /// The (name, value, importance) triple that identifies clones.
    pub fn template(&self) -> DeclTemplate {
        DeclTemplate {
            name: self.name.clone(),
            value: self.value.clone(),
            important: self.important,
        }
    }
}

/// Prints the value as written; the normalized form only serves as a
/// comparison key.
impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.raw_value)?;
        if self.important {
            write!(f, " !important")?;
        }
        Ok(())
    }
}

/// Content of a declaration without its owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclTemplate {
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl fmt::Display for DeclTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)?;
        if self.important {
            write!(f, " !important")?;
        }
        Ok(())
    }
}
