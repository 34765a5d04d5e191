//! Whether two selectors matching the same element can override each other.

use crate::model::{Declaration, Selector};

/// How declarations of a less specific selector are compared against the
/// current one. Variants are ordered from loosest to strictest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Gate {
    /// Same property name conflicts.
    ByName,
    /// Same property name and same value conflicts.
    ByValue,
    /// The selectors never interact.
    Skip,
}

impl Gate {
    /// Gate between the `current` (more specific) selector and a `next`
    /// (less specific) one.
    pub fn between(current: &Selector, next: &Selector) -> Gate {
        let media = match (current.media.is_empty(), next.media.is_empty()) {
            (true, true) => Gate::ByName,
            (true, false) => Gate::ByValue,
            (false, true) => Gate::Skip,
            (false, false) if current.media.equivalent(&next.media) => Gate::ByName,
            (false, false) => Gate::Skip,
        };

        let pseudo_element = if (current.has_pseudo_element() || next.has_pseudo_element())
            && current.key_pseudo_element != next.key_pseudo_element
        {
            Gate::Skip
        } else {
            Gate::ByName
        };

        let pseudo_class = if (current.has_state_pseudo() || next.has_state_pseudo())
            && current.key_pseudo_class != next.key_pseudo_class
        {
            Gate::ByValue
        } else {
            Gate::ByName
        };

        media.max(pseudo_element).max(pseudo_class)
    }

    /// Returns true if `next` conflicts with a declaration `name: value`.
    pub fn conflicts(self, name: &str, value: &str, next: &Declaration) -> bool {
        match self {
            Gate::ByName => next.name == name,
            Gate::ByValue => next.name == name && next.value == value,
            Gate::Skip => false,
        }
    }
}
