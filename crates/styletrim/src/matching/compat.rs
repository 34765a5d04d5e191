//! Whether an element can ever be in the state a pseudo-class names.

use styletrim_dom::Element;
use styletrim_dom::selector::StatePseudo;

const FORM_CONTROLS: &[&str] = &[
    "button", "input", "select", "textarea", "option", "optgroup", "fieldset",
];

/// Returns false when `element` can never enter `state`, so a structural
/// match of the selector does not count.
pub fn state_compatible(state: StatePseudo, element: &Element) -> bool {
    let tag = element.tag.as_str();
    match state {
        StatePseudo::Checked => {
            tag == "option"
                || (tag == "input"
                    && element.attr("type").is_some_and(|t| {
                        t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio")
                    }))
        }
        StatePseudo::Link | StatePseudo::Visited => {
            matches!(tag, "a" | "area") && element.has_attr("href")
        }
        StatePseudo::Focus | StatePseudo::Active | StatePseudo::FocusVisible => {
            is_interactive(element)
        }
        StatePseudo::Disabled | StatePseudo::Enabled => FORM_CONTROLS.contains(&tag),
        StatePseudo::Indeterminate => matches!(tag, "input" | "progress"),
        StatePseudo::Required
        | StatePseudo::Optional
        | StatePseudo::Valid
        | StatePseudo::Invalid => {
            matches!(tag, "input" | "select" | "textarea" | "form" | "fieldset")
        }
        StatePseudo::Target => element.id.is_some() || element.has_attr("name"),
        StatePseudo::Hover | StatePseudo::FocusWithin => true,
    }
}

fn is_interactive(element: &Element) -> bool {
    match element.tag.as_str() {
        "a" | "area" => element.has_attr("href"),
        "button" | "input" | "select" | "textarea" | "summary" | "iframe" => true,
        _ => element.has_attr("tabindex") || element.has_attr("contenteditable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_needs_checkable_input() {
        let checkbox = Element::new("input").with_attr("type", "checkbox");
        let text = Element::new("input").with_attr("type", "text");
        assert!(state_compatible(StatePseudo::Checked, &checkbox));
        assert!(!state_compatible(StatePseudo::Checked, &text));
        assert!(!state_compatible(StatePseudo::Checked, &Element::new("div")));
    }

    #[test]
    fn link_needs_href() {
        assert!(state_compatible(StatePseudo::Link, &Element::new("a").with_attr("href", "/")));
        assert!(!state_compatible(StatePseudo::Visited, &Element::new("a")));
    }

    #[test]
    fn focus_needs_interactive_element() {
        assert!(state_compatible(StatePseudo::Focus, &Element::new("button")));
        let focusable = Element::new("div").with_attr("tabindex", "0");
        assert!(state_compatible(StatePseudo::Focus, &focusable));
        assert!(!state_compatible(StatePseudo::Active, &Element::new("div")));
        assert!(state_compatible(StatePseudo::Hover, &Element::new("div")));
    }
}
