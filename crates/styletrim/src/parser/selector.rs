//! Selector annotation: filtered text, ignore flag, keys and specificity.

use styletrim_dom::selector::{ComplexSelector, StatePseudo, parse_selector};
use tracing::debug;

use crate::specificity::Specificity;

/// Everything the model records about one selector's text.
#[derive(Debug, Clone)]
pub struct SelectorInfo {
    pub ast: Option<ComplexSelector>,
    pub filtered: String,
    pub ignored: bool,
    pub key_pseudo_class: Option<StatePseudo>,
    pub key_pseudo_element: Option<String>,
    pub specificity: Specificity,
}

/// Annotate one selector of a selector list.
///
/// Selectors the analysis cannot reason about (negation, state attributes,
/// unknown pseudo-classes or pseudo-elements, namespaces, unparseable text)
/// are marked ignored and kept as written.
pub fn analyse_selector(raw: &str) -> SelectorInfo {
    match parse_selector(raw) {
        Ok(ast) => {
            let pseudo_element = ast.pseudo_element();
            let ignored =
                ast.uses_unsupported_constructs() || pseudo_element.is_some_and(|p| !p.is_known());
            let filtered = ast.filtered().to_string();
            let specificity = Specificity::calculate(
                &filtered,
                ast.pseudo_class_count(),
                pseudo_element.is_some(),
            );
            SelectorInfo {
                filtered,
                ignored,
                key_pseudo_class: ast.key_state_pseudo(),
                key_pseudo_element: pseudo_element.map(|p| p.name.clone()),
                specificity,
                ast: Some(ast),
            }
        }
        Err(e) => {
            debug!(selector = raw, "selector ignored: {}", e);
            SelectorInfo {
                ast: None,
                filtered: raw.to_string(),
                ignored: true,
                key_pseudo_class: None,
                key_pseudo_element: None,
                specificity: Specificity::calculate(raw, 0, false),
            }
        }
    }
}
