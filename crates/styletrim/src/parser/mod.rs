//! CSS source parsing into the style model.

mod css_parser;
mod normalize;
mod selector;

pub use css_parser::parse_stylesheet;
pub use normalize::{NormalizeError, normalize_value};
pub use selector::{SelectorInfo, analyse_selector};
