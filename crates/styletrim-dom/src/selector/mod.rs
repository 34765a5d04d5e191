//! Selector types, parsing and matching.

mod matcher;
mod parser;
mod types;

pub use matcher::SelectorMatcher;
pub use parser::{parse_selector, split_selector_list};
pub use types::*;
