//! Rendered page snapshots and CSS3 selector querying.
//!
//! This crate provides the document side of styletrim:
//!
//! - **Tree**: an arena of elements captured from one rendered page
//! - **Selectors**: a CSS3 selector parser built on `cssparser`
//! - **Matching**: right-to-left matching with combinator backtracking
//! - **Query**: the [`SelectorQuery`] seam used by the optimizer
//!
//! # Example
//!
//! ```
//! use styletrim_dom::prelude::*;
//!
//! let mut tree = ElementTree::new();
//! let body = tree.append(tree.root(), Element::new("body"));
//! let nav = tree.append(body, Element::new("nav").with_class("top"));
//!
//! let hits = TreeQuery.select(&tree, "body > .top").unwrap();
//! assert_eq!(hits, vec![nav]);
//! ```

pub mod query;
pub mod selector;
pub mod tree;

mod error;

pub use error::{Result, SelectorError};
pub use query::{SelectorQuery, TreeQuery};
pub use tree::{Element, ElementTree, NodeId, NodeKind};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::query::{SelectorQuery, TreeQuery};
    pub use crate::selector::{
        Combinator, ComplexSelector, Compound, PseudoClass, SelectorMatcher, StatePseudo,
        parse_selector,
    };
    pub use crate::tree::{Element, ElementTree, NodeId};
    pub use crate::{Result, SelectorError};
}
