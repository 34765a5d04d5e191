//! Rules: selector lists sharing a declaration block.

use super::{MediaList, SelectorId, SheetId};

/// A style rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub sheet: SheetId,
    /// 1-based source line.
    pub line: u32,
    pub selectors: Vec<SelectorId>,
    /// Media conditions of every enclosing `@media` block.
    pub media: MediaList,
}

impl Rule {
    pub fn new(sheet: SheetId, line: u32, media: MediaList) -> Self {
        Self {
            sheet,
            line,
            selectors: vec![],
            media,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}
