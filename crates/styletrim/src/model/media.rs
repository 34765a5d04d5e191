//! Media query conditions attached to rules.

use std::fmt;

/// One media query (`screen and (min-width: 600px)`).
///
/// Conditions are opaque: the optimizer never evaluates them, it only
/// compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MediaQuery {
    /// Media type with its `only`/`not` prefix, if present.
    pub media_type: Option<String>,
    /// Feature expressions, whitespace-collapsed and lowercased.
    pub features: Vec<String>,
}

impl MediaQuery {
    /// Parse a single query. Unknown syntax is kept as an opaque feature.
    pub fn parse(text: &str) -> Self {
        let mut query = Self::default();
        let collapsed = collapse(text);
        for (i, part) in split_and(&collapsed).into_iter().enumerate() {
            if i == 0 && !part.starts_with('(') {
                query.media_type = Some(part);
            } else {
                query.features.push(part);
            }
        }
        query
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(media_type) = &self.media_type {
            write!(f, "{}", media_type)?;
            first = false;
        }
        for feature in &self.features {
            if !first {
                write!(f, " and ")?;
            }
            write!(f, "{}", feature)?;
            first = false;
        }
        Ok(())
    }
}

/// The media conditions a rule is scoped to. Empty means unconditional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MediaList(pub Vec<MediaQuery>);

impl MediaList {
    /// Parse a comma-separated media query list.
    pub fn parse(text: &str) -> Self {
        Self(
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(MediaQuery::parse)
                .collect(),
        )
    }

    /// Returns true if the list places no restriction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `query` appears in the list.
    pub fn contains(&self, query: &MediaQuery) -> bool {
        self.0.contains(query)
    }

    /// Equality by mutual containment, ignoring order and repeats.
    pub fn equivalent(&self, other: &MediaList) -> bool {
        self.0.iter().all(|q| other.contains(q)) && other.0.iter().all(|q| self.contains(q))
    }

    /// This list followed by the queries of a nested block.
    pub fn nested(&self, inner: &MediaList) -> MediaList {
        let mut queries = self.0.clone();
        queries.extend(inner.0.iter().filter(|q| !self.contains(q)).cloned());
        MediaList(queries)
    }
}

impl fmt::Display for MediaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, query) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", query)?;
        }
        Ok(())
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Split at top-level ` and ` keywords.
fn split_and(text: &str) -> Vec<String> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b' ' if depth == 0 && text[i..].starts_with(" and ") => {
                parts.push(text[start..i].to_string());
                i += 5;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_type_and_features() {
        let q = MediaQuery::parse("Screen  and (min-width:600px) and (orientation: landscape)");
        assert_eq!(q.media_type.as_deref(), Some("screen"));
        assert_eq!(q.features, vec!["(min-width:600px)", "(orientation: landscape)"]);
        assert_eq!(q.to_string(), "screen and (min-width:600px) and (orientation: landscape)");
    }

    #[test]
    fn feature_only_query() {
        let q = MediaQuery::parse("(max-width: 10em)");
        assert_eq!(q.media_type, None);
        assert_eq!(q.features.len(), 1);
    }

    #[test]
    fn equivalence_is_mutual_containment() {
        let a = MediaList::parse("print, screen");
        let b = MediaList::parse("screen,print");
        let c = MediaList::parse("screen");
        assert!(a.equivalent(&b));
        assert!(!a.equivalent(&c));
        assert!(!c.equivalent(&a));
        assert!(MediaList::default().equivalent(&MediaList::parse("")));
    }

    #[test]
    fn nested_lists_concatenate() {
        let outer = MediaList::parse("screen");
        let inner = MediaList::parse("(min-width: 1px), screen");
        assert_eq!(outer.nested(&inner).0.len(), 2);
    }
}
