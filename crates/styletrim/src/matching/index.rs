//! Global join table between elements and the selectors that matched them.

use std::collections::BTreeMap;

use crate::model::{ElementKey, SelectorId};

/// Element key → discovery order → matched selectors.
///
/// Append-only while snapshots are matched; read by the post-passes.
/// Iteration order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MatchIndex {
    entries: BTreeMap<ElementKey, BTreeMap<u32, Vec<SelectorId>>>,
    registrations: usize,
}

impl MatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `selector` for `element`. Returns false if the pair was
    /// already known.
    pub fn register(
        &mut self,
        element: ElementKey,
        discovery_order: u32,
        selector: SelectorId,
    ) -> bool {
        let bucket = self
            .entries
            .entry(element)
            .or_default()
            .entry(discovery_order)
            .or_default();
        if bucket.contains(&selector) {
            return false;
        }
        bucket.push(selector);
        self.registrations += 1;
        true
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of (element, selector) pairs.
    pub fn registrations(&self) -> usize {
        self.registrations
    }

    /// Indexed elements in key order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementKey> + '_ {
        self.entries.keys()
    }

    /// All selectors matched by `element`, by discovery order then
    /// registration order.
    pub fn selectors_for(&self, element: &ElementKey) -> Vec<SelectorId> {
        self.entries
            .get(element)
            .map(|by_order| by_order.values().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Point every registration of `old` at `new`.
    pub fn retarget(&mut self, old: SelectorId, new: SelectorId) {
        for bucket in self.entries.values_mut().flat_map(|m| m.values_mut()) {
            for slot in bucket.iter_mut().filter(|s| **s == old) {
                *slot = new;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotId;
    use slotmap::SlotMap;
    use styletrim_dom::NodeId;

    #[test]
    fn registration_is_deduplicated() {
        let mut keys: SlotMap<SelectorId, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());
        let el = ElementKey::new(SnapshotId(0), NodeId(3));

        let mut index = MatchIndex::new();
        assert!(index.register(el, 1, a));
        assert!(!index.register(el, 1, a));
        assert!(index.register(el, 0, b));

        assert_eq!(index.len(), 1);
        assert_eq!(index.registrations(), 2);
        assert_eq!(index.selectors_for(&el), vec![b, a]);

        index.retarget(a, b);
        assert_eq!(index.selectors_for(&el), vec![b, b]);
    }
}
