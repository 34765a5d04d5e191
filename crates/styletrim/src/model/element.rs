//! Element identity across snapshots.

use std::fmt;

use styletrim_dom::NodeId;

/// Identifier of one page snapshot, assigned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(pub u32);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Key of one concrete element in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementKey {
    pub snapshot: SnapshotId,
    pub node: NodeId,
}

impl ElementKey {
    pub fn new(snapshot: SnapshotId, node: NodeId) -> Self {
        Self { snapshot, node }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.snapshot, self.node)
    }
}

/// An element a selector matched, with its structural path from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchedElement {
    pub key: ElementKey,
    pub path: Vec<u32>,
}
