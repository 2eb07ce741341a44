use std::collections::{BTreeMap, HashMap};

use crate::{offset_transform, Affine, Offset, Point, SceneNode};

/// Per-node placement state: the baseline the renderer produced plus the
/// committed and in-progress offsets layered on top of it.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub baseline: Affine,
    pub center: Point,
    pub width: f32,
    pub height: f32,
    committed: Offset,
    live: Offset,
}

impl NodeEntry {
    pub fn committed(&self) -> Offset {
        self.committed
    }

    pub fn live(&self) -> Offset {
        self.live
    }

    /// Committed plus in-progress offset.
    pub fn current(&self) -> Offset {
        self.committed + self.live
    }

    /// Baseline composed with the current offset — the invariant for what
    /// the scene should display.
    pub fn displayed(&self) -> Affine {
        offset_transform(&self.baseline, self.current())
    }
}

/// Holds every node of the tracked scene, keyed by stable identifier.
///
/// Committed offsets persist only through the lifetime of one in-memory
/// scene; durability across renders is the position codec's job.
#[derive(Debug, Default)]
pub struct PositionStore {
    entries: HashMap<String, NodeEntry>,
    order: Vec<String>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node with offset (0,0). Re-registering an identifier
    /// replaces the previous entry.
    pub fn register(&mut self, node: &SceneNode) {
        if !self.entries.contains_key(&node.id) {
            self.order.push(node.id.clone());
        }
        self.entries.insert(
            node.id.clone(),
            NodeEntry {
                baseline: node.transform,
                center: node.center,
                width: node.width,
                height: node.height,
                committed: Offset::ZERO,
                live: Offset::ZERO,
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&NodeEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Updates the in-progress offset without touching the committed one.
    /// Returns false for unknown identifiers.
    pub fn apply_live_offset(&mut self, id: &str, offset: Offset) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.live = offset;
                true
            }
            None => false,
        }
    }

    /// Folds the live offset into the committed offset and resets the live
    /// offset to (0,0). Returns the new committed offset.
    pub fn commit(&mut self, id: &str) -> Offset {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.committed = entry.committed + entry.live;
                entry.live = Offset::ZERO;
                entry.committed
            }
            None => Offset::ZERO,
        }
    }

    /// Clears all entries; called before tracking a fresh render.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Entries in registration (scene) order.
    pub fn entries(&self) -> impl Iterator<Item = &NodeEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Snapshot of committed offsets keyed by identifier, for the codec.
    pub fn committed_offsets(&self) -> BTreeMap<String, Offset> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.committed))
            .collect()
    }
}
