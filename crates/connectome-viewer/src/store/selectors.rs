//! Derived views over a snapshot, recomputed only when the slices they read change.

use connectome_core::{EdgeDefinition, NodeDefinition, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::snapshot::SceneSnapshot;

/// What the renderer may draw: revealed, known nodes and the revealed edges between them.
#[derive(Debug, Default)]
pub struct Renderable {
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
    pub index: HashMap<NodeId, usize>,
}

impl Renderable {
    pub fn node(&self, id: &NodeId) -> Option<&NodeDefinition> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }
}

struct Memo<K, V> {
    key: Option<K>,
    value: Arc<V>,
}

impl<K: PartialEq + Copy, V: Default> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            key: None,
            value: Arc::new(V::default()),
        }
    }
}

impl<K: PartialEq + Copy, V> Memo<K, V> {
    fn get(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if self.key != Some(key) {
            self.value = Arc::new(compute());
            self.key = Some(key);
        }
        self.value.clone()
    }
}

#[derive(Default)]
pub struct Selectors {
    renderable: Memo<(u64, u64), Renderable>,
    known: Memo<u64, HashMap<NodeId, NodeDefinition>>,
}

impl Selectors {
    pub fn renderable(&mut self, snap: &SceneSnapshot) -> Arc<Renderable> {
        let key = (snap.revisions.defs, snap.revisions.reveal);
        self.renderable.get(key, || select_renderable(snap))
    }

    /// Every known definition by id, revealed or not.
    pub fn known_nodes(&mut self, snap: &SceneSnapshot) -> Arc<HashMap<NodeId, NodeDefinition>> {
        self.known.get(snap.revisions.defs, || {
            snap.static_nodes
                .iter()
                .chain(snap.search_nodes.iter())
                .map(|n| (n.node_id.clone(), n.clone()))
                .collect()
        })
    }
}

pub fn select_renderable(snap: &SceneSnapshot) -> Renderable {
    let mut out = Renderable::default();
    for node in snap.static_nodes.iter().chain(snap.search_nodes.iter()) {
        if !snap.revealed.node_ids.contains(&node.node_id) || out.index.contains_key(&node.node_id) {
            continue;
        }
        out.index.insert(node.node_id.clone(), out.nodes.len());
        out.nodes.push(node.clone());
    }
    out.edges = snap
        .static_edges
        .iter()
        .chain(snap.search_edges.iter())
        .filter(|e| snap.revealed.edge_ids.contains(&e.edge_id))
        .filter(|e| out.index.contains_key(&e.from_node_id) && out.index.contains_key(&e.to_node_id))
        .cloned()
        .collect();
    out
}
