pub mod actions;
pub mod adapt;
pub mod manifest;
pub mod selectors;
pub mod snapshot;

use bevy::prelude::Resource;
use connectome_core::{HealthSnapshot, NodeDefinition, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

pub use actions::{reduce, SceneAction};
pub use selectors::Renderable;
pub use snapshot::{ActiveFocus, RevealedSet, SceneSnapshot, StatusMessage, TelemetryStatus};

/// Single owner of the scene snapshot.
///
/// Every mutation goes through [`SceneStore::dispatch`], which runs on the main schedule
/// only, so actions from telemetry, fetches and user input are applied one at a time in
/// the order they were committed.
#[derive(Resource, Default)]
pub struct SceneStore {
    snapshot: SceneSnapshot,
    selectors: selectors::Selectors,
    dispatched: u64,
}

impl SceneStore {
    pub fn new(snapshot: SceneSnapshot) -> Self {
        Self {
            snapshot,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> &SceneSnapshot {
        &self.snapshot
    }

    pub fn dispatch(&mut self, action: SceneAction) {
        tracing::trace!(action = action.name(), "dispatch");
        let prev = std::mem::take(&mut self.snapshot);
        self.snapshot = reduce(prev, action);
        self.dispatched += 1;
    }

    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = SceneAction>) {
        for action in actions {
            self.dispatch(action);
        }
    }

    /// Count of applied actions, for change detection by consumers outside the store.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn renderable(&mut self) -> Arc<Renderable> {
        self.selectors.renderable(&self.snapshot)
    }

    pub fn known_nodes(&mut self) -> Arc<HashMap<NodeId, NodeDefinition>> {
        self.selectors.known_nodes(&self.snapshot)
    }

    pub fn health(&self) -> Option<&HealthSnapshot> {
        self.snapshot.health.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectome_core::{
        CallType, EdgeId, FlowEvent, GraphPayload, LinkRecord, Manifest, NodeRecord, PlaybackMode,
        SearchResult, TriggerKind,
    };

    fn graph_ab() -> SearchResult {
        GraphPayload {
            nodes: vec![
                NodeRecord {
                    id: Some("a".into()),
                    ..Default::default()
                },
                NodeRecord {
                    id: Some("b".into()),
                    ..Default::default()
                },
            ],
            links: vec![LinkRecord {
                from_id: Some("a".into()),
                to_id: Some("b".into()),
                kind: Some("LINK".into()),
            }],
        }
        .into_search_result()
    }

    fn store_on(graph: &str) -> SceneStore {
        let mut store = SceneStore::default();
        store.dispatch(SceneAction::SetStaticManifest {
            manifest: Manifest::default(),
            reveal: true,
        });
        store.dispatch(SceneAction::SetGraphName(graph.to_string()));
        store
    }

    fn commit(store: &mut SceneStore, graph: &str, result: SearchResult) {
        store.dispatch(SceneAction::CommitGraphResult {
            graph_name: graph.to_string(),
            result,
            status: StatusMessage::info("Loaded"),
        });
    }

    fn flow(id: &str, from: &str, to: &str) -> FlowEvent {
        FlowEvent {
            id: id.to_string(),
            at_ms: 0.0,
            from_node_id: NodeId::new(from),
            to_node_id: NodeId::new(to),
            trigger: TriggerKind::Direct,
            call_type: CallType::GraphLink,
            label: "LINK".to_string(),
            duration_ms: None,
            energy_delta: None,
            payload_summary: None,
            notes: None,
        }
    }

    #[test]
    fn loaded_graph_renders_two_nodes_and_one_link() {
        let mut store = store_on("seed");
        commit(&mut store, "seed", graph_ab());

        let r = store.renderable();
        assert_eq!(r.nodes.len(), 2);
        assert_eq!(r.edges.len(), 1);
        assert_eq!(r.edges[0].label, "LINK");
    }

    #[test]
    fn stale_graph_result_is_dropped() {
        let mut store = store_on("seed");
        store.dispatch(SceneAction::SetGraphName("other".into()));
        commit(&mut store, "seed", graph_ab());
        assert!(store.snapshot().search_results.is_none());
        assert_eq!(store.renderable().nodes.len(), 0);
    }

    #[test]
    fn revealing_unknown_ids_changes_nothing_rendered() {
        let mut store = store_on("seed");
        commit(&mut store, "seed", graph_ab());
        let before = store.renderable().nodes.len();

        store.dispatch(SceneAction::RevealNodeAndEdgeIds {
            node_ids: vec![NodeId::new("ghost")],
            edge_ids: vec![EdgeId::new("ghost-edge")],
        });
        assert_eq!(store.renderable().nodes.len(), before);
        assert_eq!(store.renderable().edges.len(), 1);
    }

    #[test]
    fn dangling_edges_are_not_renderable() {
        let mut store = store_on("seed");
        let mut result = graph_ab();
        result.links.push(LinkRecord {
            from_id: Some("a".into()),
            to_id: Some("missing".into()),
            kind: None,
        });
        commit(&mut store, "seed", result);

        let r = store.renderable();
        assert_eq!(store.snapshot().search_edges.len(), 2);
        assert_eq!(r.edges.len(), 1);
    }

    #[test]
    fn health_ticks_replace_wholesale() {
        let mut store = SceneStore::default();
        let ok = HealthSnapshot::parse(
            r#"{"status": {"state": "OK", "score": 0.9, "notes": ["steady"]}, "runner": {"tick": 4}}"#,
        )
        .expect("ok tick");
        let warn = HealthSnapshot::parse(r#"{"status": {"state": "WARN"}}"#).expect("warn tick");

        store.dispatch(SceneAction::SetConnectomeHealth(ok));
        store.dispatch(SceneAction::SetConnectomeHealth(warn));

        let health = store.health().expect("health");
        assert_eq!(health.status.state, "WARN");
        assert_eq!(health.status.score, None);
        assert_eq!(health.runner.tick, None);
    }

    #[test]
    fn renderable_is_memoized_until_inputs_change() {
        let mut store = store_on("seed");
        commit(&mut store, "seed", graph_ab());
        let first = store.renderable();
        store.dispatch(SceneAction::SetTelemetryStatus {
            subscription: 1,
            status: TelemetryStatus::Connected,
        });
        assert!(Arc::ptr_eq(&first, &store.renderable()));

        store.dispatch(SceneAction::RevealNodeAndEdgeIds {
            node_ids: vec![NodeId::new("late")],
            edge_ids: Vec::new(),
        });
        let second = store.renderable();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.nodes.len(), first.nodes.len());
    }

    #[test]
    fn stepper_advances_over_queued_events_and_restart_resets() {
        let mut store = store_on("seed");
        commit(&mut store, "seed", graph_ab());
        store.dispatch(SceneAction::AppendFlowEvent(flow("e1", "a", "b")));
        assert_eq!(store.snapshot().cursor, 0);

        store.dispatch(SceneAction::AdvanceCursor);
        let snap = store.snapshot();
        assert_eq!(snap.cursor, 1);
        assert_eq!(snap.focus.active_node_id, Some(NodeId::new("b")));
        assert!(snap.focus.active_edge_id.is_some());

        store.dispatch(SceneAction::AdvanceCursor);
        assert_eq!(store.snapshot().cursor, 1);

        store.dispatch(SceneAction::Restart);
        let snap = store.snapshot();
        assert_eq!(snap.cursor, 0);
        assert_eq!(snap.ledger.len(), 1);
        assert_eq!(snap.focus, ActiveFocus::default());
        assert!(snap.revealed.node_ids.is_empty());
    }

    #[test]
    fn realtime_events_move_cursor_and_reveal_endpoints() {
        let mut store = store_on("seed");
        store.dispatch(SceneAction::SetMode(PlaybackMode::Realtime));
        store.dispatch(SceneAction::AppendFlowEvent(flow("e1", "x", "y")));

        let snap = store.snapshot();
        assert_eq!(snap.cursor, 1);
        assert!(snap.revealed.node_ids.contains(&NodeId::new("x")));
        assert_eq!(snap.focus.active_node_id, Some(NodeId::new("y")));
        assert_eq!(snap.focus.active_edge_id, None);
    }

    #[test]
    fn static_nodes_win_id_collisions() {
        let mut store = SceneStore::default();
        let mut manifest = Manifest::default();
        manifest.nodes.push(connectome_core::NodeDefinition {
            node_id: NodeId::new("a"),
            zone_id: None,
            node_type: connectome_core::NodeType::Actor,
            title: "Static A".into(),
            file_path: None,
            energy_value: None,
            steps: Vec::new(),
            slot: Default::default(),
            hint: Default::default(),
        });
        store.dispatch(SceneAction::SetStaticManifest {
            manifest,
            reveal: true,
        });
        store.dispatch(SceneAction::SetSearchResults(graph_ab()));

        let known = store.known_nodes();
        assert_eq!(known.len(), 2);
        assert_eq!(known[&NodeId::new("a")].title, "Static A");
    }
}
