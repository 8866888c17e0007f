//! The closed set of store actions and the reducer that applies them.

use connectome_core::{
    EdgeDefinition, EdgeId, FlowEvent, HealthSnapshot, Manifest, NodeDefinition, NodeId,
    PlaybackMode, PlaybackSpeed, SearchResult,
};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::store::adapt::adapt_search_result;
use crate::store::snapshot::{
    ActiveFocus, RevealedSet, SceneSnapshot, StatusMessage, TelemetryStatus,
};

#[derive(Debug, Clone)]
pub enum SceneAction {
    /// Seeds the static node/edge sets; `reveal` makes them the initial reveal set.
    SetStaticManifest { manifest: Manifest, reveal: bool },
    SetGraphName(String),
    SetAvailableGraphs(Vec<String>),
    SetSearchResults(SearchResult),
    /// Result for `graph_name`: stored, fully revealed and announced in one step.
    /// Dropped when `graph_name` is no longer the current graph.
    CommitGraphResult {
        graph_name: String,
        result: SearchResult,
        status: StatusMessage,
    },
    RevealNodeAndEdgeIds {
        node_ids: Vec<NodeId>,
        edge_ids: Vec<EdgeId>,
    },
    SetActiveFocus(ActiveFocus),
    AppendFlowEvent(FlowEvent),
    /// Stepper advance over already-received events. No-op in realtime or at the tail.
    AdvanceCursor,
    Restart,
    SetConnectomeHealth(HealthSnapshot),
    /// Dropped when `subscription` is older than the newest one seen.
    SetTelemetryStatus {
        subscription: u64,
        status: TelemetryStatus,
    },
    SetMode(PlaybackMode),
    SetSpeed(PlaybackSpeed),
    SetStatusMessage(Option<StatusMessage>),
    StartWaiting(Instant),
    StopWaiting,
}

impl SceneAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetStaticManifest { .. } => "set_static_manifest",
            Self::SetGraphName(_) => "set_graph_name",
            Self::SetAvailableGraphs(_) => "set_available_graphs",
            Self::SetSearchResults(_) => "set_search_results",
            Self::CommitGraphResult { .. } => "commit_graph_result",
            Self::RevealNodeAndEdgeIds { .. } => "reveal_node_and_edge_ids",
            Self::SetActiveFocus(_) => "set_active_focus",
            Self::AppendFlowEvent(_) => "append_flow_event",
            Self::AdvanceCursor => "advance_cursor",
            Self::Restart => "restart",
            Self::SetConnectomeHealth(_) => "set_connectome_health",
            Self::SetTelemetryStatus { .. } => "set_telemetry_status",
            Self::SetMode(_) => "set_mode",
            Self::SetSpeed(_) => "set_speed",
            Self::SetStatusMessage(_) => "set_status_message",
            Self::StartWaiting(_) => "start_waiting",
            Self::StopWaiting => "stop_waiting",
        }
    }
}

/// Applies one action. Never fails: unknown ids and stale results are absorbed.
pub fn reduce(mut snap: SceneSnapshot, action: SceneAction) -> SceneSnapshot {
    match action {
        SceneAction::SetStaticManifest { manifest, reveal } => {
            let initial = if reveal {
                RevealedSet {
                    node_ids: manifest.nodes.iter().map(|n| n.node_id.clone()).collect(),
                    edge_ids: manifest.edges.iter().map(|e| e.edge_id.clone()).collect(),
                }
            } else {
                RevealedSet::default()
            };
            let static_ids: HashSet<&NodeId> = manifest.nodes.iter().map(|n| &n.node_id).collect();
            let static_edge_ids: HashSet<&EdgeId> =
                manifest.edges.iter().map(|e| &e.edge_id).collect();
            let search_nodes: Vec<NodeDefinition> = snap
                .search_nodes
                .iter()
                .filter(|n| !static_ids.contains(&n.node_id))
                .cloned()
                .collect();
            let search_edges: Vec<EdgeDefinition> = snap
                .search_edges
                .iter()
                .filter(|e| !static_edge_ids.contains(&e.edge_id))
                .cloned()
                .collect();
            snap.search_nodes = Arc::new(search_nodes);
            snap.search_edges = Arc::new(search_edges);
            snap.static_nodes = Arc::new(manifest.nodes);
            snap.static_edges = Arc::new(manifest.edges);
            reveal_ids(
                &mut snap,
                initial.node_ids.iter().cloned(),
                initial.edge_ids.iter().cloned(),
            );
            snap.initial_reveal = Arc::new(initial);
            snap.revisions.defs += 1;
        }
        SceneAction::SetGraphName(name) => {
            if snap.graph_name != name {
                snap.graph_name = name;
                snap.revisions.session += 1;
            }
        }
        SceneAction::SetAvailableGraphs(graphs) => {
            snap.available_graphs = Arc::new(graphs);
            snap.revisions.session += 1;
        }
        SceneAction::SetSearchResults(result) => {
            set_search_results(&mut snap, result);
        }
        SceneAction::CommitGraphResult {
            graph_name,
            result,
            status,
        } => {
            if graph_name != snap.graph_name {
                tracing::debug!(stale = %graph_name, current = %snap.graph_name, "dropping stale graph result");
                return snap;
            }
            let (node_ids, edge_ids) = set_search_results(&mut snap, result);
            reveal_ids(&mut snap, node_ids, edge_ids);
            snap.status = Some(status);
            snap.revisions.session += 1;
        }
        SceneAction::RevealNodeAndEdgeIds { node_ids, edge_ids } => {
            reveal_ids(&mut snap, node_ids, edge_ids);
        }
        SceneAction::SetActiveFocus(focus) => {
            if snap.focus != focus {
                snap.focus = focus;
                snap.revisions.focus += 1;
            }
        }
        SceneAction::AppendFlowEvent(event) => {
            Arc::make_mut(&mut snap.ledger).push(event);
            snap.revisions.ledger += 1;
            snap.waiting_since = None;
            if snap.mode == PlaybackMode::Realtime {
                play_to_tail(&mut snap);
            }
        }
        SceneAction::AdvanceCursor => {
            if snap.mode == PlaybackMode::Realtime || snap.at_tail() {
                return snap;
            }
            snap.cursor += 1;
            snap.revisions.ledger += 1;
            if let Some(event) = snap.current_event().cloned() {
                play_event(&mut snap, &event);
            }
        }
        SceneAction::Restart => {
            snap.cursor = 0;
            snap.focus = ActiveFocus::default();
            snap.revealed = snap.initial_reveal.clone();
            snap.waiting_since = None;
            snap.revisions.ledger += 1;
            snap.revisions.focus += 1;
            snap.revisions.reveal += 1;
        }
        SceneAction::SetConnectomeHealth(health) => {
            snap.health = Some(Arc::new(health));
            snap.revisions.health += 1;
        }
        SceneAction::SetTelemetryStatus {
            subscription,
            status,
        } => {
            if subscription < snap.telemetry_subscription {
                tracing::debug!(subscription, status = status.as_str(), "stale telemetry status dropped");
            } else {
                snap.telemetry_subscription = subscription;
                if snap.telemetry != status {
                    snap.telemetry = status;
                    snap.revisions.session += 1;
                }
            }
        }
        SceneAction::SetMode(mode) => {
            snap.mode = mode;
            snap.revisions.session += 1;
            if mode == PlaybackMode::Realtime {
                snap.waiting_since = None;
                play_to_tail(&mut snap);
            }
        }
        SceneAction::SetSpeed(speed) => {
            snap.speed = speed;
            snap.revisions.session += 1;
        }
        SceneAction::SetStatusMessage(status) => {
            snap.status = status;
            snap.revisions.session += 1;
        }
        SceneAction::StartWaiting(at) => {
            snap.waiting_since = Some(at);
            snap.revisions.session += 1;
        }
        SceneAction::StopWaiting => {
            if snap.waiting_since.take().is_some() {
                snap.revisions.session += 1;
            }
        }
    }
    snap
}

/// Stores `result` and merges its adapted definitions. Returns every adapted id.
fn set_search_results(
    snap: &mut SceneSnapshot,
    result: SearchResult,
) -> (Vec<NodeId>, Vec<EdgeId>) {
    let adapted = adapt_search_result(&result);
    let node_ids: Vec<NodeId> = adapted.nodes.iter().map(|n| n.node_id.clone()).collect();
    let edge_ids: Vec<EdgeId> = adapted.edges.iter().map(|e| e.edge_id.clone()).collect();

    let known_nodes: HashSet<NodeId> = snap
        .static_nodes
        .iter()
        .chain(snap.search_nodes.iter())
        .map(|n| n.node_id.clone())
        .collect();
    let known_edges: HashSet<EdgeId> = snap
        .static_edges
        .iter()
        .chain(snap.search_edges.iter())
        .map(|e| e.edge_id.clone())
        .collect();

    let new_nodes: Vec<NodeDefinition> = adapted
        .nodes
        .into_iter()
        .filter(|n| !known_nodes.contains(&n.node_id))
        .collect();
    let new_edges: Vec<EdgeDefinition> = adapted
        .edges
        .into_iter()
        .filter(|e| !known_edges.contains(&e.edge_id))
        .collect();

    if !new_nodes.is_empty() || !new_edges.is_empty() {
        Arc::make_mut(&mut snap.search_nodes).extend(new_nodes);
        Arc::make_mut(&mut snap.search_edges).extend(new_edges);
        snap.revisions.defs += 1;
    }
    snap.search_results = Some(Arc::new(result));
    snap.revisions.search += 1;
    (node_ids, edge_ids)
}

fn reveal_ids(
    snap: &mut SceneSnapshot,
    node_ids: impl IntoIterator<Item = NodeId>,
    edge_ids: impl IntoIterator<Item = EdgeId>,
) {
    let mut node_ids = node_ids.into_iter().peekable();
    let mut edge_ids = edge_ids.into_iter().peekable();
    if node_ids.peek().is_none() && edge_ids.peek().is_none() {
        return;
    }
    let revealed = Arc::make_mut(&mut snap.revealed);
    let mut changed = false;
    for id in node_ids {
        changed |= revealed.node_ids.insert(id);
    }
    for id in edge_ids {
        changed |= revealed.edge_ids.insert(id);
    }
    if changed {
        snap.revisions.reveal += 1;
    }
}

fn play_to_tail(snap: &mut SceneSnapshot) {
    if snap.at_tail() {
        return;
    }
    let pending: Vec<FlowEvent> = snap.ledger[snap.cursor..].to_vec();
    snap.cursor = snap.ledger.len();
    snap.revisions.ledger += 1;
    for event in pending.iter() {
        play_event(snap, event);
    }
}

/// Reveals the event's endpoints and every edge joining them, then focuses it.
fn play_event(snap: &mut SceneSnapshot, event: &FlowEvent) {
    let (from, to) = (&event.from_node_id, &event.to_node_id);
    let joins = |e: &&EdgeDefinition| {
        (&e.from_node_id == from && &e.to_node_id == to)
            || (&e.from_node_id == to && &e.to_node_id == from)
    };
    // Usually one or two edges join a pair.
    let joining: SmallVec<[&EdgeDefinition; 4]> = snap
        .static_edges
        .iter()
        .chain(snap.search_edges.iter())
        .filter(joins)
        .collect();
    let active_edge = joining
        .iter()
        .find(|e| &e.from_node_id == from && e.label == event.label)
        .or_else(|| joining.iter().find(|e| &e.from_node_id == from))
        .or_else(|| joining.first())
        .map(|e| e.edge_id.clone());
    let edge_ids: SmallVec<[EdgeId; 4]> = joining.iter().map(|e| e.edge_id.clone()).collect();
    drop(joining);

    let step_key = snap
        .static_nodes
        .iter()
        .chain(snap.search_nodes.iter())
        .filter(|n| &n.node_id == to || &n.node_id == from)
        .flat_map(|n| n.steps.iter())
        .find(|s| s.label == event.label)
        .map(|s| s.key.clone());

    reveal_ids(snap, [from.clone(), to.clone()], edge_ids);
    let focus = ActiveFocus {
        active_node_id: Some(to.clone()),
        active_edge_id: active_edge,
        active_step_key: step_key,
    };
    if snap.focus != focus {
        snap.focus = focus;
        snap.revisions.focus += 1;
    }
}
