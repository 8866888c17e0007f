//! Built-in system map, optionally replaced by a JSON file.

use anyhow::Context;
use connectome_core::{
    CallType, EdgeDefinition, EdgeId, Manifest, NodeDefinition, NodeId, NodeStep, NodeType,
    RenderHint, Slot, TriggerKind, ZoneId,
};
use std::collections::HashSet;
use std::path::Path;

struct N {
    id: &'static str,
    zone: ZoneId,
    kind: NodeType,
    title: &'static str,
    path: Option<&'static str>,
    row: u32,
    col: u32,
    steps: &'static [(&'static str, &'static str, CallType)],
}

struct E {
    from: &'static str,
    to: &'static str,
    label: &'static str,
    trigger: TriggerKind,
    call_type: CallType,
}

const NODES: &[N] = &[
    N {
        id: "player",
        zone: ZoneId::Frontend,
        kind: NodeType::Actor,
        title: "Player",
        path: None,
        row: 0,
        col: 0,
        steps: &[],
    },
    N {
        id: "ui_scene",
        zone: ZoneId::Frontend,
        kind: NodeType::Ui,
        title: "Scene view",
        path: Some("app/scene/page.tsx"),
        row: 1,
        col: 0,
        steps: &[("ui_scene.render", "render moment", CallType::Code)],
    },
    N {
        id: "api_moment",
        zone: ZoneId::Backend,
        kind: NodeType::Module,
        title: "Moment API",
        path: Some("engine/infrastructure/api/moments.py"),
        row: 0,
        col: 0,
        steps: &[
            ("api_moment.receive", "receive action", CallType::Code),
            ("api_moment.respond", "stream response", CallType::Code),
        ],
    },
    N {
        id: "narrator",
        zone: ZoneId::Backend,
        kind: NodeType::Module,
        title: "Narrator",
        path: Some("engine/infrastructure/orchestration/narrator.py"),
        row: 1,
        col: 0,
        steps: &[
            ("narrator.prompt", "build prompt", CallType::Code),
            ("narrator.llm", "call model", CallType::Llm),
        ],
    },
    N {
        id: "world_runner",
        zone: ZoneId::Backend,
        kind: NodeType::Module,
        title: "World runner",
        path: Some("engine/infrastructure/orchestration/world_runner.py"),
        row: 2,
        col: 0,
        steps: &[("world_runner.tick", "advance world", CallType::Code)],
    },
    N {
        id: "tick_cron",
        zone: ZoneId::Backend,
        kind: NodeType::Timer,
        title: "Tick cron",
        path: Some("engine/physics/tick.py"),
        row: 2,
        col: 1,
        steps: &[],
    },
    N {
        id: "graph_queries",
        zone: ZoneId::Graph,
        kind: NodeType::Query,
        title: "Graph queries",
        path: Some("engine/physics/graph/graph_queries_search.py"),
        row: 0,
        col: 0,
        steps: &[
            ("graph_queries.read", "read neighborhood", CallType::GraphQuery),
            ("graph_queries.write", "write moment", CallType::GraphQuery),
        ],
    },
    N {
        id: "moment_graph",
        zone: ZoneId::Graph,
        kind: NodeType::Moment,
        title: "Moment graph",
        path: Some("engine/moment_graph/traversal.py"),
        row: 1,
        col: 0,
        steps: &[("moment_graph.surface", "surface moments", CallType::Moment)],
    },
    N {
        id: "agent_narrator",
        zone: ZoneId::Agents,
        kind: NodeType::Agent,
        title: "Narrator agent",
        path: None,
        row: 0,
        col: 0,
        steps: &[],
    },
];

const EDGES: &[E] = &[
    E {
        from: "player",
        to: "ui_scene",
        label: "action",
        trigger: TriggerKind::Direct,
        call_type: CallType::Code,
    },
    E {
        from: "ui_scene",
        to: "api_moment",
        label: "POST moment",
        trigger: TriggerKind::Direct,
        call_type: CallType::Code,
    },
    E {
        from: "api_moment",
        to: "narrator",
        label: "narrate",
        trigger: TriggerKind::Async,
        call_type: CallType::Code,
    },
    E {
        from: "narrator",
        to: "agent_narrator",
        label: "prompt",
        trigger: TriggerKind::Stream,
        call_type: CallType::Llm,
    },
    E {
        from: "narrator",
        to: "graph_queries",
        label: "read context",
        trigger: TriggerKind::Direct,
        call_type: CallType::GraphQuery,
    },
    E {
        from: "graph_queries",
        to: "moment_graph",
        label: "write moment",
        trigger: TriggerKind::Direct,
        call_type: CallType::Moment,
    },
    E {
        from: "tick_cron",
        to: "world_runner",
        label: "tick",
        trigger: TriggerKind::Timer,
        call_type: CallType::Code,
    },
    E {
        from: "world_runner",
        to: "graph_queries",
        label: "apply physics",
        trigger: TriggerKind::Hook,
        call_type: CallType::GraphLink,
    },
    E {
        from: "api_moment",
        to: "ui_scene",
        label: "stream response",
        trigger: TriggerKind::Stream,
        call_type: CallType::Code,
    },
];

pub fn builtin() -> Manifest {
    let nodes = NODES
        .iter()
        .map(|n| NodeDefinition {
            node_id: NodeId::new(n.id),
            zone_id: Some(n.zone),
            node_type: n.kind,
            title: n.title.to_string(),
            file_path: n.path.map(str::to_string),
            energy_value: None,
            steps: n
                .steps
                .iter()
                .map(|(key, label, call_type)| NodeStep {
                    key: key.to_string(),
                    label: label.to_string(),
                    call_type: *call_type,
                })
                .collect(),
            slot: Slot {
                row: n.row,
                col: n.col,
            },
            hint: RenderHint::default(),
        })
        .collect();
    let edges = EDGES
        .iter()
        .map(|e| EdgeDefinition {
            edge_id: EdgeId::new(format!("{}->{}", e.from, e.to)),
            from_node_id: NodeId::new(e.from),
            to_node_id: NodeId::new(e.to),
            label: e.label.to_string(),
            trigger: e.trigger,
            call_type: e.call_type,
        })
        .collect();
    Manifest { nodes, edges }
}

pub fn load(path: &Path) -> anyhow::Result<Manifest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse manifest {}", path.display()))?;
    Ok(dedup(manifest))
}

/// Configured manifest if one is set and readable, else the built-in one.
pub fn load_or_builtin(path: Option<&Path>) -> Manifest {
    let Some(path) = path else {
        return builtin();
    };
    match load(path) {
        Ok(m) => {
            tracing::info!(path = %path.display(), nodes = m.nodes.len(), edges = m.edges.len(), "manifest loaded");
            m
        }
        Err(err) => {
            tracing::warn!(error = ?err, "manifest unavailable, using built-in map");
            builtin()
        }
    }
}

/// Keeps the first definition of every node id and edge id.
fn dedup(mut m: Manifest) -> Manifest {
    let mut nodes = HashSet::new();
    m.nodes.retain(|n| nodes.insert(n.node_id.clone()));
    let mut edges = HashSet::new();
    m.edges.retain(|e| edges.insert(e.edge_id.clone()));
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtin_edges_resolve_to_builtin_nodes() {
        let m = builtin();
        let ids: HashSet<_> = m.nodes.iter().map(|n| n.node_id.clone()).collect();
        assert_eq!(ids.len(), m.nodes.len());
        assert!(ids.contains(&NodeId::new("player")));
        for e in m.edges.iter() {
            assert!(ids.contains(&e.from_node_id), "{}", e.edge_id.as_str());
            assert!(ids.contains(&e.to_node_id), "{}", e.edge_id.as_str());
        }
    }

    #[test]
    fn file_manifest_replaces_builtin_and_drops_duplicates() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("map.json");
        std::fs::write(
            &path,
            r#"{"nodes": [
                {"node_id": "x", "node_type": "module", "title": "X"},
                {"node_id": "x", "node_type": "agent", "title": "X again"}
            ], "edges": []}"#,
        )
        .expect("write");

        let m = load_or_builtin(Some(&path));
        assert_eq!(m.nodes.len(), 1);
        assert_eq!(m.nodes[0].title, "X");
    }

    #[test]
    fn unreadable_manifest_falls_back() {
        let dir = tempdir().expect("tempdir");
        let m = load_or_builtin(Some(&dir.path().join("missing.json")));
        assert_eq!(m, builtin());
    }
}
