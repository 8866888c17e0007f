//! Adapter from graph-data payloads to the canonical definitions.

use connectome_core::{
    CallType, EdgeDefinition, NodeDefinition, NodeId, NodeType, RenderHint, SearchResult, Slot,
    TriggerKind, ZoneId,
};
use std::collections::HashSet;

use crate::util::ids::LinkIdAllocator;

const SLOT_ROWS: u32 = 6;
const DEFAULT_LINK_TYPE: &str = "LINK";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptedGraph {
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
}

/// Records without an id, and links missing either endpoint id, are skipped.
/// Repeated node ids keep their first occurrence.
pub fn adapt_search_result(result: &SearchResult) -> AdaptedGraph {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(result.nodes.len());
    for record in result.nodes.iter() {
        let Some(id) = record.id.as_deref() else {
            continue;
        };
        if !seen.insert(id.to_string()) {
            continue;
        }
        let i = nodes.len() as u32;
        let node_type = match record.kind.as_deref() {
            Some("narrative") => NodeType::Moment,
            _ => NodeType::Module,
        };
        nodes.push(NodeDefinition {
            node_id: NodeId::new(id),
            zone_id: Some(ZoneId::Graph),
            node_type,
            title: record.name.clone().unwrap_or_else(|| id.to_string()),
            file_path: None,
            energy_value: None,
            steps: Vec::new(),
            slot: Slot {
                row: i % SLOT_ROWS,
                col: i / SLOT_ROWS,
            },
            hint: RenderHint::default(),
        });
    }

    let mut ids = LinkIdAllocator::default();
    let edges = result
        .links
        .iter()
        .filter_map(|link| {
            let from = link.from_id.as_deref()?;
            let to = link.to_id.as_deref()?;
            let kind = link.kind.as_deref().unwrap_or(DEFAULT_LINK_TYPE);
            Some(EdgeDefinition {
                edge_id: ids.next(from, to, kind),
                from_node_id: NodeId::new(from),
                to_node_id: NodeId::new(to),
                label: kind.to_string(),
                trigger: TriggerKind::Direct,
                call_type: CallType::GraphLink,
            })
        })
        .collect();

    AdaptedGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectome_core::{LinkRecord, NodeRecord};

    fn rec(id: Option<&str>, kind: Option<&str>) -> NodeRecord {
        NodeRecord {
            id: id.map(str::to_string),
            name: None,
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn adapts_records_into_graph_zone() {
        let result = SearchResult {
            nodes: vec![
                rec(Some("a"), Some("narrative")),
                rec(None, None),
                rec(Some("b"), Some("character")),
                rec(Some("a"), None),
            ],
            links: vec![
                LinkRecord {
                    from_id: Some("a".into()),
                    to_id: Some("b".into()),
                    kind: None,
                },
                LinkRecord {
                    from_id: Some("a".into()),
                    to_id: None,
                    kind: Some("X".into()),
                },
            ],
            ..Default::default()
        };
        let out = adapt_search_result(&result);
        assert_eq!(out.nodes.len(), 2);
        assert_eq!(out.nodes[0].node_type, NodeType::Moment);
        assert_eq!(out.nodes[1].node_type, NodeType::Module);
        assert_eq!(out.nodes[1].title, "b");
        assert_eq!(out.nodes[1].slot, Slot { row: 1, col: 0 });
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].label, "LINK");
        assert_eq!(out.edges[0].call_type, CallType::GraphLink);
    }
}
