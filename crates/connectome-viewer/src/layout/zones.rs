use bevy::math::Vec2;
use connectome_core::{EdgeDefinition, NodeDefinition, NodeId, ZoneId};
use std::collections::HashMap;

use crate::layout::force::{ForceParams, ForceSimulation};
use crate::layout::NodeLayout;
use crate::util::config::LayoutConfig;

pub const NODE_SPACING_X: f32 = 420.0;
pub const NODE_SPACING_Y: f32 = 320.0;
pub const NODE_WIDTH: f32 = 340.0;
pub const NODE_HEIGHT: f32 = 200.0;
pub const NODE_PADDING: f32 = 40.0;
/// Origin for nodes whose zone is missing or unknown.
pub const DEFAULT_ORIGIN: Vec2 = Vec2::new(40.0, 40.0);
pub const NARROW_VIEWPORT: f32 = 1400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLayout {
    pub zone_id: ZoneId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub title: &'static str,
}

impl ZoneLayout {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

fn base_zone(zone: ZoneId) -> (f32, f32, f32, f32, &'static str) {
    match zone {
        ZoneId::Frontend => (40.0, 40.0, 420.0, 520.0, "Frontend"),
        ZoneId::Backend => (520.0, 40.0, 520.0, 720.0, "Backend"),
        ZoneId::Graph => (1080.0, 40.0, 420.0, 520.0, "Graph"),
        ZoneId::Agents => (1080.0, 600.0, 420.0, 260.0, "Agents"),
    }
}

pub fn zone_scale(viewport_width: f32) -> f32 {
    if viewport_width < NARROW_VIEWPORT {
        0.9
    } else {
        1.0
    }
}

pub fn compute_zones(viewport_width: f32) -> Vec<ZoneLayout> {
    let scale = zone_scale(viewport_width);
    ZoneId::ALL
        .iter()
        .map(|&zone_id| {
            let (x, y, w, h, title) = base_zone(zone_id);
            ZoneLayout {
                zone_id,
                x: x * scale,
                y: y * scale,
                width: w * scale,
                height: h * scale,
                title,
            }
        })
        .collect()
}

/// Deterministic starting centers: zone origin + padding + slot grid offset.
pub fn seed_positions(nodes: &[NodeDefinition], zones: &[ZoneLayout]) -> Vec<Vec2> {
    let origins: HashMap<ZoneId, Vec2> = zones
        .iter()
        .map(|z| (z.zone_id, Vec2::new(z.x, z.y)))
        .collect();
    nodes
        .iter()
        .map(|node| {
            let origin = node
                .zone_id
                .and_then(|z| origins.get(&z).copied())
                .unwrap_or(DEFAULT_ORIGIN);
            Vec2::new(
                origin.x + NODE_PADDING + node.slot.col as f32 * NODE_SPACING_X + NODE_WIDTH / 2.0,
                origin.y + NODE_PADDING + node.slot.row as f32 * NODE_SPACING_Y + NODE_HEIGHT / 2.0,
            )
        })
        .collect()
}

/// Fewer iterations for larger inputs so one call stays bounded.
pub fn iteration_budget(node_count: usize) -> usize {
    if node_count > 800 {
        120
    } else if node_count > 300 {
        180
    } else {
        260
    }
}

pub fn zoned_params(cfg: &LayoutConfig) -> ForceParams {
    ForceParams {
        charge_strength: cfg.charge_strength,
        charge_distance_max: cfg.charge_distance_max,
        link_distance: cfg.link_distance,
        link_strength: cfg.link_strength,
        center: Some(Vec2::new(cfg.center_x, cfg.center_y)),
        collision_radius: None,
        ..Default::default()
    }
}

/// Index pairs for edges whose endpoints are both in `nodes`.
pub fn link_indices(nodes: &[NodeDefinition], edges: &[EdgeDefinition]) -> Vec<(usize, usize)> {
    let index: HashMap<&NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (&n.node_id, i))
        .collect();
    edges
        .iter()
        .filter_map(|e| Some((*index.get(&e.from_node_id)?, *index.get(&e.to_node_id)?)))
        .collect()
}

pub fn zoned_simulation(
    nodes: &[NodeDefinition],
    zones: &[ZoneLayout],
    edges: &[EdgeDefinition],
    cfg: &LayoutConfig,
) -> (Vec<Vec2>, ForceSimulation) {
    let seeds = seed_positions(nodes, zones);
    let links = link_indices(nodes, edges);
    let sim = ForceSimulation::new(&seeds, &links, zoned_params(cfg));
    (seeds, sim)
}

/// Reads relaxed centers out of `sim`, substituting the seed for any non-finite result.
pub fn collect_layout(nodes: &[NodeDefinition], seeds: &[Vec2], sim: &ForceSimulation) -> Vec<NodeLayout> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let seed = seeds.get(i).copied().unwrap_or(DEFAULT_ORIGIN);
            let center = sim.position(i).filter(|p| p.is_finite()).unwrap_or(seed);
            NodeLayout {
                node_id: node.node_id.clone(),
                center,
            }
        })
        .collect()
}

pub fn compute_node_positions(
    nodes: &[NodeDefinition],
    zones: &[ZoneLayout],
    edges: &[EdgeDefinition],
    cfg: &LayoutConfig,
) -> Vec<NodeLayout> {
    let (seeds, mut sim) = zoned_simulation(nodes, zones, edges, cfg);
    for _ in 0..iteration_budget(nodes.len()) {
        sim.tick();
    }
    collect_layout(nodes, &seeds, &sim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectome_core::{CallType, EdgeId, NodeType, RenderHint, Slot, TriggerKind};

    fn node(id: &str, zone: Option<ZoneId>, row: u32, col: u32) -> NodeDefinition {
        NodeDefinition {
            node_id: NodeId::new(id),
            zone_id: zone,
            node_type: NodeType::Module,
            title: id.to_string(),
            file_path: None,
            energy_value: None,
            steps: Vec::new(),
            slot: Slot { row, col },
            hint: RenderHint::default(),
        }
    }

    fn edge(from: &str, to: &str) -> EdgeDefinition {
        EdgeDefinition {
            edge_id: EdgeId::new(format!("{from}-{to}")),
            from_node_id: NodeId::new(from),
            to_node_id: NodeId::new(to),
            label: String::new(),
            trigger: TriggerKind::Direct,
            call_type: CallType::Code,
        }
    }

    #[test]
    fn zones_scale_below_breakpoint() {
        let wide = compute_zones(1600.0);
        let narrow = compute_zones(1200.0);
        assert_eq!(wide.len(), 4);
        let backend = |zs: &[ZoneLayout]| {
            zs.iter()
                .find(|z| z.zone_id == ZoneId::Backend)
                .cloned()
                .expect("backend zone")
        };
        assert_eq!(backend(&wide).x, 520.0);
        assert!((backend(&narrow).x - 468.0).abs() < 1e-4);
        assert_eq!(backend(&narrow).title, "Backend");
        assert_eq!(compute_zones(1200.0), narrow);
    }

    #[test]
    fn seeds_are_deterministic_and_use_slot_grid() {
        let zones = compute_zones(1600.0);
        let nodes = vec![
            node("a", Some(ZoneId::Frontend), 0, 0),
            node("b", Some(ZoneId::Frontend), 1, 1),
        ];
        let first = seed_positions(&nodes, &zones);
        let second = seed_positions(&nodes, &zones);
        assert_eq!(first, second);
        assert_eq!(first[0], Vec2::new(40.0 + 40.0 + 170.0, 40.0 + 40.0 + 100.0));
        assert_eq!(first[1] - first[0], Vec2::new(NODE_SPACING_X, NODE_SPACING_Y));
    }

    #[test]
    fn missing_zone_uses_default_origin() {
        let zones = compute_zones(1600.0);
        let seeds = seed_positions(&[node("lost", None, 0, 0)], &zones);
        assert_eq!(seeds[0], DEFAULT_ORIGIN + Vec2::new(NODE_PADDING + 170.0, NODE_PADDING + 100.0));
    }

    #[test]
    fn relaxed_positions_are_finite_and_repeatable() {
        let zones = compute_zones(1600.0);
        let nodes: Vec<_> = (0..12)
            .map(|i| node(&format!("n{i}"), Some(ZoneId::Backend), i % 3, i / 3))
            .collect();
        let edges = vec![edge("n0", "n1"), edge("n1", "n2"), edge("n0", "ghost")];
        let cfg = LayoutConfig::default();

        let a = compute_node_positions(&nodes, &zones, &edges, &cfg);
        let b = compute_node_positions(&nodes, &zones, &edges, &cfg);
        assert_eq!(a.len(), nodes.len());
        assert!(a.iter().all(|l| l.center.is_finite()));
        assert_eq!(a, b);
    }

    #[test]
    fn non_finite_results_fall_back_to_seed() {
        let zones = compute_zones(1600.0);
        let nodes = vec![node("a", Some(ZoneId::Graph), 0, 0), node("b", Some(ZoneId::Graph), 0, 1)];
        let mut cfg = LayoutConfig::default();
        cfg.charge_strength = f32::NAN;

        let seeds = seed_positions(&nodes, &zones);
        let out = compute_node_positions(&nodes, &zones, &[], &cfg);
        for (l, s) in out.iter().zip(seeds) {
            assert_eq!(l.center, s);
        }
    }

    #[test]
    fn budget_shrinks_with_size() {
        assert!(iteration_budget(2000) < iteration_budget(500));
        assert!(iteration_budget(500) < iteration_budget(10));
    }
}
