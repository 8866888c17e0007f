//! Layout for free-form node-link graphs (search and named-graph results).

use bevy::math::Vec2;
use connectome_core::{EdgeDefinition, NodeDefinition};

use crate::layout::force::{ForceParams, ForceSimulation};
use crate::layout::zones::link_indices;
use crate::layout::NodeLayout;
use crate::util::config::LayoutConfig;

/// Average area each node gets on the seed circle.
const SEED_SPACING: f32 = 36.0;

/// Circle seed whose radius grows with `sqrt(n)`, keeping initial density constant.
pub fn seed_circle(count: usize, center: Vec2) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![center];
    }
    let radius = SEED_SPACING * (count as f32).sqrt();
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32 * std::f32::consts::TAU;
            center + Vec2::new(t.cos(), t.sin()) * radius
        })
        .collect()
}

pub fn graph_params(cfg: &LayoutConfig, center: Vec2) -> ForceParams {
    ForceParams {
        charge_strength: cfg.graph_charge_strength,
        charge_distance_max: cfg.charge_distance_max,
        link_distance: cfg.graph_link_distance,
        link_strength: cfg.graph_link_strength,
        center: Some(center),
        collision_radius: Some(cfg.graph_collision_radius),
        ..Default::default()
    }
}

pub fn graph_simulation(
    nodes: &[NodeDefinition],
    edges: &[EdgeDefinition],
    center: Vec2,
    cfg: &LayoutConfig,
) -> (Vec<Vec2>, ForceSimulation) {
    let seeds = seed_circle(nodes.len(), center);
    let links = link_indices(nodes, edges);
    let sim = ForceSimulation::new(&seeds, &links, graph_params(cfg, center));
    (seeds, sim)
}

/// Runs until converged or `cfg.graph_max_iterations`, whichever comes first.
pub fn compute_graph_positions(
    nodes: &[NodeDefinition],
    edges: &[EdgeDefinition],
    center: Vec2,
    cfg: &LayoutConfig,
) -> Vec<NodeLayout> {
    let (seeds, mut sim) = graph_simulation(nodes, edges, center, cfg);
    sim.advance(cfg.graph_max_iterations);
    crate::layout::zones::collect_layout(nodes, &seeds, &sim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectome_core::{NodeId, NodeType, RenderHint, Slot, ZoneId};

    fn node(id: &str) -> NodeDefinition {
        NodeDefinition {
            node_id: NodeId::new(id),
            zone_id: Some(ZoneId::Graph),
            node_type: NodeType::Module,
            title: id.to_string(),
            file_path: None,
            energy_value: None,
            steps: Vec::new(),
            slot: Slot::default(),
            hint: RenderHint::default(),
        }
    }

    #[test]
    fn seed_radius_grows_with_sqrt_of_count() {
        let c = Vec2::new(100.0, 100.0);
        let small = seed_circle(16, c);
        let large = seed_circle(64, c);
        let r_small = small[0].distance(c);
        let r_large = large[0].distance(c);
        assert!((r_large / r_small - 2.0).abs() < 1e-3);
    }

    #[test]
    fn graph_layout_keeps_minimum_separation() {
        let nodes: Vec<_> = (0..30).map(|i| node(&format!("g{i}"))).collect();
        let cfg = LayoutConfig::default();
        let out = compute_graph_positions(&nodes, &[], Vec2::new(1290.0, 300.0), &cfg);
        assert_eq!(out.len(), 30);
        let min_sep = cfg.graph_collision_radius;
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                assert!(out[i].center.distance(out[j].center) > min_sep);
            }
        }
    }

    #[test]
    fn empty_graph_is_empty_layout() {
        let out = compute_graph_positions(&[], &[], Vec2::ZERO, &LayoutConfig::default());
        assert!(out.is_empty());
    }
}
