//! Screen-space draw list and the decision of when to rebuild it.

use bevy::math::Vec2;
use connectome_core::{EdgeId, NodeId};
use std::collections::HashMap;

use crate::layout::ZoneLayout;
use crate::render::geometry::{curve_control, edge_endpoints, quadratic_point, quadratic_polyline};
use crate::render::labels::{declutter, edge_labels_enabled, node_labels_enabled};
use crate::render::style::{self, Rgb};
use crate::render::transform::ViewTransform;
use crate::store::{ActiveFocus, Renderable};
use crate::util::config::RenderConfig;

const CURVE_BEND: f32 = 0.15;
const CURVE_SEGMENTS: usize = 12;
const NODE_LABEL_GAP: f32 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGlyph {
    pub min: Vec2,
    pub max: Vec2,
    pub title: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    Hover,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeGlyph {
    pub id: NodeId,
    pub center: Vec2,
    pub radius: f32,
    pub color: Rgb,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGlyph {
    pub id: EdgeId,
    pub points: Vec<Vec2>,
    pub color: Rgb,
    pub width: f32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub pos: Vec2,
    pub text: String,
}

/// Everything one frame draws, in canvas-local screen pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameList {
    pub zones: Vec<ZoneGlyph>,
    pub edges: Vec<EdgeGlyph>,
    pub nodes: Vec<NodeGlyph>,
    pub node_labels: Vec<TextItem>,
    pub edge_labels: Vec<TextItem>,
    /// Renderable nodes skipped for lacking a finite position.
    pub unplaced: usize,
}

pub struct FrameInput<'a> {
    pub renderable: &'a Renderable,
    pub positions: &'a HashMap<NodeId, Vec2>,
    pub zones: &'a [ZoneLayout],
    pub transform: ViewTransform,
    pub viewport: Vec2,
    pub focus: &'a ActiveFocus,
    pub hovered: Option<&'a NodeId>,
    /// Extra width factor for the active edge.
    pub pulse: f32,
    pub cfg: &'a RenderConfig,
}

fn visible(min: Vec2, max: Vec2, viewport: Vec2) -> bool {
    max.x >= 0.0 && max.y >= 0.0 && min.x <= viewport.x && min.y <= viewport.y
}

pub fn build_frame(input: &FrameInput<'_>) -> FrameList {
    let t = &input.transform;
    let mut out = FrameList::default();

    for z in input.zones.iter() {
        out.zones.push(ZoneGlyph {
            min: t.world_to_screen(Vec2::new(z.x, z.y)),
            max: t.world_to_screen(Vec2::new(z.x + z.width, z.y + z.height)),
            title: z.title,
        });
    }

    let placed = |id: &NodeId| input.positions.get(id).copied().filter(|p| p.is_finite());

    for node in input.renderable.nodes.iter() {
        let Some(world) = placed(&node.node_id) else {
            out.unplaced += 1;
            continue;
        };
        let active = input.focus.active_node_id.as_ref() == Some(&node.node_id);
        let hovered = input.hovered == Some(&node.node_id);
        let (emphasis, boost, color) = if active {
            (Emphasis::Active, style::ACTIVE_BOOST, style::ACTIVE_NODE)
        } else if hovered {
            (Emphasis::Hover, style::HOVER_BOOST, style::HOVER_NODE)
        } else {
            (Emphasis::None, 0.0, style::node_color(node.node_type))
        };
        let center = t.world_to_screen(world);
        let radius = (style::base_size(node.energy_value) + boost) / 2.0 * t.scale;
        if !visible(center - radius, center + radius, input.viewport) {
            continue;
        }
        out.nodes.push(NodeGlyph {
            id: node.node_id.clone(),
            center,
            radius,
            color,
            emphasis,
        });
    }

    let edge_labels = edge_labels_enabled(t.scale, out.nodes.len(), input.cfg);
    let mut pending: Vec<(EdgeId, Vec2, String)> = Vec::new();

    for edge in input.renderable.edges.iter() {
        let (Some(from), Some(to)) = (placed(&edge.from_node_id), placed(&edge.to_node_id)) else {
            continue;
        };
        let from_r = input
            .renderable
            .node(&edge.from_node_id)
            .map(|n| style::hit_radius(n.energy_value))
            .unwrap_or_else(|| style::hit_radius(None));
        let to_r = input
            .renderable
            .node(&edge.to_node_id)
            .map(|n| style::hit_radius(n.energy_value))
            .unwrap_or_else(|| style::hit_radius(None));
        let (a, b) = edge_endpoints(from, from_r, to, to_r);
        let (sa, sb) = (t.world_to_screen(a), t.world_to_screen(b));

        let labeled = !edge.label.is_empty();
        let points = if labeled {
            let c = curve_control(sa, sb, CURVE_BEND);
            quadratic_polyline(sa, c, sb, CURVE_SEGMENTS)
        } else {
            vec![sa, sb]
        };
        let (lo, hi) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        if !visible(lo, hi, input.viewport) {
            continue;
        }

        let active = input.focus.active_edge_id.as_ref() == Some(&edge.edge_id);
        out.edges.push(EdgeGlyph {
            id: edge.edge_id.clone(),
            points,
            color: if active {
                style::ACTIVE_EDGE
            } else {
                style::edge_color(edge.call_type)
            },
            width: if active { 1.0 + 2.0 * input.pulse } else { 1.0 },
            active,
        });
        if labeled && edge_labels {
            let c = curve_control(sa, sb, CURVE_BEND);
            pending.push((edge.edge_id.clone(), quadratic_point(sa, c, sb, 0.5), edge.label.clone()));
        }
    }

    let texts: Vec<String> = pending.iter().map(|(_, _, text)| text.clone()).collect();
    let anchors = declutter(
        pending.into_iter().map(|(id, pos, _)| (id, pos)).collect(),
        t.scale,
        input.cfg.edge_label_min_scale,
    );
    out.edge_labels = anchors
        .into_iter()
        .zip(texts)
        .filter(|(anchor, _)| anchor.visible)
        .map(|(anchor, text)| TextItem {
            pos: anchor.pos,
            text,
        })
        .collect();

    if node_labels_enabled(t.scale, out.nodes.len(), input.cfg) {
        for glyph in out.nodes.iter() {
            let Some(def) = input.renderable.node(&glyph.id) else {
                continue;
            };
            if !def.hint.show_label {
                continue;
            }
            out.node_labels.push(TextItem {
                pos: glyph.center + Vec2::new(0.0, glyph.radius + NODE_LABEL_GAP),
                text: def.title.clone(),
            });
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawReason {
    Transform,
    Scene,
    Simulation,
    Hover,
    Periodic,
}

/// Inputs the scheduler compares between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSignals {
    pub transform: ViewTransform,
    pub viewport: Vec2,
    /// Revisions of the slices that change what is drawn.
    pub scene: (u64, u64, u64),
    pub layout_revision: u64,
    pub layout_running: bool,
    pub hovered: Option<NodeId>,
    /// A time-based indicator is animating.
    pub periodic: bool,
}

/// Rebuilds the draw list only when something it depends on changed.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    last: Option<FrameSignals>,
}

impl FrameScheduler {
    pub fn observe(&mut self, signals: FrameSignals) -> Option<RedrawReason> {
        let reason = match &self.last {
            None => Some(RedrawReason::Scene),
            Some(prev) => {
                if prev.transform != signals.transform || prev.viewport != signals.viewport {
                    Some(RedrawReason::Transform)
                } else if prev.scene != signals.scene {
                    Some(RedrawReason::Scene)
                } else if signals.layout_running || prev.layout_revision != signals.layout_revision {
                    Some(RedrawReason::Simulation)
                } else if prev.hovered != signals.hovered {
                    Some(RedrawReason::Hover)
                } else if signals.periodic {
                    Some(RedrawReason::Periodic)
                } else {
                    None
                }
            }
        };
        self.last = Some(signals);
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_zones;
    use connectome_core::{CallType, EdgeDefinition, NodeDefinition, NodeType, RenderHint, Slot, TriggerKind};

    fn node(id: &str) -> NodeDefinition {
        NodeDefinition {
            node_id: NodeId::new(id),
            zone_id: None,
            node_type: NodeType::Module,
            title: id.to_uppercase(),
            file_path: None,
            energy_value: None,
            steps: Vec::new(),
            slot: Slot::default(),
            hint: RenderHint::default(),
        }
    }

    fn renderable() -> Renderable {
        let nodes = vec![node("a"), node("b"), node("c")];
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.node_id.clone(), i))
            .collect();
        Renderable {
            nodes,
            edges: vec![EdgeDefinition {
                edge_id: EdgeId::new("a-b"),
                from_node_id: NodeId::new("a"),
                to_node_id: NodeId::new("b"),
                label: "LINK".into(),
                trigger: TriggerKind::Direct,
                call_type: CallType::GraphLink,
            }],
            index,
        }
    }

    fn input<'a>(
        r: &'a Renderable,
        positions: &'a HashMap<NodeId, Vec2>,
        focus: &'a ActiveFocus,
        cfg: &'a RenderConfig,
        scale: f32,
    ) -> FrameInput<'a> {
        FrameInput {
            renderable: r,
            positions,
            zones: &[],
            transform: ViewTransform {
                x: 0.0,
                y: 0.0,
                scale,
            },
            viewport: Vec2::new(1000.0, 800.0),
            focus,
            hovered: None,
            pulse: 0.4,
            cfg,
        }
    }

    #[test]
    fn unplaced_and_non_finite_nodes_are_skipped() {
        let r = renderable();
        let mut positions = HashMap::new();
        positions.insert(NodeId::new("a"), Vec2::new(100.0, 100.0));
        positions.insert(NodeId::new("b"), Vec2::new(f32::NAN, 100.0));
        let focus = ActiveFocus::default();
        let cfg = RenderConfig::default();

        let frame = build_frame(&input(&r, &positions, &focus, &cfg, 1.0));
        assert_eq!(frame.nodes.len(), 1);
        assert_eq!(frame.unplaced, 2);
        assert!(frame.edges.is_empty());
    }

    #[test]
    fn active_node_and_edge_are_emphasized() {
        let r = renderable();
        let positions: HashMap<_, _> = [
            (NodeId::new("a"), Vec2::new(100.0, 100.0)),
            (NodeId::new("b"), Vec2::new(400.0, 100.0)),
            (NodeId::new("c"), Vec2::new(100.0, 400.0)),
        ]
        .into_iter()
        .collect();
        let focus = ActiveFocus {
            active_node_id: Some(NodeId::new("b")),
            active_edge_id: Some(EdgeId::new("a-b")),
            active_step_key: None,
        };
        let cfg = RenderConfig::default();

        let frame = build_frame(&input(&r, &positions, &focus, &cfg, 1.0));
        let b = frame.nodes.iter().find(|n| n.id.as_str() == "b").expect("b");
        let c = frame.nodes.iter().find(|n| n.id.as_str() == "c").expect("c");
        assert_eq!(b.emphasis, Emphasis::Active);
        assert_eq!(b.radius - c.radius, style::ACTIVE_BOOST / 2.0);
        assert!(frame.edges[0].active);
        assert_eq!(frame.edges[0].points.len(), CURVE_SEGMENTS + 1);
        assert_eq!(frame.edge_labels.len(), 1);
        assert_eq!(frame.node_labels.len(), 3);
    }

    #[test]
    fn labels_drop_out_when_zoomed_out() {
        let r = renderable();
        let positions: HashMap<_, _> = [
            (NodeId::new("a"), Vec2::new(100.0, 100.0)),
            (NodeId::new("b"), Vec2::new(400.0, 100.0)),
        ]
        .into_iter()
        .collect();
        let focus = ActiveFocus::default();
        let cfg = RenderConfig::default();
        let frame = build_frame(&input(&r, &positions, &focus, &cfg, 0.2));
        assert!(frame.node_labels.is_empty());
        assert!(frame.edge_labels.is_empty());
        assert_eq!(frame.nodes.len(), 2);
    }

    #[test]
    fn crowded_view_drops_edge_labels_too() {
        let r = renderable();
        let positions: HashMap<_, _> = [
            (NodeId::new("a"), Vec2::new(100.0, 100.0)),
            (NodeId::new("b"), Vec2::new(400.0, 100.0)),
            (NodeId::new("c"), Vec2::new(100.0, 400.0)),
        ]
        .into_iter()
        .collect();
        let focus = ActiveFocus::default();
        let cfg = RenderConfig {
            label_max_nodes: 2,
            ..RenderConfig::default()
        };
        let frame = build_frame(&input(&r, &positions, &focus, &cfg, 1.0));
        assert_eq!(frame.nodes.len(), 3);
        assert_eq!(frame.edges.len(), 1);
        assert!(frame.node_labels.is_empty());
        assert!(frame.edge_labels.is_empty());
    }

    #[test]
    fn zones_follow_transform() {
        let zones = compute_zones(1600.0);
        let r = Renderable::default();
        let positions = HashMap::new();
        let focus = ActiveFocus::default();
        let cfg = RenderConfig::default();
        let mut inp = input(&r, &positions, &focus, &cfg, 0.5);
        inp.zones = &zones;
        let frame = build_frame(&inp);
        assert_eq!(frame.zones.len(), 4);
        assert_eq!(frame.zones[0].min, Vec2::new(20.0, 20.0));
    }

    fn signals(scale: f32, scene: u64, running: bool, periodic: bool) -> FrameSignals {
        FrameSignals {
            transform: ViewTransform {
                x: 0.0,
                y: 0.0,
                scale,
            },
            viewport: Vec2::new(800.0, 600.0),
            scene: (scene, 0, 0),
            layout_revision: 0,
            layout_running: running,
            hovered: None,
            periodic,
        }
    }

    #[test]
    fn scheduler_is_quiet_for_static_scene() {
        let mut s = FrameScheduler::default();
        assert_eq!(s.observe(signals(1.0, 0, false, false)), Some(RedrawReason::Scene));
        assert_eq!(s.observe(signals(1.0, 0, false, false)), None);
        assert_eq!(s.observe(signals(1.5, 0, false, false)), Some(RedrawReason::Transform));
        assert_eq!(s.observe(signals(1.5, 1, false, false)), Some(RedrawReason::Scene));
        assert_eq!(s.observe(signals(1.5, 1, true, false)), Some(RedrawReason::Simulation));
        assert_eq!(s.observe(signals(1.5, 1, false, true)), Some(RedrawReason::Periodic));
        assert_eq!(s.observe(signals(1.5, 1, false, false)), None);
    }
}
