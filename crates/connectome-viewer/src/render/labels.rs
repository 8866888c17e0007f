use bevy::math::Vec2;
use connectome_core::EdgeId;

use crate::util::config::RenderConfig;

pub const DECLUTTER_STEP: f32 = 18.0;

/// Node labels cost text layout per node, so both guards are hard limits.
pub fn node_labels_enabled(scale: f32, visible_nodes: usize, cfg: &RenderConfig) -> bool {
    scale >= cfg.label_min_scale && visible_nodes <= cfg.label_max_nodes
}

/// Edge labels share the node-count guard; past it no anchors are laid out at all.
pub fn edge_labels_enabled(scale: f32, visible_nodes: usize, cfg: &RenderConfig) -> bool {
    scale >= cfg.edge_label_min_scale && visible_nodes <= cfg.label_max_nodes
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub edge_id: EdgeId,
    pub pos: Vec2,
    pub visible: bool,
}

/// Nudges each anchor down in 18px steps past earlier anchors it would overlap.
/// Anchors are hidden below `min_zoom`.
pub fn declutter(anchors: Vec<(EdgeId, Vec2)>, zoom: f32, min_zoom: f32) -> Vec<LabelAnchor> {
    let mut used: Vec<Vec2> = Vec::with_capacity(anchors.len());
    anchors
        .into_iter()
        .map(|(edge_id, pos)| {
            let mut offset = 0.0;
            for other in used.iter() {
                let dx = (pos.x - other.x).abs();
                let dy = (pos.y + offset - other.y).abs();
                if dx < DECLUTTER_STEP && dy < DECLUTTER_STEP {
                    offset += DECLUTTER_STEP;
                }
            }
            let pos = Vec2::new(pos.x, pos.y + offset);
            used.push(pos);
            LabelAnchor {
                edge_id,
                pos,
                visible: zoom >= min_zoom,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_on_scale_and_count() {
        let cfg = RenderConfig::default();
        assert!(node_labels_enabled(1.0, 10, &cfg));
        assert!(!node_labels_enabled(0.2, 10, &cfg));
        assert!(!node_labels_enabled(1.0, cfg.label_max_nodes + 1, &cfg));
    }

    #[test]
    fn edge_labels_need_closer_zoom_and_the_same_count_limit() {
        let cfg = RenderConfig::default();
        assert!(edge_labels_enabled(1.0, 10, &cfg));
        assert!(!edge_labels_enabled(0.5, 10, &cfg));
        assert!(!edge_labels_enabled(1.0, cfg.label_max_nodes + 1, &cfg));
    }

    #[test]
    fn overlapping_anchors_are_stacked() {
        let anchors = vec![
            (EdgeId::new("a"), Vec2::new(0.0, 0.0)),
            (EdgeId::new("b"), Vec2::new(5.0, 5.0)),
            (EdgeId::new("c"), Vec2::new(200.0, 0.0)),
        ];
        let out = declutter(anchors, 1.0, 0.8);
        assert_eq!(out[1].pos, Vec2::new(5.0, 23.0));
        assert_eq!(out[2].pos, Vec2::new(200.0, 0.0));
        assert!(out.iter().all(|a| a.visible));
    }

    #[test]
    fn anchors_hidden_when_zoomed_out() {
        let out = declutter(vec![(EdgeId::new("a"), Vec2::ZERO)], 0.5, 0.8);
        assert!(!out[0].visible);
    }
}
