pub mod force;
pub mod graph;
pub mod runner;
pub mod zones;

use bevy::math::Vec2;
use bevy::prelude::{Res, ResMut, Resource};
use connectome_core::{EdgeDefinition, NodeId};

use crate::app::resources::Settings;
use crate::render::ViewState;
use crate::store::SceneStore;
use crate::ui::UiLayout;

pub use runner::{LayoutInput, LayoutKey, LayoutRunner, TickOutcome};
pub use zones::{compute_node_positions, compute_zones, ZoneLayout};

const FIT_MARGIN: f32 = 60.0;

/// Relaxed center of one node, in world units.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub node_id: NodeId,
    pub center: Vec2,
}

/// Zones for the current canvas width plus the runner that owns node positions.
#[derive(Resource, Default)]
pub struct SceneLayout {
    pub runner: LayoutRunner,
    pub zones: Vec<ZoneLayout>,
    zone_scale: f32,
}

pub fn update_layout(
    mut layout: ResMut<SceneLayout>,
    store: Res<SceneStore>,
    ui_layout: Res<UiLayout>,
    settings: Res<Settings>,
    mut view: ResMut<ViewState>,
) {
    let cfg = &settings.0.layout;
    let width = ui_layout.canvas.width();
    if !width.is_finite() || width <= 0.0 {
        return;
    }
    let snap = store.snapshot();
    let key = LayoutKey {
        defs_revision: snap.revisions.defs,
        zone_scale: zones::zone_scale(width),
    };

    let layout = &mut *layout;
    if layout.zones.is_empty() || layout.zone_scale != key.zone_scale {
        layout.zones = compute_zones(width);
        layout.zone_scale = key.zone_scale;
    }
    if !layout.runner.is_current(key) {
        let edges: Vec<EdgeDefinition> = snap
            .static_edges
            .iter()
            .chain(snap.search_edges.iter())
            .cloned()
            .collect();
        layout.runner.sync(
            LayoutInput {
                key,
                zones: &layout.zones,
                zoned_nodes: &snap.static_nodes,
                graph_nodes: &snap.search_nodes,
                edges: &edges,
            },
            cfg,
        );
    }

    let outcome = layout.runner.tick(cfg);
    if outcome.graph_settled {
        view.request_fit();
    }
}

/// Fits the view to the revealed nodes once a fit was requested and positions exist.
pub fn apply_fit(
    layout: Res<SceneLayout>,
    store: Res<SceneStore>,
    ui_layout: Res<UiLayout>,
    settings: Res<Settings>,
    mut view: ResMut<ViewState>,
) {
    if !view.fit_pending {
        return;
    }
    let canvas = ui_layout.canvas;
    if !canvas.is_positive() {
        return;
    }
    let snap = store.snapshot();
    let bounds = layout
        .runner
        .bounds_of(snap.revealed.node_ids.iter())
        .or_else(|| layout.runner.bounds_of(layout.runner.positions().keys()));
    let Some((min, max)) = bounds else {
        return;
    };
    let render = &settings.0.render;
    view.transform.fit(
        min,
        max,
        Vec2::new(canvas.width(), canvas.height()),
        FIT_MARGIN,
        render.min_scale,
        render.max_scale,
    );
    view.fit_pending = false;
    tracing::debug!(scale = view.transform.scale, "view fitted");
}
