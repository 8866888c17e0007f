use bevy::prelude::*;
use bevy::window::RequestRedraw;
use bevy_egui::{egui, EguiContexts};
use std::time::Instant;

use crate::app::resources::Settings;
use crate::layout::SceneLayout;
use crate::playback::{wait_progress, PlaybackController};
use crate::render::frame::{build_frame, Emphasis, FrameInput, FrameSignals, RedrawReason};
use crate::render::style::{self, Rgb};
use crate::render::{FrameCache, ViewState};
use crate::store::SceneStore;
use crate::ui::tooltips::{node_tooltip_lines, render_tooltip};
use crate::ui::UiLayout;

const LABEL_FONT: f32 = 12.0;
const EDGE_LABEL_FONT: f32 = 10.0;

pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}

fn color(rgb: Rgb) -> Color {
    Color::srgb(rgb[0], rgb[1], rgb[2])
}

fn color32(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(
        (rgb[0] * 255.0) as u8,
        (rgb[1] * 255.0) as u8,
        (rgb[2] * 255.0) as u8,
    )
}

/// Canvas-local screen point to 2D camera world space (origin at window center, y up).
fn to_world(p: Vec2, canvas_min: Vec2, window: Vec2) -> Vec2 {
    let w = p + canvas_min;
    Vec2::new(w.x - window.x / 2.0, window.y / 2.0 - w.y)
}

#[allow(clippy::too_many_arguments)]
pub fn draw_scene(
    mut gizmos: Gizmos,
    mut contexts: EguiContexts,
    windows: Query<&Window>,
    mut store: ResMut<SceneStore>,
    layout: Res<SceneLayout>,
    view: Res<ViewState>,
    ui_layout: Res<UiLayout>,
    settings: Res<Settings>,
    playback: Res<PlaybackController>,
    mut cache: ResMut<FrameCache>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let canvas = ui_layout.canvas;
    if !canvas.is_positive() {
        return;
    }
    let viewport = Vec2::new(canvas.width(), canvas.height());
    let now = Instant::now();

    let renderable = store.renderable();
    let snap = store.snapshot();
    let periodic = playback.tick_ring_progress(snap.speed, now).is_some()
        || wait_progress(snap, now).is_some();
    let revs = &snap.revisions;
    let reason = cache.scheduler.observe(FrameSignals {
        transform: view.transform,
        viewport,
        scene: (revs.defs, revs.reveal, revs.focus),
        layout_revision: layout.runner.revision(),
        layout_running: layout.runner.is_running(),
        hovered: view.hovered.clone(),
        periodic,
    });
    cache.dirty = reason.is_some();

    // Periodic wakeups only animate overlays; the draw list does not depend on time.
    if reason.is_some_and(|r| r != RedrawReason::Periodic) {
        let pulse = style::pulse_strength(snap.current_event().and_then(|e| e.energy_delta));
        cache.frame = build_frame(&FrameInput {
            renderable: &renderable,
            positions: layout.runner.positions(),
            zones: &layout.zones,
            transform: view.transform,
            viewport,
            focus: &snap.focus,
            hovered: view.hovered.as_ref(),
            pulse,
            cfg: &settings.0.render,
        });
        tracing::trace!(
            ?reason,
            nodes = cache.frame.nodes.len(),
            edges = cache.frame.edges.len(),
            "frame rebuilt"
        );
    }

    let origin = Vec2::new(canvas.min.x, canvas.min.y);
    let win = Vec2::new(window.width(), window.height());
    let frame = &cache.frame;

    for zone in frame.zones.iter() {
        let corners = [
            zone.min,
            Vec2::new(zone.max.x, zone.min.y),
            zone.max,
            Vec2::new(zone.min.x, zone.max.y),
            zone.min,
        ];
        gizmos.linestrip_2d(
            corners.iter().map(|p| to_world(*p, origin, win)),
            color(style::ZONE_OUTLINE),
        );
    }

    for edge in frame.edges.iter() {
        let c = color(edge.color);
        gizmos.linestrip_2d(edge.points.iter().map(|p| to_world(*p, origin, win)), c);
        if edge.width > 1.0 {
            let passes = edge.width.round() as i32;
            for k in 1..passes {
                let off = Vec2::new(0.0, k as f32 * 0.75);
                gizmos.linestrip_2d(
                    edge.points.iter().map(|p| to_world(*p + off, origin, win)),
                    c,
                );
            }
        }
    }

    for node in frame.nodes.iter() {
        let center = to_world(node.center, origin, win);
        gizmos.circle_2d(center, node.radius, color(node.color));
        if node.emphasis == Emphasis::Active {
            gizmos.circle_2d(center, node.radius + 3.0, color(style::ACTIVE_NODE));
        }
    }

    let ctx = contexts.ctx_mut();
    let painter = ctx
        .layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("canvas_labels"),
        ))
        .with_clip_rect(canvas);
    let to_egui = |p: Vec2| egui::pos2(p.x + canvas.min.x, p.y + canvas.min.y);

    for zone in frame.zones.iter() {
        painter.text(
            to_egui(zone.min) + egui::vec2(8.0, 6.0),
            egui::Align2::LEFT_TOP,
            zone.title,
            egui::FontId::proportional(LABEL_FONT + 2.0),
            color32(style::ZONE_OUTLINE),
        );
    }
    for label in frame.node_labels.iter() {
        painter.text(
            to_egui(label.pos),
            egui::Align2::CENTER_TOP,
            &label.text,
            egui::FontId::proportional(LABEL_FONT),
            egui::Color32::from_gray(220),
        );
    }
    for label in frame.edge_labels.iter() {
        painter.text(
            to_egui(label.pos),
            egui::Align2::CENTER_CENTER,
            &label.text,
            egui::FontId::proportional(EDGE_LABEL_FONT),
            egui::Color32::from_gray(170),
        );
    }

    let hovered = view.hovered.as_ref().and_then(|id| renderable.node(id));
    if let (Some(def), Some(cursor)) = (hovered, view.last_cursor) {
        let pos = egui::pos2(cursor.x, cursor.y) + egui::vec2(14.0, 14.0);
        render_tooltip(ctx, "tooltip_node", pos, node_tooltip_lines(def));
    }
}

/// Wakes the reactive event loop while the draw list or an overlay is changing.
pub fn request_redraw(cache: Res<FrameCache>, mut out: EventWriter<RequestRedraw>) {
    if cache.dirty {
        out.send(RequestRedraw);
    }
}
