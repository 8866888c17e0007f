use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};
use std::time::Instant;

use crate::playback::{wait_progress, PlaybackController};
use crate::store::{SceneStore, TelemetryStatus};
use crate::ui::UiLayout;

const RING_RADIUS: f32 = 9.0;
const HUD_PADDING: f32 = 10.0;

/// Points along the arc covering `progress` of a full turn, starting at 12 o'clock.
pub fn ring_points(center: egui::Pos2, radius: f32, progress: f32) -> Vec<egui::Pos2> {
    let progress = progress.clamp(0.0, 1.0);
    let segments = ((48.0 * progress).ceil() as usize).max(1);
    (0..=segments)
        .map(|i| {
            let a = -std::f32::consts::FRAC_PI_2
                + std::f32::consts::TAU * progress * i as f32 / segments as f32;
            center + egui::vec2(a.cos(), a.sin()) * radius
        })
        .collect()
}

fn telemetry_color(status: TelemetryStatus) -> egui::Color32 {
    match status {
        TelemetryStatus::Connected => egui::Color32::from_rgb(47, 138, 79),
        TelemetryStatus::Connecting => egui::Color32::from_rgb(184, 134, 11),
        TelemetryStatus::Error => egui::Color32::from_rgb(183, 65, 14),
        TelemetryStatus::Disconnected => egui::Color32::GRAY,
    }
}

pub fn hud_overlay(
    mut contexts: EguiContexts,
    store: Res<SceneStore>,
    playback: Res<PlaybackController>,
    ui_layout: Res<UiLayout>,
) {
    let canvas = ui_layout.canvas;
    if !canvas.is_positive() {
        return;
    }
    let snap = store.snapshot();
    let now = Instant::now();
    let ctx = contexts.ctx_mut();

    egui::Area::new(egui::Id::new("hud"))
        .order(egui::Order::Foreground)
        .fixed_pos(canvas.min + egui::vec2(HUD_PADDING, HUD_PADDING))
        .show(ctx, |ui| {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(
                        egui::vec2(RING_RADIUS * 2.0 + 4.0, RING_RADIUS * 2.0 + 4.0),
                        egui::Sense::hover(),
                    );
                    let painter = ui.painter();
                    painter.circle_stroke(
                        rect.center(),
                        RING_RADIUS,
                        egui::Stroke::new(1.5, egui::Color32::from_gray(70)),
                    );
                    if let Some(p) = playback.tick_ring_progress(snap.speed, now) {
                        painter.add(egui::Shape::line(
                            ring_points(rect.center(), RING_RADIUS, p),
                            egui::Stroke::new(2.0, egui::Color32::from_rgb(184, 134, 11)),
                        ));
                    }
                    ui.label(format!("{} · {}", snap.mode.as_str(), snap.speed.as_str()));
                    ui.colored_label(
                        telemetry_color(snap.telemetry),
                        format!("● {}", snap.telemetry.as_str()),
                    );
                });
                if let Some(p) = wait_progress(snap, now) {
                    ui.add(
                        egui::ProgressBar::new(p)
                            .desired_width(160.0)
                            .text("waiting for engine"),
                    );
                }
                ui.label(format!(
                    "{} nodes · {} revealed · {} events",
                    snap.known_node_count(),
                    snap.revealed.node_ids.len(),
                    snap.ledger.len()
                ));
            });
        });
}
