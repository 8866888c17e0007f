use bevy::prelude::{Res, ResMut};
use bevy_egui::{egui, EguiContexts};
use connectome_core::{PlaybackMode, PlaybackSpeed, RuntimeCommand};
use std::time::Instant;

use crate::app::pump::{request_graph, submit_search};
use crate::app::resources::Settings;
use crate::net::fetch::{MAX_HOPS, MIN_HOPS};
use crate::net::{NetRuntime, SearchRequest};
use crate::playback::{CommandSink, LocalOnly, PlaybackController};
use crate::render::ViewState;
use crate::store::{SceneAction, SceneStore};
use crate::ui::health::show_health;
use crate::ui::ledger::show_ledger;
use crate::ui::{PanelState, UiLayout, INSPECTOR_W, PANEL_W};
use crate::util::config;

#[allow(clippy::too_many_arguments)]
pub fn ui_panel(
    mut contexts: EguiContexts,
    mut store: ResMut<SceneStore>,
    mut panel: ResMut<PanelState>,
    mut view: ResMut<ViewState>,
    mut settings: ResMut<Settings>,
    playback: Res<PlaybackController>,
    mut net: Option<ResMut<NetRuntime>>,
) {
    let ctx = contexts.ctx_mut();
    let mut commands: Vec<RuntimeCommand> = Vec::new();

    egui::SidePanel::left("controls")
        .exact_width(PANEL_W)
        .show(ctx, |ui| {
            ui.heading("Connectome");
            let snap = store.snapshot();
            ui.label(format!(
                "nodes: {} known / {} revealed",
                snap.known_node_count(),
                snap.revealed.node_ids.len()
            ));
            ui.separator();

            ui.heading("Graph");
            let mut selected = snap.graph_name.clone();
            egui::ComboBox::from_id_source("graph_select")
                .selected_text(selected.clone())
                .show_ui(ui, |ui| {
                    for name in snap.available_graphs.iter() {
                        ui.selectable_value(&mut selected, name.clone(), name.as_str());
                    }
                });
            let reload = ui.button("Reload graph").clicked();
            if selected != snap.graph_name || reload {
                request_graph(&mut store, net.as_deref(), selected);
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Search");
            let resp = ui.text_edit_singleline(&mut panel.search_query);
            let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.add(egui::Slider::new(&mut panel.threshold_pct, 0..=100).text("threshold %"));
            ui.add(egui::Slider::new(&mut panel.hops, MIN_HOPS..=MAX_HOPS).text("hops"));
            if ui.button("Search").clicked() || enter {
                let req = SearchRequest {
                    query: panel.search_query.clone(),
                    threshold_pct: panel.threshold_pct,
                    hops: panel.hops,
                    graph: store.snapshot().graph_name.clone(),
                };
                submit_search(&mut store, net.as_deref(), req);
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Playback");
            let snap = store.snapshot();
            let mut mode = snap.mode;
            ui.horizontal(|ui| {
                ui.selectable_value(&mut mode, PlaybackMode::Stepper, "Stepper");
                ui.selectable_value(&mut mode, PlaybackMode::Realtime, "Realtime");
            });
            if mode != snap.mode {
                commands.push(RuntimeCommand::SetMode { mode });
            }
            let mut speed = snap.speed;
            ui.horizontal(|ui| {
                for s in PlaybackSpeed::ALL {
                    ui.selectable_value(&mut speed, s, s.as_str());
                }
            });
            if speed != snap.speed {
                commands.push(RuntimeCommand::SetSpeed { speed });
            }
            ui.horizontal(|ui| {
                let stepper = snap.mode == PlaybackMode::Stepper;
                if ui.add_enabled(stepper, egui::Button::new("Next step")).clicked() {
                    commands.push(RuntimeCommand::NextStep);
                }
                if ui.button("Restart").clicked() {
                    commands.push(RuntimeCommand::Restart);
                }
            });

            ui.add_space(8.0);
            ui.separator();
            ui.heading("View");
            ui.horizontal(|ui| {
                if ui.button("Fit view").clicked() {
                    view.transform.reset();
                }
                if ui.button("Fit to nodes").clicked() {
                    view.request_fit();
                }
            });

            ui.add_space(8.0);
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(format!("Telemetry: {}", store.snapshot().telemetry.as_str()));
                if ui.button("Reconnect").clicked() {
                    if let Some(net) = net.as_deref_mut() {
                        net.start_telemetry();
                    }
                }
            });
            if ui.button("Save defaults").clicked() {
                settings.0.search_threshold_pct = panel.threshold_pct;
                settings.0.search_hops = panel.hops;
                settings.0.graph_name = store.snapshot().graph_name.clone();
                if let Err(err) = config::save(&settings.0) {
                    tracing::warn!(error = %err, "failed to save viewer config");
                }
            }

            ui.add_space(8.0);
            ui.separator();
            if let Some(status) = store.snapshot().status.clone() {
                if status.is_error {
                    ui.colored_label(egui::Color32::from_rgb(183, 65, 14), &status.text);
                } else {
                    ui.label(&status.text);
                }
                if let Some(raw) = &status.raw {
                    egui::CollapsingHeader::new("Raw response").show(ui, |ui| {
                        egui::ScrollArea::vertical()
                            .id_source("status_raw")
                            .max_height(160.0)
                            .show(ui, |ui| {
                                ui.monospace(raw.as_str());
                            });
                    });
                }
                if ui.small_button("Dismiss").clicked() {
                    store.dispatch(SceneAction::SetStatusMessage(None));
                }
            }
        });

    if commands.is_empty() {
        return;
    }
    let mut local = LocalOnly;
    let sink: &mut dyn CommandSink = match net.as_deref_mut() {
        Some(net) => net,
        None => &mut local,
    };
    let now = Instant::now();
    for cmd in commands {
        playback.handle(&mut store, sink, cmd, now);
    }
}

/// Right-hand inspector with health and flow; records the canvas rect left over.
pub fn inspector_panel(
    mut contexts: EguiContexts,
    store: Res<SceneStore>,
    mut ui_layout: ResMut<UiLayout>,
) {
    let ctx = contexts.ctx_mut();
    let snap = store.snapshot();
    egui::SidePanel::right("inspector")
        .exact_width(INSPECTOR_W)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                show_health(ui, snap.health.as_deref());
                ui.add_space(8.0);
                ui.separator();
                show_ledger(ui, snap);
            });
        });
    ui_layout.canvas = ctx.available_rect();
}
