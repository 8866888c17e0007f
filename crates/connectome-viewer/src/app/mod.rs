use bevy::app::AppExit;
use bevy::prelude::*;

use crate::app::pump::{apply_incoming, request_graph, FollowUp};
use crate::app::resources::{NetRx, Settings};
use crate::layout::SceneLayout;
use crate::net::NetRuntime;
use crate::playback::PlaybackController;
use crate::render::{FrameCache, ViewState};
use crate::store::{manifest, SceneAction, SceneStore};
use crate::ui::{PanelState, UiLayout};
use crate::util::config;

pub mod pump;
pub mod resources;

pub struct ConnectomeViewerPlugin;

impl Plugin for ConnectomeViewerPlugin {
    fn build(&self, app: &mut App) {
        let cfg = config::load_or_default();
        let (tx, rx) = crossbeam_channel::unbounded();
        match NetRuntime::new(&cfg, tx) {
            Ok(net) => {
                app.insert_resource(net);
            }
            Err(err) => tracing::error!(error = %err, "network runtime unavailable; running offline"),
        }

        app.insert_resource(NetRx(rx))
            .insert_resource(PanelState::from_config(&cfg))
            .insert_resource(Settings(cfg))
            .init_resource::<SceneStore>()
            .init_resource::<SceneLayout>()
            .init_resource::<ViewState>()
            .init_resource::<FrameCache>()
            .init_resource::<UiLayout>()
            .init_resource::<PlaybackController>()
            .add_systems(Startup, (crate::render::setup_camera, bootstrap))
            .add_systems(
                Update,
                (
                    pump_network,
                    crate::ui::ui_panel,
                    crate::ui::inspector_panel,
                    crate::ui::player_prompt,
                    crate::ui::hud_overlay,
                    crate::render::canvas_input,
                    crate::layout::update_layout,
                    crate::layout::apply_fit,
                    crate::render::draw_scene,
                    crate::render::request_redraw,
                )
                    .chain(),
            )
            .add_systems(Last, shutdown_on_exit);
    }
}

/// Seeds the store from the manifest and config, then starts telemetry and the first fetches.
fn bootstrap(
    settings: Res<Settings>,
    mut store: ResMut<SceneStore>,
    mut view: ResMut<ViewState>,
    mut net: Option<ResMut<NetRuntime>>,
) {
    let cfg = &settings.0;
    let manifest = manifest::load_or_builtin(cfg.manifest_path.as_deref());
    tracing::info!(
        nodes = manifest.nodes.len(),
        edges = manifest.edges.len(),
        base_url = cfg.endpoints.base_url.as_str(),
        "viewer starting"
    );
    store.dispatch_all([
        SceneAction::SetStaticManifest {
            manifest,
            reveal: cfg.reveal_manifest_on_start,
        },
        SceneAction::SetMode(cfg.initial_mode),
        SceneAction::SetSpeed(cfg.initial_speed),
    ]);
    view.request_fit();

    if let Some(net) = net.as_deref_mut() {
        net.start_telemetry();
        net.list_graphs();
    }
    request_graph(&mut store, net.as_deref(), cfg.graph_name.clone());
}

fn pump_network(mut store: ResMut<SceneStore>, rx: Res<NetRx>, net: Option<Res<NetRuntime>>) {
    for msg in rx.0.try_iter().take(100_000) {
        tracing::trace!(kind = msg.kind(), "incoming");
        if let Some(FollowUp::LoadGraph(name)) = apply_incoming(&mut store, msg) {
            request_graph(&mut store, net.as_deref(), name);
        }
    }
}

fn shutdown_on_exit(
    mut exit: EventReader<AppExit>,
    mut net: Option<ResMut<NetRuntime>>,
    mut layout: ResMut<SceneLayout>,
) {
    if exit.read().next().is_none() {
        return;
    }
    layout.runner.cancel();
    if let Some(net) = net.as_deref_mut() {
        net.shutdown();
    }
    tracing::info!("viewer shut down");
}
