mod app;
mod layout;
mod net;
mod playback;
mod render;
mod store;
mod ui;
mod util;

use bevy::prelude::*;
use bevy::winit::{UpdateMode, WinitSettings};
use bevy_egui::EguiPlugin;
use std::time::Duration;

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Connectome".into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<bevy::log::LogPlugin>(),
        )
        .add_plugins(EguiPlugin)
        // Frames are driven by input, RequestRedraw and the poll timeout that drains the network channel.
        .insert_resource(WinitSettings {
            focused_mode: UpdateMode::reactive(Duration::from_millis(200)),
            unfocused_mode: UpdateMode::reactive_low_power(Duration::from_secs(1)),
        })
        .add_plugins(app::ConnectomeViewerPlugin)
        .run();
}
