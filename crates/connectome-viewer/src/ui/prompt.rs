use bevy::prelude::{Res, ResMut};
use bevy_egui::{egui, EguiContexts};
use connectome_core::RuntimeCommand;
use std::time::Instant;

use crate::net::NetRuntime;
use crate::playback::{CommandOutcome, CommandSink, LocalOnly, PlaybackController};
use crate::store::SceneStore;
use crate::ui::PanelState;

/// Message box opened by clicking the player node.
pub fn player_prompt(
    mut contexts: EguiContexts,
    mut panel: ResMut<PanelState>,
    mut store: ResMut<SceneStore>,
    playback: Res<PlaybackController>,
    mut net: Option<ResMut<NetRuntime>>,
) {
    if !panel.prompt_open {
        return;
    }
    let ctx = contexts.ctx_mut();
    let mut open = true;
    let mut send = false;
    egui::Window::new("Player message")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            let resp = ui.text_edit_multiline(&mut panel.prompt_text);
            resp.request_focus();
            ui.horizontal(|ui| {
                send = ui.button("Send").clicked()
                    || ui.input(|i| i.key_pressed(egui::Key::Enter) && i.modifiers.command);
                if ui.button("Cancel").clicked() {
                    panel.prompt_open = false;
                }
            });
        });
    if !open {
        panel.prompt_open = false;
    }
    if !send {
        return;
    }

    let mut local = LocalOnly;
    let sink: &mut dyn CommandSink = match net.as_deref_mut() {
        Some(net) => net,
        None => &mut local,
    };
    let cmd = RuntimeCommand::PlayerMessage {
        content: panel.prompt_text.trim().to_string(),
    };
    let outcome = playback.handle(&mut store, sink, cmd, Instant::now());
    if !matches!(outcome, CommandOutcome::Rejected(_)) {
        panel.prompt_text.clear();
        panel.prompt_open = false;
    }
}
