use bevy_egui::egui;
use connectome_core::NodeDefinition;

use crate::render::style::{node_type_name, DEFAULT_ENERGY};

pub fn render_tooltip(
    ctx: &egui::Context,
    id: &str,
    pos: egui::Pos2,
    lines: impl IntoIterator<Item = String>,
) {
    egui::Area::new(egui::Id::new(id))
        .order(egui::Order::Tooltip)
        .fixed_pos(pos)
        .show(ctx, |ui| {
            ui.group(|ui| {
                for line in lines {
                    ui.label(line);
                }
            });
        });
}

pub fn node_tooltip_lines(def: &NodeDefinition) -> Vec<String> {
    let mut lines = vec![
        def.title.clone(),
        format!("id: {}", def.node_id.as_str()),
        format!("type: {}", node_type_name(def.node_type)),
        format!(
            "energy: {:.2}",
            def.energy_value.unwrap_or(DEFAULT_ENERGY)
        ),
    ];
    if def.hint.show_path {
        if let Some(path) = &def.file_path {
            lines.push(format!("file: {path}"));
        }
    }
    if def.hint.show_steps && !def.steps.is_empty() {
        lines.push("steps:".to_string());
        for step in def.steps.iter() {
            lines.push(format!("  {} {}", step.key, step.label));
        }
    }
    lines
}
