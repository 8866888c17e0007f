use bevy_egui::egui;
use connectome_core::HealthSnapshot;

pub const WAITING_TEXT: &str = "Waiting for health stream…";

pub fn state_color(state: &str) -> egui::Color32 {
    match state.to_ascii_uppercase().as_str() {
        "OK" => egui::Color32::from_rgb(47, 138, 79),
        "WARN" => egui::Color32::from_rgb(184, 134, 11),
        "ERROR" | "FAIL" => egui::Color32::from_rgb(183, 65, 14),
        _ => egui::Color32::GRAY,
    }
}

/// Label/value pairs shown under the state badge.
pub fn health_rows(h: &HealthSnapshot) -> Vec<(&'static str, String)> {
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    vec![
        ("score", opt(h.status.score.map(|s| format!("{s:.2}")))),
        ("runner speed", opt(h.runner.speed.clone())),
        ("tick", opt(h.runner.tick.map(|t| t.to_string()))),
        ("last interrupt", h.last_interrupt_reason().to_string()),
        (
            "sink set p50/p95",
            format!(
                "{:.1} / {:.1}",
                h.attention.sink_set_size.p50, h.attention.sink_set_size.p95
            ),
        ),
        (
            "reconfig/min",
            format!("{:.2}", h.attention.focus_reconfig_rate_per_min),
        ),
        ("plateau", format!("{:.1}s", h.attention.plateau_seconds)),
        ("contradiction", format!("{:.2}", h.pressure.contradiction)),
        ("top edges", h.pressure.top_edges.len().to_string()),
        (
            "query writes",
            h.counters.query_write_attempts.to_string(),
        ),
        (
            "dmz violations",
            h.counters.dmz_violation_attempts.to_string(),
        ),
        (
            "epoch mismatch",
            h.counters.async_epoch_mismatch.to_string(),
        ),
    ]
}

pub fn show_health(ui: &mut egui::Ui, health: Option<&HealthSnapshot>) {
    ui.heading("Health");
    let Some(h) = health else {
        ui.label(WAITING_TEXT);
        return;
    };
    ui.horizontal(|ui| {
        ui.colored_label(state_color(&h.status.state), format!("● {}", h.status.state));
        if !h.place_id.is_empty() {
            ui.label(format!("@ {}", h.place_id));
        }
    });
    for note in h.status.notes.iter() {
        ui.label(format!("· {note}"));
    }
    egui::Grid::new("health_grid").striped(true).show(ui, |ui| {
        for (k, v) in health_rows(h) {
            ui.label(k);
            ui.monospace(v);
            ui.end_row();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_render_as_dashes() {
        let h = HealthSnapshot::parse(r#"{"status": {"state": "OK"}}"#).expect("parse");
        let rows = health_rows(&h);
        assert_eq!(rows[0], ("score", "-".to_string()));
        assert_eq!(rows[3], ("last interrupt", "none".to_string()));
        assert_eq!(state_color("ok"), state_color("OK"));
    }
}
