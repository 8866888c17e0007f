use bevy_egui::egui;
use connectome_core::ledger::{serialize_jsonl, serialize_text, text_line};

use crate::store::SceneSnapshot;

/// How many ledger rows the panel lists.
const LEDGER_ROWS: usize = 200;

pub fn step_caption(snap: &SceneSnapshot) -> String {
    match snap.current_event() {
        Some(ev) => format!(
            "Step {} · {} → {} · {}",
            snap.cursor,
            ev.from_node_id.as_str(),
            ev.to_node_id.as_str(),
            ev.label
        ),
        None => format!("Step 0 of {}", snap.ledger.len()),
    }
}

/// Newest first.
pub fn ledger_rows(snap: &SceneSnapshot, limit: usize) -> Vec<String> {
    snap.ledger.iter().rev().take(limit).map(text_line).collect()
}

pub fn show_ledger(ui: &mut egui::Ui, snap: &SceneSnapshot) {
    ui.heading("Flow");
    ui.label(step_caption(snap));
    if let Some(key) = &snap.focus.active_step_key {
        ui.label(format!("active step: {key}"));
    }
    if snap.cursor < snap.ledger.len() {
        ui.label(format!("{} queued", snap.ledger.len() - snap.cursor));
    }

    if let Some(results) = &snap.search_results {
        if !results.matches.is_empty() {
            ui.add_space(6.0);
            ui.label(format!("Matches for \"{}\"", results.query));
            for m in results.matches.iter() {
                let pct = m
                    .similarity_percent()
                    .map(|p| format!("{p}%"))
                    .unwrap_or_else(|| "-".to_string());
                ui.label(format!("{} ({pct})", m.display_name()));
            }
        }
    }

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        if ui.button("Copy JSONL").clicked() {
            match serialize_jsonl(&snap.ledger) {
                Ok(text) => ui.ctx().output_mut(|o| o.copied_text = text),
                Err(err) => tracing::warn!(error = %err, "ledger export failed"),
            }
        }
        if ui.button("Copy text").clicked() {
            let text = serialize_text(&snap.ledger);
            ui.ctx().output_mut(|o| o.copied_text = text);
        }
    });

    egui::ScrollArea::vertical()
        .id_source("ledger_rows")
        .max_height(260.0)
        .show(ui, |ui| {
            for row in ledger_rows(snap, LEDGER_ROWS) {
                ui.monospace(row);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SceneAction;
    use crate::store::SceneStore;
    use connectome_core::{CallType, FlowEvent, NodeId, TriggerKind};

    fn event(id: &str) -> FlowEvent {
        FlowEvent {
            id: id.to_string(),
            at_ms: 1.0,
            from_node_id: NodeId::new("player"),
            to_node_id: NodeId::new("narrator"),
            trigger: TriggerKind::Direct,
            call_type: CallType::Llm,
            label: "ask".to_string(),
            duration_ms: None,
            energy_delta: None,
            payload_summary: None,
            notes: None,
        }
    }

    #[test]
    fn rows_are_newest_first_and_caption_tracks_cursor() {
        let mut store = SceneStore::default();
        assert_eq!(step_caption(store.snapshot()), "Step 0 of 0");
        store.dispatch(SceneAction::AppendFlowEvent(event("e1")));
        store.dispatch(SceneAction::AppendFlowEvent(event("e2")));
        let rows = ledger_rows(store.snapshot(), 10);
        assert!(rows[0].starts_with("e2 "));
        assert!(rows[1].starts_with("e1 "));
        assert_eq!(ledger_rows(store.snapshot(), 1).len(), 1);

        store.dispatch(SceneAction::AdvanceCursor);
        assert_eq!(
            step_caption(store.snapshot()),
            "Step 1 · player → narrator · ask"
        );
    }
}
