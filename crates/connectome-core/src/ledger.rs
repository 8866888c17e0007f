//! Ledger entries and their export forms.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::{CallType, NodeId, TriggerKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowEvent {
    pub id: String,
    pub at_ms: f64,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub trigger: TriggerKind,
    pub call_type: CallType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn trigger_name(t: TriggerKind) -> &'static str {
    match t {
        TriggerKind::Direct => "direct",
        TriggerKind::Stream => "stream",
        TriggerKind::Async => "async",
        TriggerKind::Hook => "hook",
        TriggerKind::Timer => "timer",
    }
}

fn call_type_name(c: CallType) -> &'static str {
    match c {
        CallType::GraphLink => "graphLink",
        CallType::GraphQuery => "graphQuery",
        CallType::Llm => "llm",
        CallType::Moment => "moment",
        CallType::Code => "code",
    }
}

/// One JSON object per line, in ledger order.
pub fn serialize_jsonl(ledger: &[FlowEvent]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for ev in ledger {
        out.push_str(&serde_json::to_string(ev)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn parse_jsonl(input: &str) -> Result<Vec<FlowEvent>, serde_json::Error> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}

/// Human-readable form, one event per line.
pub fn serialize_text(ledger: &[FlowEvent]) -> String {
    let mut out = String::new();
    for ev in ledger {
        out.push_str(&text_line(ev));
        out.push('\n');
    }
    out
}

/// Escapes line breaks so a bare field cannot split its record.
fn single_line(s: &str) -> Cow<'_, str> {
    if s.contains(['\r', '\n']) {
        Cow::Owned(s.replace('\r', "\\r").replace('\n', "\\n"))
    } else {
        Cow::Borrowed(s)
    }
}

pub fn text_line(ev: &FlowEvent) -> String {
    let mut line = format!(
        "{} {}ms {} -> {} {:?} trigger={} call_type={}",
        single_line(&ev.id),
        ev.at_ms,
        single_line(ev.from_node_id.as_str()),
        single_line(ev.to_node_id.as_str()),
        ev.label,
        trigger_name(ev.trigger),
        call_type_name(ev.call_type),
    );
    if let Some(d) = ev.duration_ms {
        line.push_str(&format!(" duration_ms={d}"));
    }
    if let Some(e) = ev.energy_delta {
        line.push_str(&format!(" energy_delta={e}"));
    }
    if let Some(s) = &ev.payload_summary {
        line.push_str(&format!(" payload_summary={s:?}"));
    }
    if let Some(n) = &ev.notes {
        line.push_str(&format!(" notes={n:?}"));
    }
    line
}
