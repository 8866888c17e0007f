//! Health snapshot pushed by the telemetry collaborator.
//!
//! A snapshot is always replaced wholesale; nothing here knows how to merge two of them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthSnapshot {
    #[serde(default)]
    pub ts: Option<f64>,
    #[serde(default)]
    pub playthrough_id: String,
    #[serde(default)]
    pub place_id: String,
    pub status: HealthStatus,
    #[serde(default)]
    pub runner: RunnerHealth,
    #[serde(default)]
    pub counters: HealthCounters,
    #[serde(default)]
    pub attention: AttentionHealth,
    #[serde(default)]
    pub pressure: PressureHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub state: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RunnerHealth {
    pub speed: Option<String>,
    pub tick: Option<u64>,
    pub last_interrupt: Option<Interrupt>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Interrupt {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct HealthCounters {
    pub query_write_attempts: u64,
    pub dmz_violation_attempts: u64,
    pub async_epoch_mismatch: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Percentiles {
    pub p50: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AttentionHealth {
    pub sink_set_size: Percentiles,
    pub focus_reconfig_rate_per_min: f64,
    pub plateau_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PressureHealth {
    pub contradiction: f64,
    pub top_edges: Vec<serde_json::Value>,
}

impl HealthSnapshot {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn last_interrupt_reason(&self) -> &str {
        self.runner
            .last_interrupt
            .as_ref()
            .and_then(|i| i.reason.as_deref())
            .unwrap_or("none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_service_payload() {
        let raw = r#"{
            "ts": 1700000000000,
            "playthrough_id": "pt-1",
            "place_id": "harbor",
            "status": {"state": "OK", "score": 0.92, "notes": ["stable"]},
            "runner": {"speed": "1x", "tick": 42, "last_interrupt": {"reason": "player"}},
            "counters": {"query_write_attempts": 1, "dmz_violation_attempts": 0, "async_epoch_mismatch": 3},
            "attention": {"sink_set_size": {"p50": 4, "p95": 9}, "focus_reconfig_rate_per_min": 1.5, "plateau_seconds": 12},
            "pressure": {"contradiction": 0.2, "top_edges": []}
        }"#;
        let snap = HealthSnapshot::parse(raw).expect("parse health");
        assert_eq!(snap.status.state, "OK");
        assert_eq!(snap.runner.tick, Some(42));
        assert_eq!(snap.counters.async_epoch_mismatch, 3);
        assert_eq!(snap.attention.sink_set_size.p95, 9.0);
        assert_eq!(snap.last_interrupt_reason(), "player");
    }

    #[test]
    fn missing_blocks_default_but_status_is_required() {
        let snap = HealthSnapshot::parse(r#"{"status": {"state": "WARN"}}"#).expect("parse");
        assert_eq!(snap.counters, HealthCounters::default());
        assert_eq!(snap.last_interrupt_reason(), "none");

        assert!(HealthSnapshot::parse(r#"{"runner": {"tick": 1}}"#).is_err());
        assert!(HealthSnapshot::parse("not json").is_err());
    }
}
