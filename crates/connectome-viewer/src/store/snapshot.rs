use connectome_core::{
    EdgeDefinition, EdgeId, FlowEvent, HealthSnapshot, NodeDefinition, NodeId, PlaybackMode,
    PlaybackSpeed, SearchResult,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TelemetryStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl TelemetryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

/// Highlight pointers. May name ids that are not revealed or not known at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveFocus {
    pub active_node_id: Option<NodeId>,
    pub active_edge_id: Option<EdgeId>,
    pub active_step_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevealedSet {
    pub node_ids: HashSet<NodeId>,
    pub edge_ids: HashSet<EdgeId>,
}

/// Single user-facing status line; each new message replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    /// Undecodable payload kept for diagnosis.
    pub raw: Option<String>,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            raw: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: Option<String>) -> Self {
        self.raw = raw;
        self
    }
}

/// Per-slice change counters. Selectors compare these instead of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Revisions {
    pub defs: u64,
    pub reveal: u64,
    pub focus: u64,
    pub ledger: u64,
    pub health: u64,
    pub search: u64,
    pub session: u64,
}

/// One consistent view of everything the viewer shows.
///
/// Large slices sit behind `Arc` so cloning a snapshot is cheap and readers may keep an
/// old one around while the store moves on.
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    pub graph_name: String,
    pub available_graphs: Arc<Vec<String>>,

    pub static_nodes: Arc<Vec<NodeDefinition>>,
    pub static_edges: Arc<Vec<EdgeDefinition>>,
    /// Search-derived definitions, accumulated across results and never removed.
    pub search_nodes: Arc<Vec<NodeDefinition>>,
    pub search_edges: Arc<Vec<EdgeDefinition>>,
    pub search_results: Option<Arc<SearchResult>>,

    pub revealed: Arc<RevealedSet>,
    /// What `restart` returns the reveal set to.
    pub initial_reveal: Arc<RevealedSet>,
    pub focus: ActiveFocus,

    pub ledger: Arc<Vec<FlowEvent>>,
    /// Number of ledger entries played so far; the current event is `ledger[cursor - 1]`.
    pub cursor: usize,

    pub health: Option<Arc<HealthSnapshot>>,
    pub telemetry: TelemetryStatus,
    /// Newest subscription that has reported a status.
    pub telemetry_subscription: u64,

    pub mode: PlaybackMode,
    pub speed: PlaybackSpeed,
    /// Set while a forwarded `next_step` waits for the engine.
    pub waiting_since: Option<Instant>,

    pub status: Option<StatusMessage>,
    pub revisions: Revisions,
}

impl SceneSnapshot {
    pub fn current_event(&self) -> Option<&FlowEvent> {
        self.cursor.checked_sub(1).and_then(|i| self.ledger.get(i))
    }

    pub fn at_tail(&self) -> bool {
        self.cursor >= self.ledger.len()
    }

    pub fn known_node_count(&self) -> usize {
        self.static_nodes.len() + self.search_nodes.len()
    }
}
