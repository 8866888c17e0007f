use serde::{Deserialize, Serialize};

pub mod command;
pub mod health;
pub mod ledger;
pub mod search;

pub use command::{PlaybackMode, PlaybackSpeed, RuntimeCommand};
pub use health::HealthSnapshot;
pub use ledger::FlowEvent;
pub use search::{ErrorBody, GraphList, GraphPayload, LinkRecord, NodeRecord, SearchMatch, SearchResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fixed logical regions of the canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneId {
    Frontend,
    Backend,
    Graph,
    Agents,
}

impl ZoneId {
    pub const ALL: [ZoneId; 4] = [ZoneId::Frontend, ZoneId::Backend, ZoneId::Graph, ZoneId::Agents];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Actor,
    Module,
    Query,
    Timer,
    Agent,
    Moment,
    Ui,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Direct,
    Stream,
    Async,
    Hook,
    Timer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CallType {
    GraphLink,
    GraphQuery,
    Llm,
    Moment,
    Code,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Slot {
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeStep {
    pub key: String,
    pub label: String,
    pub call_type: CallType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderHint {
    pub compact: bool,
    pub show_path: bool,
    pub show_steps: bool,
    pub reduce_motion: bool,
    pub show_label: bool,
}

impl Default for RenderHint {
    fn default() -> Self {
        Self {
            compact: false,
            show_path: true,
            show_steps: true,
            reduce_motion: false,
            show_label: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDefinition {
    pub node_id: NodeId,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    pub node_type: NodeType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<NodeStep>,
    #[serde(default)]
    pub slot: Slot,
    #[serde(default)]
    pub hint: RenderHint,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeDefinition {
    pub edge_id: EdgeId,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub label: String,
    pub trigger: TriggerKind,
    pub call_type: CallType,
}

/// Seed set of the system map: the nodes and edges known before any fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Manifest {
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
}
