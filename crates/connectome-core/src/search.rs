//! Graph-shaped payloads returned by the graph-data collaborator.
//!
//! These records are deliberately distinct from `NodeDefinition` / `EdgeDefinition`;
//! the viewer adapts them before anything downstream sees them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SearchResult {
    pub query: String,
    pub threshold: f64,
    pub hops: u32,
    pub matches: Vec<SearchMatch>,
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SearchMatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub similarity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NodeRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LinkRecord {
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// `{ "nodes": [...], "links": [...] }` as returned by a named-graph fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GraphPayload {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GraphList {
    pub graphs: Vec<String>,
}

/// Body the collaborator sends alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
}

impl SearchMatch {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("?")
    }

    pub fn similarity_percent(&self) -> Option<i64> {
        self.similarity.map(|s| (s * 100.0).round() as i64)
    }
}

impl GraphPayload {
    /// A loaded graph is committed the same way a search is: as a result with an empty query.
    pub fn into_search_result(self) -> SearchResult {
        SearchResult {
            query: String::new(),
            threshold: 1.0,
            hops: 1,
            matches: Vec::new(),
            nodes: self.nodes,
            links: self.links,
        }
    }
}
