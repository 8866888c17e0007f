//! Client for the graph-data collaborator: graph list, named graph, semantic search.

use connectome_core::{ErrorBody, GraphList, GraphPayload, RuntimeCommand, SearchResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::util::config::EndpointConfig;

pub const MIN_HOPS: u32 = 1;
pub const MAX_HOPS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("{message}")]
    Status { code: u16, message: String },
    #[error("malformed response: {message}")]
    Decode { raw: String, message: String },
    #[error("search query is empty")]
    EmptyQuery,
}

impl FetchError {
    /// Payload that failed to decode, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Decode { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// 0..=100, sent as a fraction.
    pub threshold_pct: u32,
    pub hops: u32,
    pub graph: String,
}

impl SearchRequest {
    /// Rejects blank queries before anything is sent.
    pub fn query_params(&self) -> Result<Vec<(&'static str, String)>, FetchError> {
        let q = self.query.trim();
        if q.is_empty() {
            return Err(FetchError::EmptyQuery);
        }
        let threshold = self.threshold_pct.min(100) as f64 / 100.0;
        Ok(vec![
            ("q", q.to_string()),
            ("threshold", threshold.to_string()),
            ("hops", self.hops.clamp(MIN_HOPS, MAX_HOPS).to_string()),
            ("graph", self.graph.clone()),
        ])
    }
}

/// Turns a finished response into a typed value or a typed error.
pub fn decode_response<T: DeserializeOwned>(
    status: u16,
    body: &str,
    fallback: &str,
) -> Result<T, FetchError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| fallback.to_string());
        return Err(FetchError::Status {
            code: status,
            message,
        });
    }
    serde_json::from_str(body).map_err(|e| FetchError::Decode {
        raw: body.to_string(),
        message: e.to_string(),
    })
}

#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    endpoints: EndpointConfig,
    timeout: Duration,
}

impl GraphClient {
    pub fn new(endpoints: EndpointConfig, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("connectome-viewer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoints,
            timeout,
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub async fn list_graphs(&self) -> Result<GraphList, FetchError> {
        let url = self.endpoints.url(&self.endpoints.graphs_path);
        self.get_json(&url, &[], "Graph list failed").await
    }

    pub async fn fetch_graph(&self, name: &str) -> Result<GraphPayload, FetchError> {
        let url = self.endpoints.url(&self.endpoints.graph_path);
        self.get_json(&url, &[("graph", name.to_string())], "Graph load failed")
            .await
    }

    pub async fn search(&self, req: &SearchRequest) -> Result<SearchResult, FetchError> {
        let params = req.query_params()?;
        let url = self.endpoints.url(&self.endpoints.search_path);
        self.get_json(&url, &params, "Search failed").await
    }

    /// POSTs `cmd` to the runtime endpoint. Errors when none is configured.
    pub async fn post_command(&self, cmd: &RuntimeCommand) -> Result<(), FetchError> {
        let Some(path) = self.endpoints.runtime_path.as_deref() else {
            return Err(FetchError::Transport("no runtime endpoint configured".to_string()));
        };
        let url = self.endpoints.url(path);
        let resp = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(cmd)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status().as_u16();
        if resp.status().is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        decode_response::<serde_json::Value>(status, &body, "Command rejected").map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        fallback: &str,
    ) -> Result<T, FetchError> {
        tracing::debug!(url, "fetch start");
        let resp = self
            .http
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let out = decode_response(status, &body, fallback);
        match &out {
            Ok(_) => tracing::debug!(url, status, bytes = body.len(), "fetch finished"),
            Err(err) => tracing::warn!(url, status, bytes = body.len(), error = %err, "fetch failed"),
        }
        out
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(query: &str, threshold_pct: u32, hops: u32) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            threshold_pct,
            hops,
            graph: "seed".to_string(),
        }
    }

    #[test]
    fn blank_query_is_rejected_locally() {
        assert!(matches!(req("   ", 60, 2).query_params(), Err(FetchError::EmptyQuery)));
    }

    #[test]
    fn threshold_becomes_fraction_and_hops_are_clamped() {
        let params = req(" harbor ", 60, 9).query_params().expect("params");
        assert!(params.contains(&("q", "harbor".to_string())));
        assert!(params.contains(&("threshold", "0.6".to_string())));
        assert!(params.contains(&("hops", "5".to_string())));
    }

    #[test]
    fn error_body_supplies_status_message() {
        let err = decode_response::<GraphList>(500, r#"{"error": "graph offline"}"#, "Graph list failed")
            .expect_err("status error");
        assert_eq!(err.to_string(), "graph offline");

        let err = decode_response::<GraphList>(404, "not json", "Graph list failed")
            .expect_err("status error");
        assert!(matches!(err, FetchError::Status { code: 404, .. }));
        assert_eq!(err.to_string(), "Graph list failed");
    }

    #[test]
    fn malformed_success_body_keeps_raw_payload() {
        let err = decode_response::<GraphPayload>(200, "{\"nodes\": [", "Graph load failed")
            .expect_err("decode error");
        assert_eq!(err.raw(), Some("{\"nodes\": ["));
    }

    #[test]
    fn well_formed_body_decodes() {
        let list: GraphList =
            decode_response(200, r#"{"graphs": ["seed", "harbor"]}"#, "x").expect("list");
        assert_eq!(list.graphs, vec!["seed", "harbor"]);
    }
}
