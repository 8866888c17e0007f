//! Applies network results to the store, in arrival order.

use crate::net::{FetchError, Incoming, NetRuntime, SearchRequest};
use crate::store::{SceneAction, SceneStore, StatusMessage};

/// Work a message asks the main thread to start next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    LoadGraph(String),
}

fn fetch_failed(store: &mut SceneStore, err: &FetchError) {
    store.dispatch(SceneAction::SetStatusMessage(Some(
        StatusMessage::error(err.to_string()).with_raw(err.raw().map(str::to_string)),
    )));
}

fn is_stale(store: &SceneStore, graph_name: &str) -> bool {
    if store.snapshot().graph_name == graph_name {
        return false;
    }
    tracing::info!(
        graph = graph_name,
        current = store.snapshot().graph_name.as_str(),
        "stale graph response dropped"
    );
    true
}

pub fn apply_incoming(store: &mut SceneStore, msg: Incoming) -> Option<FollowUp> {
    match msg {
        Incoming::Telemetry {
            subscription,
            status,
        } => store.dispatch(SceneAction::SetTelemetryStatus {
            subscription,
            status,
        }),
        Incoming::Health(health) => store.dispatch(SceneAction::SetConnectomeHealth(health)),
        Incoming::Flow(event) => store.dispatch(SceneAction::AppendFlowEvent(event)),
        Incoming::TelemetryDecodeError {
            event,
            raw,
            message,
        } => {
            tracing::debug!(event = event.as_str(), len = raw.len(), "telemetry payload rejected");
            store.dispatch(SceneAction::SetStatusMessage(Some(
                StatusMessage::error(format!("Bad {event} message: {message}")).with_raw(Some(raw)),
            )));
        }
        Incoming::GraphList(Ok(list)) => {
            let current = store.snapshot().graph_name.clone();
            let switch_to = (!list.graphs.is_empty() && !list.graphs.contains(&current))
                .then(|| list.graphs[0].clone());
            tracing::debug!(graphs = list.graphs.len(), "graph list received");
            store.dispatch(SceneAction::SetAvailableGraphs(list.graphs));
            return switch_to.map(FollowUp::LoadGraph);
        }
        Incoming::GraphList(Err(err)) => {
            tracing::warn!(error = %err, "graph list failed");
            fetch_failed(store, &err);
        }
        Incoming::GraphLoaded { graph_name, result } => {
            if is_stale(store, &graph_name) {
                return None;
            }
            match result {
                Ok(payload) => {
                    let result = payload.into_search_result();
                    let status = StatusMessage::info(format!(
                        "Loaded {} nodes, {} links",
                        result.nodes.len(),
                        result.links.len()
                    ));
                    store.dispatch(SceneAction::CommitGraphResult {
                        graph_name,
                        result,
                        status,
                    });
                }
                Err(err) => {
                    tracing::warn!(graph = graph_name.as_str(), error = %err, "graph load failed");
                    fetch_failed(store, &err);
                }
            }
        }
        Incoming::SearchFinished { graph_name, result } => {
            if is_stale(store, &graph_name) {
                return None;
            }
            match result {
                Ok(result) => {
                    let status = StatusMessage::info(format!("Found {} matches", result.matches.len()));
                    store.dispatch(SceneAction::CommitGraphResult {
                        graph_name,
                        result,
                        status,
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "search failed");
                    fetch_failed(store, &err);
                }
            }
        }
        Incoming::CommandFailed { command, error } => {
            tracing::warn!(command, error = %error, "runtime command failed");
            store.dispatch(SceneAction::StopWaiting);
            store.dispatch(SceneAction::SetStatusMessage(Some(
                StatusMessage::error(format!("{command} failed: {error}"))
                    .with_raw(error.raw().map(str::to_string)),
            )));
        }
    }
    None
}

/// Makes `name` current and starts fetching it.
pub fn request_graph(store: &mut SceneStore, net: Option<&NetRuntime>, name: String) {
    store.dispatch(SceneAction::SetGraphName(name.clone()));
    match net {
        Some(net) => {
            store.dispatch(SceneAction::SetStatusMessage(Some(StatusMessage::info(
                format!("Loading {name}..."),
            ))));
            net.load_graph(name);
        }
        None => store.dispatch(SceneAction::SetStatusMessage(Some(StatusMessage::error(
            "Network unavailable",
        )))),
    }
}

/// Validates locally before any request goes out. Returns whether a request was sent.
pub fn submit_search(store: &mut SceneStore, net: Option<&NetRuntime>, req: SearchRequest) -> bool {
    if let Err(err) = req.query_params() {
        store.dispatch(SceneAction::SetStatusMessage(Some(StatusMessage::error(
            err.to_string(),
        ))));
        return false;
    }
    let Some(net) = net else {
        store.dispatch(SceneAction::SetStatusMessage(Some(StatusMessage::error(
            "Network unavailable",
        ))));
        return false;
    };
    store.dispatch(SceneAction::SetStatusMessage(Some(StatusMessage::info(
        "Searching...",
    ))));
    net.search(req);
    true
}
