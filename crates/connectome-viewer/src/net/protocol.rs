use connectome_core::{FlowEvent, GraphList, GraphPayload, HealthSnapshot, SearchResult};

use crate::net::fetch::FetchError;
use crate::store::TelemetryStatus;

/// Everything network tasks hand back to the main thread.
#[derive(Debug)]
pub enum Incoming {
    /// Tagged with the subscription that produced it; later subscriptions outrank earlier.
    Telemetry {
        subscription: u64,
        status: TelemetryStatus,
    },
    Health(HealthSnapshot),
    Flow(FlowEvent),
    TelemetryDecodeError {
        event: String,
        raw: String,
        message: String,
    },
    GraphList(Result<GraphList, FetchError>),
    /// Tagged with the graph name the request was made for.
    GraphLoaded {
        graph_name: String,
        result: Result<GraphPayload, FetchError>,
    },
    SearchFinished {
        graph_name: String,
        result: Result<SearchResult, FetchError>,
    },
    CommandFailed {
        command: &'static str,
        error: FetchError,
    },
}

impl Incoming {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Telemetry { .. } => "telemetry",
            Self::Health(_) => "health",
            Self::Flow(_) => "flow",
            Self::TelemetryDecodeError { .. } => "telemetry_decode_error",
            Self::GraphList(_) => "graph_list",
            Self::GraphLoaded { .. } => "graph_loaded",
            Self::SearchFinished { .. } => "search_finished",
            Self::CommandFailed { .. } => "command_failed",
        }
    }
}
