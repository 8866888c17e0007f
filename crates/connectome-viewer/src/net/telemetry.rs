//! Push-channel subscription: connect, decode named events, forward, retry a bounded
//! number of times.

use connectome_core::{FlowEvent, HealthSnapshot};
use crossbeam_channel::Sender;
use futures_util::StreamExt;
use std::time::Duration;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::net::sse::{SseCodec, SseEvent};
use crate::net::Incoming;
use crate::store::TelemetryStatus;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry transport: {0}")]
    Transport(String),
    #[error("telemetry endpoint answered {0}")]
    Status(u16),
    #[error("undecodable {event} payload: {message}")]
    Decode {
        event: String,
        raw: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    Health(HealthSnapshot),
    Flow(FlowEvent),
    Heartbeat,
    /// Event name nobody consumes.
    Unknown(String),
}

/// Maps one SSE block to a typed message.
pub fn classify(ev: &SseEvent) -> Result<TelemetryMessage, TelemetryError> {
    let decode_err = |e: serde_json::Error| TelemetryError::Decode {
        event: ev.event.clone(),
        raw: ev.data.clone(),
        message: e.to_string(),
    };
    match ev.event.as_str() {
        "health" | "connectome_health" => HealthSnapshot::parse(&ev.data)
            .map(TelemetryMessage::Health)
            .map_err(decode_err),
        "flow_event" => serde_json::from_str(&ev.data)
            .map(TelemetryMessage::Flow)
            .map_err(decode_err),
        "ping" | "heartbeat" => Ok(TelemetryMessage::Heartbeat),
        other => Ok(TelemetryMessage::Unknown(other.to_string())),
    }
}

/// `disconnected -> connecting -> connected -> error -> connecting`, with a retry budget.
#[derive(Debug, Clone)]
pub struct TelemetryMachine {
    status: TelemetryStatus,
    failures: u32,
    max_reconnects: u32,
}

impl TelemetryMachine {
    pub fn new(max_reconnects: u32) -> Self {
        Self {
            status: TelemetryStatus::Disconnected,
            failures: 0,
            max_reconnects,
        }
    }

    pub fn status(&self) -> TelemetryStatus {
        self.status
    }

    pub fn connecting(&mut self) -> TelemetryStatus {
        self.status = TelemetryStatus::Connecting;
        self.status
    }

    /// A payload decoded; the connection is healthy again.
    pub fn delivered(&mut self) -> TelemetryStatus {
        self.status = TelemetryStatus::Connected;
        self.failures = 0;
        self.status
    }

    pub fn failed(&mut self) -> TelemetryStatus {
        self.status = TelemetryStatus::Error;
        self.failures += 1;
        self.status
    }

    pub fn may_retry(&self) -> bool {
        self.status == TelemetryStatus::Error && self.failures <= self.max_reconnects
    }
}

#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub url: String,
    pub max_reconnects: u32,
    pub retry_delay: Duration,
}

/// Runs until cancelled or until the retry budget is spent.
pub async fn run_subscription(
    http: reqwest::Client,
    settings: TelemetrySettings,
    subscription: u64,
    tx: Sender<Incoming>,
    cancel: CancellationToken,
) {
    let status = |status| Incoming::Telemetry {
        subscription,
        status,
    };
    let mut machine = TelemetryMachine::new(settings.max_reconnects);
    loop {
        let _ = tx.send(status(machine.connecting()));
        tracing::info!(url = %settings.url, "telemetry connecting");

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            r = stream_once(&http, &settings.url, &status, &tx, &mut machine) => r,
        };
        let err = match result {
            Ok(()) => TelemetryError::Transport("stream closed".to_string()),
            Err(err) => err,
        };
        if let TelemetryError::Decode { event, raw, message } = &err {
            tracing::warn!(event = %event, bytes = raw.len(), error = %message, "telemetry decode failed");
            let _ = tx.send(Incoming::TelemetryDecodeError {
                event: event.clone(),
                raw: raw.clone(),
                message: message.clone(),
            });
        } else {
            tracing::warn!(error = %err, "telemetry connection lost");
        }
        let _ = tx.send(status(machine.failed()));

        if !machine.may_retry() {
            tracing::warn!(max = settings.max_reconnects, "telemetry retry budget spent");
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(settings.retry_delay) => {}
        }
    }
    if cancel.is_cancelled() {
        let _ = tx.send(status(TelemetryStatus::Disconnected));
        tracing::info!("telemetry stopped");
    }
}

/// One connection. Returns on stream end, transport failure, or the first bad payload.
async fn stream_once(
    http: &reqwest::Client,
    url: &str,
    status: &impl Fn(TelemetryStatus) -> Incoming,
    tx: &Sender<Incoming>,
    machine: &mut TelemetryMachine,
) -> Result<(), TelemetryError> {
    let resp = http
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| TelemetryError::Transport(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(TelemetryError::Status(resp.status().as_u16()));
    }

    let body = resp.bytes_stream().map(|r| r.map_err(std::io::Error::other));
    let mut frames = FramedRead::new(StreamReader::new(body), SseCodec::default());

    while let Some(frame) = frames.next().await {
        let ev = frame.map_err(|e| TelemetryError::Transport(e.to_string()))?;
        match classify(&ev)? {
            TelemetryMessage::Health(h) => {
                let _ = tx.send(Incoming::Health(h));
                if machine.status() != TelemetryStatus::Connected {
                    let _ = tx.send(status(machine.delivered()));
                }
            }
            TelemetryMessage::Flow(f) => {
                let _ = tx.send(Incoming::Flow(f));
                if machine.status() != TelemetryStatus::Connected {
                    let _ = tx.send(status(machine.delivered()));
                }
            }
            TelemetryMessage::Heartbeat => {}
            TelemetryMessage::Unknown(name) => {
                tracing::debug!(event = %name, "ignoring telemetry event");
            }
        }
    }
    Ok(())
}
