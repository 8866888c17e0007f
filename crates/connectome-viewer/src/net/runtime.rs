use anyhow::Context;
use bevy::prelude::Resource;
use connectome_core::RuntimeCommand;
use crossbeam_channel::Sender;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::net::fetch::{GraphClient, SearchRequest};
use crate::net::telemetry::{run_subscription, TelemetrySettings};
use crate::net::Incoming;
use crate::util::config::ViewerConfig;

/// Background runtime for every network task.
///
/// Tasks never touch the store; they report through `tx`. Cancelling `cancel` (via
/// [`NetRuntime::shutdown`] or drop) stops all of them.
#[derive(Resource)]
pub struct NetRuntime {
    rt: Option<tokio::runtime::Runtime>,
    cancel: CancellationToken,
    telemetry: Option<CancellationToken>,
    telemetry_subscription: u64,
    tx: Sender<Incoming>,
    client: GraphClient,
    telemetry_settings: TelemetrySettings,
}

impl NetRuntime {
    pub fn new(cfg: &ViewerConfig, tx: Sender<Incoming>) -> anyhow::Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("connectome-net")
            .enable_all()
            .build()
            .context("failed to build network runtime")?;
        let client = GraphClient::new(cfg.endpoints.clone(), cfg.fetch_timeout())
            .context("failed to build http client")?;
        let telemetry_settings = TelemetrySettings {
            url: cfg.endpoints.url(&cfg.endpoints.telemetry_path),
            max_reconnects: cfg.telemetry_max_reconnects,
            retry_delay: Duration::from_millis(cfg.telemetry_retry_delay_ms),
        };
        Ok(Self {
            rt: Some(rt),
            cancel: CancellationToken::new(),
            telemetry: None,
            telemetry_subscription: 0,
            tx,
            client,
            telemetry_settings,
        })
    }

    pub fn has_runtime_endpoint(&self) -> bool {
        self.client.endpoints().runtime_path.is_some()
    }

    fn spawn<F>(&self, fut: F, token: CancellationToken)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(rt) = self.rt.as_ref() else {
            return;
        };
        rt.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = fut => {}
            }
        });
    }

    /// (Re)opens the telemetry subscription, closing any previous one first.
    pub fn start_telemetry(&mut self) {
        self.stop_telemetry();
        let token = self.cancel.child_token();
        self.telemetry = Some(token.clone());
        self.telemetry_subscription += 1;
        let fut = run_subscription(
            self.client.http().clone(),
            self.telemetry_settings.clone(),
            self.telemetry_subscription,
            self.tx.clone(),
            token.clone(),
        );
        let Some(rt) = self.rt.as_ref() else {
            return;
        };
        rt.spawn(fut);
    }

    pub fn stop_telemetry(&mut self) {
        if let Some(token) = self.telemetry.take() {
            token.cancel();
        }
    }

    pub fn list_graphs(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.spawn(
            async move {
                let result = client.list_graphs().await;
                let _ = tx.send(Incoming::GraphList(result));
            },
            self.cancel.child_token(),
        );
    }

    pub fn load_graph(&self, graph_name: String) {
        tracing::info!(graph = %graph_name, "loading graph");
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.spawn(
            async move {
                let result = client.fetch_graph(&graph_name).await;
                let _ = tx.send(Incoming::GraphLoaded { graph_name, result });
            },
            self.cancel.child_token(),
        );
    }

    pub fn search(&self, req: SearchRequest) {
        tracing::info!(query = %req.query, threshold_pct = req.threshold_pct, hops = req.hops, "searching");
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.spawn(
            async move {
                let result = client.search(&req).await;
                let _ = tx.send(Incoming::SearchFinished {
                    graph_name: req.graph,
                    result,
                });
            },
            self.cancel.child_token(),
        );
    }

    pub fn post_command(&self, cmd: RuntimeCommand) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.spawn(
            async move {
                if let Err(error) = client.post_command(&cmd).await {
                    let _ = tx.send(Incoming::CommandFailed {
                        command: cmd.name(),
                        error,
                    });
                }
            },
            self.cancel.child_token(),
        );
    }

    /// Cancels every task and stops the runtime. Idempotent.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.telemetry = None;
        if let Some(rt) = self.rt.take() {
            rt.shutdown_timeout(Duration::from_millis(500));
            tracing::info!("network runtime stopped");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.rt.is_none()
    }
}

impl Drop for NetRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
