//! Turns runtime commands into store actions, gated by playback mode.

use bevy::prelude::Resource;
use connectome_core::{PlaybackMode, PlaybackSpeed, RuntimeCommand};
use std::time::{Duration, Instant};

use crate::net::NetRuntime;
use crate::store::{SceneAction, SceneStore, SceneSnapshot};

/// Longest the player-wait indicator is shown for one forwarded step.
pub const PLAYER_WAIT_CAP: Duration = Duration::from_secs(4);

/// Where commands go once the local store has been updated.
pub trait CommandSink {
    fn forward(&mut self, cmd: &RuntimeCommand);
}

impl CommandSink for NetRuntime {
    fn forward(&mut self, cmd: &RuntimeCommand) {
        if self.has_runtime_endpoint() {
            self.post_command(cmd.clone());
        } else {
            tracing::debug!(command = cmd.name(), "no runtime endpoint, command handled locally");
        }
    }
}

/// Sink used when no network runtime could be built.
pub struct LocalOnly;

impl CommandSink for LocalOnly {
    fn forward(&mut self, cmd: &RuntimeCommand) {
        tracing::debug!(command = cmd.name(), "network unavailable, command handled locally");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Applied to the store only.
    Local,
    /// Applied locally (if at all) and sent to the engine.
    Forwarded,
    Rejected(&'static str),
}

#[derive(Resource)]
pub struct PlaybackController {
    epoch: Instant,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl PlaybackController {
    pub fn handle(
        &self,
        store: &mut SceneStore,
        sink: &mut dyn CommandSink,
        cmd: RuntimeCommand,
        now: Instant,
    ) -> CommandOutcome {
        let outcome = match &cmd {
            RuntimeCommand::NextStep => {
                let snap = store.snapshot();
                if snap.mode == PlaybackMode::Realtime {
                    CommandOutcome::Rejected("next_step is driven by telemetry in realtime mode")
                } else if !snap.at_tail() {
                    store.dispatch(SceneAction::AdvanceCursor);
                    CommandOutcome::Local
                } else {
                    sink.forward(&cmd);
                    store.dispatch(SceneAction::StartWaiting(now));
                    CommandOutcome::Forwarded
                }
            }
            RuntimeCommand::Restart => {
                store.dispatch(SceneAction::Restart);
                sink.forward(&cmd);
                CommandOutcome::Forwarded
            }
            RuntimeCommand::SetSpeed { speed } => {
                store.dispatch(SceneAction::SetSpeed(*speed));
                sink.forward(&cmd);
                CommandOutcome::Forwarded
            }
            RuntimeCommand::SetMode { mode } => {
                store.dispatch(SceneAction::SetMode(*mode));
                sink.forward(&cmd);
                CommandOutcome::Forwarded
            }
            RuntimeCommand::PlayerMessage { content } => {
                if content.trim().is_empty() {
                    CommandOutcome::Rejected("empty player message")
                } else {
                    sink.forward(&cmd);
                    store.dispatch(SceneAction::StartWaiting(now));
                    CommandOutcome::Forwarded
                }
            }
        };
        match &outcome {
            CommandOutcome::Rejected(reason) => {
                tracing::info!(command = cmd.name(), reason, "command rejected");
            }
            _ => tracing::debug!(command = cmd.name(), outcome = ?outcome, "command handled"),
        }
        outcome
    }

    /// Phase of the tick ring in `0..1`, or `None` while paused.
    pub fn tick_ring_progress(&self, speed: PlaybackSpeed, now: Instant) -> Option<f32> {
        tick_ring_progress(speed, now.saturating_duration_since(self.epoch))
    }
}

pub fn tick_ring_progress(speed: PlaybackSpeed, elapsed: Duration) -> Option<f32> {
    let interval = speed.nominal_interval_ms()?;
    let phase = (elapsed.as_millis() % interval as u128) as f32;
    Some(phase / interval as f32)
}

/// Progress of the player-wait bar, `None` when idle or past the cap.
pub fn wait_progress(snap: &SceneSnapshot, now: Instant) -> Option<f32> {
    let since = snap.waiting_since?;
    let elapsed = now.saturating_duration_since(since);
    if elapsed >= PLAYER_WAIT_CAP {
        return None;
    }
    Some(elapsed.as_secs_f32() / PLAYER_WAIT_CAP.as_secs_f32())
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectome_core::{CallType, FlowEvent, NodeId, TriggerKind};

    #[derive(Default)]
    struct Recorder(Vec<RuntimeCommand>);

    impl CommandSink for Recorder {
        fn forward(&mut self, cmd: &RuntimeCommand) {
            self.0.push(cmd.clone());
        }
    }

    fn flow(id: &str) -> FlowEvent {
        FlowEvent {
            id: id.to_string(),
            at_ms: 1.0,
            from_node_id: NodeId::new("player"),
            to_node_id: NodeId::new("narrator"),
            trigger: TriggerKind::Direct,
            call_type: CallType::Code,
            label: "say".to_string(),
            duration_ms: None,
            energy_delta: None,
            payload_summary: None,
            notes: None,
        }
    }

    #[test]
    fn realtime_next_step_is_rejected_without_side_effects() {
        let ctl = PlaybackController::default();
        let mut store = SceneStore::default();
        let mut sink = Recorder::default();
        store.dispatch(SceneAction::SetMode(PlaybackMode::Realtime));
        store.dispatch(SceneAction::AppendFlowEvent(flow("e1")));
        let (cursor, len) = (store.snapshot().cursor, store.snapshot().ledger.len());

        let out = ctl.handle(&mut store, &mut sink, RuntimeCommand::NextStep, Instant::now());

        assert!(matches!(out, CommandOutcome::Rejected(_)));
        assert_eq!(store.snapshot().cursor, cursor);
        assert_eq!(store.snapshot().ledger.len(), len);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn stepper_consumes_queue_then_forwards_and_waits() {
        let ctl = PlaybackController::default();
        let mut store = SceneStore::default();
        let mut sink = Recorder::default();
        store.dispatch(SceneAction::AppendFlowEvent(flow("e1")));
        let now = Instant::now();

        assert_eq!(
            ctl.handle(&mut store, &mut sink, RuntimeCommand::NextStep, now),
            CommandOutcome::Local
        );
        assert_eq!(store.snapshot().cursor, 1);
        assert!(sink.0.is_empty());

        assert_eq!(
            ctl.handle(&mut store, &mut sink, RuntimeCommand::NextStep, now),
            CommandOutcome::Forwarded
        );
        assert_eq!(sink.0, vec![RuntimeCommand::NextStep]);
        assert_eq!(wait_progress(store.snapshot(), now), Some(0.0));
        assert_eq!(wait_progress(store.snapshot(), now + PLAYER_WAIT_CAP), None);

        store.dispatch(SceneAction::AppendFlowEvent(flow("e2")));
        assert!(store.snapshot().waiting_since.is_none());
    }

    #[test]
    fn restart_keeps_ledger() {
        let ctl = PlaybackController::default();
        let mut store = SceneStore::default();
        let mut sink = Recorder::default();
        store.dispatch(SceneAction::AppendFlowEvent(flow("e1")));
        ctl.handle(&mut store, &mut sink, RuntimeCommand::NextStep, Instant::now());
        ctl.handle(&mut store, &mut sink, RuntimeCommand::Restart, Instant::now());
        assert_eq!(store.snapshot().cursor, 0);
        assert_eq!(store.snapshot().ledger.len(), 1);
    }

    #[test]
    fn empty_player_message_is_rejected() {
        let ctl = PlaybackController::default();
        let mut store = SceneStore::default();
        let mut sink = Recorder::default();
        let out = ctl.handle(
            &mut store,
            &mut sink,
            RuntimeCommand::PlayerMessage {
                content: "  ".into(),
            },
            Instant::now(),
        );
        assert!(matches!(out, CommandOutcome::Rejected(_)));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn ring_cycles_with_nominal_interval() {
        assert_eq!(tick_ring_progress(PlaybackSpeed::Pause, Duration::from_secs(5)), None);
        assert_eq!(
            tick_ring_progress(PlaybackSpeed::X2, Duration::from_millis(2250)),
            Some(0.5)
        );
    }
}
