use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Stepper,
    Realtime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackSpeed {
    #[serde(rename = "pause")]
    Pause,
    #[default]
    #[serde(rename = "1x")]
    X1,
    #[serde(rename = "2x")]
    X2,
    #[serde(rename = "3x")]
    X3,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 4] = [Self::Pause, Self::X1, Self::X2, Self::X3];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::X1 => "1x",
            Self::X2 => "2x",
            Self::X3 => "3x",
        }
    }

    /// Nominal interval between engine ticks, used only by time-based indicators.
    /// `None` while paused.
    pub fn nominal_interval_ms(self) -> Option<u64> {
        match self {
            Self::Pause => None,
            Self::X1 => Some(3000),
            Self::X2 => Some(1500),
            Self::X3 => Some(1000),
        }
    }
}

impl PlaybackMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stepper => "stepper",
            Self::Realtime => "realtime",
        }
    }
}

/// Commands accepted by the playback collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum RuntimeCommand {
    NextStep,
    Restart,
    SetSpeed { speed: PlaybackSpeed },
    SetMode { mode: PlaybackMode },
    PlayerMessage { content: String },
}

impl RuntimeCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NextStep => "next_step",
            Self::Restart => "restart",
            Self::SetSpeed { .. } => "set_speed",
            Self::SetMode { .. } => "set_mode",
            Self::PlayerMessage { .. } => "player_message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_kind_and_payload_tags() {
        let cmd = RuntimeCommand::SetSpeed {
            speed: PlaybackSpeed::X2,
        };
        let encoded = serde_json::to_value(&cmd).expect("encode");
        assert_eq!(
            encoded,
            serde_json::json!({"kind": "set_speed", "payload": {"speed": "2x"}})
        );

        let next: RuntimeCommand =
            serde_json::from_str(r#"{"kind": "next_step"}"#).expect("decode unit variant");
        assert_eq!(next, RuntimeCommand::NextStep);
    }

    #[test]
    fn pause_has_no_interval() {
        assert_eq!(PlaybackSpeed::Pause.nominal_interval_ms(), None);
        assert!(
            PlaybackSpeed::X3.nominal_interval_ms() < PlaybackSpeed::X1.nominal_interval_ms()
        );
    }
}
