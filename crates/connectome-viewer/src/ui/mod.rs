pub mod health;
pub mod hud;
pub mod layout;
pub mod ledger;
pub mod panel;
pub mod prompt;
pub mod tooltips;

use bevy::prelude::Resource;

use crate::util::config::ViewerConfig;

pub use hud::hud_overlay;
pub use layout::UiLayout;
pub use panel::{inspector_panel, ui_panel};
pub use prompt::player_prompt;

pub const PANEL_W: f32 = 280.0;
pub const INSPECTOR_W: f32 = 320.0;

/// Form state owned by the panels; not part of the scene.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PanelState {
    pub search_query: String,
    pub threshold_pct: u32,
    pub hops: u32,
    pub prompt_open: bool,
    pub prompt_text: String,
}

impl PanelState {
    pub fn from_config(cfg: &ViewerConfig) -> Self {
        Self {
            search_query: String::new(),
            threshold_pct: cfg.search_threshold_pct.min(100),
            hops: cfg.search_hops,
            prompt_open: false,
            prompt_text: String::new(),
        }
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}
