use anyhow::Context;
use connectome_core::{PlaybackMode, PlaybackSpeed};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BASE_URL_ENV: &str = "CONNECTOME_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub telemetry_path: String,
    pub graphs_path: String,
    pub graph_path: String,
    pub search_path: String,
    /// Where playback commands are POSTed. Playback is local-only when unset.
    pub runtime_path: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            telemetry_path: "/api/sse".to_string(),
            graphs_path: "/api/connectome/graphs".to_string(),
            graph_path: "/api/connectome/graph".to_string(),
            search_path: "/api/connectome/search".to_string(),
            runtime_path: None,
        }
    }
}

impl EndpointConfig {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub charge_strength: f32,
    pub charge_distance_max: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub center_x: f32,
    pub center_y: f32,

    pub graph_charge_strength: f32,
    pub graph_link_distance: f32,
    pub graph_link_strength: f32,
    pub graph_collision_radius: f32,
    pub graph_max_iterations: usize,

    /// Above this many nodes the force pass is time-sliced across frames.
    pub time_slice_threshold: usize,
    pub iterations_per_frame: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            charge_strength: -240.0,
            charge_distance_max: 900.0,
            link_distance: 220.0,
            link_strength: 0.08,
            center_x: 800.0,
            center_y: 520.0,
            graph_charge_strength: -120.0,
            graph_link_distance: 90.0,
            graph_link_strength: 0.04,
            graph_collision_radius: 44.0,
            graph_max_iterations: 300,
            time_slice_threshold: 300,
            iterations_per_frame: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub zoom_sensitivity: f32,
    pub label_min_scale: f32,
    pub label_max_nodes: usize,
    pub edge_label_min_scale: f32,
    pub click_threshold_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.05,
            max_scale: 5.0,
            zoom_sensitivity: 0.001,
            label_min_scale: 0.3,
            label_max_nodes: 600,
            edge_label_min_scale: 0.8,
            click_threshold_px: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub endpoints: EndpointConfig,
    pub fetch_timeout_secs: u64,
    pub telemetry_max_reconnects: u32,
    pub telemetry_retry_delay_ms: u64,
    pub graph_name: String,
    pub search_threshold_pct: u32,
    pub search_hops: u32,
    pub initial_mode: PlaybackMode,
    pub initial_speed: PlaybackSpeed,
    pub reveal_manifest_on_start: bool,
    pub manifest_path: Option<PathBuf>,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            fetch_timeout_secs: 30,
            telemetry_max_reconnects: 3,
            telemetry_retry_delay_ms: 2000,
            graph_name: "seed".to_string(),
            search_threshold_pct: 60,
            search_hops: 2,
            initial_mode: PlaybackMode::Stepper,
            initial_speed: PlaybackSpeed::X1,
            reveal_manifest_on_start: true,
            manifest_path: None,
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.endpoints.base_url = url.trim().to_string();
            }
        }
        self
    }
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "connectome")?;
    Some(proj.config_dir().join("viewer.toml"))
}

pub fn load_or_default() -> ViewerConfig {
    let cfg = match config_file_path() {
        Some(path) => load_or_default_from_path(&path),
        None => ViewerConfig::default(),
    };
    cfg.apply_env()
}

fn load_or_default_from_path(path: &Path) -> ViewerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ViewerConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "invalid viewer config, using defaults");
            ViewerConfig::default()
        }
    }
}

pub fn save(cfg: &ViewerConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

fn save_to_path(cfg: &ViewerConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize viewer config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write viewer config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn viewer_config_roundtrip_save_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        let mut cfg = ViewerConfig::default();
        cfg.endpoints.runtime_path = Some("/api/connectome/runtime".to_string());
        cfg.initial_mode = PlaybackMode::Realtime;

        save_to_path(&cfg, &path).expect("save config");
        let loaded = load_or_default_from_path(&path);

        assert_eq!(cfg, loaded);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        fs::write(
            &path,
            "graph_name = \"harbor\"\n[render]\nlabel_max_nodes = 50\n",
        )
        .expect("write");

        let loaded = load_or_default_from_path(&path);
        assert_eq!(loaded.graph_name, "harbor");
        assert_eq!(loaded.render.label_max_nodes, 50);
        assert_eq!(loaded.render.max_scale, 5.0);
        assert_eq!(loaded.fetch_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        fs::write(&path, "graph_name = [").expect("write");
        assert_eq!(load_or_default_from_path(&path), ViewerConfig::default());
    }

    #[test]
    fn endpoint_url_joins_without_double_slash() {
        let ep = EndpointConfig {
            base_url: "http://host:3000/".to_string(),
            ..Default::default()
        };
        assert_eq!(ep.url("/api/sse"), "http://host:3000/api/sse");
    }
}
