use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::options::stem::DEFAULT_STEM_MAX_LEN;

/// External programs driven by the default collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable (name on PATH or absolute path).
    pub yt_dlp: String,
    /// ffmpeg executable used for video re-encoding.
    pub ffmpeg: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/grabflow/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabflowConfig {
    /// Directory every artifact of a workflow pass is written to.
    pub output_dir: PathBuf,
    /// Upper bound on the title-derived stem, in characters.
    pub stem_max_len: usize,
    /// Randomize displayed format sizes by ±10% (the sizes are approximate either way).
    pub size_jitter: bool,
    pub tools: ToolsConfig,
}

impl Default for GrabflowConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            stem_max_len: DEFAULT_STEM_MAX_LEN,
            size_jitter: true,
            tools: ToolsConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("grabflow")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GrabflowConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GrabflowConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GrabflowConfig = toml::from_str(&data)?;
    Ok(cfg)
}
