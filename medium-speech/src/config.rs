//! medium-speech configuration.
//!
//! Loaded from `~/.config/cli-programs/medium-speech.toml`; every field is
//! optional and command-line flags take precedence.

use crate::playback::DEFAULT_PLAYER;
use crate::source::DEFAULT_EXPORTER_IMAGE;
use crate::text::{DEFAULT_CHUNK_BOUND, DEFAULT_TAB_WIDTH};
use crate::workdir::WorkDir;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tts_client::ProviderConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Language of the article (e.g. "en", "en-us", "fr")
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Request slower speech
    #[serde(default)]
    pub slow: bool,

    /// Player program used for playback
    #[serde(default = "default_player")]
    pub player: String,

    /// Playback rate (0.25-4.0)
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Times each track is played
    #[serde(default = "default_loops")]
    pub loops: u32,

    /// Directory for generated audio. None means a directory under the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,

    /// Maximum number of lines per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Columns a tab expands to when parsing Markdown
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,

    /// Synthesis requests in flight at once
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Retries for rate-limited or failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Docker image that exports posts to Markdown
    #[serde(default = "default_exporter_image")]
    pub exporter_image: String,

    /// Limit in seconds for each docker invocation (image pull, export)
    #[serde(default = "default_export_timeout_secs")]
    pub export_timeout_secs: u64,

    /// Limit in seconds for the URL reachability check
    #[serde(default = "default_url_check_timeout_secs")]
    pub url_check_timeout_secs: u64,

    /// Speech provider settings
    #[serde(default)]
    pub tts: ProviderConfig,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_player() -> String {
    DEFAULT_PLAYER.to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_loops() -> u32 {
    1
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_BOUND
}

fn default_tab_width() -> usize {
    DEFAULT_TAB_WIDTH
}

fn default_jobs() -> usize {
    1
}

fn default_max_retries() -> u32 {
    2
}

fn default_exporter_image() -> String {
    DEFAULT_EXPORTER_IMAGE.to_string()
}

fn default_export_timeout_secs() -> u64 {
    600
}

fn default_url_check_timeout_secs() -> u64 {
    10
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            slow: false,
            player: default_player(),
            speed: default_speed(),
            loops: default_loops(),
            workdir: None,
            chunk_size: default_chunk_size(),
            tab_width: default_tab_width(),
            jobs: default_jobs(),
            max_retries: default_max_retries(),
            exporter_image: default_exporter_image(),
            export_timeout_secs: default_export_timeout_secs(),
            url_check_timeout_secs: default_url_check_timeout_secs(),
            tts: ProviderConfig::default(),
        }
    }
}

impl SpeechConfig {
    /// Get the config file path: ~/.config/cli-programs/medium-speech.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("medium-speech.toml"))
    }

    /// Load config from the default location, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SpeechConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be at least 1");
        }
        if self.tab_width == 0 {
            anyhow::bail!("tab_width must be at least 1");
        }
        if self.jobs == 0 {
            anyhow::bail!("jobs must be at least 1");
        }
        if self.export_timeout_secs == 0 || self.url_check_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least 1 second");
        }
        if self.loops == 0 {
            anyhow::bail!("loops must be at least 1");
        }
        if !(0.25..=4.0).contains(&self.speed) {
            anyhow::bail!("speed must be between 0.25 and 4.0, got {}", self.speed);
        }
        if self.player.trim().is_empty() {
            anyhow::bail!("player must not be empty");
        }
        tts_client::lang::resolve(&self.lang)
            .with_context(|| format!("Invalid language '{}'", self.lang))?;
        Ok(())
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }

    pub fn url_check_timeout(&self) -> Duration {
        Duration::from_secs(self.url_check_timeout_secs)
    }

    /// Working directory for audio artifacts.
    pub fn workdir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(WorkDir::default_path)
    }
}
