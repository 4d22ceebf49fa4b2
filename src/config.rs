use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::MediaKind;

/// Default tool timeout: 5 minutes.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Top-level configuration for the metadata-cleaner library.
///
/// Controls where the external tools live, which file extensions are
/// treated as images or videos, and output behavior (dry run, backups).
///
/// # Loading
///
/// ```rust,no_run
/// use metadata_cleaner::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.tools.exiftool_path = Some("/opt/exiftool/exiftool".into());
/// config.output.backup_originals = true;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locations and limits of the external tools.
    pub tools: ToolsConfig,
    /// Which extensions are handled and how.
    pub media: MediaConfig,
    /// Output behavior (dry run, backups, recursion).
    pub output: OutputConfig,
}

/// Overrides for the external tools.
///
/// A configured path is only used when it exists; otherwise the tool is
/// looked up in `PATH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub exiftool_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    /// Maximum run time of a single tool invocation, in seconds.
    pub timeout_secs: u64,
}

/// File extensions (lower case, without the dot) per media kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub image_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, report what would be cleaned without modifying any files.
    pub dry_run: bool,
    /// If `true`, create a `.bak` copy before modifying a file.
    pub backup_originals: bool,
    /// If `true`, directory runs descend into subdirectories.
    pub recursive: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            exiftool_path: None,
            ffmpeg_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            image_extensions: owned(&[
                "jpg", "jpeg", "png", "tif", "tiff", "webp", "gif", "heic", "heif", "avif",
            ]),
            video_extensions: owned(&["mp4", "mov", "m4v", "avi", "mkv", "webm"]),
        }
    }
}

fn owned(exts: &[&str]) -> Vec<String> {
    exts.iter().map(|e| e.to_string()).collect()
}

impl MediaConfig {
    /// Classify a path by its (case-insensitive) extension.
    pub fn kind_of(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if self.image_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(MediaKind::Image)
        } else if self.video_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl Config {
    /// Resolve the config file path: `config.json` next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::debug!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Tool timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tools.timeout_secs)
    }
}
