//! External tool discovery.
//!
//! [`ToolPaths`] resolves `exiftool` and `ffmpeg` either from the configured
//! overrides or from `PATH`, and [`check_dependencies`] reports which of them
//! are missing.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;

pub const EXIFTOOL: &str = "exiftool";
pub const FFMPEG: &str = "ffmpeg";

/// Tools every cleaning run needs.
pub const REQUIRED_TOOLS: &[&str] = &[EXIFTOOL, FFMPEG];

/// Result of a dependency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub has_dependencies: bool,
    /// Missing tools, in [`REQUIRED_TOOLS`] order.
    pub missing: Vec<String>,
}

/// Resolved locations of the external tools.
#[derive(Debug, Clone, Default)]
pub struct ToolPaths {
    tools: HashMap<&'static str, PathBuf>,
}

impl ToolPaths {
    /// Discover the required tools.
    ///
    /// A configured path wins when it exists; otherwise [`which::which`]
    /// searches `PATH`. Tools that cannot be found are left out.
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in REQUIRED_TOOLS {
            let custom = match name {
                EXIFTOOL => config.exiftool_path.as_deref(),
                FFMPEG => config.ffmpeg_path.as_deref(),
                _ => None,
            };

            let resolved = match custom {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    log::warn!(
                        "Configured {name} path {} does not exist, searching PATH",
                        p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    log::debug!("Found {name} at {}", path.display());
                    tools.insert(name, path);
                }
                None => log::debug!("{name} not found"),
            }
        }

        Self { tools }
    }

    /// Path of the given tool, or an error if it was not found.
    pub fn require(&self, name: &str) -> Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| anyhow::anyhow!("{name} not found; is it installed and in PATH?"))
    }

    pub fn status(&self) -> DependencyStatus {
        let missing: Vec<String> = REQUIRED_TOOLS
            .iter()
            .filter(|name| !self.tools.contains_key(*name))
            .map(|name| name.to_string())
            .collect();

        DependencyStatus {
            has_dependencies: missing.is_empty(),
            missing,
        }
    }
}

/// Check whether `exiftool` and `ffmpeg` are available.
pub fn check_dependencies(config: &ToolsConfig) -> DependencyStatus {
    ToolPaths::discover(config).status()
}

/// Installation instructions for the current platform.
pub fn install_hints() -> Vec<&'static str> {
    if cfg!(target_os = "macos") {
        vec!["brew install exiftool ffmpeg"]
    } else if cfg!(target_os = "linux") {
        vec![
            "Ubuntu/Debian: sudo apt install libimage-exiftool-perl ffmpeg",
            "CentOS/RHEL: sudo yum install perl-Image-ExifTool ffmpeg",
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            "Windows: Download from https://exiftool.org/ and https://ffmpeg.org/download.html",
            "Or use Chocolatey: choco install exiftool ffmpeg",
        ]
    } else {
        vec!["Download from https://exiftool.org/ and https://ffmpeg.org/download.html"]
    }
}
