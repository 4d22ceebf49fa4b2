mod command;
mod exiftool;
mod ffmpeg;

pub use command::{StdioMode, ToolCommand, ToolOutput};
pub use exiftool::{ExifToolStripper, exiftool_args};
pub use ffmpeg::{FfmpegStripper, ffmpeg_args};
pub(crate) use ffmpeg::TEMP_MARKER;

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use crate::deps::{self, ToolPaths};
use crate::pipeline::MediaKind;

/// Removes metadata from a file in place by delegating to an external tool.
///
/// The library ships with [`ExifToolStripper`] for images and
/// [`FfmpegStripper`] for videos.
///
/// # Example
///
/// ```rust,no_run
/// use metadata_cleaner::strip::{ExifToolStripper, StdioMode, Stripper};
/// use std::path::Path;
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let stripper = ExifToolStripper::new("exiftool".into(), Duration::from_secs(60));
/// stripper.strip(Path::new("photo.jpg"), StdioMode::Capture).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait Stripper: Send + Sync {
    /// Display name (the tool it runs).
    fn name(&self) -> &str;
    /// Whether this stripper handles files of the given kind.
    fn handles(&self, kind: MediaKind) -> bool;
    /// Strip all metadata from `path`, replacing the file.
    async fn strip(&self, path: &Path, stdio: StdioMode) -> Result<ToolOutput>;
}

/// Build the stripper responsible for `kind`.
///
/// Fails when the tool it needs was not discovered.
pub fn stripper_for(
    kind: MediaKind,
    tools: &ToolPaths,
    timeout: Duration,
) -> Result<Box<dyn Stripper>> {
    let stripper: Box<dyn Stripper> = match kind {
        MediaKind::Image => Box::new(ExifToolStripper::new(
            tools.require(deps::EXIFTOOL)?.to_path_buf(),
            timeout,
        )),
        MediaKind::Video => Box::new(FfmpegStripper::new(
            tools.require(deps::FFMPEG)?.to_path_buf(),
            timeout,
        )),
    };
    debug_assert!(stripper.handles(kind));
    Ok(stripper)
}
