use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{StdioMode, Stripper, ToolCommand, ToolOutput};
use crate::pipeline::MediaKind;

/// Marker between the stem and extension of in-flight output files.
pub(crate) const TEMP_MARKER: &str = ".cleaning";

pub struct FfmpegStripper {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegStripper {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }
}

/// Arguments for a metadata-free stream copy of `input` into `output`.
///
/// Global and per-stream metadata and chapters are dropped, every stream is
/// kept, and the bitexact flags stop ffmpeg from writing its own encoder tag.
pub fn ffmpeg_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-i",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(input.as_os_str().to_os_string());
    args.extend(
        [
            "-map",
            "0",
            "-map_metadata",
            "-1",
            "-map_chapters",
            "-1",
            "-c",
            "copy",
            "-fflags",
            "+bitexact",
            "-flags:v",
            "+bitexact",
            "-flags:a",
            "+bitexact",
        ]
        .iter()
        .map(OsString::from),
    );
    args.push(output.as_os_str().to_os_string());
    args
}

/// Create an empty sibling of `path` for ffmpeg to write into.
///
/// The extension is preserved so ffmpeg picks the same container format.
fn temp_sibling(path: &Path) -> Result<tempfile::TempPath> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = match path.extension() {
        Some(ext) => format!("{TEMP_MARKER}.{}", ext.to_string_lossy()),
        None => TEMP_MARKER.to_string(),
    };

    let file = tempfile::Builder::new()
        .prefix(&format!(".{stem}."))
        .suffix(&suffix)
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    Ok(file.into_temp_path())
}

#[async_trait::async_trait]
impl Stripper for FfmpegStripper {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn handles(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Video
    }

    async fn strip(&self, path: &Path, stdio: StdioMode) -> Result<ToolOutput> {
        // The cleaned copy must replace the real file, not a symlink to it.
        let target = std::fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;

        // Dropping `tmp` on any early return removes the partial output.
        let tmp = temp_sibling(&target)?;

        let output = ToolCommand::new(self.program.clone())
            .args(ffmpeg_args(&target, &tmp))
            .timeout(self.timeout)
            .stdio(stdio)
            .execute()
            .await?;

        let permissions = std::fs::metadata(&target)
            .context("Failed to read original file permissions")?
            .permissions();
        std::fs::set_permissions(&tmp, permissions)
            .context("Failed to copy permissions to cleaned file")?;

        tmp.persist(&target)
            .with_context(|| format!("Failed to replace {}", target.display()))?;
        log::debug!("Replaced {} with cleaned copy", target.display());

        Ok(output)
    }
}
