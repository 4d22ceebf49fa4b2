use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{StdioMode, Stripper, ToolCommand, ToolOutput};
use crate::pipeline::MediaKind;

pub struct ExifToolStripper {
    program: PathBuf,
    timeout: Duration,
}

impl ExifToolStripper {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }
}

/// `exiftool -all= -overwrite_original <file>`: delete every writable tag
/// and rewrite the file without leaving an `_original` copy behind.
pub fn exiftool_args(path: &Path) -> Vec<OsString> {
    vec!["-all=".into(), "-overwrite_original".into(), file_arg(path)]
}

/// exiftool reads any argument starting with `-` as an option.
fn file_arg(path: &Path) -> OsString {
    if path.as_os_str().as_encoded_bytes().starts_with(b"-") {
        Path::new(".").join(path).into_os_string()
    } else {
        path.as_os_str().to_os_string()
    }
}

#[async_trait::async_trait]
impl Stripper for ExifToolStripper {
    fn name(&self) -> &str {
        "exiftool"
    }

    fn handles(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Image
    }

    async fn strip(&self, path: &Path, stdio: StdioMode) -> Result<ToolOutput> {
        ToolCommand::new(self.program.clone())
            .args(exiftool_args(path))
            .timeout(self.timeout)
            .stdio(stdio)
            .execute()
            .await
    }
}
