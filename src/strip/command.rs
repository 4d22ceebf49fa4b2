//! Builder for running an external tool with a timeout.

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Where a tool's stdout/stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Relay straight to the terminal.
    #[default]
    Inherit,
    /// Collect into [`ToolOutput`].
    Capture,
}

/// Output of a finished tool run. Both streams are empty in
/// [`StdioMode::Inherit`].
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// A single external tool invocation.
///
/// ```no_run
/// use metadata_cleaner::strip::{StdioMode, ToolCommand};
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("exiftool"))
///     .arg("-ver")
///     .stdio(StdioMode::Capture)
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
    stdio: StdioMode,
}

impl ToolCommand {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            stdio: StdioMode::default(),
        }
    }

    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    pub fn stdio(&mut self, mode: StdioMode) -> &mut Self {
        self.stdio = mode;
        self
    }

    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the tool to completion.
    ///
    /// Fails when the process cannot be spawned, exceeds its timeout (the
    /// child is killed), or exits with a non-zero status. The error message
    /// carries the tool's stderr when it was captured.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let name = self.program_name();
        log::debug!("Running {} {:?}", self.program.display(), self.args);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match self.stdio {
            StdioMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            StdioMode::Capture => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {name}"))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.with_context(|| format!("I/O error waiting for {name}"))?,
            Err(_elapsed) => {
                anyhow::bail!("{name} timed out after {:?}", self.timeout)
            }
        };

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            let stderr = tool_output.stderr.trim();
            if stderr.is_empty() {
                anyhow::bail!("{name} exited with {}", output.status);
            }
            anyhow::bail!("{name} exited with {}: {stderr}", output.status);
        }

        Ok(tool_output)
    }
}
