use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Config, MediaConfig, OutputConfig};
use crate::deps::{self, DependencyStatus, ToolPaths};
use crate::exif::{self, MetadataSummary};
use crate::strip::{self, StdioMode};

/// How a file is cleaned, determined by its extension.
///
/// - **Image** files are rewritten in place by `exiftool`.
/// - **Video** files are stream-copied by `ffmpeg` into a sibling file that
///   then replaces the original.
///
/// Use [`MediaConfig::kind_of`] to classify a path.
///
/// # Example
///
/// ```rust
/// use metadata_cleaner::config::MediaConfig;
/// use metadata_cleaner::pipeline::MediaKind;
/// use std::path::Path;
///
/// let media = MediaConfig::default();
/// assert_eq!(media.kind_of(Path::new("render.png")), Some(MediaKind::Image));
/// assert_eq!(media.kind_of(Path::new("clip.mp4")), Some(MediaKind::Video));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// The external tool that cleans this kind of file.
    pub fn tool(&self) -> &'static str {
        match self {
            Self::Image => deps::EXIFTOOL,
            Self::Video => deps::FFMPEG,
        }
    }
}

/// Per-run options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Keep a `.bak` copy of each file before it is modified.
    pub backup: bool,
    /// Report what would be cleaned without touching any file.
    pub dry_run: bool,
    /// Descend into subdirectories in [`Cleaner::clean_directory`].
    pub recursive: bool,
    /// Capture tool output into the results instead of relaying it.
    pub silent: bool,
    /// Re-inspect each cleaned file and record what metadata remains.
    pub verify: bool,
}

impl CleanOptions {
    pub fn from_output(output: &OutputConfig) -> Self {
        Self {
            backup: output.backup_originals,
            dry_run: output.dry_run,
            recursive: output.recursive,
            ..Self::default()
        }
    }

    fn stdio(&self) -> StdioMode {
        if self.silent {
            StdioMode::Capture
        } else {
            StdioMode::Inherit
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Cleaned,
    WouldClean,
    Skipped,
    Failed,
}

/// The outcome of cleaning a single file.
#[derive(Debug, Clone, Serialize)]
pub struct CleanResult {
    pub path: PathBuf,
    pub kind: Option<MediaKind>,
    pub action: Action,
    /// Metadata found before cleaning.
    pub metadata: Option<MetadataSummary>,
    /// Metadata still present after cleaning (only with `verify`).
    pub remaining: Option<MetadataSummary>,
    pub backup_path: Option<PathBuf>,
    /// Tool that ran (or would run).
    pub tool: Option<String>,
    /// Captured tool output (only when `silent`).
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
}

impl CleanResult {
    fn new(path: &Path, kind: Option<MediaKind>) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            action: Action::Skipped,
            metadata: None,
            remaining: None,
            backup_path: None,
            tool: kind.map(|k| k.tool().to_string()),
            stdout: String::new(),
            stderr: String::new(),
            error: None,
        }
    }

    fn fail(mut self, error: impl std::fmt::Display) -> Self {
        self.action = Action::Failed;
        self.error = Some(error.to_string());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.action == Action::Failed
    }
}

/// Results of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub results: Vec<CleanResult>,
}

impl CleanReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.count(Action::Skipped)
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed() - self.skipped()
    }

    pub fn cleaned(&self) -> usize {
        self.count(Action::Cleaned)
    }

    /// Files a dry run found that a real run would clean.
    pub fn would_clean(&self) -> usize {
        self.count(Action::WouldClean)
    }

    fn count(&self, action: Action) -> usize {
        self.results.iter().filter(|r| r.action == action).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Turn a report with failures into an error.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed();
        if failed > 0 {
            anyhow::bail!("{failed} of {} file(s) failed", self.total());
        }
        Ok(self)
    }
}

/// Expand the given paths into the list of files to clean.
///
/// Files are kept as given (unsupported or missing ones are reported by
/// [`Cleaner::clean_file`]). Directories are walked recursively and
/// contribute only supported media files.
pub fn collect_files(paths: &[PathBuf], media: &MediaConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = walk(path, usize::MAX)
                .filter(|p| media.kind_of(p).is_some())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    files
}

/// List the supported media files in `dir`.
///
/// Only direct children are returned unless `recursive` is set. The result
/// is sorted.
pub fn collect_directory(
    dir: &Path,
    recursive: bool,
    media: &MediaConfig,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Directory not found: {}", dir.display());
    }

    let depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = walk(dir, depth)
        .filter(|p| media.kind_of(p).is_some())
        .collect();
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| !is_temp_artifact(p))
}

/// Leftovers of an interrupted ffmpeg run (`.<stem>.<random>.cleaning.<ext>`).
fn is_temp_artifact(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let base = name.rsplit_once('.').map_or(name, |(base, _)| base);
    let Some(prefix) = base
        .strip_suffix(strip::TEMP_MARKER)
        .or_else(|| name.strip_suffix(strip::TEMP_MARKER))
    else {
        return false;
    };
    // `.<stem>.<random>`
    prefix.starts_with('.') && prefix[1..].contains('.')
}

/// Create a backup of the original file as `<file>.<ext>.bak`.
///
/// An existing backup file is left untouched so repeated runs never
/// overwrite the first copy of the original. Anything else already at the
/// backup path is an error.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = match path.extension() {
        Some(ext) => path.with_extension(format!("{}.bak", ext.to_string_lossy())),
        None => path.with_extension("bak"),
    };

    if backup_path.is_file() {
        log::debug!("Keeping existing backup: {}", backup_path.display());
    } else if backup_path.exists() {
        anyhow::bail!(
            "Failed to create backup: {} exists and is not a file",
            backup_path.display()
        );
    } else {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Cleans files by dispatching them to `exiftool` or `ffmpeg`.
///
/// # Example
///
/// ```rust,no_run
/// use metadata_cleaner::config::Config;
/// use metadata_cleaner::pipeline::{CleanOptions, Cleaner};
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let cleaner = Cleaner::new(Config::default());
/// let status = cleaner.check_dependencies();
/// if !status.has_dependencies {
///     eprintln!("Missing: {}", status.missing.join(", "));
///     return Ok(());
/// }
///
/// let options = CleanOptions { backup: true, ..CleanOptions::default() };
/// let report = cleaner.clean_directory(Path::new("./renders"), &options).await?;
/// println!("{} cleaned, {} failed", report.succeeded(), report.failed());
/// # Ok(())
/// # }
/// ```
pub struct Cleaner {
    config: Config,
    tools: ToolPaths,
}

impl Cleaner {
    /// Create a cleaner, discovering the external tools.
    pub fn new(config: Config) -> Self {
        let tools = ToolPaths::discover(&config.tools);
        Self { config, tools }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn check_dependencies(&self) -> DependencyStatus {
        self.tools.status()
    }

    /// Clean a single file.
    ///
    /// Never returns an error: failures are recorded in the result so a
    /// batch can continue past a bad file.
    pub async fn clean_file(&self, path: &Path, options: &CleanOptions) -> CleanResult {
        let kind = self.config.media.kind_of(path);
        let mut result = CleanResult::new(path, kind);

        if !path.is_file() {
            return result.fail("File not found");
        }

        let Some(kind) = kind else {
            log::warn!("Skipping unsupported file: {}", path.display());
            result.error = Some("Unsupported file type".to_string());
            return result;
        };

        match exif::read_metadata(path) {
            Ok(summary) => result.metadata = Some(summary),
            Err(e) => log::warn!("Failed to inspect {}: {e}", path.display()),
        }

        if options.dry_run {
            result.action = Action::WouldClean;
            return result;
        }

        let stripper = match strip::stripper_for(kind, &self.tools, self.config.timeout()) {
            Ok(s) => s,
            Err(e) => return result.fail(e),
        };

        if options.backup {
            match backup_file(path) {
                Ok(backup) => result.backup_path = Some(backup),
                Err(e) => return result.fail(format!("{e:#}")),
            }
        }

        match stripper.strip(path, options.stdio()).await {
            Ok(output) => {
                result.action = Action::Cleaned;
                result.stdout = output.stdout;
                result.stderr = output.stderr;
            }
            Err(e) => return result.fail(format!("{e:#}")),
        }

        if options.verify {
            match exif::read_metadata(path) {
                Ok(summary) => {
                    if !summary.is_empty() {
                        log::warn!("Metadata remains in {}", path.display());
                    }
                    result.remaining = Some(summary);
                }
                Err(e) => log::warn!("Failed to re-inspect {}: {e}", path.display()),
            }
        }

        result
    }

    /// Clean the given files; directories in the list are expanded
    /// recursively.
    pub async fn clean_files(
        &self,
        paths: &[PathBuf],
        options: &CleanOptions,
    ) -> Result<CleanReport> {
        if paths.is_empty() {
            anyhow::bail!("No files specified");
        }
        let files = collect_files(paths, &self.config.media);
        Ok(self.clean_all(&files, options).await)
    }

    /// Clean the supported media files in a directory.
    pub async fn clean_directory(
        &self,
        dir: &Path,
        options: &CleanOptions,
    ) -> Result<CleanReport> {
        let files = collect_directory(dir, options.recursive, &self.config.media)?;
        if files.is_empty() {
            log::info!("No supported media files found in {}", dir.display());
        }
        Ok(self.clean_all(&files, options).await)
    }

    async fn clean_all(&self, files: &[PathBuf], options: &CleanOptions) -> CleanReport {
        let total = files.len();
        let mut report = CleanReport::default();

        for (i, path) in files.iter().enumerate() {
            log::info!("[{}/{}] Cleaning: {}", i + 1, total, path.display());
            let result = self.clean_file(path, options).await;

            let tool = result.tool.as_deref().unwrap_or("?");
            match result.action {
                Action::Cleaned => log::info!("  Cleaned with {tool}"),
                Action::WouldClean => log::info!("  Would clean with {tool}"),
                Action::Skipped => {}
                Action::Failed => {
                    log::error!("  Error: {}", result.error.as_deref().unwrap_or("unknown"))
                }
            }

            report.results.push(result);
        }

        report
    }
}

/// Clean a single file with a one-shot [`Cleaner`].
pub async fn clean_file(path: &Path, options: &CleanOptions, config: &Config) -> CleanResult {
    Cleaner::new(config.clone()).clean_file(path, options).await
}

/// Clean several files with a one-shot [`Cleaner`].
pub async fn clean_files(
    paths: &[PathBuf],
    options: &CleanOptions,
    config: &Config,
) -> Result<CleanReport> {
    Cleaner::new(config.clone()).clean_files(paths, options).await
}

/// Clean a directory with a one-shot [`Cleaner`].
pub async fn clean_directory(
    dir: &Path,
    options: &CleanOptions,
    config: &Config,
) -> Result<CleanReport> {
    Cleaner::new(config.clone()).clean_directory(dir, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn media() -> MediaConfig {
        MediaConfig::default()
    }

    /// A config whose tools point at paths that do not exist and cannot be
    /// found in `PATH`.
    fn config_without_tools(dir: &Path) -> Config {
        let mut config = Config::default();
        config.tools.exiftool_path = Some(dir.join("no-exiftool"));
        config.tools.ffmpeg_path = Some(dir.join("no-ffmpeg"));
        config
    }

    /// Write an executable shell script.
    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Stand-ins for the real tools: the exiftool stub truncates the file,
    /// the ffmpeg stub copies its input to its last argument.
    #[cfg(unix)]
    fn config_with_stub_tools(bin: &Path) -> Config {
        let exiftool = write_script(
            bin,
            "exiftool",
            r#"for last; do :; done
echo "    1 image files updated"
printf 'clean' > "$last""#,
        );
        let ffmpeg = write_script(
            bin,
            "ffmpeg",
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-i" ]; then input="$2"; fi
  last="$1"
  shift
done
cp "$input" "$last""#,
        );

        let mut config = Config::default();
        config.tools.exiftool_path = Some(exiftool);
        config.tools.ffmpeg_path = Some(ffmpeg);
        config.tools.timeout_secs = 10;
        config
    }

    // ── collect_directory ────────────────────────────────────────────

    #[test]
    fn collect_directory_top_level_only() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(dir.path().join("b.mp4"), b"fake").unwrap();
        fs::write(dir.path().join("notes.txt"), b"fake").unwrap();
        fs::write(sub.join("c.png"), b"fake").unwrap();

        let files = collect_directory(dir.path(), false, &media()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.jpg"), dir.path().join("b.mp4")]
        );
    }

    #[test]
    fn collect_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("c.png"), b"fake").unwrap();
        fs::write(sub.join("d.txt"), b"fake").unwrap();

        let files = collect_directory(dir.path(), true, &media()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains(&sub.join("c.png")));
    }

    #[test]
    fn collect_directory_missing_dir_is_error() {
        let err = collect_directory(Path::new("/nonexistent/dir"), false, &media()).unwrap_err();
        assert!(err.to_string().contains("Directory not found"));
    }

    #[test]
    fn collect_directory_ignores_temp_artifacts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("clip.mp4"), b"fake").unwrap();
        fs::write(dir.path().join(".clip.a1b2c3.cleaning.mp4"), b"partial").unwrap();

        let files = collect_directory(dir.path(), false, &media()).unwrap();
        assert_eq!(files, vec![dir.path().join("clip.mp4")]);
    }

    #[test]
    fn hidden_files_that_only_mention_cleaning_are_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".spring.cleaning-day.jpg"), b"fake").unwrap();
        fs::write(dir.path().join(".cleaning.jpg"), b"fake").unwrap();
        fs::write(dir.path().join(".render.Xy12.cleaning.png"), b"partial").unwrap();

        let files = collect_directory(dir.path(), false, &media()).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join(".cleaning.jpg"),
                dir.path().join(".spring.cleaning-day.jpg"),
            ]
        );
    }

    // ── collect_files ────────────────────────────────────────────────

    #[test]
    fn collect_files_keeps_explicit_files_and_expands_dirs() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        let sub = dir.path().join("folder");
        fs::create_dir(&sub).unwrap();
        fs::write(&txt, b"hello").unwrap();
        fs::write(sub.join("deep.heic"), b"fake").unwrap();
        fs::write(sub.join("skip.txt"), b"fake").unwrap();

        let files = collect_files(&[txt.clone(), sub.clone()], &media());
        assert_eq!(files, vec![txt, sub.join("deep.heic")]);
    }

    // ── backup_file ──────────────────────────────────────────────────

    #[test]
    fn backup_appends_bak_and_keeps_first_copy() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"original").unwrap();

        let backup = backup_file(&jpg).unwrap();
        assert_eq!(backup, dir.path().join("photo.jpg.bak"));
        assert_eq!(fs::read(&backup).unwrap(), b"original");

        fs::write(&jpg, b"changed").unwrap();
        backup_file(&jpg).unwrap();
        assert_eq!(fs::read(&backup).unwrap(), b"original");
    }

    #[test]
    fn backup_path_taken_by_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"original").unwrap();
        fs::create_dir(dir.path().join("photo.jpg.bak")).unwrap();

        let err = backup_file(&jpg).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }

    // ── CleanReport ──────────────────────────────────────────────────

    #[test]
    fn report_counts() {
        let ok = CleanResult {
            action: Action::Cleaned,
            ..CleanResult::new(Path::new("a.jpg"), Some(MediaKind::Image))
        };
        let skipped = CleanResult::new(Path::new("a.txt"), None);
        let failed = CleanResult::new(Path::new("b.mp4"), Some(MediaKind::Video)).fail("boom");

        let report = CleanReport {
            results: vec![ok, skipped, failed],
        };
        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.cleaned(), 1);
        assert_eq!(report.would_clean(), 0);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());

        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 file(s) failed");
    }

    #[test]
    fn dry_run_results_are_not_counted_as_cleaned() {
        let would = CleanResult {
            action: Action::WouldClean,
            ..CleanResult::new(Path::new("a.png"), Some(MediaKind::Image))
        };
        let report = CleanReport {
            results: vec![would],
        };
        assert_eq!(report.cleaned(), 0);
        assert_eq!(report.would_clean(), 1);
        assert!(report.is_success());
    }

    // ── Cleaner ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn dry_run_touches_nothing_and_needs_no_tools() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"original").unwrap();

        let cleaner = Cleaner::new(config_without_tools(dir.path()));
        let options = CleanOptions {
            dry_run: true,
            backup: true,
            ..CleanOptions::default()
        };
        let result = cleaner.clean_file(&jpg, &options).await;

        assert_eq!(result.action, Action::WouldClean);
        assert_eq!(result.tool.as_deref(), Some("exiftool"));
        assert_eq!(fs::read(&jpg).unwrap(), b"original");
        assert!(!dir.path().join("photo.jpg.bak").exists());
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let cleaner = Cleaner::new(config_without_tools(dir.path()));
        let result = cleaner
            .clean_file(&dir.path().join("ghost.jpg"), &CleanOptions::default())
            .await;
        assert_eq!(result.action, Action::Failed);
        assert_eq!(result.error.as_deref(), Some("File not found"));
    }

    #[tokio::test]
    async fn unsupported_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, b"hello").unwrap();

        let cleaner = Cleaner::new(config_without_tools(dir.path()));
        let result = cleaner.clean_file(&txt, &CleanOptions::default()).await;
        assert_eq!(result.action, Action::Skipped);
        assert!(result.kind.is_none());
    }

    #[tokio::test]
    async fn clean_files_empty_list_is_error() {
        let dir = TempDir::new().unwrap();
        let cleaner = Cleaner::new(config_without_tools(dir.path()));
        let err = cleaner
            .clean_files(&[], &CleanOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No files specified");
    }

    #[tokio::test]
    async fn clean_empty_directory_succeeds() {
        let dir = TempDir::new().unwrap();
        let cleaner = Cleaner::new(config_without_tools(dir.path()));
        let report = cleaner
            .clean_directory(dir.path(), &CleanOptions::default())
            .await
            .unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_tool_fails_file_without_modifying_it() {
        let dir = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let mut config = config_with_stub_tools(bin.path());
        config.tools.exiftool_path = None;
        let cleaner = Cleaner::new(config);
        // A real exiftool in PATH would be picked up instead.
        if cleaner.check_dependencies().missing.is_empty() {
            return;
        }

        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"original").unwrap();
        let result = cleaner.clean_file(&jpg, &CleanOptions::default()).await;

        assert_eq!(result.action, Action::Failed);
        assert!(result.error.unwrap().contains("exiftool not found"));
        assert_eq!(fs::read(&jpg).unwrap(), b"original");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn image_is_cleaned_with_backup_and_captured_output() {
        let dir = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"original").unwrap();

        let cleaner = Cleaner::new(config_with_stub_tools(bin.path()));
        assert!(cleaner.check_dependencies().has_dependencies);

        let options = CleanOptions {
            backup: true,
            silent: true,
            verify: true,
            ..CleanOptions::default()
        };
        let result = cleaner.clean_file(&jpg, &options).await;

        assert_eq!(result.action, Action::Cleaned, "{:?}", result.error);
        assert!(result.stdout.contains("1 image files updated"));
        assert_eq!(fs::read(&jpg).unwrap(), b"clean");
        assert_eq!(result.backup_path, Some(dir.path().join("photo.jpg.bak")));
        assert_eq!(fs::read(dir.path().join("photo.jpg.bak")).unwrap(), b"original");
        assert!(result.remaining.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn video_is_replaced_and_temp_file_removed() {
        let dir = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let mp4 = dir.path().join("clip.mp4");
        fs::write(&mp4, b"video bytes").unwrap();

        let cleaner = Cleaner::new(config_with_stub_tools(bin.path()));
        let options = CleanOptions {
            silent: true,
            ..CleanOptions::default()
        };
        let result = cleaner.clean_file(&mp4, &options).await;

        assert_eq!(result.action, Action::Cleaned, "{:?}", result.error);
        assert_eq!(result.tool.as_deref(), Some("ffmpeg"));
        assert_eq!(fs::read(&mp4).unwrap(), b"video bytes");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("clip.mp4")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn backup_failure_leaves_original_untouched() {
        let dir = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"original").unwrap();
        fs::create_dir(dir.path().join("photo.jpg.bak")).unwrap();

        let cleaner = Cleaner::new(config_with_stub_tools(bin.path()));
        let options = CleanOptions {
            backup: true,
            silent: true,
            ..CleanOptions::default()
        };
        let result = cleaner.clean_file(&jpg, &options).await;

        assert_eq!(result.action, Action::Failed);
        assert!(result.error.unwrap().contains("Failed to create backup"));
        assert!(result.backup_path.is_none());
        assert_eq!(fs::read(&jpg).unwrap(), b"original");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_video_cleans_the_target() {
        let bin = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let library = TempDir::new().unwrap();
        let real = store.path().join("real.mp4");
        let link = library.path().join("clip.mp4");
        fs::write(&real, b"DIRTY").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut config = config_with_stub_tools(bin.path());
        config.tools.ffmpeg_path = Some(write_script(
            bin.path(),
            "ffmpeg-clean",
            r#"for last; do :; done
printf 'CLEAN' > "$last""#,
        ));
        let cleaner = Cleaner::new(config);
        let options = CleanOptions {
            silent: true,
            ..CleanOptions::default()
        };
        let report = cleaner
            .clean_directory(library.path(), &options)
            .await
            .unwrap();

        assert_eq!(report.cleaned(), 1, "{:?}", report.results[0].error);
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&real).unwrap(), b"CLEAN");
        assert_eq!(fs::read_dir(store.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_is_reported_and_original_kept() {
        let dir = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let mut config = config_with_stub_tools(bin.path());
        config.tools.ffmpeg_path = Some(write_script(
            bin.path(),
            "broken-ffmpeg",
            "echo 'Invalid data found when processing input' >&2\nexit 1",
        ));
        let mp4 = dir.path().join("clip.mp4");
        fs::write(&mp4, b"video bytes").unwrap();

        let cleaner = Cleaner::new(config);
        let options = CleanOptions {
            silent: true,
            ..CleanOptions::default()
        };
        let result = cleaner.clean_file(&mp4, &options).await;

        assert_eq!(result.action, Action::Failed);
        assert!(result.error.unwrap().contains("Invalid data found"));
        assert_eq!(fs::read(&mp4).unwrap(), b"video bytes");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn directory_run_reports_every_file() {
        let dir = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("a.png"), b"png").unwrap();
        fs::write(dir.path().join("b.webm"), b"webm").unwrap();
        fs::write(sub.join("c.jpg"), b"jpg").unwrap();

        let cleaner = Cleaner::new(config_with_stub_tools(bin.path()));
        let options = CleanOptions {
            silent: true,
            recursive: true,
            ..CleanOptions::default()
        };
        let report = cleaner.clean_directory(dir.path(), &options).await.unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 3);
        assert!(report.into_result().is_ok());
    }
}
