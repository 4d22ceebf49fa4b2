use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use metadata_cleaner::config;
use metadata_cleaner::deps::{self, DependencyStatus};
use metadata_cleaner::pipeline::{Action, CleanOptions, CleanReport, CleanResult, Cleaner};

#[derive(Parser, Debug)]
#[command(
    name = "metadata-cleaner",
    version,
    about = "Remove EXIF data and metadata from AI-generated images and videos"
)]
struct Cli {
    /// Image or video files to clean
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Clean all supported files in a directory
    #[arg(short, long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Process subdirectories (with --directory)
    #[arg(short, long)]
    recursive: bool,

    /// Keep a .bak copy of every file before cleaning it
    #[arg(short, long)]
    backup: bool,

    /// Show what would be cleaned without modifying files
    #[arg(long)]
    dry_run: bool,

    /// Capture exiftool/ffmpeg output instead of printing it
    #[arg(short, long)]
    quiet: bool,

    /// Re-inspect cleaned files and warn if metadata remains
    #[arg(long)]
    verify: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Check that exiftool and ffmpeg are installed and exit
    #[arg(long = "check-deps")]
    check_deps: bool,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let mut config = config::Config::load(cli.config.as_deref())?;

    // CLI flags only ever switch these on
    config.output.dry_run |= cli.dry_run;
    config.output.backup_originals |= cli.backup;
    config.output.recursive |= cli.recursive;

    let cleaner = Cleaner::new(config);
    let status = cleaner.check_dependencies();

    // Handle --check-deps
    if cli.check_deps {
        print_dependency_report(&status);
        if !status.has_dependencies {
            anyhow::bail!("Missing dependencies: {}", status.missing.join(", "));
        }
        return Ok(());
    }

    let dry_run = cleaner.config().output.dry_run;
    if !status.has_dependencies {
        if dry_run {
            log::warn!(
                "Missing dependencies: {} (ignored for dry run)",
                status.missing.join(", ")
            );
        } else {
            print_dependency_report(&status);
            anyhow::bail!("Missing dependencies: {}", status.missing.join(", "));
        }
    }

    if cli.files.is_empty() && cli.directory.is_none() {
        anyhow::bail!("No input files or directory specified. Use --help for usage.");
    }

    let options = CleanOptions {
        silent: cli.quiet || cli.json,
        verify: cli.verify,
        ..CleanOptions::from_output(&cleaner.config().output)
    };

    if dry_run {
        log::info!("DRY RUN: no files will be modified");
    }

    let mut report = CleanReport::default();
    if let Some(ref dir) = cli.directory {
        let dir_report = cleaner.clean_directory(dir, &options).await?;
        report.results.extend(dir_report.results);
    }
    if !cli.files.is_empty() {
        let files_report = cleaner.clean_files(&cli.files, &options).await?;
        report.results.extend(files_report.results);
    }

    if dry_run && !cli.json {
        for result in &report.results {
            print_dry_run(result);
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.results)?);
    }

    let (done, verb) = if dry_run {
        (report.would_clean(), "would be cleaned")
    } else {
        (report.cleaned(), "cleaned")
    };
    log::info!(
        "Done: {done} {verb}, {} skipped, {} failed out of {} file(s)",
        report.skipped(),
        report.failed(),
        report.total()
    );

    report.into_result()?;
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Dependency status plus installation instructions.
fn print_dependency_report(status: &DependencyStatus) {
    if status.has_dependencies {
        println!("{GREEN}[INFO]{RESET} All dependencies are installed (exiftool, ffmpeg).");
        return;
    }

    println!(
        "{YELLOW}[WARNING]{RESET} This tool requires the following dependencies: {}",
        status.missing.join(", ")
    );
    println!("{GREEN}[INFO]{RESET} Installation instructions:");
    for hint in deps::install_hints() {
        println!("  {hint}");
    }
    println!();
    println!("Usage examples:");
    println!("  metadata-cleaner image.jpg");
    println!("  metadata-cleaner -b image.jpg");
    println!("  metadata-cleaner -d /path/to/images");
    println!("  metadata-cleaner --dry-run -r -d /path/to/images");
    println!();
}

/// Show what a dry run found for one file.
fn print_dry_run(result: &CleanResult) {
    println!();
    println!("{BOLD}File:{RESET} {}", result.path.display());
    println!("  {DIM}{}{RESET}", "─".repeat(70));

    match result.action {
        Action::WouldClean => {
            let tool = result.tool.as_deref().unwrap_or("?");
            println!("  {GREEN}Would clean with {tool}{RESET}");
        }
        Action::Skipped => {
            let reason = result.error.as_deref().unwrap_or("unsupported");
            println!("  {DIM}Skipped: {reason}{RESET}");
            return;
        }
        Action::Failed => {
            println!("  {RED}Error: {}{RESET}", result.error.as_deref().unwrap_or("unknown"));
            return;
        }
        Action::Cleaned => {}
    }

    let Some(ref summary) = result.metadata else {
        return;
    };
    if summary.is_empty() {
        println!("  {DIM}(no identifying metadata found){RESET}");
        return;
    }
    for (tag, value) in summary.fields() {
        print_row(tag, value);
    }
    if summary.has_gps {
        print_row("GPS", "present");
    }
}

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print a single row in the metadata table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
