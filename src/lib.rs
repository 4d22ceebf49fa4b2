//! # metadata-cleaner
//!
//! Strip EXIF and container metadata from AI-generated images and videos.
//! Images are rewritten by `exiftool`, videos are stream-copied by `ffmpeg`;
//! this crate finds the tools, picks the files, runs the tools and reports
//! what happened.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metadata_cleaner::config::Config;
//! use metadata_cleaner::pipeline::{CleanOptions, Cleaner};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let cleaner = Cleaner::new(config);
//!
//!     let status = cleaner.check_dependencies();
//!     if !status.has_dependencies {
//!         anyhow::bail!("missing tools: {}", status.missing.join(", "));
//!     }
//!
//!     let options = CleanOptions { backup: true, silent: true, ..CleanOptions::default() };
//!     let report = cleaner
//!         .clean_files(&[PathBuf::from("render.png"), PathBuf::from("clip.mp4")], &options)
//!         .await?;
//!
//!     for result in &report.results {
//!         match &result.error {
//!             Some(err) => eprintln!("{}: {err}", result.path.display()),
//!             None => println!("{}: {:?}", result.path.display(), result.action),
//!         }
//!     }
//!
//!     report.into_result()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Kind | Default extensions | Tool |
//! |------|--------------------|------|
//! | Image | `jpg jpeg png tif tiff webp gif heic heif avif` | `exiftool -all=` |
//! | Video | `mp4 mov m4v avi mkv webm` | `ffmpeg -map_metadata -1 -c copy` |
//!
//! Extensions are configurable through [`config::MediaConfig`].
//!
//! ## Modules
//!
//! - [`config`]: Configuration types and loading/saving
//! - [`deps`]: Locating `exiftool` and `ffmpeg`
//! - [`exif`]: Read-only inspection of the metadata a file carries
//! - [`pipeline`]: File collection, backups and the [`pipeline::Cleaner`]
//! - [`strip`]: The external tool invocations

pub mod config;
pub mod deps;
pub mod exif;
pub mod pipeline;
pub mod strip;

pub use deps::{DependencyStatus, check_dependencies};
pub use pipeline::{
    CleanOptions, CleanReport, CleanResult, Cleaner, clean_directory, clean_file, clean_files,
};
