use anyhow::{Context, Result};
use nom_exif::*;
use serde::Serialize;
use std::path::Path;

/// Where the metadata in a file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// Nothing nom-exif could parse.
    #[default]
    None,
    /// An EXIF block (JPEG, HEIF, TIFF, PNG, WebP, ...).
    Exif,
    /// Track/container metadata (MP4, MOV, MKV, ...).
    Track,
}

/// The identifying metadata present in a file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataSummary {
    pub source: MetadataSource,
    pub make: Option<String>,
    pub model: Option<String>,
    pub software: Option<String>,
    pub created: Option<String>,
    pub has_gps: bool,
}

impl MetadataSummary {
    /// True when no identifying field and no GPS position was found.
    pub fn is_empty(&self) -> bool {
        !self.has_gps && self.fields().is_empty()
    }

    /// Present fields as `(label, value)` pairs.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Make", self.make.as_deref()),
            ("Model", self.model.as_deref()),
            ("Software", self.software.as_deref()),
            ("Created", self.created.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
    }
}

/// Inspect the metadata currently stored in a file.
///
/// Files nom-exif cannot parse are reported as [`MetadataSource::None`];
/// only a file that cannot be opened is an error.
pub fn read_metadata(path: &Path) -> Result<MetadataSummary> {
    let file = std::fs::File::open(path).context("Failed to open media file")?;
    let ms = match MediaSource::seekable(file) {
        Ok(ms) => ms,
        Err(e) => {
            log::debug!("Unrecognized media format {}: {e}", path.display());
            return Ok(MetadataSummary::default());
        }
    };
    let mut parser = MediaParser::new();

    if ms.has_exif() {
        let iter: ExifIter = match parser.parse(ms) {
            Ok(iter) => iter,
            Err(e) => {
                log::debug!("No EXIF data found in {}: {e}", path.display());
                return Ok(MetadataSummary::default());
            }
        };

        // GPS has to be read before the iterator is consumed.
        let has_gps = iter.parse_gps_info().ok().flatten().is_some();
        let exif: Exif = iter.into();

        return Ok(MetadataSummary {
            source: MetadataSource::Exif,
            make: exif.get(ExifTag::Make).and_then(entry_to_string),
            model: exif.get(ExifTag::Model).and_then(entry_to_string),
            software: exif.get(ExifTag::Software).and_then(entry_to_string),
            created: exif.get(ExifTag::DateTimeOriginal).and_then(entry_to_string),
            has_gps,
        });
    }

    if ms.has_track() {
        let info: TrackInfo = match parser.parse(ms) {
            Ok(info) => info,
            Err(e) => {
                log::debug!("No track metadata found in {}: {e}", path.display());
                return Ok(MetadataSummary::default());
            }
        };

        return Ok(MetadataSummary {
            source: MetadataSource::Track,
            make: info.get(TrackInfoTag::Make).and_then(entry_to_string),
            model: info.get(TrackInfoTag::Model).and_then(entry_to_string),
            software: info.get(TrackInfoTag::Software).and_then(entry_to_string),
            created: info.get(TrackInfoTag::CreateDate).and_then(entry_to_string),
            has_gps: info.get(TrackInfoTag::GpsIso6709).is_some(),
        });
    }

    log::debug!("No metadata container in {}", path.display());
    Ok(MetadataSummary::default())
}

fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}
