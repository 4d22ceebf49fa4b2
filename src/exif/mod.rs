//! Read-only inspection of EXIF and track metadata.
//!
//! [`read_metadata`] reports what identifying data a file carries before and
//! after cleaning. Removal itself is always delegated to the external tools
//! in [`crate::strip`].

mod reader;

pub use reader::{MetadataSource, MetadataSummary, read_metadata};
