//! EPUB output: package assembly from chapter records, and the zip container writer.

pub mod package;
mod writer;

pub use package::{
    assemble, chapter_filename, chapter_id, MediaType, Package, PackageEntry, PackageOptions,
    TocPoint,
};
pub use writer::write_package;

use thiserror::Error;

/// Errors from packaging. Fatal to a run; no partial file is left at the destination.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Cannot write EPUB: inconsistent package: {detail}")]
    DanglingReference { detail: String },

    #[error("Failed to create EPUB file: {path}: {source}")]
    CreateFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move finished EPUB into place: {path}: {source}")]
    Persist {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write EPUB archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<std::io::Error> for PackageError {
    fn from(e: std::io::Error) -> Self {
        PackageError::Zip(zip::result::ZipError::Io(e))
    }
}

pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
