//! Error types for the survey grid store.

use std::path::PathBuf;

use thiserror::Error;

use crate::field::FieldKind;

/// Result type alias for grid store operations.
pub type Result<T> = std::result::Result<T, SgridError>;

/// Errors that can occur while creating, opening, or accessing a grid file.
///
/// Every public operation in this crate reports exactly one of these kinds.
/// Variants carry the file path, coordinate, or field identity needed to
/// render a useful message; the `Display` output is the human-readable form
/// intended for calling tools. The library never prints or exits on error.
#[derive(Error, Debug)]
pub enum SgridError {
    /// The grid file could not be created.
    #[error("failed to create grid file {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The grid file could not be opened.
    #[error("failed to open grid file {}: {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but does not carry the expected version banner.
    #[error("{} is not a survey grid file: {reason}", .path.display())]
    NotThisFormat { path: PathBuf, reason: String },

    /// The file was written by a strictly newer major format version.
    #[error(
        "{} was written by format major version {file_major}; \
         this library supports up to {library_major}",
        .path.display()
    )]
    NewerMajorVersion {
        path: PathBuf,
        file_major: u32,
        library_major: u32,
    },

    /// The header block could not be written back to the file.
    #[error("failed to write header to {}: {source}", .path.display())]
    HeaderWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The header block was present but could not be interpreted.
    #[error("malformed header in {}: {reason}", .path.display())]
    HeaderMalformed { path: PathBuf, reason: String },

    /// Creation parameters violate a format invariant.
    #[error("invalid grid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A cell address lies outside the grid extent.
    #[error("cell ({row}, {col}) is outside the {height} x {width} grid")]
    InvalidCoordinate {
        row: i64,
        col: i64,
        width: u32,
        height: u32,
    },

    /// A partial-row span extends past the grid width.
    #[error("row span {start}+{len} exceeds grid width {width}")]
    InvalidRowRange { start: u32, len: u32, width: u32 },

    /// A physical value cannot be quantized into its field's declared range.
    #[error(
        "{field} value {value} is outside the declared range \
         [{min}, {max}] (+ one quantization step)"
    )]
    ValueOutOfRange {
        field: FieldKind,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A record read failed or came up short at the OS level.
    #[error("failed to read record ({row}, {col}) from {}: {source}", .path.display())]
    RecordReadFailed {
        path: PathBuf,
        row: u32,
        col: u32,
        source: std::io::Error,
    },

    /// A record write failed or came up short at the OS level.
    #[error("failed to write record ({row}, {col}) to {}: {source}", .path.display())]
    RecordWriteFailed {
        path: PathBuf,
        row: u32,
        col: u32,
        source: std::io::Error,
    },

    /// A coverage query was made before the coverage map was built.
    #[error("no coverage map open for {}", .path.display())]
    NoCoverageMap { path: PathBuf },
}

impl SgridError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a HeaderMalformed error.
    pub fn header_malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::HeaderMalformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
