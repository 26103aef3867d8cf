//! Error types for pyramid I/O, unpacking and artefact detection.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the workflow. Nothing is caught internally; every failure
/// propagates to the caller with the offending path attached where there is one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode TIFF '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Failed to encode TIFF '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Unsupported sample format in '{path}' page {page}: {found}")]
    UnsupportedSampleFormat {
        path: PathBuf,
        page: usize,
        found: String,
    },

    #[error("Pyramid has no levels")]
    EmptyPyramid,

    #[error("Level {index} ({width}x{height}) is not smaller than the level before it")]
    LevelOrder { index: usize, width: u32, height: u32 },

    #[error("Level of {width}x{height} needs {expected} samples, got {actual}")]
    LevelSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Level has no samples")]
    EmptyLevel,

    #[error("Cannot infer row and column from file name '{name}'")]
    TileName { name: String },

    #[error("Percentile must be within [0, 100], got {0}")]
    InvalidPercentile(f64),

    #[error("Reference set contains no images")]
    EmptyReferenceSet,

    #[error("Failed to encode metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Metadata entry '{key}' is not representable in JSON: {value}")]
    NonFiniteMetadata { key: String, value: String },

    #[error("Configuration error in '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Failed to write report '{path}': {reason}")]
    Report { path: PathBuf, reason: String },

    #[error("Path has no usable file name: '{0}'")]
    InvalidPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: tiff::TiffError) -> Self {
        Error::Decode {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, source: tiff::TiffError) -> Self {
        Error::Encode {
            path: path.into(),
            source,
        }
    }
}
