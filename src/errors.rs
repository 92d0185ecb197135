//! Error types.
//!
//! Only `ContainerFormatError` is fatal for an input file.
//! The remaining kinds are recoverable: they are logged, recorded as a
//! [`Warning`] on the timeline or artifact they concern, and processing
//! continues.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal for the file being read: no metadata track,
/// or a corrupt top-level structure.
#[derive(Debug, Error)]
pub enum ContainerFormatError {
    #[error("no GPMF metadata track found")]
    NoMetadataTrack,
    #[error("metadata track contains no telemetry")]
    NoTelemetry,
    #[error("malformed data at byte offset {offset}: {reason}")]
    Malformed { offset: u64, reason: String },
    #[error("nesting deeper than {max} levels at byte offset {offset}")]
    MaxDepthExceeded { max: usize, offset: u64 },
    #[error("file size {got} bytes exceeds max {max} bytes for {}", path.display())]
    MaxFileSizeExceeded { max: u64, got: u64, path: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContainerFormatError {
    pub(crate) fn malformed(offset: u64, reason: impl fmt::Display) -> Self {
        Self::Malformed {
            offset,
            reason: reason.to_string(),
        }
    }

    /// Truncated reads count as malformed structure, not as I/O failure.
    pub(crate) fn from_binrw(err: binrw::Error, offset: u64) -> Self {
        match err {
            binrw::Error::Io(e) if e.kind() != std::io::ErrorKind::UnexpectedEof => Self::Io(e),
            other => Self::malformed(offset, other),
        }
    }

    /// Same as `from_binrw()` for plain `std::io` reads.
    pub(crate) fn from_io(err: std::io::Error, offset: u64) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::malformed(offset, "unexpected end of data"),
            _ => Self::Io(err),
        }
    }
}

/// A single stream could not be decoded. The stream is skipped.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum StreamDecodeError {
    #[error("unsupported stream {fourcc} skipped")]
    Unsupported { fourcc: String },
    #[error("stream {fourcc}: expected {expected} values per sample, got {got}")]
    Shape {
        fourcc: String,
        expected: usize,
        got: usize,
    },
    #[error("stream {fourcc}: {reason}")]
    Value { fourcc: String, reason: String },
}

/// Consecutive clips end and start too far apart. Merging continues.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error(
    "possible missing clip between {previous} and {next}: \
    positions are {distance_m:.1} m apart (threshold {threshold_m:.1} m)"
)]
pub struct SequenceGapError {
    pub previous: String,
    pub next: String,
    pub distance_m: f64,
    pub threshold_m: f64,
}

/// Requested stream has no samples. An empty, valid artifact is produced.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("stream {stream} has no samples, {format} output is empty")]
pub struct EmptyStreamError {
    pub stream: String,
    pub format: String,
}

/// Recoverable problems, kept alongside the data they concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    StreamDecode(StreamDecodeError),
    SequenceGap(SequenceGapError),
    EmptyStream(EmptyStreamError),
    /// The same clip was passed more than once in a batch.
    DuplicateClip { path: String, fingerprint: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamDecode(err) => err.fmt(f),
            Self::SequenceGap(err) => err.fmt(f),
            Self::EmptyStream(err) => err.fmt(f),
            Self::DuplicateClip { path, fingerprint } => {
                write!(f, "{path} duplicates an earlier clip (fingerprint {fingerprint})")
            }
        }
    }
}

impl From<StreamDecodeError> for Warning {
    fn from(value: StreamDecodeError) -> Self {
        Self::StreamDecode(value)
    }
}

impl From<SequenceGapError> for Warning {
    fn from(value: SequenceGapError) -> Self {
        Self::SequenceGap(value)
    }
}

impl From<EmptyStreamError> for Warning {
    fn from(value: EmptyStreamError) -> Self {
        Self::EmptyStream(value)
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Container(#[from] ContainerFormatError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("gpx error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("no telemetry could be extracted from any input")]
    NoTelemetry,
    #[error("unknown export format '{0}'")]
    InvalidFormat(String),
    #[error("unknown KML altitude mode '{0}'")]
    InvalidAltitudeMode(String),
    #[error("invalid config value: {0}")]
    InvalidConfig(String),
}
