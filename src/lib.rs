//! Extract GoPro GPMF telemetry from MP4 clips and export it as
//! JSON, GPX, KML, GeoJSON, or CSV.
//!
//! Supported streams are GPS (`GPS5`, `GPS9`) and the inertial sensors
//! (`ACCL`, `GYRO`, `GRAV`, `MAGN`), normalized into physical units on
//! a single timeline. Consecutive clips from one recording can be merged.
//!
//! ```rs
//! use gpmf_export::{export_all, extract, Config};
//! use std::path::Path;
//!
//! fn main() -> Result<(), gpmf_export::Error> {
//!     let config = Config::default();
//!     let timeline = extract(Path::new("GH010026.MP4"))?;
//!     for artifact in export_all(&timeline, &config.formats, &config.export_options())? {
//!         artifact.write_to(&config.output_dir)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod content_types;
pub mod demux;
pub mod export;
pub mod files;
pub mod geo;
pub mod gopro;
pub mod gpmf;
pub mod mp4;
pub mod timeline;
mod errors;

#[cfg(test)]
mod test_helpers;

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

pub use config::Config;
pub use content_types::{FixQuality, Orientation, PositionSample, SensorType, VectorSample};
pub use demux::StreamKind;
pub use errors::{ContainerFormatError, EmptyStreamError, Error, SequenceGapError, StreamDecodeError, Warning};
pub use export::{export, export_all, AltitudeMode, ExportArtifact, ExportFormat, ExportOptions};
pub use gopro::{Batch, DeviceName, GoProSession};
pub use gpmf::{FourCC, Gpmf, Timestamp};
pub use timeline::{merge, MergeOptions, TelemetryTimeline, TimelineStream};

/// Extracts and normalizes telemetry from a GoPro MP4/LRV clip
/// or a raw GPMF file. The timeline is named after the file stem.
pub fn extract(path: &Path) -> Result<TelemetryTimeline, Error> {
    let gpmf = Gpmf::new(path)?;
    Ok(TelemetryTimeline::from_gpmf(&gpmf, &files::basename(path))?)
}

/// Extracts and normalizes telemetry from any seekable source.
pub fn extract_reader<R: Read + Seek>(reader: R, name: &str) -> Result<TelemetryTimeline, Error> {
    let gpmf = Gpmf::from_reader(reader, name)?;
    Ok(TelemetryTimeline::from_gpmf(&gpmf, name)?)
}

/// Extracts telemetry from `paths` in parallel and merges the results
/// in the given order. Fails only if no path could be read.
pub fn extract_batch(paths: &[PathBuf], options: &MergeOptions) -> Result<Batch, Error> {
    GoProSession::new(paths).merge(options)
}
