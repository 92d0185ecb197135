//! Exporters for normalized telemetry.
//!
//! Each exporter is a pure function of the timeline and options:
//! the same input always produces byte-identical output.
//!
//! ```rs
//! use gpmf_export::{export, extract, ExportFormat, ExportOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), gpmf_export::Error> {
//!     let timeline = extract(Path::new("GH010026.MP4"))?;
//!     for artifact in export(&timeline, ExportFormat::Gpx, &ExportOptions::default())? {
//!         artifact.write_to(Path::new("telemetry_output"))?;
//!     }
//!     Ok(())
//! }
//! ```

mod csv;
mod geojson;
mod gpx;
mod json;
mod kml;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    constants::{DEFAULT_GPX_SEGMENT_GAP_SECS, DEFAULT_NAMING_PATTERN},
    content_types::PositionSample,
    errors::{EmptyStreamError, Error, Warning},
    TelemetryTimeline,
};

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Gpx,
    Kml,
    GeoJson,
    Csv,
}

impl ExportFormat {
    pub const ALL: [Self; 5] = [Self::Json, Self::Gpx, Self::Kml, Self::GeoJson, Self::Csv];

    /// File extension.
    pub fn ext(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Gpx => "gpx",
            Self::Kml => "kml",
            Self::GeoJson => "geojson",
            Self::Csv => "csv",
        }
    }

    /// `{kind}` in file names. CSV uses the stream name instead.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Json => "telemetry",
            Self::Gpx | Self::Kml | Self::GeoJson => "gps",
            Self::Csv => "stream",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ext())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "gpx" => Ok(Self::Gpx),
            "kml" => Ok(Self::Kml),
            "geojson" => Ok(Self::GeoJson),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::InvalidFormat(s.to_owned())),
        }
    }
}

/// KML `altitudeMode`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeMode {
    #[default]
    Absolute,
    #[serde(alias = "relativeToGround")]
    RelativeToGround,
    #[serde(alias = "clampToGround")]
    ClampToGround,
}

impl AltitudeMode {
    /// Value as written in KML.
    pub fn kml_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::RelativeToGround => "relativeToGround",
            Self::ClampToGround => "clampToGround",
        }
    }
}

impl FromStr for AltitudeMode {
    type Err = Error;

    /// Accepts both `relative_to_ground` and `relativeToGround`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace(['_', '-'], "").to_ascii_lowercase().as_str() {
            "absolute" => Ok(Self::Absolute),
            "relativetoground" => Ok(Self::RelativeToGround),
            "clamptoground" => Ok(Self::ClampToGround),
            _ => Err(Error::InvalidAltitudeMode(s.to_owned())),
        }
    }
}

/// Exporter options.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// File name pattern with `{name}`, `{kind}`, and `{ext}` placeholders.
    pub naming: String,
    pub kml_altitude_mode: AltitudeMode,
    /// Time gap in seconds between fixed points that starts a new GPX track segment.
    pub gpx_segment_gap_secs: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            naming: DEFAULT_NAMING_PATTERN.to_owned(),
            kml_altitude_mode: AltitudeMode::default(),
            gpx_segment_gap_secs: DEFAULT_GPX_SEGMENT_GAP_SECS,
        }
    }
}

impl ExportOptions {
    /// File name for an artifact.
    pub fn file_name(&self, name: &str, kind: &str, ext: &str) -> String {
        self.naming
            .replace("{name}", name)
            .replace("{kind}", kind)
            .replace("{ext}", ext)
    }
}

/// Named, serialized output.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// File name, see `ExportOptions::naming`.
    pub name: String,
    pub content: Vec<u8>,
    /// Set if the exported stream was empty.
    pub warning: Option<Warning>,
}

impl ExportArtifact {
    /// Writes the artifact to `dir`, creating `dir` and any
    /// sub directories in the artifact name if necessary.
    /// Returns the path written to.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, Error> {
        let path = dir.join(&self.name);
        std::fs::create_dir_all(path.parent().unwrap_or(dir))?;
        std::fs::write(&path, &self.content)?;
        debug!("Wrote {} ({} bytes)", path.display(), self.content.len());
        Ok(path)
    }

    /// `true` if the exported stream had no samples.
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }
}

/// Exports `timeline` as `format`. CSV yields one artifact per stream,
/// all other formats a single artifact.
pub fn export(
    timeline: &TelemetryTimeline,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<Vec<ExportArtifact>, Error> {
    let artifacts = match format {
        ExportFormat::Json => vec![self::json::export(timeline, options)?],
        ExportFormat::Gpx => vec![self::gpx::export(timeline, options)?],
        ExportFormat::Kml => vec![self::kml::export(timeline, options)],
        ExportFormat::GeoJson => vec![self::geojson::export(timeline, options)?],
        ExportFormat::Csv => self::csv::export(timeline, options)?,
    };

    for artifact in artifacts.iter() {
        if let Some(warning) = &artifact.warning {
            warn!("{}: {warning}", artifact.name);
        }
    }

    Ok(artifacts)
}

/// Exports `timeline` in all `formats` in parallel.
/// Artifacts are returned in the order of `formats`.
pub fn export_all(
    timeline: &TelemetryTimeline,
    formats: &[ExportFormat],
    options: &ExportOptions,
) -> Result<Vec<ExportArtifact>, Error> {
    let artifacts = formats
        .par_iter()
        .map(|format| export(timeline, *format, options))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(artifacts.into_iter().flatten().collect())
}

/// Fixed points in the position stream used for geospatial exports,
/// with a warning if there are none.
pub(crate) fn fixed_positions(
    timeline: &TelemetryTimeline,
    format: ExportFormat,
) -> (Vec<&PositionSample>, Option<Warning>) {
    let (stream, points) = match timeline.positions() {
        Some((kind, points)) => (kind.to_string(), points),
        None => ("GPS".to_owned(), Vec::new()),
    };
    let fixed: Vec<&PositionSample> = points.into_iter().filter(|p| p.is_fixed()).collect();
    let warning = fixed.is_empty().then(|| {
        Warning::from(EmptyStreamError {
            stream,
            format: format.to_string(),
        })
    });
    (fixed, warning)
}

/// Escapes text for XML content and attributes.
pub(crate) fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_from_str() {
        assert_eq!("GeoJSON".parse::<ExportFormat>().unwrap(), ExportFormat::GeoJson);
        assert_eq!(" gpx ".parse::<ExportFormat>().unwrap(), ExportFormat::Gpx);
        assert!(matches!("shp".parse::<ExportFormat>(), Err(Error::InvalidFormat(_))));
        assert_eq!(ExportFormat::GeoJson.to_string(), "geojson");
    }

    #[test]
    fn altitude_modes() {
        assert_eq!("relativeToGround".parse::<AltitudeMode>().unwrap(), AltitudeMode::RelativeToGround);
        assert_eq!("clamp_to_ground".parse::<AltitudeMode>().unwrap(), AltitudeMode::ClampToGround);
        assert!("sea_floor".parse::<AltitudeMode>().is_err());
        assert_eq!(AltitudeMode::default().kml_str(), "absolute");
    }

    #[test]
    fn naming_pattern() {
        let options = ExportOptions::default();
        assert_eq!(options.file_name("GH010026", "gps", "gpx"), "GH010026_gps.gpx");
        let options = ExportOptions {
            naming: "{ext}/{name}-{kind}.{ext}".to_owned(),
            ..Default::default()
        };
        assert_eq!(options.file_name("clip", "GPS5", "csv"), "csv/clip-GPS5.csv");
    }

    #[test]
    fn writes_into_sub_directories() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            naming: "{ext}/{name}-{kind}.{ext}".to_owned(),
            ..Default::default()
        };
        let artifact = ExportArtifact {
            name: options.file_name("clip", "gps", "gpx"),
            content: b"<gpx/>".to_vec(),
            warning: None,
        };
        let path = artifact.write_to(&dir.path().join("out")).unwrap();
        assert_eq!(path, dir.path().join("out/gpx/clip-gps.gpx"));
        assert_eq!(std::fs::read(path).unwrap(), b"<gpx/>");
        assert!(!artifact.has_warning());
    }

    #[test]
    fn escapes_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
