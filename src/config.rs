//! Export settings, read from a TOML file.
//!
//! All fields are optional:
//! ```toml
//! formats = ["json", "gpx", "kml", "geojson", "csv"]
//! output_dir = "telemetry_output"
//! naming = "{name}_{kind}.{ext}"
//! kml_altitude_mode = "absolute"
//! gpx_segment_gap_secs = 5.0
//! merge_gap_threshold_m = 500.0
//! merged_name = "merged_track"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    constants::{
        DEFAULT_GPX_SEGMENT_GAP_SECS, DEFAULT_MERGED_NAME, DEFAULT_MERGE_GAP_THRESHOLD_M,
        DEFAULT_NAMING_PATTERN, DEFAULT_OUTPUT_DIR,
    },
    errors::Error,
    export::{AltitudeMode, ExportFormat, ExportOptions},
    timeline::MergeOptions,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub formats: Vec<ExportFormat>,
    pub output_dir: PathBuf,
    pub naming: String,
    pub kml_altitude_mode: AltitudeMode,
    pub gpx_segment_gap_secs: f64,
    pub merge_gap_threshold_m: f64,
    pub merged_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            formats: ExportFormat::ALL.to_vec(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            naming: DEFAULT_NAMING_PATTERN.to_owned(),
            kml_altitude_mode: AltitudeMode::default(),
            gpx_segment_gap_secs: DEFAULT_GPX_SEGMENT_GAP_SECS,
            merge_gap_threshold_m: DEFAULT_MERGE_GAP_THRESHOLD_M,
            merged_name: DEFAULT_MERGED_NAME.to_owned(),
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(body)?;
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let body = std::fs::read_to_string(path)?;
        let config = body.parse::<Self>()?;
        debug!("Read config {}", path.display());
        Ok(config)
    }

    /// Checks values that parse but make no sense.
    /// Gaps may be infinite, to never split or never warn.
    pub fn validate(&self) -> Result<(), Error> {
        let gaps = [
            ("gpx_segment_gap_secs", self.gpx_segment_gap_secs),
            ("merge_gap_threshold_m", self.merge_gap_threshold_m),
        ];
        for (key, value) in gaps {
            if value.is_nan() || value < 0. {
                return Err(Error::InvalidConfig(format!("{key} must be >= 0, got {value}")));
            }
        }
        if self.naming.trim().is_empty() {
            return Err(Error::InvalidConfig("naming is empty".to_owned()));
        }
        Ok(())
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            naming: self.naming.to_owned(),
            kml_altitude_mode: self.kml_altitude_mode,
            gpx_segment_gap_secs: self.gpx_segment_gap_secs,
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            gap_threshold_m: self.merge_gap_threshold_m,
            name: self.merged_name.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config = "".parse::<Config>().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.formats.len(), 5);
        assert_eq!(config.export_options(), ExportOptions::default());
        assert_eq!(config.merge_options(), MergeOptions::default());
    }

    #[test]
    fn partial_config() {
        let config = r#"
            formats = ["gpx", "geojson"]
            kml_altitude_mode = "clamp_to_ground"
            merged_name = "ride"
        "#
        .parse::<Config>()
        .unwrap();
        assert_eq!(config.formats, [ExportFormat::Gpx, ExportFormat::GeoJson]);
        assert_eq!(config.kml_altitude_mode, AltitudeMode::ClampToGround);
        assert_eq!(config.merge_options().name, "ride");
        assert_eq!(config.gpx_segment_gap_secs, 5.0);
        assert_eq!(config.output_dir, PathBuf::from("telemetry_output"));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(matches!("formats = [\"shp\"]".parse::<Config>(), Err(Error::Config(_))));
        assert!(matches!("gpx_gap = 2.0".parse::<Config>(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_negative_gaps() {
        assert!(matches!(
            "gpx_segment_gap_secs = -1.0".parse::<Config>(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            "merge_gap_threshold_m = nan".parse::<Config>(),
            Err(Error::InvalidConfig(_))
        ));
        let config = "gpx_segment_gap_secs = 1e300\nmerge_gap_threshold_m = inf".parse::<Config>().unwrap();
        assert_eq!(config.export_options().gpx_segment_gap_secs, 1e300);
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gpmf-export.toml");
        std::fs::write(&path, "kml_altitude_mode = \"relativeToGround\"\n").unwrap();
        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.kml_altitude_mode, AltitudeMode::RelativeToGround);
        assert!(matches!(Config::from_path(&dir.path().join("missing.toml")), Err(Error::Io(_))));
    }
}
