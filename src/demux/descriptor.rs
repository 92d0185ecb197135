//! Per-stream metadata and raw sample rows, as grouped by the demuxer.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Duration, PrimitiveDateTime};

use crate::{
    content_types::{Orientation, SensorType},
    errors::StreamDecodeError,
    FourCC, Timestamp,
};

/// Supported data streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    /// Hero10 and earlier, Hero11 and later log both `GPS5` and `GPS9`.
    #[serde(rename = "GPS5")]
    Gps5,
    /// Hero11 and later.
    #[serde(rename = "GPS9")]
    Gps9,
    #[serde(rename = "ACCL")]
    Accl,
    #[serde(rename = "GYRO")]
    Gyro,
    #[serde(rename = "GRAV")]
    Grav,
    #[serde(rename = "MAGN")]
    Magn,
}

impl Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl StreamKind {
    pub fn from_fourcc(fourcc: &FourCC) -> Option<Self> {
        match fourcc {
            FourCC::GPS5 => Some(Self::Gps5),
            FourCC::GPS9 => Some(Self::Gps9),
            FourCC::ACCL => Some(Self::Accl),
            FourCC::GYRO => Some(Self::Gyro),
            FourCC::GRAV => Some(Self::Grav),
            FourCC::MAGN => Some(Self::Magn),
            _ => None,
        }
    }

    pub fn fourcc(&self) -> FourCC {
        match self {
            Self::Gps5 => FourCC::GPS5,
            Self::Gps9 => FourCC::GPS9,
            Self::Accl => FourCC::ACCL,
            Self::Gyro => FourCC::GYRO,
            Self::Grav => FourCC::GRAV,
            Self::Magn => FourCC::MAGN,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Gps5 => "GPS5",
            Self::Gps9 => "GPS9",
            Self::Accl => "ACCL",
            Self::Gyro => "GYRO",
            Self::Grav => "GRAV",
            Self::Magn => "MAGN",
        }
    }

    /// Values per sample.
    pub fn width(&self) -> usize {
        match self {
            Self::Gps5 => 5,
            Self::Gps9 => 9,
            _ => 3,
        }
    }

    pub fn is_position(&self) -> bool {
        matches!(self, Self::Gps5 | Self::Gps9)
    }

    /// Sensor type for inertial streams.
    pub fn sensor(&self) -> Option<SensorType> {
        SensorType::from_fourcc(&self.fourcc())
    }
}

/// Scale divisor/s (`SCAL`). Either a single divisor for all values,
/// or one divisor per column.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Uniform(f64),
    PerColumn(Vec<f64>),
}

impl Default for Scale {
    fn default() -> Self {
        Self::Uniform(1.)
    }
}

impl Scale {
    /// Scale for `kind` from logged `SCAL` values.
    /// No values means unscaled.
    pub fn new(values: &[f64], kind: StreamKind) -> Result<Self, StreamDecodeError> {
        if values.iter().any(|v| *v == 0. || !v.is_finite()) {
            return Err(StreamDecodeError::Value {
                fourcc: kind.to_string(),
                reason: format!("invalid scale divisor in {values:?}"),
            });
        }
        match values.len() {
            0 => Ok(Self::default()),
            1 => Ok(Self::Uniform(values[0])),
            n if n == kind.width() => Ok(Self::PerColumn(values.to_owned())),
            n => Err(StreamDecodeError::Shape {
                fourcc: format!("{kind} SCAL"),
                expected: kind.width(),
                got: n,
            }),
        }
    }

    /// Divides each value in `row` by its divisor.
    pub fn apply(&self, row: &[f64]) -> Vec<f64> {
        match self {
            Self::Uniform(d) => row.iter().map(|v| v / d).collect(),
            Self::PerColumn(ds) => row.iter().zip(ds).map(|(v, d)| v / d).collect(),
        }
    }
}

/// A single data block, i.e. the samples for one stream in one payload,
/// with the sticky values in effect when it was logged.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    /// Payload timing, adjusted for `TIMO`.
    pub time: Timestamp,
    /// Unscaled rows, `width` values each.
    pub rows: Vec<Vec<f64>>,
    pub scale: Scale,
    /// `GPSF`
    pub fix: Option<u32>,
    /// `GPSP / 100`
    pub dop: Option<f64>,
    /// `GPSU`
    pub datetime: Option<PrimitiveDateTime>,
    /// `ORIN`
    pub orientation: Option<Orientation>,
}

/// Stream metadata and data blocks for a single stream
/// across all payloads in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub kind: StreamKind,
    /// `STNM`, e.g. "Accelerometer".
    pub name: Option<String>,
    /// `SIUN`, or `UNIT` if no SI units are logged.
    pub units: Vec<String>,
    /// Latest `ORIN`.
    pub orientation: Option<Orientation>,
    /// Sticky modifiers (FourCC) logged for this stream.
    pub sticky: BTreeSet<String>,
    /// Sum of the declared repeat counts, including empty blocks
    /// and blocks that could not be decoded.
    pub declared_samples: usize,
    /// Latest `GPSA`, e.g. `MSLV` (mean sea level).
    pub altitude_system: Option<String>,
    pub blocks: Vec<DataBlock>,
}

impl StreamDescriptor {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            name: None,
            units: Vec::new(),
            orientation: None,
            sticky: BTreeSet::new(),
            declared_samples: 0,
            altitude_system: None,
            blocks: Vec::new(),
        }
    }

    /// Number of decoded samples.
    pub fn sample_count(&self) -> usize {
        self.blocks.iter().map(|b| b.rows.len()).sum()
    }

    /// Time covered by blocks with samples.
    pub fn duration(&self) -> Duration {
        self.blocks
            .iter()
            .filter(|b| !b.rows.is_empty())
            .map(|b| b.time.duration)
            .sum()
    }

    /// Sample rate in Hz: sample count over covered duration.
    pub fn sample_rate(&self) -> Option<f64> {
        let secs = self.duration().as_seconds_f64();
        (secs > 0.).then(|| self.sample_count() as f64 / secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_per_column_or_uniform() {
        let s = Scale::new(&[10., 100., 1.], StreamKind::Accl).unwrap();
        assert_eq!(s.apply(&[10., 10., 10.]), vec![1., 0.1, 10.]);
        let s = Scale::new(&[4.], StreamKind::Accl).unwrap();
        assert_eq!(s.apply(&[8., 2., -4.]), vec![2., 0.5, -1.]);
        assert_eq!(Scale::new(&[], StreamKind::Gps5).unwrap(), Scale::Uniform(1.));
    }

    #[test]
    fn scale_must_match_width() {
        assert!(matches!(
            Scale::new(&[1., 2.], StreamKind::Gps5),
            Err(StreamDecodeError::Shape { expected: 5, got: 2, .. })
        ));
        assert!(matches!(
            Scale::new(&[0.], StreamKind::Gyro),
            Err(StreamDecodeError::Value { .. })
        ));
    }

    #[test]
    fn sample_rate_from_blocks() {
        let mut d = StreamDescriptor::new(StreamKind::Accl);
        for i in 0..2 {
            d.blocks.push(DataBlock {
                time: Timestamp::new(i * 1000, 1000),
                rows: vec![vec![0.; 3]; 200],
                scale: Scale::default(),
                fix: None,
                dop: None,
                datetime: None,
                orientation: None,
            });
        }
        assert_eq!(d.sample_count(), 400);
        assert_eq!(d.sample_rate(), Some(200.));
    }
}
