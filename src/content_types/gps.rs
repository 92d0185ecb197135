use serde::{Serialize, Serializer};
use time::PrimitiveDateTime;

use crate::Timestamp;

use super::primitivedatetime_to_string;

/// GPS fix (satellite lock).
///
/// Logged in `GPSF` for Hero10 and earlier (`GPS5` devices),
/// and per point in `GPS9` for Hero11 and later.
/// Valid values are 0 (no lock), 2 (2D lock), 3 (3D lock).
/// Anything else is treated as no lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixQuality {
    NoFix,
    #[serde(rename = "2d")]
    Fix2D,
    #[serde(rename = "3d")]
    Fix3D,
}

impl From<u32> for FixQuality {
    fn from(value: u32) -> Self {
        match value {
            2 => Self::Fix2D,
            3 => Self::Fix3D,
            _ => Self::NoFix,
        }
    }
}

impl FixQuality {
    pub fn is_fixed(&self) -> bool {
        self != &Self::NoFix
    }

    /// GPX `fix` value.
    pub fn to_str(&self) -> &str {
        match self {
            Self::NoFix => "none",
            Self::Fix2D => "2d",
            Self::Fix3D => "3d",
        }
    }
}

/// Dilution of precision, as reported by the device.
/// GoPro devices log a single value, stored as `horizontal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Precision {
    pub horizontal: Option<f64>,
    pub vertical: Option<f64>,
}

impl Precision {
    pub fn new(dop: Option<f64>) -> Self {
        Self {
            horizontal: dop,
            vertical: None,
        }
    }
}

/// Point derived from `GPS5` or `GPS9`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    /// Latitude, decimal degrees.
    pub latitude: f64,
    /// Longitude, decimal degrees.
    pub longitude: f64,
    /// Altitude, metres.
    pub altitude: f64,
    /// 2D ground speed, m/s.
    pub speed2d: f64,
    /// 3D speed, m/s.
    pub speed3d: f64,
    /// `None` if the device did not log a fix value.
    pub fix: Option<FixQuality>,
    pub precision: Precision,
    /// UTC date time. From `GPSU` plus in-payload offset for `GPS5`,
    /// logged per point for `GPS9`.
    #[serde(serialize_with = "serialize_datetime")]
    pub datetime: Option<PrimitiveDateTime>,
    pub time: Timestamp,
}

impl PositionSample {
    /// Included in geospatial exports.
    /// Points without a logged fix value are kept.
    pub fn is_fixed(&self) -> bool {
        self.fix.map(|f| f.is_fixed()).unwrap_or(true)
    }

    pub fn dop(&self) -> Option<f64> {
        self.precision.horizontal
    }

    pub fn datetime_to_string(&self) -> Option<String> {
        self.datetime
            .as_ref()
            .and_then(|dt| primitivedatetime_to_string(dt).ok())
    }
}

fn serialize_datetime<S: Serializer>(
    datetime: &Option<PrimitiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match datetime.as_ref().map(primitivedatetime_to_string) {
        Some(Ok(s)) => serializer.serialize_some(&s),
        Some(Err(err)) => Err(serde::ser::Error::custom(err)),
        None => serializer.serialize_none(),
    }
}

/// Gps point cluster, converted from `GPS5` or `GPS9`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Gps(pub Vec<PositionSample>);

impl Gps {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PositionSample> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&PositionSample> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&PositionSample> {
        self.0.last()
    }

    /// Points with satellite lock, or without a logged fix value.
    ///
    /// If satellite lock is not acquired, the device will log zeros
    /// or the latest known location with a GPS fix of `0`,
    /// meaning both time and location will be wrong.
    pub fn fixed(&self) -> Self {
        Self(self.0.iter().filter(|p| p.is_fixed()).cloned().collect())
    }

    /// First point with satellite lock.
    pub fn first_fixed(&self) -> Option<&PositionSample> {
        self.iter().find(|p| p.is_fixed())
    }

    /// Returns the start of the recording as date time,
    /// i.e. the datetime of the first point with satellite lock
    /// minus its time relative to recording start.
    pub fn t0(&self) -> Option<PrimitiveDateTime> {
        let first = self.iter().find(|p| p.is_fixed() && p.datetime.is_some())?;
        Some(first.datetime? - first.time.relative)
    }

    /// First and last logged UTC datetime as ISO8601 strings.
    pub fn datetime_range(&self) -> Option<(String, String)> {
        let first = self.iter().find_map(|p| p.datetime_to_string())?;
        let last = self.iter().rev().find_map(|p| p.datetime_to_string())?;
        Some((first, last))
    }
}
