//! Processed telemetry records.

pub mod gps;
pub mod sensor;

pub use gps::{FixQuality, Gps, PositionSample, Precision};
pub use sensor::{Orientation, SensorType, VectorSample};

use time::{format_description::well_known::Rfc3339, PrimitiveDateTime};

/// Formats a GPS datetime (always UTC) as ISO8601/RFC3339,
/// e.g. `2023-04-12T08:30:15.25Z`.
pub fn primitivedatetime_to_string(datetime: &PrimitiveDateTime) -> Result<String, time::error::Format> {
    datetime.assume_utc().format(&Rfc3339)
}
