//! Converts demuxed data blocks into scaled, timestamped samples.

use std::collections::BTreeMap;

use time::{Duration, PrimitiveDateTime};

use super::{Samples, TimelineStream};
use crate::{
    constants::GPMF_DATETIME_DEFAULT,
    content_types::{FixQuality, Orientation, PositionSample, Precision, VectorSample},
    demux::{DataBlock, Demuxed, StreamDescriptor, StreamKind},
    gopro::DeviceName,
    Timestamp,
};

/// Added to a sample timestamp that does not increase.
pub const TIMESTAMP_NUDGE: Duration = Duration::microseconds(1);

/// Normalized streams for all demuxed streams, including empty ones.
pub fn streams(demuxed: &Demuxed) -> BTreeMap<StreamKind, TimelineStream> {
    let device = DeviceName::from_str(demuxed.device.as_deref().unwrap_or_default());
    demuxed
        .streams
        .iter()
        .map(|(kind, descriptor)| (*kind, stream(descriptor, &device)))
        .collect()
}

/// Normalized stream for a single descriptor.
pub fn stream(descriptor: &StreamDescriptor, device: &DeviceName) -> TimelineStream {
    let mut samples = match descriptor.kind {
        StreamKind::Gps5 => Samples::Position(descriptor.blocks.iter().flat_map(gps5).collect()),
        StreamKind::Gps9 => Samples::Position(descriptor.blocks.iter().flat_map(gps9).collect()),
        _ => {
            let default = device.default_orientation();
            Samples::Vector(
                descriptor
                    .blocks
                    .iter()
                    .flat_map(|b| vectors(b, default))
                    .collect(),
            )
        }
    };

    samples.make_monotonic();

    let units = if descriptor.units.is_empty() {
        default_units(descriptor.kind)
    } else {
        descriptor.units.to_owned()
    };

    TimelineStream {
        kind: descriptor.kind,
        name: descriptor.name.to_owned(),
        units,
        sample_rate: descriptor.sample_rate(),
        orientation: descriptor.orientation,
        altitude_system: descriptor.altitude_system.to_owned(),
        declared_samples: descriptor.declared_samples,
        samples,
    }
}

/// Units for streams that do not log `SIUN`/`UNIT`.
/// Sensor streams have one unit per axis.
fn default_units(kind: StreamKind) -> Vec<String> {
    let units: &[&str] = match kind {
        StreamKind::Gps5 => &["deg", "deg", "m", "m/s", "m/s"],
        StreamKind::Gps9 => &["deg", "deg", "m", "m/s", "m/s", "day", "s", "", ""],
        _ => {
            let unit = kind.sensor().map(|s| s.default_units()).unwrap_or_default();
            return vec![unit.to_owned(); 3];
        }
    };
    units.iter().map(|u| u.to_string()).collect()
}

/// `GPS5`: `[lat, lon, alt, speed2d, speed3d]`, with fix, DOP,
/// and datetime from sticky `GPSF`, `GPSP`, `GPSU`.
fn gps5(block: &DataBlock) -> Vec<PositionSample> {
    let n = block.rows.len();
    block
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let [latitude, longitude, altitude, speed2d, speed3d] = block.scale.apply(row)[..] else {
                return None;
            };
            let time = block.time.sample(i, n);
            // GPSU is logged for the first sample in the payload
            let datetime = block
                .datetime
                .and_then(|dt| dt.checked_add(time.relative - block.time.relative));
            Some(PositionSample {
                latitude,
                longitude,
                altitude,
                speed2d,
                speed3d,
                fix: block.fix.map(FixQuality::from),
                precision: Precision::new(block.dop),
                datetime,
                time,
            })
        })
        .collect()
}

/// `GPS9`: `[lat, lon, alt, speed2d, speed3d, days since 2000,
/// seconds since midnight, DOP, fix]`, logged per point.
fn gps9(block: &DataBlock) -> Vec<PositionSample> {
    let n = block.rows.len();
    block
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let [latitude, longitude, altitude, speed2d, speed3d, days, secs, dop, fix] =
                block.scale.apply(row)[..]
            else {
                return None;
            };
            Some(PositionSample {
                latitude,
                longitude,
                altitude,
                speed2d,
                speed3d,
                fix: Some(FixQuality::from(fix as u32)),
                precision: Precision::new(Some(dop)),
                datetime: gps9_datetime(days, secs),
                time: block.time.sample(i, n),
            })
        })
        .collect()
}

fn gps9_datetime(days: f64, secs: f64) -> Option<PrimitiveDateTime> {
    if !days.is_finite() || !secs.is_finite() {
        return None;
    }
    GPMF_DATETIME_DEFAULT
        .checked_add(Duration::checked_seconds_f64(days.trunc() * 86_400.)?)?
        .checked_add(Duration::checked_seconds_f64(secs)?)
}

/// 3-axis sensor data, reordered from `ORIN` (or the device default)
/// into camera `x, y, z`.
fn vectors(block: &DataBlock, default: Orientation) -> Vec<VectorSample> {
    let orientation = block.orientation.unwrap_or(default);
    let n = block.rows.len();
    block
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            VectorSample::new(&block.scale.apply(row), &orientation, block.time.sample(i, n))
        })
        .collect()
}

/// Ensures timestamps are strictly increasing. A sample that does not
/// come after the previous one is moved forward by `TIMESTAMP_NUDGE`.
pub(crate) fn nudge<'a>(times: impl Iterator<Item = &'a mut Timestamp>) {
    let mut previous: Option<Duration> = None;
    for time in times {
        if let Some(prev) = previous {
            if time.relative <= prev {
                time.relative = prev + TIMESTAMP_NUDGE;
            }
        }
        previous = Some(time.relative);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::Scale;
    use time::macros::datetime;

    fn block(rows: Vec<Vec<f64>>, scale: Scale) -> DataBlock {
        DataBlock {
            time: Timestamp::new(1000, 1000),
            rows,
            scale,
            fix: Some(3),
            dop: Some(1.5),
            datetime: Some(datetime!(2023-04-12 08:30:16)),
            orientation: None,
        }
    }

    #[test]
    fn gps5_scale_and_datetime() {
        let b = block(
            vec![vec![557_000_000., 132_000_000., 80_000., 1500., 160.]; 4],
            Scale::PerColumn(vec![1e7, 1e7, 1e3, 1e3, 1e2]),
        );
        let points = gps5(&b);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].latitude, 55.7);
        assert_eq!(points[0].altitude, 80.);
        assert_eq!(points[0].speed3d, 1.6);
        assert_eq!(points[2].time.relative_ms(), 1500);
        assert_eq!(points[2].datetime, Some(datetime!(2023-04-12 08:30:16.5)));
        assert_eq!(points[3].fix, Some(FixQuality::Fix3D));
        assert_eq!(points[3].dop(), Some(1.5));
    }

    #[test]
    fn gps9_per_point_values() {
        // 2023-04-12 is day 8502 since 2000-01-01
        let row = vec![557_000_000., 132_000_000., 80_000., 1500., 160., 8502., 30_615_250., 215., 2.];
        let b = block(
            vec![row],
            Scale::PerColumn(vec![1e7, 1e7, 1e3, 1e3, 1e2, 1., 1e3, 1e2, 1.]),
        );
        let points = gps9(&b);
        assert_eq!(points[0].fix, Some(FixQuality::Fix2D));
        assert_eq!(points[0].dop(), Some(2.15));
        assert_eq!(points[0].datetime, Some(datetime!(2023-04-12 08:30:15.250)));
    }

    #[test]
    fn gps9_datetime_out_of_range() {
        assert_eq!(gps9_datetime(f64::NAN, 0.), None);
        assert_eq!(gps9_datetime(1e300, 0.), None);
        assert_eq!(gps9_datetime(8502., 1e30), None);
        assert_eq!(gps9_datetime(-1e20, 0.), None);
        assert_eq!(gps9_datetime(8502., 30_615.25), Some(datetime!(2023-04-12 08:30:15.250)));
    }

    #[test]
    fn vectors_use_device_default_orientation() {
        let b = block(vec![vec![1., 2., 3.]], Scale::Uniform(1.));
        let v = vectors(&b, Orientation::ZXY);
        assert_eq!(v[0].xyz(), (2., 3., 1.));
    }

    #[test]
    fn ties_are_nudged_forward() {
        let mut times = vec![Timestamp::new(0, 10), Timestamp::new(0, 10), Timestamp::new(0, 10), Timestamp::new(5, 10)];
        nudge(times.iter_mut());
        assert_eq!(times[1].relative, TIMESTAMP_NUDGE);
        assert_eq!(times[2].relative, TIMESTAMP_NUDGE * 2);
        assert_eq!(times[3].relative, Duration::milliseconds(5));
    }
}
