//! GPX 1.1 track from the position stream.

use ::gpx::{Fix, Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use geo_types::Point;
use time::Duration;

use super::{fixed_positions, ExportArtifact, ExportFormat, ExportOptions};
use crate::{
    content_types::{FixQuality, PositionSample},
    errors::Error,
    TelemetryTimeline,
};

const CREATOR: &str = "gpmf-export";

pub(super) fn export(timeline: &TelemetryTimeline, options: &ExportOptions) -> Result<ExportArtifact, Error> {
    let format = ExportFormat::Gpx;
    let (points, warning) = fixed_positions(timeline, format);

    let mut tracks = Vec::new();
    if !points.is_empty() {
        let mut track = Track::new();
        track.name = Some(timeline.name.to_owned());
        track.segments = segments(&points, options.gpx_segment_gap_secs);
        tracks.push(track);
    }

    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.to_owned()),
        metadata: None,
        waypoints: vec![],
        tracks,
        routes: vec![],
    };

    let mut content: Vec<u8> = Vec::new();
    ::gpx::write(&gpx, &mut content)?;

    Ok(ExportArtifact {
        name: options.file_name(&timeline.name, format.kind(), format.ext()),
        content,
        warning,
    })
}

/// Splits points into track segments wherever consecutive points
/// are more than `gap_secs` apart. Compared as `f64`, since any
/// value is accepted, e.g. `f64::MAX` to never split.
fn segments(points: &[&PositionSample], gap_secs: f64) -> Vec<TrackSegment> {
    let mut segments: Vec<TrackSegment> = Vec::new();
    let mut current: Vec<Waypoint> = Vec::new();
    let mut previous: Option<Duration> = None;

    for point in points.iter() {
        if let Some(t) = previous {
            if (point.time.relative - t).as_seconds_f64() > gap_secs && !current.is_empty() {
                segments.push(TrackSegment {
                    points: std::mem::take(&mut current),
                });
            }
        }
        previous = Some(point.time.relative);
        current.push(waypoint(point));
    }

    if !current.is_empty() {
        segments.push(TrackSegment { points: current });
    }

    segments
}

fn waypoint(point: &PositionSample) -> Waypoint {
    let mut waypoint = Waypoint::new(Point::new(point.longitude, point.latitude));
    waypoint.elevation = Some(point.altitude);
    waypoint.time = point
        .datetime
        .map(|dt| ::gpx::Time::from(dt.assume_utc()));
    waypoint.fix = point.fix.map(|f| match f {
        FixQuality::Fix2D => Fix::TwoDimensional,
        FixQuality::Fix3D => Fix::ThreeDimensional,
        FixQuality::NoFix => Fix::None,
    });
    waypoint.pdop = point.dop();
    waypoint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_helpers::{devc, gps5, gps5_payload, gps_rows, gpsf, gpsu, scal, strm},
        Gpmf,
    };
    use approx::assert_relative_eq;

    fn timeline(payloads: &[Vec<u8>]) -> TelemetryTimeline {
        let gpmf = Gpmf::from_slice(&payloads.concat()).unwrap();
        TelemetryTimeline::from_gpmf(&gpmf, "GH010026").unwrap()
    }

    fn no_fix_payload(datetime: &str) -> Vec<u8> {
        devc(
            "Hero9 Black",
            &[strm(&[
                gpsf(0),
                gpsu(datetime),
                scal(&[10_000_000, 10_000_000, 1000, 1000, 100]),
                gps5(&gps_rows(10, 0, 0, 0)),
            ])],
        )
    }

    #[test]
    fn reads_back_as_gpx() {
        let t = timeline(&[gps5_payload(&gps_rows(10, 557_000_000, 132_000_000, 10), "230412083015.000")]);
        let artifact = export(&t, &ExportOptions::default()).unwrap();
        assert_eq!(artifact.name, "GH010026_gps.gpx");
        assert!(artifact.warning.is_none());

        let gpx = ::gpx::read(artifact.content.as_slice()).unwrap();
        let points = &gpx.tracks[0].segments[0].points;
        assert_eq!(points.len(), 10);
        assert_relative_eq!(points[0].point().y(), 55.7, epsilon = 1e-6);
        assert_relative_eq!(points[9].point().y(), 55.700009, epsilon = 1e-6);
        assert_relative_eq!(points[0].point().x(), 13.2, epsilon = 1e-6);
        assert_eq!(points[0].elevation, Some(100.));
        assert!(points[0].time.is_some());
    }

    #[test]
    fn skips_no_fix_and_splits_on_gaps() {
        // 1 s with fix, 1 s without, 1 s with fix: a 1.1 s gap between fixed points
        let t = timeline(&[
            gps5_payload(&gps_rows(10, 557_000_000, 132_000_000, 10), "230412083015.000"),
            no_fix_payload("230412083016.000"),
            gps5_payload(&gps_rows(10, 557_000_100, 132_000_000, 10), "230412083017.000"),
        ]);

        let options = ExportOptions {
            gpx_segment_gap_secs: 1.0,
            ..Default::default()
        };
        let gpx = ::gpx::read(export(&t, &options).unwrap().content.as_slice()).unwrap();
        let segments = &gpx.tracks[0].segments;
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].points.len(), 10);
        assert_eq!(segments[1].points.len(), 10);

        let gpx = ::gpx::read(export(&t, &ExportOptions::default()).unwrap().content.as_slice()).unwrap();
        assert_eq!(gpx.tracks[0].segments.len(), 1);
        assert_eq!(gpx.tracks[0].segments[0].points.len(), 20);
    }

    #[test]
    fn huge_gap_never_splits() {
        let t = timeline(&[
            gps5_payload(&gps_rows(10, 557_000_000, 132_000_000, 10), "230412083015.000"),
            no_fix_payload("230412083016.000"),
            gps5_payload(&gps_rows(10, 557_000_100, 132_000_000, 10), "230412083017.000"),
        ]);
        for gap in [1e300, f64::MAX, f64::INFINITY] {
            let options = ExportOptions {
                gpx_segment_gap_secs: gap,
                ..Default::default()
            };
            let gpx = ::gpx::read(export(&t, &options).unwrap().content.as_slice()).unwrap();
            assert_eq!(gpx.tracks[0].segments.len(), 1);
        }
    }

    #[test]
    fn no_fixed_points_gives_empty_gpx() {
        let t = timeline(&[no_fix_payload("230412083015.000")]);
        let artifact = export(&t, &ExportOptions::default()).unwrap();
        assert!(artifact.warning.is_some());
        let gpx = ::gpx::read(artifact.content.as_slice()).unwrap();
        assert!(gpx.tracks.is_empty());
    }
}
