//! One CSV table per stream.
//!
//! Coordinates are written with 6 decimals (~0.1 m),
//! all other values at full precision.

use super::{ExportArtifact, ExportFormat, ExportOptions};
use crate::{
    content_types::{PositionSample, VectorSample},
    errors::{EmptyStreamError, Error, Warning},
    timeline::{Samples, TimelineStream},
    TelemetryTimeline,
};

const POSITION_COLUMNS: [&str; 5] = ["latitude", "longitude", "altitude", "speed2d", "speed3d"];
const VECTOR_COLUMNS: [&str; 3] = ["x", "y", "z"];

pub(super) fn export(timeline: &TelemetryTimeline, options: &ExportOptions) -> Result<Vec<ExportArtifact>, Error> {
    let format = ExportFormat::Csv;

    if timeline.streams.is_empty() {
        let warning = EmptyStreamError {
            stream: "*".to_owned(),
            format: format.to_string(),
        };
        return Ok(vec![ExportArtifact {
            name: options.file_name(&timeline.name, format.kind(), format.ext()),
            content: Vec::new(),
            warning: Some(warning.into()),
        }]);
    }

    timeline
        .streams
        .values()
        .map(|stream| {
            let warning: Option<Warning> = stream.is_empty().then(|| {
                EmptyStreamError {
                    stream: stream.kind.to_string(),
                    format: format.to_string(),
                }
                .into()
            });
            Ok(ExportArtifact {
                name: options.file_name(&timeline.name, stream.kind.to_str(), format.ext()),
                content: table(stream)?,
                warning,
            })
        })
        .collect()
}

fn table(stream: &TimelineStream) -> Result<Vec<u8>, Error> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    match &stream.samples {
        Samples::Position(points) => {
            let mut header = vec!["time [s]".to_owned(), "utc".to_owned()];
            header.extend(column_names(&POSITION_COLUMNS, &stream.units));
            header.extend(["fix".to_owned(), "dop".to_owned()]);
            writer.write_record(&header)?;
            for point in points.iter() {
                writer.write_record(&position_record(point))?;
            }
        }
        Samples::Vector(vectors) => {
            let mut header = vec!["time [s]".to_owned()];
            header.extend(column_names(&VECTOR_COLUMNS, &stream.units));
            writer.write_record(&header)?;
            for vector in vectors.iter() {
                writer.write_record(&vector_record(vector))?;
            }
        }
    }

    writer.into_inner().map_err(|err| Error::Io(err.into_error()))
}

/// Column names with units, e.g. `altitude [m]`.
fn column_names(columns: &[&str], units: &[String]) -> Vec<String> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| match units.get(i).map(|u| u.trim()) {
            Some(unit) if !unit.is_empty() => format!("{column} [{unit}]"),
            _ => column.to_string(),
        })
        .collect()
}

fn position_record(point: &PositionSample) -> [String; 9] {
    [
        point.time.relative.as_seconds_f64().to_string(),
        point.datetime_to_string().unwrap_or_default(),
        format!("{:.6}", point.latitude),
        format!("{:.6}", point.longitude),
        point.altitude.to_string(),
        point.speed2d.to_string(),
        point.speed3d.to_string(),
        point.fix.map(|f| f.to_str().to_owned()).unwrap_or_default(),
        point.dop().map(|d| d.to_string()).unwrap_or_default(),
    ]
}

fn vector_record(vector: &VectorSample) -> [String; 4] {
    [
        vector.time.relative.as_seconds_f64().to_string(),
        vector.x.to_string(),
        vector.y.to_string(),
        vector.z.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_helpers::{devc, gps5_payload, gps_rows, scal, strm, vector3},
        Gpmf,
    };

    fn timeline() -> TelemetryTimeline {
        let mut payload = gps5_payload(&gps_rows(2, 557_000_001, 132_000_000, 10), "230412083015.000");
        payload.extend(devc("Hero9 Black", &[strm(&[scal(&[418]), vector3(b"ACCL", &[[4100, 10, -20]; 2])])]));
        let gpmf = Gpmf::from_slice(&payload).unwrap();
        TelemetryTimeline::from_gpmf(&gpmf, "GH010026").unwrap()
    }

    #[test]
    fn one_table_per_stream() {
        let artifacts = export(&timeline(), &ExportOptions::default()).unwrap();
        let names = artifacts.iter().map(|a| a.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["GH010026_GPS5.csv", "GH010026_ACCL.csv"]);
        assert!(artifacts.iter().all(|a| a.warning.is_none()));
    }

    #[test]
    fn six_decimal_coordinates() {
        let artifacts = export(&timeline(), &ExportOptions::default()).unwrap();
        let text = String::from_utf8(artifacts[0].content.to_owned()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("time [s],utc,latitude [deg],longitude [deg],altitude [m],speed2d [m/s],speed3d [m/s],fix,dop")
        );
        let first = lines.next().unwrap().split(',').collect::<Vec<_>>();
        assert_eq!(first[0], "0");
        assert_eq!(first[2], "55.700000");
        assert_eq!(first[3], "13.200000");
        assert_eq!(first[4], "100");
        assert_eq!(first[7], "3d");
        assert_eq!(first[8], "1.5");
    }

    #[test]
    fn sensor_values_at_full_precision() {
        let artifacts = export(&timeline(), &ExportOptions::default()).unwrap();
        let text = String::from_utf8(artifacts[1].content.to_owned()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("time [s],x [m/s²],y [m/s²],z [m/s²]"));
        let row = lines.next().unwrap().split(',').collect::<Vec<_>>();
        // Hero9 default orientation XZY: first channel is x
        let x: f64 = row[1].parse().unwrap();
        assert_eq!(x, 4100. / 418.);
    }

    #[test]
    fn empty_timeline_gives_empty_artifact() {
        let artifacts = export(&TelemetryTimeline::default(), &ExportOptions::default()).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].content.is_empty());
        assert!(artifacts[0].warning.is_some());
    }
}
