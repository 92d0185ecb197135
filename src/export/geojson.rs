//! GeoJSON `Feature` with the track as a `LineString`.
//! Per-point values are stored as property arrays,
//! aligned with the coordinates.

use ::geojson::{Feature, Geometry, JsonObject, JsonValue, Value};

use super::{fixed_positions, ExportArtifact, ExportFormat, ExportOptions};
use crate::{errors::Error, TelemetryTimeline};

pub(super) fn export(timeline: &TelemetryTimeline, options: &ExportOptions) -> Result<ExportArtifact, Error> {
    let format = ExportFormat::GeoJson;
    let (points, warning) = fixed_positions(timeline, format);

    let coordinates = points
        .iter()
        .map(|p| vec![p.longitude, p.latitude, p.altitude])
        .collect::<Vec<_>>();

    let mut properties = JsonObject::new();
    properties.insert("name".to_owned(), JsonValue::from(timeline.name.as_str()));
    properties.insert(
        "device".to_owned(),
        timeline.device.as_deref().map(JsonValue::from).unwrap_or(JsonValue::Null),
    );
    properties.insert(
        "time".to_owned(),
        points
            .iter()
            .map(|p| JsonValue::from(p.time.relative.as_seconds_f64()))
            .collect(),
    );
    properties.insert(
        "utc".to_owned(),
        points
            .iter()
            .map(|p| p.datetime_to_string().map(JsonValue::from).unwrap_or(JsonValue::Null))
            .collect(),
    );
    properties.insert(
        "dop".to_owned(),
        points
            .iter()
            .map(|p| p.dop().map(JsonValue::from).unwrap_or(JsonValue::Null))
            .collect(),
    );
    properties.insert(
        "fix".to_owned(),
        points
            .iter()
            .map(|p| p.fix.map(|f| JsonValue::from(f.to_str())).unwrap_or(JsonValue::Null))
            .collect(),
    );

    let feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    };

    let mut content = serde_json::to_vec_pretty(&feature)?;
    content.push(b'\n');

    Ok(ExportArtifact {
        name: options.file_name(&timeline.name, format.kind(), format.ext()),
        content,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_helpers::{gps5_payload, gps_rows},
        Gpmf,
    };
    use ::geojson::GeoJson;
    use approx::assert_relative_eq;

    #[test]
    fn line_string_with_aligned_properties() {
        let gpmf = Gpmf::from_slice(&gps5_payload(&gps_rows(4, 557_000_000, 132_000_000, 10), "230412083015.000")).unwrap();
        let timeline = TelemetryTimeline::from_gpmf(&gpmf, "GH010026").unwrap();
        let artifact = export(&timeline, &ExportOptions::default()).unwrap();
        assert_eq!(artifact.name, "GH010026_gps.geojson");

        let text = String::from_utf8(artifact.content).unwrap();
        let feature = match text.parse::<GeoJson>().unwrap() {
            GeoJson::Feature(f) => f,
            other => panic!("expected feature, got {other:?}"),
        };

        let coordinates = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(c)) => c.to_owned(),
            other => panic!("expected line string, got {other:?}"),
        };
        assert_eq!(coordinates.len(), 4);
        assert_relative_eq!(coordinates[0][0], 13.2, epsilon = 1e-6);
        assert_relative_eq!(coordinates[3][1], 55.700003, epsilon = 1e-6);
        assert_relative_eq!(coordinates[0][2], 100., epsilon = 1e-6);

        let time = feature.property("time").and_then(|t| t.as_array()).unwrap();
        assert_eq!(time.len(), 4);
        assert_relative_eq!(time[2].as_f64().unwrap(), 0.5, epsilon = 1e-9);
        let fix = feature.property("fix").and_then(|t| t.as_array()).unwrap();
        assert_eq!(fix[0], "3d");
        let dop = feature.property("dop").and_then(|t| t.as_array()).unwrap();
        assert_relative_eq!(dop[0].as_f64().unwrap(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn empty_timeline_is_empty_line_string() {
        let artifact = export(&TelemetryTimeline::default(), &ExportOptions::default()).unwrap();
        assert!(artifact.warning.is_some());
        let text = String::from_utf8(artifact.content).unwrap();
        assert!(matches!(text.parse::<GeoJson>().unwrap(), GeoJson::Feature(_)));
    }
}
