//! KML 2.2 document with the track as a single `LineString`.

use super::{escape_xml, fixed_positions, ExportArtifact, ExportFormat, ExportOptions};
use crate::TelemetryTimeline;

pub(super) fn export(timeline: &TelemetryTimeline, options: &ExportOptions) -> ExportArtifact {
    let format = ExportFormat::Kml;
    let (points, warning) = fixed_positions(timeline, format);
    let name = escape_xml(&timeline.name);

    let coordinates = points
        .iter()
        .map(|p| format!("{},{},{}", p.longitude, p.latitude, p.altitude))
        .collect::<Vec<_>>()
        .join(" ");

    let kml = format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n",
            "  <Document>\n",
            "    <name>{name}</name>\n",
            "    <Placemark>\n",
            "      <name>{name}</name>\n",
            "      <LineString>\n",
            "        <altitudeMode>{mode}</altitudeMode>\n",
            "        <coordinates>{coordinates}</coordinates>\n",
            "      </LineString>\n",
            "    </Placemark>\n",
            "  </Document>\n",
            "</kml>\n",
        ),
        name = name,
        mode = options.kml_altitude_mode.kml_str(),
        coordinates = coordinates,
    );

    ExportArtifact {
        name: options.file_name(&timeline.name, format.kind(), format.ext()),
        content: kml.into_bytes(),
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{EmptyStreamError, Warning},
        export::AltitudeMode,
        test_helpers::{gps5_payload, gps_rows},
        Gpmf,
    };

    fn timeline(name: &str) -> TelemetryTimeline {
        let gpmf = Gpmf::from_slice(&gps5_payload(&gps_rows(3, 557_000_000, 132_000_000, 10), "230412083015.000")).unwrap();
        TelemetryTimeline::from_gpmf(&gpmf, name).unwrap()
    }

    #[test]
    fn lon_lat_alt_coordinates() {
        let artifact = export(&timeline("GH010026"), &ExportOptions::default());
        let kml = String::from_utf8(artifact.content).unwrap();
        assert_eq!(artifact.name, "GH010026_gps.kml");
        assert!(kml.contains("<altitudeMode>absolute</altitudeMode>"));
        assert!(kml.contains("<coordinates>13.2,55.7,100 13.2,55.700001,100 13.2,55.700002,100</coordinates>"));
    }

    #[test]
    fn altitude_mode_and_escaped_name() {
        let options = ExportOptions {
            kml_altitude_mode: AltitudeMode::RelativeToGround,
            ..Default::default()
        };
        let kml = String::from_utf8(export(&timeline("ride <1> & 2"), &options).content).unwrap();
        assert!(kml.contains("<altitudeMode>relativeToGround</altitudeMode>"));
        assert!(kml.contains("<name>ride &lt;1&gt; &amp; 2</name>"));
    }

    #[test]
    fn no_positions_gives_empty_line_string() {
        let artifact = export(&TelemetryTimeline::default(), &ExportOptions::default());
        assert!(matches!(
            &artifact.warning,
            Some(Warning::EmptyStream(EmptyStreamError { format, .. })) if format == "kml"
        ));
        let kml = String::from_utf8(artifact.content).unwrap();
        assert!(kml.contains("<coordinates></coordinates>"));
        assert!(kml.ends_with("</kml>\n"));
    }
}
