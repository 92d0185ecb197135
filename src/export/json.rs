//! Lossless JSON dump of the full timeline.

use super::{ExportArtifact, ExportFormat, ExportOptions};
use crate::{
    errors::{EmptyStreamError, Error, Warning},
    TelemetryTimeline,
};

pub(super) fn export(timeline: &TelemetryTimeline, options: &ExportOptions) -> Result<ExportArtifact, Error> {
    let format = ExportFormat::Json;
    let mut content = serde_json::to_vec_pretty(timeline)?;
    content.push(b'\n');

    let warning: Option<Warning> = timeline.is_empty().then(|| {
        EmptyStreamError {
            stream: "*".to_owned(),
            format: format.to_string(),
        }
        .into()
    });

    Ok(ExportArtifact {
        name: options.file_name(&timeline.name, format.kind(), format.ext()),
        content,
        warning,
    })
}
