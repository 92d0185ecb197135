//! Concatenates timelines for consecutive clips.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::TelemetryTimeline;
use crate::{
    constants::{DEFAULT_MERGED_NAME, DEFAULT_MERGE_GAP_THRESHOLD_M},
    errors::{SequenceGapError, Warning},
    geo::haversine,
};

/// Options for merging clips.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    /// Distance in metres between the last fix in one clip and the first
    /// fix in the next, above which a clip is assumed to be missing.
    pub gap_threshold_m: f64,
    /// Name for the merged timeline.
    pub name: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            gap_threshold_m: DEFAULT_MERGE_GAP_THRESHOLD_M,
            name: DEFAULT_MERGED_NAME.to_owned(),
        }
    }
}

/// Merges `timelines` in the given order. Each timeline is shifted to
/// start where the previous one ends. Returns `None` if `timelines` is empty.
///
/// Large distances between consecutive clips and clips
/// given more than once are recorded as warnings, but do not stop the merge.
pub fn merge(timelines: Vec<TelemetryTimeline>, options: &MergeOptions) -> Option<TelemetryTimeline> {
    let mut timelines = timelines.into_iter();
    let mut merged = timelines.next()?;
    merged.name = options.name.to_owned();

    let mut seen: HashSet<String> = merged.fingerprints.iter().cloned().collect();

    for mut next in timelines {
        let source = next
            .sources
            .first()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| next.name.to_owned());

        for fingerprint in next.fingerprints.iter() {
            if !seen.insert(fingerprint.to_owned()) {
                warn!("{source} duplicates an earlier clip");
                merged.warnings.push(Warning::DuplicateClip {
                    path: source.to_owned(),
                    fingerprint: fingerprint.to_owned(),
                });
            }
        }

        if let (Some(last), Some(first)) = (merged.last_fix(), next.first_fix()) {
            let distance_m = haversine(last.latitude, last.longitude, first.latitude, first.longitude);
            if distance_m > options.gap_threshold_m {
                let err = SequenceGapError {
                    previous: merged
                        .sources
                        .last()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    next: source.to_owned(),
                    distance_m,
                    threshold_m: options.gap_threshold_m,
                };
                warn!("{err}");
                merged.warnings.push(err.into());
            }
        }

        let offset = merged.end();
        debug!("{source}: offset {:.3}s", offset.as_seconds_f64());
        next.offset(offset);
        merged.append(next);
    }

    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        demux::StreamKind,
        test_helpers::{devc, gps5_payload, gps9, gps_rows, scal, strm, text},
        Gpmf,
    };

    fn clip(name: &str, lat: i32, datetime: &str) -> TelemetryTimeline {
        let gpmf = Gpmf::from_slice(&gps5_payload(&gps_rows(10, lat, 132_000_000, 10), datetime)).unwrap();
        let mut timeline = TelemetryTimeline::from_gpmf(&gpmf, name).unwrap();
        timeline.sources = vec![format!("{name}.MP4").into()];
        timeline
    }

    #[test]
    fn concatenates_in_order() {
        let a = clip("GH010026", 557_000_000, "230412083015.000");
        let b = clip("GH020026", 557_000_100, "230412083016.000");
        let merged = merge(vec![a.clone(), b.clone()], &MergeOptions::default()).unwrap();

        assert_eq!(merged.name, "merged_track");
        assert_eq!(merged.len(), a.len() + b.len());
        assert_eq!(merged.sources.len(), 2);
        assert!(merged.warnings.is_empty());

        let points = merged.stream(StreamKind::Gps5).unwrap().samples.positions().unwrap();
        assert!(points[10].time.relative > points[9].time.relative);
        assert!(points.windows(2).all(|w| w[1].time.relative > w[0].time.relative));
    }

    #[test]
    fn gap_is_recorded_and_merged() {
        let a = clip("GH010026", 557_000_000, "230412083015.000");
        // ~11 km north
        let b = clip("GH020026", 558_000_000, "230412083016.000");
        let merged = merge(vec![a, b], &MergeOptions::default()).unwrap();
        assert_eq!(merged.len(), 20);
        assert!(matches!(
            &merged.warnings[..],
            [Warning::SequenceGap(SequenceGapError { previous, .. })] if previous == "GH010026.MP4"
        ));
    }

    #[test]
    fn duplicate_clip_is_flagged() {
        let a = clip("GH010026", 557_000_000, "230412083015.000");
        let merged = merge(vec![a.clone(), a], &MergeOptions::default()).unwrap();
        assert_eq!(merged.len(), 20);
        assert!(matches!(merged.warnings[0], Warning::DuplicateClip { .. }));
    }

    fn gps9_clip(name: &str, lat: i32) -> TelemetryTimeline {
        let rows = (0..10)
            .map(|i| ([lat + i * 10, 132_000_000, 80_000, 1500, 160, 8502, 30_617_000 + i * 100], [150_u16, 3_u16]))
            .collect::<Vec<_>>();
        let payload = devc(
            "Hero11 Black",
            &[strm(&[
                text(b"TYPE", "lllllllSS"),
                scal(&[10_000_000, 10_000_000, 1000, 1000, 100, 1, 1000, 100, 1]),
                gps9(&rows),
            ])],
        );
        let mut timeline = TelemetryTimeline::from_gpmf(&Gpmf::from_slice(&payload).unwrap(), name).unwrap();
        timeline.sources = vec![format!("{name}.MP4").into()];
        timeline
    }

    #[test]
    fn positions_fall_back_per_clip() {
        let a = clip("GH010026", 557_000_000, "230412083015.000");
        let b = gps9_clip("GH020026", 557_000_100);
        let c = clip("GH030026", 557_000_200, "230412083017.000");
        let merged = merge(vec![a, b, c], &MergeOptions::default()).unwrap();
        assert!(merged.warnings.is_empty());

        let (kind, points) = merged.positions().unwrap();
        assert_eq!(kind, StreamKind::Gps9);
        assert_eq!(points.len(), 30);
        assert!(points.windows(2).all(|w| w[1].time.relative > w[0].time.relative));
        assert_eq!(points[0].latitude, 55.7);
        assert_eq!(points[10].latitude, 55.70001);
        assert_eq!(points[20].latitude, 55.70002);
        assert_eq!(merged.last_fix().map(|p| p.latitude), Some(55.700029));
    }

    #[test]
    fn nothing_to_merge() {
        assert!(merge(Vec::new(), &MergeOptions::default()).is_none());
    }
}
