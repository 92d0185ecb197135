//! Normalized telemetry for one clip, or several merged clips.

pub mod merge;
pub mod normalize;

pub use merge::{merge, MergeOptions};

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use time::Duration;
use tracing::debug;

use crate::{
    content_types::{Gps, Orientation, PositionSample, VectorSample},
    demux::{demux, StreamKind},
    errors::{ContainerFormatError, Warning},
    Gpmf, Timestamp,
};

use normalize::{nudge, TIMESTAMP_NUDGE};

/// Samples for a single stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Samples {
    Position(Vec<PositionSample>),
    Vector(Vec<VectorSample>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Self::Position(s) => s.len(),
            Self::Vector(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn positions(&self) -> Option<&[PositionSample]> {
        match self {
            Self::Position(s) => Some(s),
            Self::Vector(_) => None,
        }
    }

    pub fn vectors(&self) -> Option<&[VectorSample]> {
        match self {
            Self::Vector(s) => Some(s),
            Self::Position(_) => None,
        }
    }

    pub fn first_time(&self) -> Option<Timestamp> {
        match self {
            Self::Position(s) => s.first().map(|p| p.time),
            Self::Vector(s) => s.first().map(|v| v.time),
        }
    }

    pub fn last_time(&self) -> Option<Timestamp> {
        match self {
            Self::Position(s) => s.last().map(|p| p.time),
            Self::Vector(s) => s.last().map(|v| v.time),
        }
    }

    /// Shifts all timestamps and any logged datetime is left as is.
    pub fn offset(&mut self, offset: Duration) {
        match self {
            Self::Position(s) => s.iter_mut().for_each(|p| p.time = p.time.offset(offset)),
            Self::Vector(s) => s.iter_mut().for_each(|v| v.time = v.time.offset(offset)),
        }
    }

    pub(crate) fn make_monotonic(&mut self) {
        match self {
            Self::Position(s) => nudge(s.iter_mut().map(|p| &mut p.time)),
            Self::Vector(s) => nudge(s.iter_mut().map(|v| &mut v.time)),
        }
    }

    /// Appends `other` if it holds the same kind of samples.
    fn append(&mut self, other: Self) {
        match (self, other) {
            (Self::Position(a), Self::Position(b)) => a.extend(b),
            (Self::Vector(a), Self::Vector(b)) => a.extend(b),
            _ => (),
        }
    }
}

/// Normalized samples and metadata for a single stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineStream {
    pub kind: StreamKind,
    /// `STNM`
    pub name: Option<String>,
    /// One unit per column.
    pub units: Vec<String>,
    /// Hz
    pub sample_rate: Option<f64>,
    /// Logged `ORIN`, if any.
    pub orientation: Option<Orientation>,
    /// `GPSA` altitude reference for position streams, e.g. `MSLV`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_system: Option<String>,
    /// Samples declared in the source. Differs from the number of
    /// samples if some blocks could not be decoded.
    pub declared_samples: usize,
    pub samples: Samples,
}

impl TimelineStream {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends samples from the same stream in a later clip.
    /// The sample rate becomes the combined rate for both.
    fn append(&mut self, other: Self) {
        self.sample_rate = match (self.sample_rate, other.sample_rate) {
            (Some(a), Some(b)) if a > 0. && b > 0. => {
                let (n1, n2) = (self.len() as f64, other.len() as f64);
                Some((n1 + n2) / (n1 / a + n2 / b))
            }
            (a, b) => a.or(b),
        };
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.units.is_empty() {
            self.units = other.units;
        }
        self.orientation = self.orientation.or(other.orientation);
        if self.altitude_system.is_none() {
            self.altitude_system = other.altitude_system;
        }
        self.declared_samples += other.declared_samples;
        self.samples.append(other.samples);
    }
}

/// Timestamped telemetry, keyed by stream.
///
/// Within each stream, timestamps are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryTimeline {
    /// Basename for outputs, e.g. `GH010026`.
    pub name: String,
    /// `DVNM`
    pub device: Option<String>,
    pub sources: Vec<PathBuf>,
    /// Blake3 hash (hex) for each clip, see `Gpmf::fingerprint`.
    pub fingerprints: Vec<String>,
    pub streams: BTreeMap<StreamKind, TimelineStream>,
    pub warnings: Vec<Warning>,
    /// Start of each clip, in merge order.
    #[serde(skip)]
    pub clip_starts: Vec<Duration>,
}

impl TelemetryTimeline {
    /// Demuxes and normalizes `gpmf`. Fails if no samples could be
    /// extracted for any supported stream.
    pub fn from_gpmf(gpmf: &Gpmf, name: &str) -> Result<Self, ContainerFormatError> {
        if gpmf.is_empty() {
            return Err(ContainerFormatError::NoTelemetry);
        }

        let demuxed = demux(gpmf);
        let timeline = Self {
            name: name.to_owned(),
            device: demuxed.device.to_owned(),
            sources: gpmf.source.to_owned(),
            fingerprints: gpmf.fingerprint.iter().cloned().collect(),
            streams: normalize::streams(&demuxed),
            warnings: demuxed.warnings,
            clip_starts: vec![Duration::ZERO],
        };

        if timeline.is_empty() {
            return Err(ContainerFormatError::NoTelemetry);
        }

        debug!(
            "{name}: {} samples in {} streams",
            timeline.len(),
            timeline.streams.len()
        );

        Ok(timeline)
    }

    pub fn stream(&self, kind: StreamKind) -> Option<&TimelineStream> {
        self.streams.get(&kind)
    }

    /// Total number of samples across all streams.
    pub fn len(&self) -> usize {
        self.streams.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Points used for geospatial exports: per clip, `GPS9` if it
    /// has samples, otherwise `GPS5`. The returned kind is `GPS9`
    /// if any clip uses it.
    pub fn positions(&self) -> Option<(StreamKind, Vec<&PositionSample>)> {
        let gps9 = self
            .stream(StreamKind::Gps9)
            .and_then(|s| s.samples.positions());
        let gps5 = self
            .stream(StreamKind::Gps5)
            .and_then(|s| s.samples.positions());
        if gps9.is_none() && gps5.is_none() {
            return None;
        }

        let mut points: Vec<&PositionSample> = Vec::new();
        let mut uses_gps9 = false;
        for (i, start) in self.clips().iter().enumerate() {
            let end = self.clip_starts.get(i + 1);
            let in_clip = |p: &&PositionSample| {
                (i == 0 || p.time.relative >= *start) && end.map_or(true, |e| p.time.relative < *e)
            };
            let clip_gps9 = gps9.unwrap_or_default().iter().filter(in_clip).collect::<Vec<_>>();
            if clip_gps9.is_empty() {
                points.extend(gps5.unwrap_or_default().iter().filter(in_clip));
            } else {
                uses_gps9 = true;
                points.extend(clip_gps9);
            }
        }

        let kind = if uses_gps9 || gps5.is_none() {
            StreamKind::Gps9
        } else {
            StreamKind::Gps5
        };
        debug!("{}: using {kind} ({} points)", self.name, points.len());
        Some((kind, points))
    }

    /// Clip starts, or a single clip starting at zero.
    fn clips(&self) -> &[Duration] {
        if self.clip_starts.is_empty() {
            &[Duration::ZERO]
        } else {
            &self.clip_starts
        }
    }

    /// Points used for geospatial exports.
    pub fn gps(&self) -> Gps {
        Gps(self
            .positions()
            .map(|(_, p)| p.into_iter().cloned().collect())
            .unwrap_or_default())
    }

    /// First position with satellite lock.
    pub fn first_fix(&self) -> Option<&PositionSample> {
        self.positions()?.1.into_iter().find(|p| p.is_fixed())
    }

    /// Last position with satellite lock.
    pub fn last_fix(&self) -> Option<&PositionSample> {
        self.positions()?.1.into_iter().rev().find(|p| p.is_fixed())
    }

    /// End of the timeline: the latest end of the last sample
    /// in any stream. A sample covers at least `TIMESTAMP_NUDGE`.
    pub fn end(&self) -> Duration {
        self.streams
            .values()
            .filter_map(|s| s.samples.last_time())
            .map(|t| t.relative + t.duration.max(TIMESTAMP_NUDGE))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Shifts all timestamps by `offset`.
    pub fn offset(&mut self, offset: Duration) {
        self.streams
            .values_mut()
            .for_each(|s| s.samples.offset(offset));
        self.clip_starts.iter_mut().for_each(|s| *s += offset);
    }

    /// Appends `other`, which must already be offset to start after `self`.
    pub(crate) fn append(&mut self, other: Self) {
        if self.device.is_none() {
            self.device = other.device;
        }
        self.sources.extend(other.sources);
        self.fingerprints.extend(other.fingerprints);
        self.warnings.extend(other.warnings);
        self.clip_starts.extend(other.clip_starts);
        for (kind, stream) in other.streams {
            match self.streams.get_mut(&kind) {
                Some(s) => s.append(stream),
                None => {
                    self.streams.insert(kind, stream);
                }
            }
        }
    }
}
