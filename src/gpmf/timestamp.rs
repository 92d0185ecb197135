//! Convenience structure for dealing with relative timestamps.

use serde::{ser::SerializeStruct, Serialize, Serializer};
use time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Timestamp containing time relative to recording start and the "duration",
/// i.e. the time until the next payload or sample.
pub struct Timestamp {
    /// Time passed since recording start.
    pub relative: Duration,
    /// Time span covered, e.g. the MP4 sample duration for a payload,
    /// or the sample interval for a single telemetry sample.
    pub duration: Duration,
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.relative.cmp(&other.relative)
    }
}

impl From<(Duration, Duration)> for Timestamp {
    fn from(value: (Duration, Duration)) -> Self {
        Self {
            relative: value.0,
            duration: value.1,
        }
    }
}

impl Serialize for Timestamp {
    /// Serialized as seconds.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Timestamp", 2)?;
        state.serialize_field("relative", &self.relative.as_seconds_f64())?;
        state.serialize_field("duration", &self.duration.as_seconds_f64())?;
        state.end()
    }
}

impl Timestamp {
    /// New Timestamp. `relative` equals time in milliseconds
    /// from recording start,
    /// `duration` equals time span in milliseconds.
    pub fn new(relative: i64, duration: i64) -> Self {
        Self {
            relative: Duration::milliseconds(relative),
            duration: Duration::milliseconds(duration),
        }
    }

    /// Returns `Timestamp.relative` as milliseconds.
    pub fn relative_ms(&self) -> i128 {
        self.relative.whole_milliseconds()
    }

    /// Returns `Timestamp.duration` as milliseconds.
    pub fn duration_ms(&self) -> i128 {
        self.duration.whole_milliseconds()
    }

    /// End of the covered time span.
    pub fn end(&self) -> Duration {
        self.relative + self.duration
    }

    /// Timestamp for sample `index` out of `count`, distributed evenly
    /// over the time span covered by `self`.
    pub fn sample(&self, index: usize, count: usize) -> Self {
        if count == 0 {
            return *self;
        }
        let start = self.relative.whole_nanoseconds();
        let span = self.duration.whole_nanoseconds();
        let n = count as i128;
        Self {
            relative: nanos(start + span * index as i128 / n),
            duration: nanos(span / n),
        }
    }

    /// Shifts `relative` by `offset`, leaving `duration` untouched.
    pub fn offset(&self, offset: Duration) -> Self {
        Self {
            relative: self.relative + offset,
            ..*self
        }
    }
}

fn nanos(value: i128) -> Duration {
    Duration::nanoseconds(value.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_evenly_distributed() {
        let payload = Timestamp::new(1000, 1000);
        let ts = (0..4).map(|i| payload.sample(i, 4)).collect::<Vec<_>>();
        assert_eq!(ts[0].relative_ms(), 1000);
        assert_eq!(ts[1].relative_ms(), 1250);
        assert_eq!(ts[3].relative_ms(), 1750);
        assert!(ts.iter().all(|t| t.duration_ms() == 250));
    }

    #[test]
    fn offset_keeps_duration() {
        let t = Timestamp::new(500, 100).offset(Duration::seconds(2));
        assert_eq!(t.relative_ms(), 2500);
        assert_eq!(t.duration_ms(), 100);
        assert_eq!(t.end(), Duration::milliseconds(2600));
    }
}
