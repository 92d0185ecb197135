use crate::Timestamp;

/// Byte offset, size and timing for a single MP4 sample,
/// i.e. one GPMF payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset {
    /// Absolute byte offset in the MP4 file.
    pub position: u64,
    /// Sample size in bytes.
    pub size: u64,
    /// Sample start relative to track start, and sample duration.
    pub time: Timestamp,
}

impl Offset {
    pub fn new(position: u64, size: u64, time: Timestamp) -> Self {
        Self {
            position,
            size,
            time,
        }
    }

    /// Absolute byte offset for the end of the sample.
    /// `None` if it does not fit in a `u64`.
    pub fn end(&self) -> Option<u64> {
        self.position.checked_add(self.size)
    }
}
