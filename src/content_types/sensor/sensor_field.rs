use std::fmt::Display;

use serde::Serialize;

use crate::Timestamp;

use super::Orientation;

/// Single 3-axis sample in camera orientation and physical units:
/// - Accelerometer (acceleration, m/s²)
/// - Gyroscope (rotation, rad/s)
/// - Gravity vector (direction of gravity in relation to camera angle)
/// - Magnetometer (µT)
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct VectorSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub time: Timestamp,
}

impl Display for VectorSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<x: {:>3.08}, y: {:>3.08}, z: {:>3.08}>", self.x, self.y, self.z)
    }
}

impl VectorSample {
    /// New sample from scaled channel values in device order.
    /// Returns `None` if fewer than three channels are present.
    pub fn new(channels: &[f64], orientation: &Orientation, time: Timestamp) -> Option<Self> {
        let (x, y, z) = orientation.apply(channels)?;
        Some(Self { x, y, z, time })
    }

    pub fn xyz(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Vector length.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}
