//! Sensor axis order (`ORIN`).
//!
//! See <https://github.com/gopro/gpmf-parser/issues/165#issuecomment-1207241564>.
//! `ORIN` lists the camera axis for each input channel, e.g. `ZXY` means
//! channel 0 is camera Z, channel 1 is camera X, channel 2 is camera Y.
//! Lower case means the axis is inverted.

use std::fmt::Display;

use serde::{Serialize, Serializer};

/// Maps input channels to camera `x, y, z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orientation {
    /// For each camera axis: input channel and sign.
    axes: [(usize, i8); 3],
}

impl Default for Orientation {
    fn default() -> Self {
        Self::XZY
    }
}

impl Orientation {
    pub const XYZ: Self = Self {
        axes: [(0, 1), (1, 1), (2, 1)],
    };
    /// Default for Hero7 and later when `ORIN` is not logged.
    /// Changed from `ZXY`, see <https://github.com/gopro/gpmf-parser/issues/170#issuecomment-1322414755>.
    pub const XZY: Self = Self {
        axes: [(0, 1), (2, 1), (1, 1)],
    };
    /// Default for Hero5 and Hero6.
    pub const ZXY: Self = Self {
        axes: [(1, 1), (2, 1), (0, 1)],
    };

    /// Parses an `ORIN` value. Returns `None` unless each axis
    /// occurs exactly once in the first three characters.
    pub fn parse(orin: &str) -> Option<Self> {
        let mut axes: [Option<(usize, i8)>; 3] = [None; 3];
        let chars: Vec<char> = orin.trim_end_matches('\0').chars().collect();
        if chars.len() != 3 {
            return None;
        }

        for (channel, c) in chars.iter().enumerate() {
            let axis = match c.to_ascii_uppercase() {
                'X' => 0,
                'Y' => 1,
                'Z' => 2,
                _ => return None,
            };
            if axes[axis].is_some() {
                return None;
            }
            let sign = if c.is_ascii_lowercase() { -1 } else { 1 };
            axes[axis] = Some((channel, sign));
        }

        Some(Self {
            axes: [axes[0]?, axes[1]?, axes[2]?],
        })
    }

    /// Reorders input channels into camera `(x, y, z)`.
    /// Returns `None` if fewer than three channels are present.
    pub fn apply(&self, channels: &[f64]) -> Option<(f64, f64, f64)> {
        let axis = |i: usize| {
            let (channel, sign) = self.axes[i];
            channels.get(channel).map(|v| v * sign as f64)
        };
        Some((axis(0)?, axis(1)?, axis(2)?))
    }
}

impl Display for Orientation {
    /// Formats as an `ORIN` string, e.g. `ZXY`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut chars = [' '; 3];
        for (axis, (channel, sign)) in self.axes.iter().enumerate() {
            let c = ['X', 'Y', 'Z'][axis];
            chars[*channel] = if *sign < 0 { c.to_ascii_lowercase() } else { c };
        }
        write!(f, "{}", chars.iter().collect::<String>())
    }
}

impl Serialize for Orientation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
