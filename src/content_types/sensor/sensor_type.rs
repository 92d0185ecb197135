use std::fmt::Display;

use crate::FourCC;

/// Inertial sensor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    Accelerometer,
    GravityVector,
    Gyroscope,
    Magnetometer,
}

impl Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorType::Accelerometer => write!(f, "Accelerometer"),
            SensorType::GravityVector => write!(f, "GravityVector"),
            SensorType::Gyroscope => write!(f, "Gyroscope"),
            SensorType::Magnetometer => write!(f, "Magnetometer"),
        }
    }
}

impl SensorType {
    pub fn from_fourcc(fourcc: &FourCC) -> Option<Self> {
        match fourcc {
            FourCC::ACCL => Some(Self::Accelerometer),
            FourCC::GRAV => Some(Self::GravityVector),
            FourCC::GYRO => Some(Self::Gyroscope),
            FourCC::MAGN => Some(Self::Magnetometer),
            _ => None,
        }
    }

    pub fn fourcc(&self) -> FourCC {
        match self {
            Self::Accelerometer => FourCC::ACCL,
            Self::GravityVector => FourCC::GRAV,
            Self::Gyroscope => FourCC::GYRO,
            Self::Magnetometer => FourCC::MAGN,
        }
    }

    /// SI units used when the stream logs no `SIUN`.
    /// Gravity is a unit vector.
    pub fn default_units(&self) -> &'static str {
        match self {
            Self::Accelerometer => "m/s²",
            Self::GravityVector => "",
            Self::Gyroscope => "rad/s",
            Self::Magnetometer => "µT",
        }
    }
}
