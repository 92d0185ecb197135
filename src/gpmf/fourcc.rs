//! GPMF Four CC, i.e. general stream identifier.
//! Not all are covered or documented, hence `FourCC::Other(String)`.
//! `FourCC::Invalid` is there to check for zero padding at the end of payloads,
//! which will otherwise erronously be parsed as valid GPMF FourCC.

use std::fmt::Display;

/// FourCC enum. Descriptions lifted from official GPMF documentation (<https://github.com/gopro/gpmf-parser>)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FourCC {
    // FOURCC RESERVED FOR GPMF STRUCTURE
    /// unique device source for metadata
    DEVC,
    /// device/track ID
    DVID,
    /// device name
    DVNM,
    /// Nested signal stream of metadata/telemetry
    STRM,
    /// Stream name
    STNM,
    /// Comments for any stream
    RMRK,
    /// Scaling factor (divisor)
    SCAL,
    /// Standard Units (like SI)
    SIUN,
    /// Display units
    UNIT,
    /// Typedefs for complex structures
    TYPE,
    /// Total Samples delivered since record start
    TSMP,
    /// Time Offset, data is delayed by 'x' seconds.
    TIMO,
    /// Empty payload count
    EMPT,
    /// Beginning of data timing in milliseconds (older devices)
    TICK,
    /// End of data timing in milliseconds (older devices)
    TOCK,
    /// Microsecond timestamp for the first sample in the payload
    STMP,

    // DEVICE/DATA SPECIFIC FOURCC
    /// 3-axis accelerometer, m/s²
    ACCL,
    /// 3-axis gyroscope, rad/s
    GYRO,
    /// Gravity vector
    GRAV,
    /// Magnetometer, µT
    MAGN,
    /// Camera orientation quaternions
    CORI,
    /// Image orientation quaternions
    IORI,
    /// latitude, longitude, altitude (WGS 84), 2D ground speed, and 3D speed
    GPS5,
    /// GPS5 plus days since 2000, seconds since midnight, DOP, and fix (Hero11 and later)
    GPS9,
    /// GPS Fix: 0 - no lock, 2 or 3 - 2D or 3D Lock
    GPSF,
    /// GPS Precision - Dilution of Precision (DOP x100)
    GPSP,
    /// UTC time and date from GPS
    GPSU,
    /// GPS Altitude system, e.g. `MSLV`
    GPSA,
    /// Axis order for sensor data, e.g. `ZXY`. Lower case means inverted axis.
    ORIN,
    /// Axis order for output, e.g. `XYZ`
    ORIO,
    /// Orientation matrix
    MTRX,
    /// Sensor temperature, °C
    TMPC,
    /// Exposure time
    SHUT,
    /// White balance in Kelvin
    WBAL,
    /// Sensor ISO
    ISOE,

    /// Zero padding.
    #[default]
    Invalid,

    /// Undocumented FourCC
    Other(String),
}

impl Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FourCC {
    /// Generate FourCC enum from raw bytes.
    pub fn from_slice(slice: &[u8]) -> Self {
        match slice {
            b"DEVC" => FourCC::DEVC,
            b"DVID" => FourCC::DVID,
            b"DVNM" => FourCC::DVNM,
            b"STRM" => FourCC::STRM,
            b"STNM" => FourCC::STNM,
            b"RMRK" => FourCC::RMRK,
            b"SCAL" => FourCC::SCAL,
            b"SIUN" => FourCC::SIUN,
            b"UNIT" => FourCC::UNIT,
            b"TYPE" => FourCC::TYPE,
            b"TSMP" => FourCC::TSMP,
            b"TIMO" => FourCC::TIMO,
            b"EMPT" => FourCC::EMPT,
            b"TICK" => FourCC::TICK,
            b"TOCK" => FourCC::TOCK,
            b"STMP" => FourCC::STMP,

            b"ACCL" => FourCC::ACCL,
            b"GYRO" => FourCC::GYRO,
            b"GRAV" => FourCC::GRAV,
            b"MAGN" => FourCC::MAGN,
            b"CORI" => FourCC::CORI,
            b"IORI" => FourCC::IORI,
            b"GPS5" => FourCC::GPS5,
            b"GPS9" => FourCC::GPS9,
            b"GPSF" => FourCC::GPSF,
            b"GPSP" => FourCC::GPSP,
            b"GPSU" => FourCC::GPSU,
            b"GPSA" => FourCC::GPSA,
            b"ORIN" => FourCC::ORIN,
            b"ORIO" => FourCC::ORIO,
            b"MTRX" => FourCC::MTRX,
            b"TMPC" => FourCC::TMPC,
            b"SHUT" => FourCC::SHUT,
            b"WBAL" => FourCC::WBAL,
            b"ISOE" => FourCC::ISOE,

            // used as check for breaking parse loop
            b"\0\0\0\0" => FourCC::Invalid,

            _ => FourCC::Other(String::from_utf8_lossy(slice).to_string()),
        }
    }

    /// Generate FourCC enum from `&str`.
    pub fn from_str(fourcc: &str) -> Self {
        Self::from_slice(fourcc.as_bytes())
    }

    /// Generate `&str` from `FourCC`.
    pub fn to_str(&self) -> &str {
        match self {
            FourCC::DEVC => "DEVC",
            FourCC::DVID => "DVID",
            FourCC::DVNM => "DVNM",
            FourCC::STRM => "STRM",
            FourCC::STNM => "STNM",
            FourCC::RMRK => "RMRK",
            FourCC::SCAL => "SCAL",
            FourCC::SIUN => "SIUN",
            FourCC::UNIT => "UNIT",
            FourCC::TYPE => "TYPE",
            FourCC::TSMP => "TSMP",
            FourCC::TIMO => "TIMO",
            FourCC::EMPT => "EMPT",
            FourCC::TICK => "TICK",
            FourCC::TOCK => "TOCK",
            FourCC::STMP => "STMP",

            FourCC::ACCL => "ACCL",
            FourCC::GYRO => "GYRO",
            FourCC::GRAV => "GRAV",
            FourCC::MAGN => "MAGN",
            FourCC::CORI => "CORI",
            FourCC::IORI => "IORI",
            FourCC::GPS5 => "GPS5",
            FourCC::GPS9 => "GPS9",
            FourCC::GPSF => "GPSF",
            FourCC::GPSP => "GPSP",
            FourCC::GPSU => "GPSU",
            FourCC::GPSA => "GPSA",
            FourCC::ORIN => "ORIN",
            FourCC::ORIO => "ORIO",
            FourCC::MTRX => "MTRX",
            FourCC::TMPC => "TMPC",
            FourCC::SHUT => "SHUT",
            FourCC::WBAL => "WBAL",
            FourCC::ISOE => "ISOE",

            FourCC::Invalid => "INVALID_FOURCC",

            FourCC::Other(s) => s,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self == &FourCC::Invalid
    }

    /// Sticky modifiers apply to all following data in the same `STRM`,
    /// and to later payloads of the same stream until a new value is logged.
    pub fn is_sticky(&self) -> bool {
        matches!(
            self,
            FourCC::STNM
                | FourCC::SCAL
                | FourCC::SIUN
                | FourCC::UNIT
                | FourCC::TYPE
                | FourCC::TIMO
                | FourCC::GPSF
                | FourCC::GPSP
                | FourCC::GPSU
                | FourCC::GPSA
                | FourCC::ORIN
                | FourCC::ORIO
                | FourCC::MTRX
        )
    }

    /// Per-payload bookkeeping that neither carries samples
    /// nor modifies them.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(
            self,
            FourCC::DVID
                | FourCC::DVNM
                | FourCC::RMRK
                | FourCC::TSMP
                | FourCC::EMPT
                | FourCC::TICK
                | FourCC::TOCK
                | FourCC::STMP
                | FourCC::TMPC
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_fourcc() {
        assert_eq!(FourCC::from_slice(b"GPS5"), FourCC::GPS5);
        assert_eq!(FourCC::from_str("GPS9").to_str(), "GPS9");
        assert_eq!(FourCC::from_slice(b"ABCD"), FourCC::Other("ABCD".to_owned()));
        assert!(FourCC::from_slice(&[0, 0, 0, 0]).is_invalid());
    }

    #[test]
    fn modifiers_are_sticky() {
        assert!(FourCC::SCAL.is_sticky());
        assert!(FourCC::GPSF.is_sticky());
        assert!(!FourCC::GPS5.is_sticky());
        assert!(!FourCC::TSMP.is_sticky());
        assert!(FourCC::TSMP.is_bookkeeping());
    }
}
