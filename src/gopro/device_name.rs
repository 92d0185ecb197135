//! GoPro device name (`DVNM`).

use std::fmt::Display;

use crate::content_types::Orientation;

/// GoPro camera model, as logged in `DVNM`.
/// Does not yet include all previous models, hence `Unknown`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum DeviceName {
    Hero5Black,  // DVNM "Camera" or "Hero5 Black"
    Hero6Black,  // DVNM not confirmed
    Hero7Black,  // DVNM "Hero7 Black" or "HERO7 Black"
    Hero8Black,  // DVNM not confirmed
    Hero9Black,  // DVNM "Hero9 Black" or "HERO9 Black"
    Hero10Black, // DVNM "Hero10 Black" or "HERO10 Black"
    Hero11Black, // DVNM "Hero11 Black" or "HERO11 Black"
    Hero12Black, // DVNM "Hero12 Black" or "HERO12 Black"
    Hero13Black,
    Fusion,
    GoProMax,
    GoProKarma,  // DVNM "GoPro Karma v1.0" + whichever device is connected e.g. hero 5.
    #[default]
    Unknown,
}

impl Display for DeviceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl DeviceName {
    /// Device from `DVNM`. Case insensitive, since casing
    /// differs between firmware versions.
    pub fn from_str(model: &str) -> Self {
        match model.trim_matches(|c: char| c.is_whitespace() || c == '\0').to_ascii_lowercase().as_str() {
            // Hero5 Black identifies itself as "Camera" so far.
            "camera" | "hero5 black" => Self::Hero5Black,
            "hero6 black" => Self::Hero6Black,
            "hero7 black" => Self::Hero7Black,
            "hero8 black" => Self::Hero8Black,
            "hero9 black" => Self::Hero9Black,
            "hero10 black" => Self::Hero10Black,
            "hero11 black" => Self::Hero11Black,
            "hero12 black" => Self::Hero12Black,
            "hero13 black" => Self::Hero13Black,
            "fusion" => Self::Fusion,
            "gopro max" => Self::GoProMax,
            "gopro karma v1.0" => Self::GoProKarma,
            _ => Self::Unknown,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            Self::Hero5Black => "Hero5 Black",
            Self::Hero6Black => "Hero6 Black",
            Self::Hero7Black => "Hero7 Black",
            Self::Hero8Black => "Hero8 Black",
            Self::Hero9Black => "Hero9 Black",
            Self::Hero10Black => "Hero10 Black",
            Self::Hero11Black => "Hero11 Black",
            Self::Hero12Black => "Hero12 Black",
            Self::Hero13Black => "Hero13 Black",
            Self::Fusion => "Fusion",
            Self::GoProMax => "GoPro Max",
            Self::GoProKarma => "GoPro Karma v1.0", // only v1.0 so far
            Self::Unknown => "Unknown",
        }
    }

    /// Sensor axis order to use when no `ORIN` is logged.
    pub fn default_orientation(&self) -> Orientation {
        match self {
            Self::Hero5Black | Self::Hero6Black => Orientation::ZXY,
            _ => Orientation::XZY,
        }
    }
}
