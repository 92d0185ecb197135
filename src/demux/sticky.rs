//! Sticky values, i.e. modifiers that apply to all following data
//! in a stream until a new value is logged.

use std::collections::BTreeSet;

use time::{Duration, PrimitiveDateTime};

use crate::{
    constants::MAX_TIME_OFFSET,
    content_types::Orientation,
    gpmf::{value::parse_gpmf_datetime, RawMetadataBlock, Values},
    FourCC,
};

/// Sticky values in effect at some point in the stream.
/// `None` means not (yet) logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StickyContext {
    /// `STNM`
    pub name: Option<String>,
    /// `SCAL`
    pub scale: Option<Vec<f64>>,
    /// `SIUN`
    pub si_units: Option<Vec<String>>,
    /// `UNIT`
    pub display_units: Option<Vec<String>>,
    /// `TYPE`
    pub type_def: Option<String>,
    /// `ORIN`
    pub orientation: Option<Orientation>,
    /// `TIMO`
    pub time_offset: Option<Duration>,
    /// `GPSF`
    pub fix: Option<u32>,
    /// `GPSP / 100`
    pub dop: Option<f64>,
    /// `GPSU`
    pub datetime: Option<PrimitiveDateTime>,
    /// `GPSA`
    pub altitude_system: Option<String>,
    /// FourCC for all sticky values logged.
    pub logged: BTreeSet<String>,
}

impl StickyContext {
    /// Applies a modifier block. Returns an error reason if the value
    /// could not be decoded, in which case the context is unchanged.
    pub fn apply(&mut self, block: &RawMetadataBlock) -> Result<(), String> {
        let fourcc = block.fourcc();
        let values = Values::decode(block, None)?;
        let invalid = || format!("invalid {fourcc} value");

        match fourcc {
            FourCC::STNM => self.name = Some(values.text().ok_or_else(invalid)?),
            FourCC::SCAL => self.scale = Some(values.flatten().ok_or_else(invalid)?),
            FourCC::SIUN => self.si_units = Some(values.text_rows().ok_or_else(invalid)?.to_owned()),
            FourCC::UNIT => self.display_units = Some(values.text_rows().ok_or_else(invalid)?.to_owned()),
            FourCC::TYPE => self.type_def = Some(values.text().ok_or_else(invalid)?),
            FourCC::ORIN => {
                let orin = values.text().ok_or_else(invalid)?;
                self.orientation =
                    Some(Orientation::parse(&orin).ok_or_else(|| format!("invalid ORIN '{orin}'"))?);
            }
            FourCC::TIMO => {
                let secs = values.first_f64().ok_or_else(invalid)?;
                self.time_offset = Some(
                    Duration::checked_seconds_f64(secs)
                        .filter(|offset| offset.abs() <= MAX_TIME_OFFSET)
                        .ok_or_else(|| format!("TIMO out of range: {secs}"))?,
                );
            }
            FourCC::GPSF => self.fix = Some(values.first_f64().ok_or_else(invalid)? as u32),
            FourCC::GPSP => self.dop = Some(values.first_f64().ok_or_else(invalid)? / 100.),
            FourCC::GPSU => {
                let text = values.text().ok_or_else(invalid)?;
                self.datetime =
                    Some(parse_gpmf_datetime(&text).ok_or_else(|| format!("invalid GPSU '{text}'"))?);
            }
            FourCC::GPSA => self.altitude_system = Some(values.text().ok_or_else(invalid)?),
            // Logged, but not applied
            _ => (),
        }

        self.logged.insert(fourcc.to_str().to_owned());
        Ok(())
    }

    /// Returns `self` with all values logged in `newer` replacing the current ones.
    pub fn overlay(&self, newer: &Self) -> Self {
        Self {
            name: newer.name.clone().or_else(|| self.name.clone()),
            scale: newer.scale.clone().or_else(|| self.scale.clone()),
            si_units: newer.si_units.clone().or_else(|| self.si_units.clone()),
            display_units: newer.display_units.clone().or_else(|| self.display_units.clone()),
            type_def: newer.type_def.clone().or_else(|| self.type_def.clone()),
            orientation: newer.orientation.or(self.orientation),
            time_offset: newer.time_offset.or(self.time_offset),
            fix: newer.fix.or(self.fix),
            dop: newer.dop.or(self.dop),
            datetime: newer.datetime.or(self.datetime),
            altitude_system: newer.altitude_system.clone().or_else(|| self.altitude_system.clone()),
            logged: self.logged.union(&newer.logged).cloned().collect(),
        }
    }

    /// `SIUN`, or `UNIT` if no SI units are logged.
    pub fn units(&self) -> Option<&[String]> {
        self.si_units.as_deref().or(self.display_units.as_deref())
    }
}
