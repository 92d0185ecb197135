//! Decoding of GPMF value data.
//!
//! All values are big endian.
//!
//! | Type | Value                                  |
//! |------|----------------------------------------|
//! | `b`  | `i8`                                   |
//! | `B`  | `u8`                                   |
//! | `c`  | ASCII/ISO 8859-1 text                  |
//! | `d`  | `f64`                                  |
//! | `f`  | `f32`                                  |
//! | `F`  | FourCC                                 |
//! | `G`  | 128-bit ID                             |
//! | `j`  | `i64`                                  |
//! | `J`  | `u64`                                  |
//! | `l`  | `i32`                                  |
//! | `L`  | `u32`                                  |
//! | `q`  | Q15.16 fixed point                     |
//! | `Q`  | Q31.32 fixed point                     |
//! | `s`  | `i16`                                  |
//! | `S`  | `u16`                                  |
//! | `U`  | UTC date time, `yymmddhhmmss.sss`      |
//! | `?`  | complex, described by a sticky `TYPE`  |

use time::{Date, Month, PrimitiveDateTime, Time};

use super::klv::{BlockData, KlvHeader, RawMetadataBlock};

/// Decoded block values.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// One row per sample, one column per element.
    Numeric(Vec<Vec<f64>>),
    /// One string per sample.
    Text(Vec<String>),
    /// Undecodable or opaque data, e.g. `G`.
    Raw(Vec<u8>),
}

impl Values {
    /// Decode values for `block`. `type_def` is the sticky `TYPE` string
    /// for the stream, required for complex (`?`) values.
    pub fn decode(block: &RawMetadataBlock, type_def: Option<&str>) -> Result<Self, String> {
        let bytes = match &block.data {
            BlockData::Values(bytes) => bytes,
            BlockData::Nested(_) => return Err("nested block has no values".to_owned()),
        };
        let header = &block.header;

        match header.value_type {
            b'c' => Ok(Self::Text(text_rows(header, bytes))),
            b'F' => Ok(Self::Text(
                bytes.chunks_exact(4).map(latin1).collect(),
            )),
            b'U' => Ok(Self::Text(
                bytes.chunks_exact(16).map(latin1).collect(),
            )),
            b'G' => Ok(Self::Raw(bytes.to_owned())),
            b'?' => {
                let types = type_def.ok_or_else(|| "complex value without TYPE".to_owned())?;
                numeric_rows(header, bytes, &expand_type_def(types, header.size as usize)?)
            }
            t => {
                let width = element_size(t)
                    .ok_or_else(|| format!("unknown value type '{}'", t as char))?;
                let columns = header.size as usize / width;
                numeric_rows(header, bytes, &vec![t; columns])
            }
        }
    }

    /// Numeric rows, if any.
    pub fn rows(&self) -> Option<&[Vec<f64>]> {
        match self {
            Self::Numeric(rows) => Some(rows),
            _ => None,
        }
    }

    /// All numeric values flattened, e.g. for `SCAL`.
    pub fn flatten(&self) -> Option<Vec<f64>> {
        self.rows().map(|rows| rows.iter().flatten().copied().collect())
    }

    /// First numeric value, e.g. for `GPSF`.
    pub fn first_f64(&self) -> Option<f64> {
        self.rows()?.first()?.first().copied()
    }

    /// Text values joined, e.g. for `STNM`.
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Text(rows) => Some(rows.concat()),
            _ => None,
        }
    }

    /// Text rows, e.g. per-column `SIUN`.
    pub fn text_rows(&self) -> Option<&[String]> {
        match self {
            Self::Text(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Size in bytes for a single element of type `t`.
pub fn element_size(t: u8) -> Option<usize> {
    match t {
        b'b' | b'B' | b'c' => Some(1),
        b's' | b'S' => Some(2),
        b'f' | b'l' | b'L' | b'q' | b'F' => Some(4),
        b'd' | b'j' | b'J' | b'Q' => Some(8),
        b'G' | b'U' => Some(16),
        _ => None,
    }
}

/// Expands a `TYPE` definition such as `lllllllSS` or `l[3]S`
/// into one type char per element. Elements are at least one byte,
/// so a row never holds more than `max` elements.
fn expand_type_def(type_def: &str, max: usize) -> Result<Vec<u8>, String> {
    let bytes = type_def.trim_end_matches('\0').as_bytes();
    let mut types = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let t = bytes[i];
        if t == b'[' {
            let close = bytes[i..]
                .iter()
                .position(|b| *b == b']')
                .map(|p| p + i)
                .ok_or_else(|| format!("unterminated array in TYPE '{type_def}'"))?;
            let count: usize = std::str::from_utf8(&bytes[i + 1..close])
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| format!("invalid array length in TYPE '{type_def}'"))?;
            let prev = *types
                .last()
                .ok_or_else(|| format!("array without type in TYPE '{type_def}'"))?;
            if count > max + 1 - types.len() {
                return Err(format!("array length {count} exceeds row size {max} in TYPE '{type_def}'"));
            }
            types.extend(std::iter::repeat(prev).take(count.saturating_sub(1)));
            i = close + 1;
            continue;
        }
        types.push(t);
        if types.len() > max {
            return Err(format!("TYPE '{type_def}' exceeds row size {max}"));
        }
        i += 1;
    }
    Ok(types)
}

fn numeric_rows(header: &KlvHeader, bytes: &[u8], types: &[u8]) -> Result<Values, String> {
    let row_len = types
        .iter()
        .map(|t| {
            element_size(*t)
                .filter(|_| !matches!(*t, b'c' | b'U' | b'F' | b'G'))
                .ok_or_else(|| format!("non-numeric element type '{}'", *t as char))
        })
        .sum::<Result<usize, String>>()?;

    if row_len == 0 || row_len != header.size as usize {
        return Err(format!(
            "element size {} does not match type size {}",
            header.size, row_len
        ));
    }

    let rows = bytes
        .chunks_exact(row_len)
        .map(|row| {
            let mut pos = 0;
            types
                .iter()
                .map(|t| {
                    // element sizes checked above
                    let size = element_size(*t).unwrap_or(0);
                    let value = read_numeric(*t, &row[pos..pos + size]);
                    pos += size;
                    value
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    Ok(Values::Numeric(rows))
}

fn read_numeric(t: u8, b: &[u8]) -> f64 {
    match t {
        b'b' => i8::from_be_bytes([b[0]]) as f64,
        b'B' => b[0] as f64,
        b's' => i16::from_be_bytes([b[0], b[1]]) as f64,
        b'S' => u16::from_be_bytes([b[0], b[1]]) as f64,
        b'l' => i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
        b'L' => u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
        b'f' => f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
        b'q' => i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64 / 65_536.0,
        b'd' => f64::from_be_bytes(eight(b)),
        b'j' => i64::from_be_bytes(eight(b)) as f64,
        b'J' => u64::from_be_bytes(eight(b)) as f64,
        b'Q' => i64::from_be_bytes(eight(b)) as f64 / 4_294_967_296.0,
        _ => f64::NAN,
    }
}

fn eight(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// Text is either one string of `repeat` single byte chars,
/// or `repeat` strings of `size` chars each.
fn text_rows(header: &KlvHeader, bytes: &[u8]) -> Vec<String> {
    if header.size <= 1 {
        vec![latin1(bytes)]
    } else {
        bytes
            .chunks_exact(header.size as usize)
            .map(latin1)
            .collect()
    }
}

/// ISO 8859-1 maps directly to the first 256 code points.
fn latin1(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| *b as char)
        .collect()
}

/// Parse a GPMF `U` value, `yymmddhhmmss.sss`, e.g. `230412083015.250`.
pub fn parse_gpmf_datetime(value: &str) -> Option<PrimitiveDateTime> {
    let digits = value.get(..12)?;
    let num = |range: std::ops::Range<usize>| digits.get(range)?.parse::<u16>().ok();

    let date = Date::from_calendar_date(
        2000 + num(0..2)? as i32,
        Month::try_from(num(2..4)? as u8).ok()?,
        num(4..6)? as u8,
    )
    .ok()?;

    let millis = value
        .get(13..16)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);
    let time = Time::from_hms_milli(
        num(6..8)? as u8,
        num(8..10)? as u8,
        num(10..12)? as u8,
        millis,
    )
    .ok()?;

    Some(PrimitiveDateTime::new(date, time))
}
