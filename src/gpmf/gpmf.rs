//! GPMF container reader.
//!
//! Input:
//! - original, unedited GoPro MP4/LRV clips
//! - raw GPMF "files" extracted via e.g. FFmpeg
//! - byte slices
//!
//! Timing is derived from the MP4 container, one MP4 sample per payload.
//! Raw GPMF has no container timing, so each top-level `DEVC`
//! is assumed to cover one second.
//!
//! ```rs
//! use gpmf_export::Gpmf;
//! use std::path::Path;
//!
//! fn main() -> Result<(), gpmf_export::ContainerFormatError> {
//!     let gpmf = Gpmf::new(Path::new("GOPRO_VIDEO.MP4"))?;
//!     println!("{} payloads", gpmf.len());
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use rayon::prelude::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, warn};

use super::{
    klv::{RawMetadataBlock, KLV_HEADER_SIZE},
    Timestamp,
};
use crate::{
    constants::{MAX_RAW_GPMF_SIZE, RAW_PAYLOAD_DURATION_MS},
    errors::ContainerFormatError,
    mp4::Mp4,
};

/// Single GPMF payload, i.e. one MP4 sample or one raw `DEVC`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpmfPayload {
    /// Payload index in source.
    pub index: usize,
    /// Payload start relative to recording start, and payload duration.
    pub time: Timestamp,
    /// Top-level blocks, normally one `DEVC` per device.
    pub blocks: Vec<RawMetadataBlock>,
}

/// Parsed, but unprocessed, GPMF data for a single source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gpmf {
    /// Payloads in recording order.
    pub payloads: Vec<GpmfPayload>,
    /// Path/s to the source/s the GPMF data was extracted from.
    pub source: Vec<PathBuf>,
    /// Blake3 hash (hex) of the first payload's raw bytes.
    /// Identifies the clip rather than the file, so that the same
    /// clip given twice can be detected.
    pub fingerprint: Option<String>,
}

impl Gpmf {
    /// GPMF from file. Either an unedited GoPro MP4-file,
    /// or a "raw" GPMF-file, extracted via FFmpeg.
    /// The file type is determined from content, not file extension.
    pub fn new(path: &Path) -> Result<Self, ContainerFormatError> {
        let mut reader = BufReader::new(File::open(path)?);

        if is_raw_gpmf(&mut reader)? {
            return Self::from_raw(path);
        }

        let mut mp4 = Mp4::from_reader(reader)?;
        let mut gpmf = Self::from_mp4(&mut mp4)?;
        if gpmf.is_empty() {
            warn!("GPMF track in {} contains no samples", path.display());
        }
        gpmf.source = vec![path.to_owned()];
        Ok(gpmf)
    }

    /// GPMF from any seekable source, e.g. an in-memory MP4.
    /// `name` is only used for logging.
    pub fn from_reader<R: Read + Seek>(mut reader: R, name: &str) -> Result<Self, ContainerFormatError> {
        if is_raw_gpmf(&mut reader)? {
            let len = reader.seek(SeekFrom::End(0))?;
            if len > MAX_RAW_GPMF_SIZE {
                return Err(ContainerFormatError::MaxFileSizeExceeded {
                    max: MAX_RAW_GPMF_SIZE,
                    got: len,
                    path: PathBuf::from(name),
                });
            }
            reader.seek(SeekFrom::Start(0))?;
            let mut bytes = Vec::with_capacity(len as usize);
            reader.read_to_end(&mut bytes)?;
            return Self::from_slice(&bytes);
        }

        let gpmf = Self::from_mp4(&mut Mp4::from_reader(reader)?)?;
        if gpmf.is_empty() {
            warn!("GPMF track in {name} contains no samples");
        }
        Ok(gpmf)
    }

    /// Returns the embedded GPMF payloads in a GoPro MP4 file.
    pub fn from_mp4<R: Read + Seek>(mp4: &mut Mp4<R>) -> Result<Self, ContainerFormatError> {
        // 1. Extract position/byte offset, size, and time span for GPMF payloads.
        let offsets = mp4.gpmf_offsets()?;
        debug!("{} GPMF payloads", offsets.len());

        // 2. Read data at MP4 offsets serially
        let raw = offsets
            .iter()
            .map(|o| mp4.read_at(o.position, o.size).map(|bytes| (o, bytes)))
            .collect::<Result<Vec<_>, ContainerFormatError>>()?;

        let fingerprint = raw.first().map(|(_, bytes)| fingerprint(bytes));

        // 3. Parse each payload, order is preserved
        let payloads = raw
            .into_par_iter()
            .enumerate()
            .map(|(index, (offset, bytes))| {
                RawMetadataBlock::parse(&bytes, offset.position).map(|blocks| GpmfPayload {
                    index,
                    time: offset.time,
                    blocks,
                })
            })
            .collect::<Result<Vec<_>, ContainerFormatError>>()?;

        Ok(Self {
            payloads,
            source: Vec::new(),
            fingerprint,
        })
    }

    /// Returns GPMF from a "raw" GPMF-file,
    /// e.g. the "GoPro MET" track extracted from a GoPro MP4 with FFmpeg.
    pub fn from_raw(path: &Path) -> Result<Self, ContainerFormatError> {
        let size = path.metadata()?.len();

        if size > MAX_RAW_GPMF_SIZE {
            return Err(ContainerFormatError::MaxFileSizeExceeded {
                max: MAX_RAW_GPMF_SIZE,
                got: size,
                path: path.to_owned(),
            });
        }

        let mut gpmf = Self::from_slice(&std::fs::read(path)?)?;
        gpmf.source = vec![path.to_owned()];
        Ok(gpmf)
    }

    /// GPMF from raw GPMF bytes. Each top-level block
    /// is treated as a separate payload covering one second.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ContainerFormatError> {
        let blocks = RawMetadataBlock::parse(bytes, 0)?;

        let fingerprint = blocks.first().map(|b| {
            let end = (KLV_HEADER_SIZE + b.header.padded_len()).min(bytes.len());
            fingerprint(&bytes[..end])
        });

        let payloads = blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| GpmfPayload {
                index,
                time: Timestamp::new(
                    index as i64 * RAW_PAYLOAD_DURATION_MS,
                    RAW_PAYLOAD_DURATION_MS,
                ),
                blocks: vec![block],
            })
            .collect();

        Ok(Self {
            payloads,
            source: Vec::new(),
            fingerprint,
        })
    }

    /// Returns number of payloads.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Returns `true` if no payloads are present.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpmfPayload> {
        self.payloads.iter()
    }

    /// Total duration covered by all payloads.
    pub fn duration(&self) -> time::Duration {
        self.payloads
            .last()
            .map(|p| p.time.end())
            .unwrap_or_default()
    }
}

/// Blake3 hash of `bytes` as lower case hex.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Raw GPMF starts with a `DEVC` header rather than an MP4 atom.
/// Leaves the reader at start.
fn is_raw_gpmf<R: Read + Seek>(reader: &mut R) -> Result<bool, ContainerFormatError> {
    let mut magic = [0_u8; 8];
    reader.seek(SeekFrom::Start(0))?;
    let n = reader.read(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(n >= 4 && &magic[..4] == b"DEVC")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::test_helpers::{gps5_payload, gps_rows, mp4_with_payloads, nested};
    use crate::FourCC;

    #[test]
    fn reads_payloads_from_mp4() {
        let payloads = vec![
            gps5_payload(&gps_rows(10, 0, 0, 1), "230412083015.000"),
            gps5_payload(&gps_rows(10, 0, 0, 1), "230412083016.000"),
        ];
        let bytes = mp4_with_payloads(&payloads, 1000, 1001);
        let gpmf = Gpmf::from_reader(Cursor::new(bytes), "test.mp4").unwrap();

        assert_eq!(gpmf.len(), 2);
        assert_eq!(gpmf.payloads[1].index, 1);
        assert_eq!(gpmf.payloads[1].time.relative_ms(), 1001);
        assert_eq!(gpmf.payloads[0].blocks[0].fourcc(), FourCC::DEVC);
        assert_eq!(gpmf.fingerprint, Some(fingerprint(&payloads[0])));
    }

    #[test]
    fn raw_gpmf_gets_one_second_per_devc() {
        let bytes = [nested(b"DEVC", &[]), nested(b"DEVC", &[]), nested(b"DEVC", &[])].concat();
        let gpmf = Gpmf::from_reader(Cursor::new(bytes), "raw.bin").unwrap();
        assert_eq!(gpmf.len(), 3);
        assert_eq!(gpmf.payloads[2].time, Timestamp::new(2000, 1000));
        assert_eq!(gpmf.duration(), time::Duration::seconds(3));
    }

    #[test]
    fn malformed_payload_fails_whole_file() {
        let mut payload = gps5_payload(&gps_rows(2, 0, 0, 1), "230412083015.000");
        // DEVC claims more data than the payload holds
        payload[6..8].copy_from_slice(&u16::MAX.to_be_bytes());
        let bytes = mp4_with_payloads(&[payload], 1000, 1000);
        let err = Gpmf::from_reader(Cursor::new(bytes), "bad.mp4").unwrap_err();
        assert!(matches!(err, ContainerFormatError::Malformed { .. }));
    }

    #[test]
    fn not_mp4_and_not_gpmf() {
        let err = Gpmf::from_reader(Cursor::new(vec![0xff_u8; 64]), "noise.bin").unwrap_err();
        assert!(matches!(err, ContainerFormatError::Malformed { .. }));
    }
}
