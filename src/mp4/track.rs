//! Track identification and sample table resolution.

use binrw::{BinRead, BinReaderExt};
use std::io::Cursor;
use time::Duration;

use super::{AtomHeader, Offset};
use crate::{
    constants::{GOPRO_METADATA_HANDLER, GPMF_SAMPLE_FORMAT, MP4_METADATA_HANDLER_TYPE},
    errors::ContainerFormatError,
    Timestamp,
};

/// Version, flags, and entry count shared by `stts`, `stsc`, `stco`, `co64`.
#[derive(Debug, BinRead)]
#[br(big)]
struct TableHeader {
    _version: u8,
    _flags: [u8; 3],
    entry_count: u32,
}

#[derive(Debug, BinRead)]
#[br(big)]
struct StszHeader {
    _version: u8,
    _flags: [u8; 3],
    /// Non-zero if all samples have the same size.
    sample_size: u32,
    sample_count: u32,
}

/// Track properties needed to locate GPMF data.
/// Sample table atoms are only located during the walk,
/// and parsed on demand for the selected track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// Media handler type from `mdia/hdlr`, e.g. `meta`.
    pub handler_type: [u8; 4],
    /// Media handler name, e.g. `GoPro MET`.
    pub handler_name: String,
    /// First sample description format in `stsd`, e.g. `gpmd`.
    pub sample_format: Option<[u8; 4]>,
    /// Time units per second, from `mdhd`.
    pub timescale: u32,
    pub(crate) stts: Option<AtomHeader>,
    pub(crate) stsz: Option<AtomHeader>,
    pub(crate) stsc: Option<AtomHeader>,
    /// `stco` or `co64`.
    pub(crate) chunk_offsets: Option<AtomHeader>,
}

impl Track {
    /// Timed metadata track with handler name `GoPro MET`,
    /// or any track with sample format `gpmd`.
    pub fn is_gpmf(&self) -> bool {
        let by_handler = &self.handler_type == MP4_METADATA_HANDLER_TYPE
            && self.handler_name.contains(GOPRO_METADATA_HANDLER);
        let by_format = self.sample_format.as_ref() == Some(GPMF_SAMPLE_FORMAT);
        by_handler || by_format
    }

    pub fn handler_type(&self) -> String {
        String::from_utf8_lossy(&self.handler_type).to_string()
    }
}

/// Parsed sample table for a single track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    /// `stts`: (sample count, sample delta)
    pub time_to_sample: Vec<(u32, u32)>,
    /// `stsz`
    pub sample_sizes: Vec<u32>,
    /// `stsc`: (first chunk, samples per chunk). Chunk numbers start at 1.
    pub sample_to_chunk: Vec<(u32, u32)>,
    /// `stco` or `co64`
    pub chunk_offsets: Vec<u64>,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.sample_sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_sizes.is_empty()
    }

    /// Resolves the sample table into absolute byte offsets,
    /// sizes, and timing for each sample.
    ///
    /// `atom_offset` is only used for error reporting.
    pub fn offsets(&self, timescale: u32, atom_offset: u64) -> Result<Vec<Offset>, ContainerFormatError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if timescale == 0 {
            return Err(ContainerFormatError::malformed(atom_offset, "track timescale is 0"));
        }

        let positions = self.positions(atom_offset)?;
        if positions.len() != self.len() {
            return Err(ContainerFormatError::malformed(
                atom_offset,
                format!(
                    "sample table locates {} of {} samples",
                    positions.len(),
                    self.len()
                ),
            ));
        }

        // Samples beyond the last stts entry reuse its delta
        let last_delta = self.time_to_sample.last().map(|(_, d)| *d).unwrap_or(0);
        let mut deltas = self
            .time_to_sample
            .iter()
            .flat_map(|(count, delta)| std::iter::repeat(*delta).take(*count as usize));

        let mut ticks = 0_u64;
        let offsets = positions
            .into_iter()
            .map(|(position, size)| {
                let delta = deltas.next().unwrap_or(last_delta);
                let time = Timestamp {
                    relative: ticks_to_duration(ticks, timescale),
                    duration: ticks_to_duration(delta as u64, timescale),
                };
                ticks += delta as u64;
                Offset::new(position, size as u64, time)
            })
            .collect();

        Ok(offsets)
    }

    /// (position, size) for each sample, walking chunks in order.
    fn positions(&self, atom_offset: u64) -> Result<Vec<(u64, u32)>, ContainerFormatError> {
        let mut positions = Vec::with_capacity(self.sample_sizes.len());
        let mut sizes = self.sample_sizes.iter();
        let chunk_count = self.chunk_offsets.len();

        for (i, (first_chunk, per_chunk)) in self.sample_to_chunk.iter().enumerate() {
            let first = (first_chunk.saturating_sub(1) as usize).min(chunk_count);
            let next = self
                .sample_to_chunk
                .get(i + 1)
                .map(|(c, _)| c.saturating_sub(1) as usize)
                .unwrap_or(chunk_count)
                .clamp(first, chunk_count);

            for chunk_offset in &self.chunk_offsets[first..next] {
                let mut position = *chunk_offset;
                for _ in 0..*per_chunk {
                    match sizes.next() {
                        Some(size) => {
                            positions.push((position, *size));
                            position = position.checked_add(*size as u64).ok_or_else(|| {
                                ContainerFormatError::malformed(
                                    atom_offset,
                                    format!("chunk at {chunk_offset} runs past the largest file offset"),
                                )
                            })?;
                        }
                        None => return Ok(positions),
                    }
                }
            }
        }

        Ok(positions)
    }
}

fn ticks_to_duration(ticks: u64, timescale: u32) -> Duration {
    let nanos = ticks as i128 * 1_000_000_000 / timescale as i128;
    Duration::nanoseconds(nanos.min(i64::MAX as i128) as i64)
}

/// Validates that `count` entries of `width` bytes fit in `data` after
/// `skip` header bytes, and returns the entries.
fn entries<'a>(
    data: &'a [u8],
    skip: usize,
    count: u32,
    width: usize,
    atom: &AtomHeader,
) -> Result<std::slice::ChunksExact<'a, u8>, ContainerFormatError> {
    let needed = (count as usize).checked_mul(width).and_then(|n| n.checked_add(skip));
    match needed {
        Some(n) if n <= data.len() => Ok(data[skip..n].chunks_exact(width)),
        _ => Err(ContainerFormatError::malformed(
            atom.offset,
            format!(
                "'{}' declares {count} entries, only {} bytes present",
                atom.name(),
                data.len()
            ),
        )),
    }
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn be_u64(b: &[u8]) -> u64 {
    u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

fn table_header(data: &[u8], atom: &AtomHeader) -> Result<TableHeader, ContainerFormatError> {
    Cursor::new(data)
        .read_be::<TableHeader>()
        .map_err(|err| ContainerFormatError::from_binrw(err, atom.offset))
}

pub(crate) fn parse_stts(data: &[u8], atom: &AtomHeader) -> Result<Vec<(u32, u32)>, ContainerFormatError> {
    let header = table_header(data, atom)?;
    Ok(entries(data, 8, header.entry_count, 8, atom)?
        .map(|e| (be_u32(&e[..4]), be_u32(&e[4..])))
        .collect())
}

pub(crate) fn parse_stsc(data: &[u8], atom: &AtomHeader) -> Result<Vec<(u32, u32)>, ContainerFormatError> {
    let header = table_header(data, atom)?;
    // first chunk, samples per chunk, sample description index
    Ok(entries(data, 8, header.entry_count, 12, atom)?
        .map(|e| (be_u32(&e[..4]), be_u32(&e[4..8])))
        .collect())
}

/// `file_len` bounds the total size of fixed size samples.
pub(crate) fn parse_stsz(data: &[u8], atom: &AtomHeader, file_len: u64) -> Result<Vec<u32>, ContainerFormatError> {
    let header = Cursor::new(data)
        .read_be::<StszHeader>()
        .map_err(|err| ContainerFormatError::from_binrw(err, atom.offset))?;

    if header.sample_size != 0 {
        let total = header.sample_size as u64 * header.sample_count as u64;
        if total > file_len {
            return Err(ContainerFormatError::malformed(
                atom.offset,
                format!("'stsz' declares {total} bytes of samples in a {file_len} byte file"),
            ));
        }
        return Ok(vec![header.sample_size; header.sample_count as usize]);
    }

    Ok(entries(data, 12, header.sample_count, 4, atom)?
        .map(be_u32)
        .collect())
}

/// `stco` (32-bit) or `co64` (64-bit) chunk offsets.
pub(crate) fn parse_chunk_offsets(data: &[u8], atom: &AtomHeader) -> Result<Vec<u64>, ContainerFormatError> {
    let header = table_header(data, atom)?;
    if atom.is(b"co64") {
        Ok(entries(data, 8, header.entry_count, 8, atom)?.map(be_u64).collect())
    } else {
        Ok(entries(data, 8, header.entry_count, 4, atom)?
            .map(|e| be_u32(e) as u64)
            .collect())
    }
}

/// Returns timescale from `mdhd`.
pub(crate) fn parse_mdhd(data: &[u8], atom: &AtomHeader) -> Result<u32, ContainerFormatError> {
    // version 1 uses 64-bit creation and modification times
    let pos = match data.first() {
        Some(1) => 20,
        Some(_) => 12,
        None => return Err(ContainerFormatError::malformed(atom.offset, "empty 'mdhd'")),
    };
    data.get(pos..pos + 4)
        .map(be_u32)
        .ok_or_else(|| ContainerFormatError::malformed(atom.offset, "truncated 'mdhd'"))
}

/// Returns handler type and handler name from `hdlr`.
pub(crate) fn parse_hdlr(data: &[u8], atom: &AtomHeader) -> Result<([u8; 4], String), ContainerFormatError> {
    // version/flags (4), pre-defined (4), handler type (4), reserved (12), name
    let handler_type = data
        .get(8..12)
        .map(|b| [b[0], b[1], b[2], b[3]])
        .ok_or_else(|| ContainerFormatError::malformed(atom.offset, "truncated 'hdlr'"))?;
    // Name may be a counted (QuickTime) or null terminated (ISO) string
    let name = data
        .get(24..)
        .map(|b| {
            String::from_utf8_lossy(b)
                .trim_matches(|c: char| c.is_control())
                .to_owned()
        })
        .unwrap_or_default();
    Ok((handler_type, name))
}

/// Returns the format of the first sample description in `stsd`.
pub(crate) fn parse_stsd(data: &[u8]) -> Option<[u8; 4]> {
    // version/flags (4), entry count (4), entry size (4), format (4)
    data.get(12..16).map(|b| [b[0], b[1], b[2], b[3]])
}
