//! Minimal MP4 reader.
//!
//! Walks the atom tree to locate the GPMF track (`moov/trak/mdia/hdlr`)
//! and resolves its sample table into byte offsets for each GPMF payload.
//! Audio and video data are never read.
//!
//! ```rs
//! use gpmf_export::mp4::Mp4;
//! use std::path::Path;
//!
//! fn main() -> Result<(), gpmf_export::ContainerFormatError> {
//!     let mut mp4 = Mp4::new(Path::new("GOPRO_VIDEO.MP4"))?;
//!     for offset in mp4.gpmf_offsets()? {
//!         let payload = mp4.read_at(offset.position, offset.size)?;
//!     }
//!     Ok(())
//! }
//! ```

mod atom;
mod offset;
mod track;

pub use atom::AtomHeader;
pub use offset::Offset;
pub use track::{SampleTable, Track};

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::{constants::MAX_ATOM_DEPTH, errors::ContainerFormatError};

/// MP4 reader over any seekable byte source.
#[derive(Debug)]
pub struct Mp4<R> {
    reader: R,
    len: u64,
}

impl Mp4<BufReader<File>> {
    /// Opens an MP4 file for buffered, streamed reading.
    pub fn new(path: &Path) -> Result<Self, ContainerFormatError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> Mp4<R> {
    pub fn from_reader(mut reader: R) -> Result<Self, ContainerFormatError> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self { reader, len })
    }

    /// Source size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads `size` bytes at absolute byte offset `position`.
    pub fn read_at(&mut self, position: u64, size: u64) -> Result<Vec<u8>, ContainerFormatError> {
        if position.saturating_add(size) > self.len {
            return Err(ContainerFormatError::malformed(
                position,
                format!("{size} bytes requested, source ends at {}", self.len),
            ));
        }
        self.reader.seek(SeekFrom::Start(position))?;
        let mut buf = vec![0_u8; size as usize];
        self.reader
            .read_exact(&mut buf)
            .map_err(|err| ContainerFormatError::from_io(err, position))?;
        Ok(buf)
    }

    /// All tracks in `moov`.
    ///
    /// Unparsable data after `moov` is ignored, since the track
    /// layout is already known at that point.
    pub fn tracks(&mut self) -> Result<Vec<Track>, ContainerFormatError> {
        let mut tracks: Option<Vec<Track>> = None;
        let mut pos = 0;

        loop {
            self.reader.seek(SeekFrom::Start(pos))?;
            let atom = match AtomHeader::read(&mut self.reader, self.len) {
                Ok(Some(atom)) => atom,
                Ok(None) => break,
                Err(err) if tracks.is_some() => {
                    debug!("Ignoring trailing data after 'moov': {err}");
                    break;
                }
                Err(err) => return Err(err),
            };

            debug!("{} @{} ({} bytes)", atom.name(), atom.offset, atom.size);

            if atom.is(b"moov") {
                tracks = Some(self.parse_moov(&atom)?);
            }

            pos = atom.end();
        }

        Ok(tracks.unwrap_or_default())
    }

    /// Byte offsets and timing for all GPMF payloads.
    /// Empty if the GPMF track has no samples.
    pub fn gpmf_offsets(&mut self) -> Result<Vec<Offset>, ContainerFormatError> {
        let track = self
            .tracks()?
            .into_iter()
            .find(Track::is_gpmf)
            .ok_or(ContainerFormatError::NoMetadataTrack)?;

        debug!(
            "GPMF track: handler '{}' '{}', timescale {}",
            track.handler_type(),
            track.handler_name,
            track.timescale
        );

        let table = self.sample_table(&track)?;
        let offset = track.stsz.map(|a| a.offset).unwrap_or_default();
        let offsets = table.offsets(track.timescale, offset)?;

        if let Some(o) = offsets.iter().find(|o| o.end().map_or(true, |end| end > self.len)) {
            return Err(ContainerFormatError::malformed(
                o.position,
                format!("sample of {} bytes runs past end of source", o.size),
            ));
        }

        Ok(offsets)
    }

    /// Parses the sample table atoms located for `track`.
    /// A track without `stsz` has no samples.
    pub fn sample_table(&mut self, track: &Track) -> Result<SampleTable, ContainerFormatError> {
        let mut table = SampleTable::default();

        if let Some(atom) = track.stsz {
            table.sample_sizes = track::parse_stsz(&self.read_atom(&atom)?, &atom, self.len)?;
        }
        if table.is_empty() {
            return Ok(table);
        }

        let missing = |name: &str| ContainerFormatError::malformed(0, format!("GPMF track has no '{name}'"));
        let stts = track.stts.ok_or_else(|| missing("stts"))?;
        let stsc = track.stsc.ok_or_else(|| missing("stsc"))?;
        let stco = track.chunk_offsets.ok_or_else(|| missing("stco"))?;

        table.time_to_sample = track::parse_stts(&self.read_atom(&stts)?, &stts)?;
        table.sample_to_chunk = track::parse_stsc(&self.read_atom(&stsc)?, &stsc)?;
        table.chunk_offsets = track::parse_chunk_offsets(&self.read_atom(&stco)?, &stco)?;

        Ok(table)
    }

    /// Atom data, excluding header.
    fn read_atom(&mut self, atom: &AtomHeader) -> Result<Vec<u8>, ContainerFormatError> {
        self.read_at(atom.data_offset(), atom.data_size())
    }

    /// Direct children of `parent`.
    fn children(&mut self, parent: &AtomHeader) -> Result<Vec<AtomHeader>, ContainerFormatError> {
        let mut children = Vec::new();
        let mut pos = parent.data_offset();
        loop {
            self.reader.seek(SeekFrom::Start(pos))?;
            match AtomHeader::read(&mut self.reader, parent.end())? {
                Some(child) => {
                    pos = child.end();
                    children.push(child);
                }
                None => break,
            }
        }
        Ok(children)
    }

    fn parse_moov(&mut self, moov: &AtomHeader) -> Result<Vec<Track>, ContainerFormatError> {
        let mut tracks = Vec::new();
        for atom in self.children(moov)? {
            if atom.is(b"trak") {
                let mut track = Track::default();
                self.parse_trak(&atom, &mut track, 2)?;
                tracks.push(track);
            }
        }
        Ok(tracks)
    }

    /// Fills in `track` from `parent` and its descendants.
    fn parse_trak(&mut self, parent: &AtomHeader, track: &mut Track, depth: usize) -> Result<(), ContainerFormatError> {
        if depth > MAX_ATOM_DEPTH {
            return Err(ContainerFormatError::MaxDepthExceeded {
                max: MAX_ATOM_DEPTH,
                offset: parent.offset,
            });
        }

        for atom in self.children(parent)? {
            match &atom.name {
                b"mdhd" => track.timescale = track::parse_mdhd(&self.read_atom(&atom)?, &atom)?,
                // QuickTime files may also have a data handler 'hdlr' in 'minf'
                b"hdlr" if parent.is(b"mdia") => {
                    let (handler_type, handler_name) = track::parse_hdlr(&self.read_atom(&atom)?, &atom)?;
                    track.handler_type = handler_type;
                    track.handler_name = handler_name;
                }
                b"stsd" => track.sample_format = track::parse_stsd(&self.read_atom(&atom)?),
                b"stts" => track.stts = Some(atom),
                b"stsz" => track.stsz = Some(atom),
                b"stsc" => track.stsc = Some(atom),
                b"stco" | b"co64" => track.chunk_offsets = Some(atom),
                _ if atom.is_container() => self.parse_trak(&atom, track, depth + 1)?,
                _ => (),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::test_helpers::{atom, mp4_with_payloads};

    #[test]
    fn locates_gpmf_samples() {
        let payloads = vec![vec![1_u8; 12], vec![2_u8; 20]];
        let bytes = mp4_with_payloads(&payloads, 1000, 1001);
        let mut mp4 = Mp4::from_reader(Cursor::new(bytes)).unwrap();

        let offsets = mp4.gpmf_offsets().unwrap();
        assert_eq!(offsets.len(), 2);
        assert_eq!(mp4.read_at(offsets[1].position, offsets[1].size).unwrap(), payloads[1]);
        assert_eq!(offsets[1].time.relative_ms(), 1001);
    }

    #[test]
    fn tolerates_trailing_atoms() {
        let mut bytes = mp4_with_payloads(&[vec![1_u8; 8]], 1000, 1000);
        bytes.extend(atom(b"udta", &[0_u8; 12]));
        bytes.extend(atom(b"free", &[]));
        // garbage that does not form a valid atom
        bytes.extend(&[0xff_u8; 11]);
        let mut mp4 = Mp4::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(mp4.gpmf_offsets().unwrap().len(), 1);
    }

    #[test]
    fn no_gpmf_track() {
        let mut bytes = atom(b"ftyp", b"mp42");
        bytes.extend(atom(b"moov", &atom(b"trak", &[])));
        let mut mp4 = Mp4::from_reader(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            mp4.gpmf_offsets(),
            Err(ContainerFormatError::NoMetadataTrack)
        ));
    }

    #[test]
    fn empty_gpmf_track() {
        let bytes = mp4_with_payloads(&[], 1000, 1000);
        let mut mp4 = Mp4::from_reader(Cursor::new(bytes)).unwrap();
        assert!(mp4.gpmf_offsets().unwrap().is_empty());
    }
}
