//! MP4 atom (box) headers.

use std::io::{Read, Seek};

use binrw::{BinRead, BinReaderExt};

use crate::errors::ContainerFormatError;

#[derive(Debug, Clone, Copy, BinRead)]
#[br(big)]
struct RawAtomHeader {
    size: u32,
    name: [u8; 4],
}

/// Atom header with absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomHeader {
    pub name: [u8; 4],
    /// Absolute byte offset of the atom, header included.
    pub offset: u64,
    /// Total atom size, header included.
    pub size: u64,
    /// 8, or 16 for 64-bit sizes.
    pub header_size: u64,
}

impl AtomHeader {
    /// Reads the atom header at the current position.
    /// Returns `None` if fewer than 8 bytes remain before `parent_end`,
    /// or if zero padding is found.
    ///
    /// A size of `0` means the atom extends to `parent_end`.
    pub fn read<R: Read + Seek>(
        reader: &mut R,
        parent_end: u64,
    ) -> Result<Option<Self>, ContainerFormatError> {
        let offset = reader.stream_position()?;
        if offset + 8 > parent_end {
            return Ok(None);
        }

        let raw: RawAtomHeader = reader
            .read_be()
            .map_err(|err| ContainerFormatError::from_binrw(err, offset))?;

        if raw.size == 0 && raw.name == [0; 4] {
            return Ok(None);
        }

        let (size, header_size) = match raw.size {
            0 => (parent_end - offset, 8),
            1 => {
                let large: u64 = reader
                    .read_be()
                    .map_err(|err| ContainerFormatError::from_binrw(err, offset))?;
                (large, 16)
            }
            s => (s as u64, 8),
        };

        let header = Self {
            name: raw.name,
            offset,
            size,
            header_size,
        };

        if size < header_size || offset.saturating_add(size) > parent_end {
            return Err(ContainerFormatError::malformed(
                offset,
                format!(
                    "atom '{}' with size {size} exceeds its parent (ends at {parent_end})",
                    header.name()
                ),
            ));
        }

        Ok(Some(header))
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name).to_string()
    }

    pub fn is(&self, name: &[u8; 4]) -> bool {
        &self.name == name
    }

    /// Absolute byte offset for atom data.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size
    }

    pub fn data_size(&self) -> u64 {
        self.size - self.header_size
    }

    /// Absolute byte offset for the end of the atom.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Container atoms relevant for locating tracks and sample tables.
    pub fn is_container(&self) -> bool {
        matches!(
            &self.name,
            b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" | b"dinf" | b"edts"
        )
    }
}
