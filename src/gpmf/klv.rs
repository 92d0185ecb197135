//! GPMF key-length-value blocks.
//!
//! Each block starts with an 8 byte header:
//! FourCC (4 bytes), value type (1 byte, ASCII),
//! element size (1 byte), repeat count (2 bytes, big endian).
//! Value data follows, padded to 32-bit alignment.
//! Type `0` means the block contains further KLV blocks.

use std::io::Cursor;

use binrw::{BinRead, BinReaderExt};

use super::FourCC;
use crate::{constants::MAX_KLV_DEPTH, errors::ContainerFormatError};

pub const KLV_HEADER_SIZE: usize = 8;

/// KLV header as logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct KlvHeader {
    pub fourcc: [u8; 4],
    /// GPMF value type, e.g. `b'l'` for `i32`. `0` for nested blocks.
    pub value_type: u8,
    /// Size in bytes for a single sample/element.
    pub size: u8,
    /// Number of samples.
    pub repeat: u16,
}

impl KlvHeader {
    pub fn fourcc(&self) -> FourCC {
        FourCC::from_slice(&self.fourcc)
    }

    /// Declared value size in bytes, excluding padding.
    pub fn data_len(&self) -> usize {
        self.size as usize * self.repeat as usize
    }

    /// Declared value size in bytes, including padding.
    pub fn padded_len(&self) -> usize {
        (self.data_len() + 3) & !3
    }

    pub fn is_nested(&self) -> bool {
        self.value_type == 0
    }
}

/// Block content.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    /// Child blocks, e.g. the `STRM`s in a `DEVC`.
    Nested(Vec<RawMetadataBlock>),
    /// Unpadded value bytes, interpreted via the header's value type.
    Values(Vec<u8>),
}

/// A single KLV block with its children, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetadataBlock {
    pub header: KlvHeader,
    pub data: BlockData,
}

impl RawMetadataBlock {
    pub fn fourcc(&self) -> FourCC {
        self.header.fourcc()
    }

    pub fn children(&self) -> &[RawMetadataBlock] {
        match &self.data {
            BlockData::Nested(children) => children,
            BlockData::Values(_) => &[],
        }
    }

    /// Find first direct child with specified FourCC.
    pub fn find(&self, fourcc: &FourCC) -> Option<&RawMetadataBlock> {
        self.children().iter().find(|b| &b.fourcc() == fourcc)
    }

    /// Parse all blocks in `bytes`. `offset` is the position of `bytes`
    /// in the source, used for error reporting only.
    ///
    /// Nested blocks are parsed with an explicit stack rather than recursion,
    /// with depth and declared sizes validated before descending.
    /// Zero padding at the end of a block list ends that list.
    /// Any other leftover bytes are rejected.
    pub fn parse(bytes: &[u8], offset: u64) -> Result<Vec<Self>, ContainerFormatError> {
        // Open containers: header, end position, position to resume parent at, children
        let mut stack: Vec<(KlvHeader, usize, usize, Vec<Self>)> = Vec::new();
        let mut top: Vec<Self> = Vec::new();
        let mut pos = 0_usize;
        let mut end = bytes.len();

        loop {
            if pos + KLV_HEADER_SIZE > end || is_padding(&bytes[pos..end]) {
                if bytes[pos..end].iter().any(|b| *b != 0) {
                    return Err(ContainerFormatError::malformed(
                        offset + pos as u64,
                        format!("{} trailing bytes are not zero padding", end - pos),
                    ));
                }
                // Close current container, or stop at top level
                match stack.pop() {
                    Some((header, _, resume, children)) => {
                        let block = Self {
                            header,
                            data: BlockData::Nested(children),
                        };
                        pos = resume;
                        end = stack.last().map(|(_, e, _, _)| *e).unwrap_or(bytes.len());
                        match stack.last_mut() {
                            Some((_, _, _, siblings)) => siblings.push(block),
                            None => top.push(block),
                        }
                        continue;
                    }
                    None => break,
                }
            }

            let header = read_header(&bytes[pos..pos + KLV_HEADER_SIZE], offset + pos as u64)?;
            let data_start = pos + KLV_HEADER_SIZE;
            let data_end = data_start + header.data_len();

            if data_end > end {
                return Err(ContainerFormatError::malformed(
                    offset + pos as u64,
                    format!(
                        "{} declares {} bytes, only {} remain",
                        header.fourcc(),
                        header.data_len(),
                        end - data_start
                    ),
                ));
            }
            // Padding may be cut short by the end of the payload
            let next = (data_start + header.padded_len()).min(end);

            if header.is_nested() {
                if stack.len() >= MAX_KLV_DEPTH {
                    return Err(ContainerFormatError::MaxDepthExceeded {
                        max: MAX_KLV_DEPTH,
                        offset: offset + pos as u64,
                    });
                }
                stack.push((header, data_end, next, Vec::new()));
                pos = data_start;
                end = data_end;
            } else {
                let block = Self {
                    header,
                    data: BlockData::Values(bytes[data_start..data_end].to_vec()),
                };
                match stack.last_mut() {
                    Some((_, _, _, siblings)) => siblings.push(block),
                    None => top.push(block),
                }
                pos = next;
            }
        }

        Ok(top)
    }
}

fn read_header(bytes: &[u8], offset: u64) -> Result<KlvHeader, ContainerFormatError> {
    Cursor::new(bytes)
        .read_be::<KlvHeader>()
        .map_err(|err| ContainerFormatError::from_binrw(err, offset))
}

/// Zero bytes where a FourCC is expected.
fn is_padding(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && FourCC::from_slice(&bytes[..4]).is_invalid()
}
