//! The 8-byte RIFF chunk header and WORD-alignment helper shared by every
//! nesting level of the chunk walker.

use std::io::{self, Read};

#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub fourcc: u32,
    pub size: u32,
}

impl ChunkHeader {
    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(Self {
            fourcc: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            size: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// Cursor position immediately after a chunk whose header starts at
/// `header_start` and whose declared payload is `size` bytes: header, then
/// payload, then one pad byte if the payload is odd-length. Applied
/// uniformly at every nesting level (top-level, `hdrl`, `strl`, `idx1`).
pub fn chunk_end(header_start: u64, size: u32) -> u64 {
    header_start + 8 + size as u64 + (size as u64 & 1)
}
