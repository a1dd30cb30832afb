//! Little-endian decoders for the packed on-disk AVI structs. Read
//! byte-by-byte rather than transmuted, so field layout never depends on
//! the host's struct packing rules.

use std::io::{self, Read};

pub fn read_u16_le<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_i32_le<R: Read>(r: &mut R) -> io::Result<i32> {
    Ok(read_u32_le(r)? as i32)
}

/// `avih` — the main AVI header. `reserved[4]` is consumed but discarded.
#[derive(Debug, Clone, Default)]
pub struct MainHeader {
    pub micro_sec_per_frame: u32,
    pub max_bytes_per_sec: u32,
    pub padding_granularity: u32,
    pub flags: u32,
    pub total_frames: u32,
    pub initial_frames: u32,
    pub streams: u32,
    pub suggested_buffer_size: u32,
    pub width: u32,
    pub height: u32,
}

impl MainHeader {
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let header = Self {
            micro_sec_per_frame: read_u32_le(r)?,
            max_bytes_per_sec: read_u32_le(r)?,
            padding_granularity: read_u32_le(r)?,
            flags: read_u32_le(r)?,
            total_frames: read_u32_le(r)?,
            initial_frames: read_u32_le(r)?,
            streams: read_u32_le(r)?,
            suggested_buffer_size: read_u32_le(r)?,
            width: read_u32_le(r)?,
            height: read_u32_le(r)?,
        };
        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;
        Ok(header)
    }

    /// Byte length of the record as laid out on disk, reserved field
    /// included — used to compute how much of `avih`'s declared chunk size
    /// remains to be skipped.
    pub const ENCODED_LEN: u32 = 56;
}

/// `strh` — one stream's header.
#[derive(Debug, Clone, Default)]
pub struct StreamHeader {
    pub fourcc_type: u32,
    pub fourcc_handler: u32,
    pub flags: u32,
    pub priority: u16,
    pub language: u16,
    pub initial_frames: u32,
    pub scale: u32,
    pub rate: u32,
    pub start: u32,
    pub length: u32,
    pub suggested_buffer_size: u32,
    pub quality: u32,
    pub sample_size: u32,
}

impl StreamHeader {
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let header = Self {
            fourcc_type: read_u32_le(r)?,
            fourcc_handler: read_u32_le(r)?,
            flags: read_u32_le(r)?,
            priority: read_u16_le(r)?,
            language: read_u16_le(r)?,
            initial_frames: read_u32_le(r)?,
            scale: read_u32_le(r)?,
            rate: read_u32_le(r)?,
            start: read_u32_le(r)?,
            length: read_u32_le(r)?,
            suggested_buffer_size: read_u32_le(r)?,
            quality: read_u32_le(r)?,
            sample_size: read_u32_le(r)?,
        };
        // rcFrame { left, top, right, bottom }: i16 x 4, ignored.
        let mut rc_frame = [0u8; 8];
        r.read_exact(&mut rc_frame)?;
        Ok(header)
    }

    pub const ENCODED_LEN: u32 = 56;
}

/// `strf` for a video stream — `BITMAPINFOHEADER`.
#[derive(Debug, Clone, Default)]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: u32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
}

impl BitmapInfoHeader {
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let header = Self {
            size: read_u32_le(r)?,
            width: read_u32_le(r)?,
            height: read_i32_le(r)?,
            planes: read_u16_le(r)?,
            bit_count: read_u16_le(r)?,
            compression: read_u32_le(r)?,
            size_image: read_u32_le(r)?,
        };
        // xPelsPerMeter, yPelsPerMeter, clrUsed, clrImportant
        let mut tail = [0u8; 16];
        r.read_exact(&mut tail)?;
        Ok(header)
    }

    pub const ENCODED_LEN: u32 = 40;
}

/// `strf` for an audio stream — `WAVEFORMATEX` (without the trailing
/// variable-length extension, which is never present for PCM/MP3 here).
#[derive(Debug, Clone, Default)]
pub struct WaveFormatEx {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WaveFormatEx {
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            format_tag: read_u16_le(r)?,
            channels: read_u16_le(r)?,
            samples_per_sec: read_u32_le(r)?,
            avg_bytes_per_sec: read_u32_le(r)?,
            block_align: read_u16_le(r)?,
            bits_per_sample: read_u16_le(r)?,
        })
    }

    pub const ENCODED_LEN: u32 = 16;
}

/// One `idx1` record.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    pub chunk_id: u32,
    pub flags: u32,
    pub offset: u32,
    pub size: u32,
}

impl IndexEntry {
    pub const ENCODED_LEN: u32 = 16;

    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            chunk_id: read_u32_le(r)?,
            flags: read_u32_le(r)?,
            offset: read_u32_le(r)?,
            size: read_u32_le(r)?,
        })
    }
}
