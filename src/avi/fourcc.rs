//! RIFF/AVI FourCC constants, little-endian as they appear on disk.

pub const RIFF: u32 = 0x4646_4952; // "RIFF"
pub const AVI_: u32 = 0x2049_5641; // "AVI "
pub const LIST: u32 = 0x5453_494C; // "LIST"
pub const HDRL: u32 = 0x6C72_6468; // "hdrl"
pub const AVIH: u32 = 0x6869_7661; // "avih"
pub const STRL: u32 = 0x6C72_7473; // "strl"
pub const STRH: u32 = 0x6872_7473; // "strh"
pub const STRF: u32 = 0x6672_7473; // "strf"
pub const MOVI: u32 = 0x6976_6F6D; // "movi"
pub const IDX1: u32 = 0x3178_6469; // "idx1"

pub const VIDS: u32 = 0x7364_6976; // "vids"
pub const AUDS: u32 = 0x7364_7561; // "auds"

pub const CHUNK_00DB: u32 = 0x6264_3030; // "00db"
pub const CHUNK_00DC: u32 = 0x6364_3030; // "00dc"
pub const CHUNK_01WB: u32 = 0x6277_3130; // "01wb"

pub const MJPG: u32 = 0x4750_4A4D; // "MJPG"
pub const MJPG_LOWER: u32 = 0x6770_6A6D; // "mjpg"

pub fn to_string(fourcc: u32) -> String {
    fourcc
        .to_le_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}
