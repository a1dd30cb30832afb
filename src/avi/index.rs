//! Builds a sparse, skip-interval seek table from `idx1`.

use std::io::{Read, Seek, SeekFrom};

use serde::{Deserialize, Serialize};

use super::fourcc;
use super::records::IndexEntry;

/// Default cap on in-memory index entries. Chosen by the original embedded
/// target to bound RAM use for very long recordings; kept as a default here
/// but made constructor-configurable (see [`crate::avi::AviDemuxer::with_max_index_entries`]).
pub const DEFAULT_MAX_INDEX_ENTRIES: u32 = 36_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoIndex {
    pub skip_interval: u32,
    pub frame_offsets: Vec<u32>,
}

impl VideoIndex {
    pub fn entry_count(&self) -> u32 {
        self.frame_offsets.len() as u32
    }
}

/// Reads `idx1` at `idx1_location`/`idx1_size` and builds a [`VideoIndex`]
/// covering `total_video_frames` frames, storing at most `max_entries`
/// offsets. Returns `None` if there's no usable index (no `idx1`, or a
/// header that claims zero video frames) — callers treat that as "seeking
/// unavailable", not a hard error.
pub fn build_index<R: Read + Seek>(
    reader: &mut R,
    idx1_location: u64,
    idx1_size: u32,
    total_video_frames: u32,
    max_entries: u32,
) -> std::io::Result<Option<VideoIndex>> {
    if idx1_location == 0 || idx1_size == 0 || total_video_frames == 0 {
        return Ok(None);
    }

    let mut skip_interval = 1u32;
    let mut entry_count = total_video_frames;
    while entry_count > max_entries {
        skip_interval += 1;
        entry_count = (total_video_frames + skip_interval - 1) / skip_interval;
    }

    let mut frame_offsets = vec![0u32; entry_count as usize];

    reader.seek(SeekFrom::Start(idx1_location))?;
    let entries_in_idx1 = idx1_size / IndexEntry::ENCODED_LEN;

    let mut video_frame_index = 0u32;
    let mut index_entry_pos = 0usize;

    for _ in 0..entries_in_idx1 {
        let entry = match IndexEntry::read(reader) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "truncated idx1, stopping index build early");
                break;
            }
        };

        if entry.chunk_id == fourcc::CHUNK_00DB || entry.chunk_id == fourcc::CHUNK_00DC {
            if video_frame_index % skip_interval == 0 && index_entry_pos < frame_offsets.len() {
                frame_offsets[index_entry_pos] = entry.offset;
                index_entry_pos += 1;
            }
            video_frame_index += 1;
        }
    }

    tracing::info!(
        total_video_frames,
        entries = index_entry_pos,
        capacity = frame_offsets.len(),
        skip_interval,
        "video index built"
    );

    Ok(Some(VideoIndex {
        skip_interval,
        frame_offsets,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn idx1_bytes(entries: &[(u32, u32, u32, u32)]) -> Vec<u8> {
        let mut buf = Vec::new();
        for (id, flags, offset, size) in entries {
            buf.write_all(&id.to_le_bytes()).unwrap();
            buf.write_all(&flags.to_le_bytes()).unwrap();
            buf.write_all(&offset.to_le_bytes()).unwrap();
            buf.write_all(&size.to_le_bytes()).unwrap();
        }
        buf
    }

    #[test]
    fn builds_dense_index_when_under_cap() {
        // `idx1_location = 0` is the "absent" sentinel `build_index` checks
        // for, so the fixture is padded with bytes standing in for the rest
        // of the file preceding `idx1`, matching how the demuxer always
        // records a non-zero `header_start + 8`.
        let pad = vec![0u8; 16];
        let entries: Vec<_> = (0..10)
            .map(|i| (fourcc::CHUNK_00DC, 0u32, i * 1000, 900u32))
            .collect();
        let idx1 = idx1_bytes(&entries);
        let mut bytes = pad.clone();
        bytes.extend_from_slice(&idx1);
        let mut cursor = Cursor::new(bytes);
        let idx = build_index(
            &mut cursor,
            pad.len() as u64,
            idx1.len() as u32,
            10,
            DEFAULT_MAX_INDEX_ENTRIES,
        )
        .unwrap()
        .unwrap();
        assert_eq!(idx.skip_interval, 1);
        assert_eq!(idx.entry_count(), 10);
        assert_eq!(idx.frame_offsets[3], 3000);
    }

    #[test]
    fn applies_skip_interval_when_over_cap() {
        let pad = vec![0u8; 16];
        let entries: Vec<_> = (0..1000)
            .map(|i| (fourcc::CHUNK_00DC, 0u32, i * 1000, 900u32))
            .collect();
        let idx1 = idx1_bytes(&entries);
        let mut bytes = pad.clone();
        bytes.extend_from_slice(&idx1);
        let mut cursor = Cursor::new(bytes);
        let idx = build_index(&mut cursor, pad.len() as u64, idx1.len() as u32, 1000, 500)
            .unwrap()
            .unwrap();
        assert!(idx.skip_interval >= 2);
        assert!(idx.entry_count() <= 500);
        assert!(idx.entry_count() as u32 * idx.skip_interval >= 1000);
    }

    #[test]
    fn no_idx1_yields_no_index() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let idx = build_index(&mut cursor, 0, 0, 10, DEFAULT_MAX_INDEX_ENTRIES).unwrap();
        assert!(idx.is_none());
    }
}
