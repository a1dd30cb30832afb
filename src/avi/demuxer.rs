//! Top-level chunk walk, `movi` frame iteration, and index-based seeking.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::buffered_reader::BufferedReader;
use crate::error::{DemuxError, FrameKind};

use super::fourcc;
use super::header::{parse_hdrl, AudioInfo, VideoInfo};
use super::index::{build_index, VideoIndex, DEFAULT_MAX_INDEX_ENTRIES};
use super::riff::{chunk_end, ChunkHeader};

/// Everything learned about the file during [`AviDemuxer::parse_info`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub video: VideoInfo,
    pub audio: AudioInfo,
    pub movi_location: u64,
    pub idx1_location: u64,
    pub idx1_size: u32,
    pub index: Option<VideoIndex>,
}

/// One decoded-ready frame payload returned by [`AviDemuxer::read_frame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameDescriptor {
    pub kind: FrameKind,
    pub size: u32,
    pub frame_index: u32,
}

/// A generic AVI/RIFF demuxer over any positioned byte stream.
pub struct AviDemuxer<R> {
    reader: R,
    info: Option<FileInfo>,
    video_frame_count: u32,
    max_index_entries: u32,
}

impl<R: Read + Seek> AviDemuxer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            info: None,
            video_frame_count: 0,
            max_index_entries: DEFAULT_MAX_INDEX_ENTRIES,
        }
    }

    /// Overrides the seek-index entry cap used by the next [`Self::parse_info`]
    /// call. The original implementation fixed this at compile time; a
    /// library has no such knob for its callers, so it is exposed here
    /// instead, defaulting to the same value.
    pub fn with_max_index_entries(mut self, max_entries: u32) -> Self {
        self.max_index_entries = max_entries;
        self
    }

    pub fn info(&self) -> Option<&FileInfo> {
        self.info.as_ref()
    }

    /// Consumes the demuxer, releasing its reader. Spelled out for parity
    /// with the original API's explicit `delete`; in Rust, dropping the
    /// value does the same thing.
    pub fn delete(self) {}

    /// Parses `hdrl`/`strl`, locates `movi`, and builds the `idx1`-derived
    /// seek index, leaving the cursor positioned at the start of `movi`.
    pub fn parse_info(&mut self) -> Result<&FileInfo, DemuxError> {
        self.reader.seek(SeekFrom::Start(0))?;

        let riff = ChunkHeader::read(&mut self.reader)?;
        if riff.fourcc != fourcc::RIFF {
            return Err(DemuxError::NotRiff);
        }
        let avi_sig = super::records::read_u32_le(&mut self.reader)?;
        if avi_sig != fourcc::AVI_ {
            return Err(DemuxError::NotAvi);
        }

        let mut video = VideoInfo::default();
        let mut audio = AudioInfo::default();
        let mut movi_location = 0u64;
        let mut idx1_location = 0u64;
        let mut idx1_size = 0u32;

        loop {
            let pos = self.reader.stream_position()?;
            let chunk = match ChunkHeader::read(&mut self.reader) {
                Ok(c) => c,
                Err(_) => break, // End of file: no more top-level chunks.
            };

            match chunk.fourcc {
                fourcc::LIST => {
                    let list_type = super::records::read_u32_le(&mut self.reader)?;
                    let list_end = chunk_end(pos, chunk.size);
                    match list_type {
                        fourcc::MOVI => {
                            movi_location = self.reader.stream_position()?;
                        }
                        fourcc::HDRL => {
                            parse_hdrl(&mut self.reader, list_end, &mut video, &mut audio)?;
                        }
                        _ => {}
                    }
                    self.reader.seek(SeekFrom::Start(list_end))?;
                }
                fourcc::IDX1 => {
                    idx1_location = pos + 8;
                    idx1_size = chunk.size;
                    self.reader.seek(SeekFrom::Start(chunk_end(pos, chunk.size)))?;
                }
                _ => {
                    self.reader.seek(SeekFrom::Start(chunk_end(pos, chunk.size)))?;
                }
            }
        }

        if movi_location == 0 {
            tracing::warn!("no LIST movi chunk found");
        }

        let index = build_index(
            &mut self.reader,
            idx1_location,
            idx1_size,
            video.total_frames,
            self.max_index_entries,
        )?;

        self.reader.seek(SeekFrom::Start(movi_location))?;

        tracing::info!(
            width = video.width,
            height = video.height,
            total_frames = video.total_frames,
            has_index = index.is_some(),
            "parsed AVI file info"
        );

        let info = FileInfo {
            video,
            audio,
            movi_location,
            idx1_location,
            idx1_size,
            index,
        };
        self.info = Some(info);
        Ok(self.info.as_ref().unwrap())
    }

    /// Reads the next video or audio frame into the matching caller-owned
    /// buffer, skipping (and logging) any frame too large for the buffer
    /// provided for its kind. Returns `Ok(None)` at end of stream.
    pub fn read_frame(
        &mut self,
        mut video: Option<&mut [u8]>,
        mut audio: Option<&mut [u8]>,
    ) -> Result<Option<FrameDescriptor>, DemuxError> {
        if self.info.is_none() {
            return Err(DemuxError::NotParsed);
        }

        loop {
            let pos = self.reader.stream_position()?;
            let chunk = match ChunkHeader::read(&mut self.reader) {
                Ok(c) => c,
                Err(_) => return Ok(None),
            };
            let end = chunk_end(pos, chunk.size);

            if chunk.fourcc == fourcc::CHUNK_00DB || chunk.fourcc == fourcc::CHUNK_00DC {
                let Some(buf) = video.as_deref_mut() else {
                    return Err(DemuxError::MissingBuffer(FrameKind::Video));
                };
                if chunk.size as usize > buf.len() {
                    tracing::warn!(size = chunk.size, capacity = buf.len(), "video buffer too small, skipping frame");
                    self.reader.seek(SeekFrom::Start(end))?;
                    continue;
                }
                self.reader.read_exact(&mut buf[..chunk.size as usize])?;
                self.reader.seek(SeekFrom::Start(end))?;
                let frame_index = self.video_frame_count;
                self.video_frame_count += 1;
                return Ok(Some(FrameDescriptor {
                    kind: FrameKind::Video,
                    size: chunk.size,
                    frame_index,
                }));
            } else if chunk.fourcc == fourcc::CHUNK_01WB {
                let Some(buf) = audio.as_deref_mut() else {
                    return Err(DemuxError::MissingBuffer(FrameKind::Audio));
                };
                if chunk.size as usize > buf.len() {
                    tracing::warn!(size = chunk.size, capacity = buf.len(), "audio buffer too small, skipping frame");
                    self.reader.seek(SeekFrom::Start(end))?;
                    continue;
                }
                self.reader.read_exact(&mut buf[..chunk.size as usize])?;
                self.reader.seek(SeekFrom::Start(end))?;
                return Ok(Some(FrameDescriptor {
                    kind: FrameKind::Audio,
                    size: chunk.size,
                    frame_index: 0,
                }));
            } else {
                self.reader.seek(SeekFrom::Start(end))?;
            }
        }
    }

    pub fn seek_to_start(&mut self) -> Result<(), DemuxError> {
        let movi_location = self.info.as_ref().ok_or(DemuxError::NotParsed)?.movi_location;
        self.reader.seek(SeekFrom::Start(movi_location))?;
        self.video_frame_count = 0;
        Ok(())
    }

    pub fn seek_to_frame(&mut self, frame_number: u32) -> Result<(), DemuxError> {
        let info = self.info.as_ref().ok_or(DemuxError::NotParsed)?;
        let index = info.index.as_ref().ok_or(DemuxError::IndexUnavailable)?;
        let index_entry = frame_number / index.skip_interval;
        if index_entry >= index.entry_count() {
            return Err(DemuxError::IndexOutOfRange(frame_number));
        }
        let offset = index.frame_offsets[index_entry as usize];
        let target_pos = info.movi_location - 4 + offset as u64;
        self.reader.seek(SeekFrom::Start(target_pos))?;
        self.video_frame_count = index_entry * index.skip_interval;
        Ok(())
    }
}

/// Opens `path` through a [`BufferedReader`], parses its info, and enables
/// background read-ahead for the frame-iteration phase that follows.
pub fn open<P: AsRef<Path>>(path: P) -> Result<AviDemuxer<BufferedReader>, DemuxError> {
    let reader = BufferedReader::open(path)?;
    let mut demuxer = AviDemuxer::new(reader);
    demuxer.parse_info()?;
    demuxer.reader.set_preload_enabled(true);
    Ok(demuxer)
}
