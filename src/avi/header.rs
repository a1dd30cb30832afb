//! Parses the `hdrl` LIST: the main `avih` header and each stream's
//! `strl` (`strh` + `strf`) sub-list.

use std::io::{Read, Seek, SeekFrom};

use serde::{Deserialize, Serialize};

use super::fourcc;
use super::records::{BitmapInfoHeader, MainHeader, StreamHeader, WaveFormatEx};
use super::riff::{chunk_end, ChunkHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    Unknown,
    Mjpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCodec {
    Unknown,
    Pcm,
    Mp3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    pub total_frames: u32,
    pub frame_rate_us: u32,
    pub max_frame_size: u32,
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self {
            codec: VideoCodec::Unknown,
            width: 0,
            height: 0,
            total_frames: 0,
            frame_rate_us: 0,
            max_frame_size: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    pub codec: AudioCodec,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sampling_rate: u32,
    pub max_frame_size: u32,
}

impl Default for AudioInfo {
    fn default() -> Self {
        Self {
            codec: AudioCodec::Unknown,
            channels: 0,
            bits_per_sample: 0,
            sampling_rate: 0,
            max_frame_size: 0,
        }
    }
}

fn video_codec(fourcc_handler: u32) -> VideoCodec {
    match fourcc_handler {
        fourcc::MJPG | fourcc::MJPG_LOWER => VideoCodec::Mjpeg,
        _ => VideoCodec::Unknown,
    }
}

fn audio_codec(format_tag: u16) -> AudioCodec {
    match format_tag {
        0x0001 => AudioCodec::Pcm,
        0x0055 => AudioCodec::Mp3,
        _ => AudioCodec::Unknown,
    }
}

/// Parses the contents of `LIST hdrl` (`avih` plus each `LIST strl`),
/// `list_end` being the absolute offset one past the list's payload.
pub fn parse_hdrl<R: Read + Seek>(
    reader: &mut R,
    list_end: u64,
    video: &mut VideoInfo,
    audio: &mut AudioInfo,
) -> std::io::Result<()> {
    while reader.stream_position()? < list_end {
        let pos = reader.stream_position()?;
        let chunk = ChunkHeader::read(reader)?;

        match chunk.fourcc {
            fourcc::AVIH => {
                let main = MainHeader::read(reader)?;
                video.width = main.width;
                video.height = main.height;
                video.total_frames = main.total_frames;
                video.frame_rate_us = main.micro_sec_per_frame;
                if chunk.size > MainHeader::ENCODED_LEN {
                    reader.seek(SeekFrom::Current((chunk.size - MainHeader::ENCODED_LEN) as i64))?;
                }
            }
            fourcc::LIST => {
                let nested_type = super::records::read_u32_le(reader)?;
                let nested_end = chunk_end(pos, chunk.size);
                if nested_type == fourcc::STRL {
                    parse_strl(reader, nested_end, video, audio)?;
                }
                reader.seek(SeekFrom::Start(nested_end))?;
                continue;
            }
            _ => {
                reader.seek(SeekFrom::Current(chunk.size as i64))?;
            }
        }

        reader.seek(SeekFrom::Start(chunk_end(pos, chunk.size)))?;
    }
    Ok(())
}

fn parse_strl<R: Read + Seek>(
    reader: &mut R,
    list_end: u64,
    video: &mut VideoInfo,
    audio: &mut AudioInfo,
) -> std::io::Result<()> {
    let mut current_type = 0u32;

    while reader.stream_position()? < list_end {
        let pos = reader.stream_position()?;
        let chunk = ChunkHeader::read(reader)?;

        match chunk.fourcc {
            fourcc::STRH => {
                let strh = StreamHeader::read(reader)?;
                current_type = strh.fourcc_type;
                if current_type == fourcc::VIDS {
                    video.max_frame_size = strh.suggested_buffer_size;
                } else if current_type == fourcc::AUDS {
                    audio.max_frame_size = strh.suggested_buffer_size;
                }
                if chunk.size > StreamHeader::ENCODED_LEN {
                    reader.seek(SeekFrom::Current((chunk.size - StreamHeader::ENCODED_LEN) as i64))?;
                }
            }
            fourcc::STRF => match current_type {
                fourcc::VIDS => {
                    let bih = BitmapInfoHeader::read(reader)?;
                    video.codec = video_codec(bih.compression);
                    if chunk.size > BitmapInfoHeader::ENCODED_LEN {
                        reader.seek(SeekFrom::Current((chunk.size - BitmapInfoHeader::ENCODED_LEN) as i64))?;
                    }
                }
                fourcc::AUDS => {
                    let wfx = WaveFormatEx::read(reader)?;
                    audio.codec = audio_codec(wfx.format_tag);
                    audio.channels = wfx.channels;
                    audio.sampling_rate = wfx.samples_per_sec;
                    audio.bits_per_sample = wfx.bits_per_sample;
                    if chunk.size > WaveFormatEx::ENCODED_LEN {
                        reader.seek(SeekFrom::Current((chunk.size - WaveFormatEx::ENCODED_LEN) as i64))?;
                    }
                }
                _ => {
                    reader.seek(SeekFrom::Current(chunk.size as i64))?;
                }
            },
            _ => {
                reader.seek(SeekFrom::Current(chunk.size as i64))?;
            }
        }

        reader.seek(SeekFrom::Start(chunk_end(pos, chunk.size)))?;
    }
    Ok(())
}
