//! RIFF/AVI container parsing: chunk walking, `hdrl`/`strl` headers, the
//! `idx1` seek index, and frame iteration.

pub mod demuxer;
pub mod fourcc;
pub mod header;
pub mod index;
pub mod records;
pub mod riff;

pub use demuxer::{open, AviDemuxer, FileInfo, FrameDescriptor};
pub use header::{AudioCodec, AudioInfo, VideoCodec, VideoInfo};
pub use index::VideoIndex;

/// Convenience alias for the common case: an [`AviDemuxer`] reading through
/// the crate's own [`crate::buffered_reader::BufferedReader`].
pub type Demuxer = AviDemuxer<crate::buffered_reader::BufferedReader>;
