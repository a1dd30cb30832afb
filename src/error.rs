//! Error types shared by the buffered reader and the AVI demuxer.

use thiserror::Error;

/// Which frame slot a [`crate::avi::FrameKind`] refers to, used by
/// [`DemuxError::MissingBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Video,
    Audio,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Video => write!(f, "video"),
            FrameKind::Audio => write!(f, "audio"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DemuxError {
    #[error("not a RIFF file")]
    NotRiff,
    #[error("not an AVI file")]
    NotAvi,
    #[error("no stream information parsed yet, call parse_info first")]
    NotParsed,
    #[error("a {0} chunk arrived but no {0} buffer was provided")]
    MissingBuffer(FrameKind),
    #[error("no seek index is available for this file")]
    IndexUnavailable,
    #[error("frame {0} is out of range for the seek index")]
    IndexOutOfRange(u32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
