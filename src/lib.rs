//! AVI DEMUXER - Pure Rust AVI/RIFF Parser with background read-ahead
//!
//! AVI is Microsoft's container from 1992: a simple RIFF structure, easier
//! than MP4's box tree. This crate is aimed at playback from slow,
//! block-oriented storage, where reading ahead of the decoder in a
//! background thread matters more than broad codec coverage.
//!
//! - [`buffered_reader::BufferedReader`] is a background read-ahead cache
//!   standing in for the underlying storage's `Read`/`Seek`.
//! - [`avi`] parses the container on top of any `Read + Seek`.

pub mod avi;
pub mod buffered_reader;
pub mod error;

pub use avi::{open, AviDemuxer, Demuxer, FileInfo, FrameDescriptor};
pub use buffered_reader::BufferedReader;
pub use error::{DemuxError, FrameKind};
