#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::panic)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! `frame_locator_lib` identifies which frame of which episode of a video
//! series a still image was taken from. Every sampled frame of every known
//! episode is reduced to a 64-bit perceptual fingerprint ahead of time;
//! locating an image is then a nearest-neighbour scan over that table by
//! Hamming distance.
//!
//! # High level API
//! The online path: fingerprint a query image and rank the table.
//! ```rust
//! use frame_locator_lib::{Fingerprint, FingerprintRecord, FingerprintTable, SearchOptions};
//!
//! let table = FingerprintTable::new([FingerprintRecord {
//!     fingerprint: Fingerprint::from_raw(0x0f0f_0f0f_0f0f_0f0f),
//!     frame: 42,
//!     episode: 3,
//!     source_id: 1,
//! }]);
//!
//! let matches = table.search(
//!     Fingerprint::from_raw(0x0f0f_0f0f_0f0f_0f0f),
//!     &SearchOptions::default(),
//! );
//! assert_eq!(matches[0].distance, 0);
//! assert_eq!(matches[0].frame, 42);
//! ```
//!
//! The offline path walks a video file with ffmpeg at a reduced sampling
//! rate and emits one [`FingerprintRecord`] per frame: see
//! [`index_video`]. Tables are stored as JSON and loaded once per
//! process: see [`FingerprintTable::from_json_reader`].
//!
//! # Prerequisites
//! Indexing calls ffmpeg from the command line, so ffmpeg must be
//! installed and visible on the command line. The online query path has
//! no external dependencies.
//!
//! # How it works
//! Each frame (or query image) is reduced to a 9x8 grayscale grid. Within
//! each of the 8 rows, each of the 8 adjacent horizontal pixel pairs
//! contributes one bit: set when the left pixel is darker than the right.
//! The result is a 64-bit gradient hash that is robust to uniform
//! brightness shifts but sensitive to structural layout. Similar images
//! have fingerprints with a small Hamming distance, so a search is a
//! linear scan of the table keeping everything under a distance
//! threshold. No index structure is used; this is O(table size) per
//! query, which is fine for the tens of thousands of records a series
//! produces.

mod definitions;
mod fingerprint;
mod grid;
mod indexer;
mod record;
mod search;

pub use definitions::{
    DEFAULT_MAX_DISTANCE, DEFAULT_MAX_RESULTS, GRID_HEIGHT, GRID_PIXELS, GRID_WIDTH, INDEX_FPS,
};
pub use fingerprint::Fingerprint;
pub use grid::GrayGrid;
pub use indexer::{index_frames, index_video, IndexOutcome};
pub use record::{FingerprintRecord, FingerprintTable};
pub use search::{locate, FrameMatch, SearchOptions};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error raised while fingerprinting an image or indexing a video.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    /// The query image could not be resized down to the hash grid.
    /// Only the current query is lost; the table and any other queries
    /// are unaffected.
    #[error("could not resize image to the hash resolution: {0}")]
    Resize(String),

    /// A decoded frame did not have the hash grid's dimensions.
    #[error("bad frame geometry: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    FrameGeometry {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },

    /// More frames were decoded than a 16-bit frame index can number.
    #[error("video produced more than {} sampled frames", u16::MAX)]
    FrameIndexOverflow,

    /// The decoder pipe failed. Fatal to the indexing run.
    #[error("video decoding failed: {0}")]
    Decode(#[from] ffmpeg_frame_pipe::FramePipeError),

    /// A fingerprint table could not be read or written.
    #[error("fingerprint table IO failed: {0}")]
    Table(String),
}
