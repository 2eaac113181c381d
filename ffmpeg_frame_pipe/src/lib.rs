#![allow(clippy::let_and_return)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::unwrap_used)]

//! Frame transport between a commandline ffmpeg process and the calling
//! program.
//!
//! Ffmpeg is spawned as a child process and instructed to write small
//! fixed-size frames to its stdout as binary PPM images. This crate
//! performs the exact-size framed reads on the receiving end of that
//! pipe and yields each frame as an [`image::GrayImage`].
//!
//! A short read on the pipe (including zero bytes) is the normal end of
//! the stream, not an error: ffmpeg has finished decoding and closed its
//! end. Frames received before that point remain valid.

mod error_kind;
mod ffmpeg_stream;
mod ppm_stream;

pub use error_kind::FramePipeError;
pub use ffmpeg_stream::{DecoderExit, FfmpegFrameStream, FfmpegStreamBuilder};
pub use ppm_stream::{FrameSource, PpmFrameReader};
