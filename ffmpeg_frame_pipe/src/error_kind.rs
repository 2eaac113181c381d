use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Causes of failure when obtaining frames from the decoder pipe.
///
/// Running out of frames is not listed here: end of stream is a normal
/// terminal condition reported as `None` by the frame sources.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FramePipeError {
    /// The ffmpeg command was not found. Make sure ffmpeg is installed and
    /// visible on the command line.
    #[error("ffmpeg not found. Make sure ffmpeg is installed and visible on the command line")]
    FfmpegNotFound,

    /// Io error occurred while spawning or reaping the ffmpeg process.
    #[error("ffmpeg IO error: {0}")]
    Io(String),

    /// A complete frame arrived on the pipe but its header was not the
    /// expected PPM descriptor. The stream is desynchronized and no
    /// further frames can be recovered from it.
    #[error("malformed frame header on the decoder pipe")]
    BadFrameHeader,
}
