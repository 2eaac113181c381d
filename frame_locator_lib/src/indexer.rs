use std::path::Path;

use ffmpeg_frame_pipe::{DecoderExit, FfmpegStreamBuilder, FrameSource};

use crate::definitions::{GRID_HEIGHT, GRID_WIDTH, INDEX_FPS};
use crate::{Error, Fingerprint, FingerprintRecord, GrayGrid};

/// The result of indexing one video file.
#[derive(Debug)]
pub struct IndexOutcome {
    /// One record per sampled frame, in frame order.
    pub records: Vec<FingerprintRecord>,

    /// How the decoder process ended. A non-clean exit after the stream
    /// drained does not invalidate the records, but callers should
    /// surface it.
    pub decoder_exit: DecoderExit,
}

/// Fingerprint every frame a source yields, numbering frames from 0.
///
/// All records carry the caller-supplied episode number and source
/// identifier. The source ending (however abruptly the underlying byte
/// stream was cut) is the normal end of indexing: whatever whole frames
/// arrived are returned.
///
/// # Errors
/// Fails on decoder pipe errors, on frames that are not at grid
/// resolution, and if the video yields more frames than a `u16` frame
/// index can number.
pub fn index_frames<S: FrameSource>(
    source: &mut S,
    episode: u16,
    source_id: u8,
) -> Result<Vec<FingerprintRecord>, Error> {
    let mut records = vec![];

    while let Some(frame) = source.next_frame()? {
        let grid = GrayGrid::from_gray_frame(&frame)?;

        let frame_index = u16::try_from(records.len()).map_err(|_| Error::FrameIndexOverflow)?;

        records.push(FingerprintRecord {
            fingerprint: Fingerprint::from_grid(&grid),
            frame: frame_index,
            episode,
            source_id,
        });
    }

    Ok(records)
}

/// Index a video file: spawn ffmpeg sampling [`INDEX_FPS`] frames per
/// second directly at grid resolution, fingerprint every frame, and
/// collect the decoder's exit status.
///
/// # Errors
/// Fails if the decoder cannot be spawned (fatal: no stream exists to
/// read), plus the conditions of [`index_frames`].
pub fn index_video(
    src_path: impl AsRef<Path>,
    episode: u16,
    source_id: u8,
) -> Result<IndexOutcome, Error> {
    let mut stream = FfmpegStreamBuilder::new(src_path, GRID_WIDTH, GRID_HEIGHT)
        .fps(INDEX_FPS)
        .spawn()?;

    let records = index_frames(&mut stream, episode, source_id)?;
    let decoder_exit = stream.finish();

    Ok(IndexOutcome {
        records,
        decoder_exit,
    })
}
