use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
    time::Duration,
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use image::GrayImage;
use wait_timeout::ChildExt;

use crate::{FramePipeError, FrameSource, PpmFrameReader};

/// How long to wait for ffmpeg to exit after its output pipe has drained
/// before killing it.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Exit state of the decoder process, collected after the frame stream has
/// ended. A non-clean exit does not invalidate frames that were already
/// read, but callers may want to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderExit {
    /// Exited with status zero.
    Clean,
    /// Exited with a nonzero status (the code, if one was available).
    Failed(Option<i32>),
    /// Did not exit after its pipe closed and had to be killed.
    Killed,
}

impl DecoderExit {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

impl std::fmt::Display for DecoderExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "exited cleanly"),
            Self::Failed(Some(code)) => write!(f, "exited with status {code}"),
            Self::Failed(None) => write!(f, "exited abnormally"),
            Self::Killed => write!(f, "did not exit and was killed"),
        }
    }
}

/// Configuration for an ffmpeg frame stream.
///
/// Ffmpeg is asked to downscale to `width`x`height`, convert to
/// grayscale, resample to `fps` frames per second of video, and write the
/// result to its stdout as binary PPM images. The returned stream reads
/// those frames; it never writes to the decoder.
#[derive(Clone, Debug)]
pub struct FfmpegStreamBuilder {
    src_path: PathBuf,
    width: u32,
    height: u32,
    fps: u32,
}

impl FfmpegStreamBuilder {
    pub fn new(src_path: impl AsRef<Path>, width: u32, height: u32) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            width,
            height,
            fps: 6,
        }
    }

    pub fn fps(&mut self, fps: u32) -> &mut Self {
        self.fps = fps;
        self
    }

    /// Spawn the decoder. Failure to spawn is fatal to the whole run;
    /// there is no stream to read from.
    pub fn spawn(&self) -> Result<FfmpegFrameStream, FramePipeError> {
        let vf = format!(
            "scale={}:{},format=gray,fps={}",
            self.width, self.height, self.fps
        );

        let mut command = Command::new("ffmpeg");
        command
            .arg("-hide_banner")
            .args([OsStr::new("-loglevel"), OsStr::new("fatal")])
            .args([OsStr::new("-i"), self.src_path.as_os_str()])
            .args(["-vf", &vf])
            .args(["-f", "image2pipe"])
            .args(["-vcodec", "ppm"])
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        //do not spawn a command window when inside a windows gui application
        #[cfg(target_family = "windows")]
        command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            //separate out NotFound from other spawn errors, as by far the
            //most likely cause is that ffmpeg is not installed.
            std::io::ErrorKind::NotFound => FramePipeError::FfmpegNotFound,
            _ => FramePipeError::Io(format!("{:?}", e.kind())),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FramePipeError::Io("no pipe to ffmpeg stdout".to_string()))?;

        Ok(FfmpegFrameStream {
            reader: Some(PpmFrameReader::new(stdout, self.width, self.height)),
            child,
            width: self.width,
            height: self.height,
            reaped: false,
        })
    }
}

/// A running ffmpeg process together with the reading end of its frame
/// pipe. Reads block until a whole frame is available.
#[derive(Debug)]
pub struct FfmpegFrameStream {
    reader: Option<PpmFrameReader<ChildStdout>>,
    child: Child,
    width: u32,
    height: u32,
    reaped: bool,
}

impl FfmpegFrameStream {
    /// Close our end of the pipe and collect the decoder's exit status.
    ///
    /// Call after the stream has ended (or to abandon it early). The exit
    /// state is informational: frames already read remain valid even if
    /// the decoder failed afterwards.
    pub fn finish(&mut self) -> DecoderExit {
        self.reader = None;
        self.reaped = true;

        match self.child.wait_timeout(REAP_TIMEOUT) {
            Ok(Some(status)) => {
                if status.success() {
                    DecoderExit::Clean
                } else {
                    DecoderExit::Failed(status.code())
                }
            }
            Ok(None) | Err(_) => {
                let _kill_error = self.child.kill();
                let _wait_error = self.child.wait();
                DecoderExit::Killed
            }
        }
    }
}

impl FrameSource for FfmpegFrameStream {
    fn frame_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<GrayImage>, FramePipeError> {
        match self.reader.as_mut() {
            Some(reader) => reader.next_frame(),
            None => Ok(None),
        }
    }
}

// to prevent accumulation of zombie processes, reap ffmpeg here if the
// caller never did so
impl Drop for FfmpegFrameStream {
    fn drop(&mut self) {
        if !self.reaped {
            let _kill_error = self.child.kill();
            let _wait_error = self.child.wait();
        }
    }
}
