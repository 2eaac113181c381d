use std::io::Read;

use image::GrayImage;

use crate::FramePipeError;

/// A lazy, finite, non-restartable source of fixed-size grayscale frames.
///
/// Implemented by [`crate::FfmpegFrameStream`] for real video files, and
/// easily faked in tests so that consumers can be exercised without
/// spawning a decoder.
pub trait FrameSource {
    /// Pixel dimensions of every frame this source yields.
    fn frame_dimensions(&self) -> (u32, u32);

    /// The next frame, or `Ok(None)` once the stream has ended.
    ///
    /// End of stream is terminal: once `Ok(None)` has been returned the
    /// source will never yield another frame.
    fn next_frame(&mut self) -> Result<Option<GrayImage>, FramePipeError>;
}

/// Reads binary PPM frames of a known fixed size from a byte stream.
///
/// Each frame on the wire is a fixed textual header (`P6\n<w> <h>\n255\n`)
/// immediately followed by `w * h * 3` payload bytes. Because the decoder
/// is configured to emit grayscale content, the three channel bytes of
/// each pixel are redundant and only the first is kept.
///
/// Every call performs one exact frame-sized blocking read. A short read
/// (fewer bytes than a whole frame, including zero) ends the stream
/// cleanly; frames already yielded stand.
#[derive(Debug)]
pub struct PpmFrameReader<R> {
    src: R,
    width: u32,
    height: u32,
    header_len: usize,
    frame_len: usize,
    finished: bool,
}

impl<R: Read> PpmFrameReader<R> {
    pub fn new(src: R, width: u32, height: u32) -> Self {
        let header_len = ppm_header(width, height).len();
        let frame_len = header_len + (width as usize * height as usize * 3);
        Self {
            src,
            width,
            height,
            header_len,
            frame_len,
            finished: false,
        }
    }

    /// Blocking exact-size read of one whole frame.
    /// Returns `None` on the first short or failed read.
    fn read_frame_bytes(&mut self) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; self.frame_len];
        let mut buf_head = 0;
        while buf_head < buf.len() {
            match self.src.read(&mut buf[buf_head..]) {
                //no more data can be read: mid-frame data is discarded
                Err(_) | Ok(0) => return None,
                Ok(bytes_read) => buf_head += bytes_read,
            }
        }
        Some(buf)
    }
}

impl<R: Read> FrameSource for PpmFrameReader<R> {
    fn frame_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<GrayImage>, FramePipeError> {
        if self.finished {
            return Ok(None);
        }

        let Some(frame_bytes) = self.read_frame_bytes() else {
            self.finished = true;
            return Ok(None);
        };

        if !frame_bytes.starts_with(b"P6") {
            self.finished = true;
            return Err(FramePipeError::BadFrameHeader);
        }

        //keep one byte per pixel, the source is already grayscale.
        let intensities = frame_bytes[self.header_len..]
            .iter()
            .step_by(3)
            .copied()
            .collect::<Vec<_>>();

        let frame = GrayImage::from_raw(self.width, self.height, intensities)
            .expect("one intensity was recovered per pixel");

        Ok(Some(frame))
    }
}

pub(crate) fn ppm_header(width: u32, height: u32) -> String {
    format!("P6\n{width} {height}\n255\n")
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    const W: u32 = 9;
    const H: u32 = 8;

    fn wire_frame(luma: u8) -> Vec<u8> {
        let mut bytes = ppm_header(W, H).into_bytes();
        bytes.extend(std::iter::repeat(luma).take(W as usize * H as usize * 3));
        bytes
    }

    #[test]
    fn frame_on_the_wire_is_227_bytes_at_9x8() {
        //11-byte header plus 9*8*3 payload bytes
        assert_eq!(wire_frame(0).len(), 227);
    }

    #[test]
    fn well_formed_stream_yields_every_frame_in_order() {
        let mut stream = vec![];
        for luma in 0..6u8 {
            stream.extend(wire_frame(luma));
        }

        let mut reader = PpmFrameReader::new(Cursor::new(stream), W, H);
        for luma in 0..6u8 {
            let frame = reader.next_frame().unwrap().unwrap();
            assert_eq!(frame.dimensions(), (W, H));
            assert!(frame.as_raw().iter().all(|&px| px == luma));
        }
        assert!(reader.next_frame().unwrap().is_none());

        //end of stream is terminal
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn truncated_final_frame_is_discarded() {
        let mut stream = wire_frame(10);
        stream.extend(&wire_frame(20)[..100]);

        let mut reader = PpmFrameReader::new(Cursor::new(stream), W, H);
        let frame = reader.next_frame().unwrap().unwrap();
        assert!(frame.as_raw().iter().all(|&px| px == 10));
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_stream_ends_immediately() {
        let mut reader = PpmFrameReader::new(Cursor::new(vec![]), W, H);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn non_ppm_data_is_a_bad_header() {
        //a whole frame's worth of garbage, so the exact-size read
        //succeeds and the header check itself is what trips
        let stream = vec![0xffu8; 227];
        let mut reader = PpmFrameReader::new(Cursor::new(stream), W, H);
        assert!(matches!(
            reader.next_frame(),
            Err(FramePipeError::BadFrameHeader)
        ));
    }

    #[test]
    fn only_every_third_payload_byte_is_kept() {
        let mut stream = ppm_header(W, H).into_bytes();
        for px in 0..(W * H) as usize {
            stream.extend([px as u8, 0xaa, 0xbb]);
        }

        let mut reader = PpmFrameReader::new(Cursor::new(stream), W, H);
        let frame = reader.next_frame().unwrap().unwrap();
        for (i, &px) in frame.as_raw().iter().enumerate() {
            assert_eq!(px, i as u8);
        }
    }
}
