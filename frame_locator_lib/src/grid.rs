use std::ops::Deref;

use fast_image_resize::{self as fr, images::ImageRef, Resizer};
use image::{DynamicImage, GrayImage, RgbaImage};

use crate::definitions::{GRID_HEIGHT, GRID_PIXELS, GRID_WIDTH};
use crate::Error;

/// The fixed 9x8 grayscale grid that fingerprints are computed from.
///
/// Stored row-major: 9 columns wide, 8 rows tall, one intensity per
/// pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayGrid {
    pixels: [u8; GRID_PIXELS],
}

impl GrayGrid {
    /// Reduce an arbitrary-size RGBA image to the hash grid.
    ///
    /// The image is resized with a convolution filter (a naive resize
    /// measurably degrades match quality) and then collapsed to
    /// grayscale by averaging the red, green and blue channels. Alpha is
    /// discarded.
    ///
    /// # Errors
    /// Returns [`Error::Resize`] if the image has degenerate geometry.
    /// The caller must not proceed to hashing in that case.
    pub fn from_rgba(img: &RgbaImage) -> Result<Self, Error> {
        //bail out on degenerate geometry before handing the buffer over
        if img.width() == 0 || img.height() == 0 {
            return Err(Error::Resize("image has zero width or height".to_string()));
        }

        let src_ref = ImageRef::new(
            img.width(),
            img.height(),
            img.deref(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| Error::Resize(e.to_string()))?;

        let mut dst_image = DynamicImage::ImageRgba8(RgbaImage::new(GRID_WIDTH, GRID_HEIGHT));

        //alpha is about to be thrown away, so skip premultiplication
        let opts = fr::ResizeOptions::new().use_alpha(false);

        let mut resizer = Resizer::new();
        resizer
            .resize(&src_ref, &mut dst_image, Some(&opts))
            .map_err(|e| Error::Resize(e.to_string()))?;

        let DynamicImage::ImageRgba8(dst_image) = dst_image else {
            unreachable!()
        };

        let mut pixels = [0u8; GRID_PIXELS];
        for (intensity, rgba) in pixels.iter_mut().zip(dst_image.pixels()) {
            let [r, g, b, _a] = rgba.0;
            *intensity = ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8;
        }

        Ok(Self { pixels })
    }

    /// Adopt a frame that the decoder already produced at grid
    /// resolution, so no resize happens on the indexing path.
    ///
    /// # Errors
    /// Returns [`Error::FrameGeometry`] if the frame is not exactly
    /// 9x8.
    pub fn from_gray_frame(frame: &GrayImage) -> Result<Self, Error> {
        if frame.dimensions() != (GRID_WIDTH, GRID_HEIGHT) {
            return Err(Error::FrameGeometry {
                expected_w: GRID_WIDTH,
                expected_h: GRID_HEIGHT,
                got_w: frame.width(),
                got_h: frame.height(),
            });
        }

        let mut pixels = [0u8; GRID_PIXELS];
        pixels.copy_from_slice(frame.as_raw());
        Ok(Self { pixels })
    }

    /// Build a grid directly from 72 row-major intensities.
    #[must_use]
    pub const fn from_pixels(pixels: [u8; GRID_PIXELS]) -> Self {
        Self { pixels }
    }

    /// Intensity at `row` (0..8) and `col` (0..9).
    #[must_use]
    pub const fn intensity(&self, row: u32, col: u32) -> u8 {
        self.pixels[(row * GRID_WIDTH + col) as usize]
    }

    #[must_use]
    pub const fn pixels(&self) -> &[u8; GRID_PIXELS] {
        &self.pixels
    }
}
