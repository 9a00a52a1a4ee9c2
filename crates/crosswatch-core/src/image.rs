use crate::color::rgb_to_lab;
use crate::rect::Rect;

/// Errors raised when wrapping or slicing raw pixel buffers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("region {rect:?} is outside the {width}x{height} image")]
    RegionOutOfBounds {
        rect: Rect,
        width: usize,
        height: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = checked_len(width, height, 1)?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Borrowed interleaved RGB frame (3 bytes per pixel, row-major).
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned interleaved RGB frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    /// Frame filled with a single color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = checked_len(width, height, 3)?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Paint an axis-aligned rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, rect: Rect, rgb: [u8; 3]) {
        let x0 = rect.x.max(0) as usize;
        let y0 = rect.y.max(0) as usize;
        let x1 = (rect.right().max(0) as usize).min(self.width);
        let y1 = (rect.bottom().max(0) as usize).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.put_pixel(x, y, rgb);
            }
        }
    }
}

impl RgbImageView<'_> {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Copy `rect` out of the frame as a CIE L* plane (values 0..=100).
    ///
    /// The rectangle must lie fully inside the frame.
    pub fn crop_lightness(&self, rect: Rect) -> Result<GrayImage, ImageError> {
        if !rect.fits_within(self.width, self.height) {
            return Err(ImageError::RegionOutOfBounds {
                rect,
                width: self.width,
                height: self.height,
            });
        }
        let (x0, y0) = (rect.x as usize, rect.y as usize);
        let (w, h) = (rect.width as usize, rect.height as usize);
        let mut out = GrayImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let lab = rgb_to_lab(self.pixel(x0 + x, y0 + y));
                out.data[y * w + x] = lab.l.round().clamp(0.0, 100.0) as u8;
            }
        }
        Ok(out)
    }
}

fn checked_len(width: usize, height: usize, channels: usize) -> Result<usize, ImageError> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(ImageError::InvalidDimensions { width, height })
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rgb_from_raw_rejects_short_buffer() {
        let err = RgbImage::from_raw(4, 2, vec![0; 10]).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidBuffer {
                expected: 24,
                got: 10
            }
        );
    }

    #[test]
    fn crop_lightness_maps_black_and_white() {
        let mut img = RgbImage::filled(8, 8, [255, 255, 255]);
        img.fill_rect(Rect::new(0, 0, 4, 8), [0, 0, 0]);
        let patch = img.view().crop_lightness(Rect::new(2, 1, 4, 3)).unwrap();
        assert_eq!((patch.width, patch.height), (4, 3));
        assert_eq!(patch.view().get(0, 0), 0);
        assert_eq!(patch.view().get(3, 2), 100);
    }

    #[test]
    fn crop_lightness_rejects_partial_overlap() {
        let img = RgbImage::filled(8, 8, [0, 0, 0]);
        let err = img.view().crop_lightness(Rect::new(-1, 0, 4, 4));
        assert!(matches!(err, Err(ImageError::RegionOutOfBounds { .. })));
    }

    #[test]
    fn bilinear_interpolates_between_neighbours() {
        let img = GrayImage::from_raw(2, 1, vec![0, 100]).unwrap();
        assert_relative_eq!(sample_bilinear(&img.view(), 0.25, 0.0), 25.0);
    }
}
