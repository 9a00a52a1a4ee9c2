//! Binary preprocessing applied to patches before classification.

use crate::image::{GrayImage, GrayImageView};

/// Foreground value written by [`binarize`] and propagated by [`dilate`].
const FOREGROUND: u8 = 255;

/// Map pixels inside the inclusive range `[lo, hi]` to 255 and everything
/// else to 0.
pub fn binarize(src: &GrayImageView<'_>, lo: u8, hi: u8) -> GrayImage {
    let data = src
        .data
        .iter()
        .map(|&v| if (lo..=hi).contains(&v) { FOREGROUND } else { 0 })
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Grow foreground regions: a pixel becomes foreground if any pixel in the
/// `(2 * radius + 1)` square around it is non-zero.
///
/// Implemented as two separable max passes.
pub fn dilate(src: &GrayImageView<'_>, radius: usize) -> GrayImage {
    let (w, h) = (src.width, src.height);
    if radius == 0 || w == 0 || h == 0 {
        return GrayImage {
            width: w,
            height: h,
            data: src.data.to_vec(),
        };
    }

    let mut horiz = vec![0u8; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(w - 1);
            horiz[y * w + x] = row[x0..=x1].iter().copied().max().unwrap_or(0);
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(h - 1);
        for x in 0..w {
            out.data[y * w + x] = (y0..=y1).map(|yy| horiz[yy * w + x]).max().unwrap_or(0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binarize_selects_dark_ink() {
        let img = GrayImage::from_raw(4, 1, vec![0, 60, 61, 100]).unwrap();
        let bin = binarize(&img.view(), 0, 60);
        assert_eq!(bin.data, vec![255, 255, 0, 0]);
    }

    #[test]
    fn dilate_grows_single_pixel_into_square() {
        let mut img = GrayImage::new(7, 7);
        img.data[3 * 7 + 3] = 255;
        let out = dilate(&img.view(), 2);
        let set: usize = out.data.iter().filter(|&&v| v == 255).count();
        assert_eq!(set, 25);
        assert_eq!(out.view().get(1, 1), 255);
        assert_eq!(out.view().get(0, 0), 0);
    }

    #[test]
    fn dilate_clips_at_border() {
        let mut img = GrayImage::new(4, 4);
        img.data[0] = 255;
        let out = dilate(&img.view(), 1);
        assert_eq!(out.data.iter().filter(|&&v| v == 255).count(), 4);
    }
}
