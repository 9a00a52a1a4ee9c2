use crosswatch_core::{BlobParams, LabThreshold, Rect, Region, RgbImageView};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Running statistics for one connected component.
#[derive(Clone, Copy, Debug)]
struct Component {
    sum_x: u64,
    sum_y: u64,
    count: u32,
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl Component {
    fn seed(x: usize, y: usize) -> Self {
        Self {
            sum_x: 0,
            sum_y: 0,
            count: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn add(&mut self, x: usize, y: usize) {
        self.sum_x += x as u64;
        self.sum_y += y as u64;
        self.count += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn absorb(&mut self, other: &Component) {
        self.sum_x += other.sum_x;
        self.sum_y += other.sum_y;
        self.count += other.count;
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    fn bbox(&self) -> Rect {
        Rect::new(
            self.min_x as i32,
            self.min_y as i32,
            (self.max_x - self.min_x + 1) as i32,
            (self.max_y - self.min_y + 1) as i32,
        )
    }

    fn to_region(self) -> Region {
        let n = self.count.max(1) as f32;
        let bbox = self.bbox();
        Region {
            centroid: Point2::new(self.sum_x as f32 / n, self.sum_y as f32 / n),
            area: bbox.area(),
            pixels: self.count,
            bbox,
        }
    }
}

fn threshold_mask(frame: &RgbImageView<'_>, threshold: &LabThreshold) -> Vec<bool> {
    let mut mask = Vec::with_capacity(frame.width * frame.height);
    for y in 0..frame.height {
        for x in 0..frame.width {
            mask.push(threshold.contains_rgb(frame.pixel(x, y)));
        }
    }
    mask
}

/// 8-connected components of the pixels matching `threshold`, in raster
/// order of each component's first pixel.
fn label_components(frame: &RgbImageView<'_>, threshold: &LabThreshold) -> Vec<Component> {
    let (w, h) = (frame.width, frame.height);
    let mut mask = threshold_mask(frame, threshold);
    let mut out = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if !mask[start] {
            continue;
        }
        mask[start] = false;
        let (sx, sy) = (start % w, start / w);
        let mut comp = Component::seed(sx, sy);
        stack.push((sx, sy));

        while let Some((x, y)) = stack.pop() {
            comp.add(x, y);
            let y0 = y.saturating_sub(1);
            let y1 = (y + 1).min(h - 1);
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    let idx = ny * w + nx;
                    if mask[idx] {
                        mask[idx] = false;
                        stack.push((nx, ny));
                    }
                }
            }
        }
        out.push(comp);
    }
    out
}

/// Repeatedly fuse components whose bounding boxes overlap. The surviving
/// component keeps the position of the earlier one.
fn merge_overlapping(mut comps: Vec<Component>) -> Vec<Component> {
    'restart: loop {
        for i in 0..comps.len() {
            for j in (i + 1)..comps.len() {
                if comps[i].bbox().overlaps(&comps[j].bbox()) {
                    let other = comps.remove(j);
                    comps[i].absorb(&other);
                    continue 'restart;
                }
            }
        }
        return comps;
    }
}

/// Find color blobs in `frame`.
///
/// Components below `pixels_threshold` member pixels or `area_threshold`
/// bounding-box area are dropped before merging.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, params), fields(width = frame.width, height = frame.height))
)]
pub fn find_blobs(frame: &RgbImageView<'_>, params: &BlobParams) -> Vec<Region> {
    if frame.width == 0 || frame.height == 0 {
        return Vec::new();
    }
    let comps: Vec<Component> = label_components(frame, &params.threshold)
        .into_iter()
        .filter(|c| c.count >= params.pixels_threshold && c.bbox().area() >= params.area_threshold)
        .collect();

    let comps = if params.merge {
        merge_overlapping(comps)
    } else {
        comps
    };
    comps.into_iter().map(Component::to_region).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crosswatch_core::RgbImage;

    const RED: [u8; 3] = [230, 20, 25];
    const PAPER: [u8; 3] = [240, 240, 235];

    fn loose() -> BlobParams {
        BlobParams {
            pixels_threshold: 1,
            area_threshold: 1,
            merge: false,
            ..BlobParams::default()
        }
    }

    fn paint_cross(img: &mut RgbImage, cx: i32, cy: i32, arm: i32, thick: i32) {
        img.fill_rect(Rect::new(cx - arm, cy - thick / 2, 2 * arm + 1, thick), RED);
        img.fill_rect(Rect::new(cx - thick / 2, cy - arm, thick, 2 * arm + 1), RED);
    }

    #[test]
    fn single_cross_yields_one_region_at_its_center() {
        let mut img = RgbImage::filled(120, 100, PAPER);
        paint_cross(&mut img, 60, 50, 15, 5);
        let regions = find_blobs(&img.view(), &BlobParams::default());
        assert_eq!(regions.len(), 1);
        let r = regions[0];
        assert_relative_eq!(r.centroid.x, 60.0, epsilon = 0.01);
        assert_relative_eq!(r.centroid.y, 50.0, epsilon = 0.01);
        assert_eq!(r.bbox, Rect::new(45, 35, 31, 31));
        assert_eq!(r.area, 31 * 31);
        assert_eq!(r.pixels, 31 * 5 * 2 - 25);
    }

    #[test]
    fn diagonal_neighbours_are_connected() {
        let mut img = RgbImage::filled(4, 4, PAPER);
        img.put_pixel(0, 0, RED);
        img.put_pixel(1, 1, RED);
        img.put_pixel(3, 3, RED);
        let regions = find_blobs(&img.view(), &loose());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].pixels, 2);
        assert_eq!(regions[1].bbox, Rect::new(3, 3, 1, 1));
    }

    #[test]
    fn small_specks_are_filtered_out() {
        let mut img = RgbImage::filled(60, 60, PAPER);
        img.fill_rect(Rect::new(2, 2, 3, 3), RED);
        paint_cross(&mut img, 30, 30, 12, 6);
        let regions = find_blobs(&img.view(), &BlobParams::default());
        assert_eq!(regions.len(), 1);
        assert!(regions[0].pixels >= 200);
    }

    #[test]
    fn merge_fuses_overlapping_boxes() {
        // An L-shape's bounding box swallows a separate square in its corner.
        let mut img = RgbImage::filled(40, 40, PAPER);
        img.fill_rect(Rect::new(0, 0, 30, 2), RED);
        img.fill_rect(Rect::new(0, 0, 2, 30), RED);
        img.fill_rect(Rect::new(20, 20, 5, 5), RED);

        let unmerged = find_blobs(&img.view(), &loose());
        assert_eq!(unmerged.len(), 2);

        let merged = find_blobs(
            &img.view(),
            &BlobParams {
                merge: true,
                ..loose()
            },
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].pixels, unmerged[0].pixels + unmerged[1].pixels);
        assert_eq!(merged[0].bbox, Rect::new(0, 0, 30, 30));
    }

    #[test]
    fn empty_frame_has_no_blobs() {
        let img = RgbImage::filled(0, 0, PAPER);
        assert!(find_blobs(&img.view(), &BlobParams::default()).is_empty());
    }
}
