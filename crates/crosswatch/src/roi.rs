//! Region-of-interest geometry.
//!
//! All functions here are pure: they turn frame dimensions or a marker
//! centroid into fixed-size sampling rectangles and check those rectangles
//! against the frame.

use crosswatch_core::Rect;
use serde::{Deserialize, Serialize};

use crate::detection::Marker;
use crate::params::{RoiProfile, LEARN_ROI_OFFSET, LEARN_ROI_SIZE};

/// Which of the two marker-relative regions a rectangle belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionName {
    Left,
    Right,
}

impl RegionName {
    pub const ALL: [RegionName; 2] = [RegionName::Left, RegionName::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            RegionName::Left => 0,
            RegionName::Right => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegionName::Left => "left",
            RegionName::Right => "right",
        }
    }
}

impl std::fmt::Display for RegionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pair of rectangles sampled next to the marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRegions {
    pub left: Rect,
    pub right: Rect,
}

impl DetectionRegions {
    pub fn get(&self, name: RegionName) -> Rect {
        match name {
            RegionName::Left => self.left,
            RegionName::Right => self.right,
        }
    }

    /// Regions in evaluation order (left first).
    pub fn iter(&self) -> impl Iterator<Item = (RegionName, Rect)> + '_ {
        RegionName::ALL.into_iter().map(|n| (n, self.get(n)))
    }
}

/// Square learning region around the frame center, biased upward.
pub fn learning_region(frame_w: usize, frame_h: usize) -> Rect {
    let cx = (frame_w / 2) as i32;
    let cy = (frame_h / 2) as i32;
    Rect::new(
        cx + LEARN_ROI_OFFSET.0,
        cy + LEARN_ROI_OFFSET.1,
        LEARN_ROI_SIZE,
        LEARN_ROI_SIZE,
    )
}

/// Place both detection regions at the profile's fixed offsets from the
/// marker centroid.
pub fn detection_regions(marker: &Marker, profile: &RoiProfile) -> DetectionRegions {
    let y = marker.centroid_y.saturating_add(profile.dy);
    DetectionRegions {
        left: Rect::new(
            marker.centroid_x.saturating_add(profile.left_dx),
            y,
            profile.size,
            profile.size,
        ),
        right: Rect::new(
            marker.centroid_x.saturating_add(profile.right_dx),
            y,
            profile.size,
            profile.size,
        ),
    }
}

/// True when both regions can be sampled from a `frame_w` x `frame_h`
/// frame.
///
/// In practice this rejects a negative left edge on the left region, a right
/// edge past the frame width on the right region, or a bottom edge past the
/// frame height on either.
pub fn regions_in_bounds(regions: &DetectionRegions, frame_w: usize, frame_h: usize) -> bool {
    regions.left.fits_within(frame_w, frame_h) && regions.right.fits_within(frame_w, frame_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 320;
    const H: usize = 240;

    fn marker(x: i32, y: i32) -> Marker {
        Marker {
            centroid_x: x,
            centroid_y: y,
            area: 900,
        }
    }

    #[test]
    fn learning_region_keeps_upward_bias() {
        assert_eq!(learning_region(W, H), Rect::new(110, 90, 100, 100));
        assert!(learning_region(W, H).fits_within(W, H));
        assert!(learning_region(640, 480).fits_within(640, 480));
    }

    #[test]
    fn learning_region_overflows_qqvga_frames() {
        let roi = learning_region(160, 120);
        assert_eq!(roi, Rect::new(30, 30, 100, 100));
        assert!(!roi.fits_within(160, 120));
    }

    #[test]
    fn wide_profile_regions_at_frame_center() {
        let r = detection_regions(&marker(160, 100), &RoiProfile::WIDE);
        assert_eq!(r.left, Rect::new(80, 110, 70, 70));
        assert_eq!(r.right, Rect::new(170, 110, 70, 70));
        assert!(regions_in_bounds(&r, W, H));
    }

    #[test]
    fn tight_profile_regions() {
        let r = detection_regions(&marker(160, 100), &RoiProfile::TIGHT);
        assert_eq!(r.left, Rect::new(85, 110, 70, 70));
        assert_eq!(r.right, Rect::new(165, 110, 70, 70));
    }

    #[test]
    fn marker_near_left_edge_is_rejected() {
        let r = detection_regions(&marker(30, 100), &RoiProfile::WIDE);
        assert!(r.left.x < 0);
        assert!(!regions_in_bounds(&r, W, H));
    }

    #[test]
    fn boundaries_are_exact_for_each_edge() {
        for profile in [RoiProfile::WIDE, RoiProfile::TIGHT] {
            let min_x = -profile.left_dx;
            let max_x = W as i32 - profile.right_dx - profile.size;
            let max_y = H as i32 - profile.dy - profile.size;

            let ok = |x, y| regions_in_bounds(&detection_regions(&marker(x, y), &profile), W, H);

            assert!(ok(min_x, 100));
            assert!(!ok(min_x - 1, 100));
            assert!(ok(max_x, 100));
            assert!(!ok(max_x + 1, 100));
            assert!(ok(160, max_y));
            assert!(!ok(160, max_y + 1));
        }
    }

    #[test]
    fn far_away_centroids_saturate_and_are_rejected() {
        for (x, y) in [(i32::MAX, 100), (i32::MIN, 100), (160, i32::MAX), (160, i32::MIN)] {
            let r = detection_regions(&marker(x, y), &RoiProfile::WIDE);
            assert!(!regions_in_bounds(&r, W, H), "({x}, {y})");
        }
    }

    #[test]
    fn iter_yields_left_then_right() {
        let r = detection_regions(&marker(160, 100), &RoiProfile::WIDE);
        let names: Vec<_> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec![RegionName::Left, RegionName::Right]);
    }
}
