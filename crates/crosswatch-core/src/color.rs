//! sRGB to CIE L*a*b* conversion and LAB box thresholds.

use serde::{Deserialize, Serialize};

/// A color in CIE L*a*b* (D65 white point).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

/// Axis-aligned box in LAB space; a pixel matches when all three channels
/// fall inside their inclusive ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabThreshold {
    pub l_min: i16,
    pub l_max: i16,
    pub a_min: i16,
    pub a_max: i16,
    pub b_min: i16,
    pub b_max: i16,
}

impl LabThreshold {
    /// Saturated red under indoor light.
    pub const RED: Self = Self {
        l_min: 0,
        l_max: 100,
        a_min: 20,
        a_max: 127,
        b_min: 0,
        b_max: 127,
    };

    #[inline]
    pub fn contains(&self, lab: Lab) -> bool {
        let inside = |v: f32, lo: i16, hi: i16| v >= lo as f32 && v <= hi as f32;
        inside(lab.l, self.l_min, self.l_max)
            && inside(lab.a, self.a_min, self.a_max)
            && inside(lab.b, self.b_min, self.b_max)
    }

    #[inline]
    pub fn contains_rgb(&self, rgb: [u8; 3]) -> bool {
        self.contains(rgb_to_lab(rgb))
    }
}

impl Default for LabThreshold {
    fn default() -> Self {
        Self::RED
    }
}

const WHITE_X: f32 = 0.950_47;
const WHITE_Z: f32 = 1.088_83;

#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

pub fn rgb_to_lab(rgb: [u8; 3]) -> Lab {
    let r = srgb_to_linear(rgb[0]);
    let g = srgb_to_linear(rgb[1]);
    let b = srgb_to_linear(rgb[2]);

    let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175 * b;
    let z = 0.019_333_9 * r + 0.119_192 * g + 0.950_304_1 * b;

    let fx = lab_f(x / WHITE_X);
    let fy = lab_f(y);
    let fz = lab_f(z / WHITE_Z);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}
