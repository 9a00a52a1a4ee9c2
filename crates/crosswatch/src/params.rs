//! Thresholds, ROI offset tables and the serializable run configuration.

use crosswatch_core::BlobParams;
use serde::{Deserialize, Serialize};

use crate::frame::FrameConfig;

/// Consecutive qualifying observations needed to confirm a learned digit.
pub const CONFIRMATION_WINDOW: usize = 20;
/// A learning observation qualifies only when its confidence is above this.
pub const LEARN_THRESHOLD: f32 = 0.8;
/// Side length of the square learning region.
pub const LEARN_ROI_SIZE: i32 = 100;
/// Offset of the learning region's top-left corner from the frame center.
/// The vertical offset is deliberately smaller than half the size.
pub const LEARN_ROI_OFFSET: (i32, i32) = (-50, -30);
/// Side length of each square detection region.
pub const DETECT_ROI_SIZE: i32 = 70;
/// Lightness band (CIE L*, 0..=100) treated as ink when binarizing patches.
pub const INK_LIGHTNESS: (u8, u8) = (0, 60);
/// Dilation radius applied to learning patches after binarization.
pub const LEARN_DILATE_RADIUS: usize = 2;
/// Minimum spacing between two reports for the same region.
pub const REPORT_INTERVAL_MS: u64 = 1000;

/// Placement of the two detection regions relative to the marker centroid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiProfile {
    /// Left region's x offset from the centroid.
    pub left_dx: i32,
    /// Right region's x offset from the centroid.
    pub right_dx: i32,
    /// Vertical offset shared by both regions.
    pub dy: i32,
    pub size: i32,
}

impl RoiProfile {
    pub const TIGHT: Self = Self {
        left_dx: -75,
        right_dx: 5,
        dy: 10,
        size: DETECT_ROI_SIZE,
    };

    pub const WIDE: Self = Self {
        left_dx: -80,
        right_dx: 10,
        dy: 10,
        size: DETECT_ROI_SIZE,
    };
}

/// Confidence requirement for a detection region to count as a match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchGate {
    /// Confidence must be strictly above the value.
    Above(f32),
    /// Any confidence matches once the label agrees.
    Unconditional,
}

impl MatchGate {
    #[inline]
    pub fn passes(&self, confidence: f32) -> bool {
        match *self {
            MatchGate::Above(t) => confidence > t,
            MatchGate::Unconditional => true,
        }
    }
}

/// One complete detection configuration. Each preset is used as a whole;
/// fields are never mixed across presets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionProfile {
    pub roi: RoiProfile,
    /// Dilation radius for detection patches; 0 disables dilation.
    pub dilate_radius: usize,
    pub gate: MatchGate,
}

impl DetectionProfile {
    /// 75/5 px spacing, binarize only, confidence above 0.7.
    pub const TIGHT: Self = Self {
        roi: RoiProfile::TIGHT,
        dilate_radius: 0,
        gate: MatchGate::Above(0.7),
    };

    /// 80/10 px spacing, binarize and dilate, no confidence gate.
    pub const WIDE: Self = Self {
        roi: RoiProfile::WIDE,
        dilate_radius: LEARN_DILATE_RADIUS,
        gate: MatchGate::Unconditional,
    };
}

/// Named detection preset selectable from the configuration file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilePreset {
    #[default]
    Tight,
    Wide,
}

impl ProfilePreset {
    pub fn profile(self) -> DetectionProfile {
        match self {
            ProfilePreset::Tight => DetectionProfile::TIGHT,
            ProfilePreset::Wide => DetectionProfile::WIDE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LearningParams {
    pub window: usize,
    pub threshold: f32,
    pub ink: (u8, u8),
    pub dilate_radius: usize,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            window: CONFIRMATION_WINDOW,
            threshold: LEARN_THRESHOLD,
            ink: INK_LIGHTNESS,
            dilate_radius: LEARN_DILATE_RADIUS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionParams {
    pub profile: ProfilePreset,
    pub ink: (u8, u8),
    pub blob: BlobParams,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            profile: ProfilePreset::default(),
            ink: INK_LIGHTNESS,
            blob: BlobParams::default(),
        }
    }
}

/// Everything the recognition session needs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionParams {
    pub learning: LearningParams,
    pub detection: DetectionParams,
    pub report_interval_ms: u64,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            learning: LearningParams::default(),
            detection: DetectionParams::default(),
            report_interval_ms: REPORT_INTERVAL_MS,
        }
    }
}

/// Top-level configuration file: camera setup plus session parameters.
///
/// Unknown keys are rejected at every level so that a misspelled section
/// fails to load instead of silently keeping its defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineParams {
    pub frame: FrameConfig,
    pub learning: LearningParams,
    pub detection: DetectionParams,
    pub report_interval_ms: u64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        let session = SessionParams::default();
        Self {
            frame: FrameConfig::default(),
            learning: session.learning,
            detection: session.detection,
            report_interval_ms: session.report_interval_ms,
        }
    }
}

impl PipelineParams {
    pub fn session(&self) -> SessionParams {
        SessionParams {
            learning: self.learning,
            detection: self.detection,
            report_interval_ms: self.report_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_is_strict() {
        assert!(!MatchGate::Above(0.7).passes(0.7));
        assert!(MatchGate::Above(0.7).passes(0.71));
        assert!(MatchGate::Unconditional.passes(0.0));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let params: PipelineParams =
            serde_json::from_str(r#"{ "detection": { "profile": "wide" } }"#).unwrap();
        assert_eq!(params.detection.profile.profile(), DetectionProfile::WIDE);
        assert_eq!(params.learning.window, CONFIRMATION_WINDOW);
        assert_eq!(params.report_interval_ms, REPORT_INTERVAL_MS);
        assert_eq!(params.frame, FrameConfig::default());
        assert_eq!(params.session().detection, params.detection);
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        for raw in [
            r#"{ "learnig": { "window": 5 } }"#,
            r#"{ "learning": { "windw": 5 } }"#,
            r#"{ "detection": { "blob": { "merge": false, "pixel_threshold": 10 } } }"#,
            r#"{ "frame": { "size": "vga" } }"#,
        ] {
            assert!(serde_json::from_str::<PipelineParams>(raw).is_err(), "{raw}");
        }
    }
}
