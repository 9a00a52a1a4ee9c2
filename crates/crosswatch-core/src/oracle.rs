//! Capability traits for the two external oracles the recognition core
//! depends on: a digit classifier and a color-blob (marker) detector.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::color::LabThreshold;
use crate::image::{GrayImageView, RgbImageView};
use crate::rect::Rect;

/// Number of digit classes the classifier scores (0..=9).
pub const DIGIT_CLASSES: usize = 10;

/// An oracle failed to produce an answer. Treated as fatal by the frame loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("marker detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("classifier returned {got} class scores (expected {expected})")]
    MalformedOutput { expected: usize, got: usize },
}

/// Arg-max view of a classifier probability vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: u8,
    pub confidence: f32,
}

impl ClassificationResult {
    /// Pick the most probable class. Equal maxima resolve to the lowest
    /// label; NaN scores never win.
    pub fn from_probabilities(probs: &[f32]) -> Option<Self> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in probs.iter().enumerate() {
            if p.is_nan() {
                continue;
            }
            if best.map(|(_, b)| p > b).unwrap_or(true) {
                best = Some((i, p));
            }
        }
        let (label, confidence) = best?;
        Some(Self {
            label: u8::try_from(label).ok()?,
            confidence,
        })
    }
}

pub trait ClassifierOracle {
    /// Score a preprocessed patch; returns one probability per digit class.
    fn classify(&self, patch: &GrayImageView<'_>) -> Result<Vec<f32>, OracleError>;

    /// Classify and reduce to `{label, confidence}`.
    fn classify_patch(&self, patch: &GrayImageView<'_>) -> Result<ClassificationResult, OracleError> {
        let probs = self.classify(patch)?;
        if probs.len() != DIGIT_CLASSES {
            return Err(OracleError::MalformedOutput {
                expected: DIGIT_CLASSES,
                got: probs.len(),
            });
        }
        ClassificationResult::from_probabilities(&probs).ok_or(OracleError::MalformedOutput {
            expected: DIGIT_CLASSES,
            got: 0,
        })
    }
}

/// A connected color region reported by a [`MarkerOracle`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Mean position of the member pixels.
    pub centroid: Point2<f32>,
    /// Bounding-box area in pixels.
    pub area: u32,
    /// Number of member pixels.
    pub pixels: u32,
    pub bbox: Rect,
}

/// Blob search settings passed to the marker detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlobParams {
    pub threshold: LabThreshold,
    /// Regions with fewer member pixels are dropped.
    pub pixels_threshold: u32,
    /// Regions with a smaller bounding-box area are dropped.
    pub area_threshold: u32,
    /// Fuse regions whose bounding boxes overlap.
    pub merge: bool,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            threshold: LabThreshold::RED,
            pixels_threshold: 200,
            area_threshold: 200,
            merge: true,
        }
    }
}

pub trait MarkerOracle {
    fn find_regions(
        &self,
        frame: &RgbImageView<'_>,
        params: &BlobParams,
    ) -> Result<Vec<Region>, OracleError>;
}
