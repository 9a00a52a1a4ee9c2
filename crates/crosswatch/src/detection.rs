//! Marker-anchored detection and match gating.

use crosswatch_core::{
    binarize, dilate, ClassifierOracle, GrayImage, GrayImageView, MarkerOracle, OracleError,
    Rect, Region, RgbImageView,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::{DetectionParams, DetectionProfile};
use crate::roi::{detection_regions, regions_in_bounds, DetectionRegions, RegionName};

/// The spatial anchor for one detection cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub centroid_x: i32,
    pub centroid_y: i32,
    pub area: u32,
}

impl Marker {
    pub fn from_region(region: &Region) -> Self {
        Self {
            centroid_x: region.centroid.x.round() as i32,
            centroid_y: region.centroid.y.round() as i32,
            area: region.area,
        }
    }
}

/// Largest-area region as the marker. Among equal areas the first region
/// in detector order wins.
pub fn select_marker(regions: &[Region]) -> Option<Marker> {
    let mut best: Option<&Region> = None;
    for r in regions {
        if best.map(|b| r.area > b.area).unwrap_or(true) {
            best = Some(r);
        }
    }
    best.map(Marker::from_region)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionVerdict {
    pub region: RegionName,
    pub rect: Rect,
    pub matched: bool,
    pub label: u8,
    pub confidence: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// No marker-colored region this frame.
    NoMarker,
    /// The marker sits too close to the frame edge for both regions.
    OutOfBounds {
        marker: Marker,
        regions: DetectionRegions,
    },
    /// Both regions were classified.
    Classified {
        marker: Marker,
        regions: DetectionRegions,
        verdicts: Vec<RegionVerdict>,
    },
}

impl DetectionOutcome {
    pub fn verdicts(&self) -> &[RegionVerdict] {
        match self {
            DetectionOutcome::Classified { verdicts, .. } => verdicts,
            _ => &[],
        }
    }

    pub fn marker(&self) -> Option<&Marker> {
        match self {
            DetectionOutcome::NoMarker => None,
            DetectionOutcome::OutOfBounds { marker, .. }
            | DetectionOutcome::Classified { marker, .. } => Some(marker),
        }
    }
}

pub struct DetectionEngine {
    params: DetectionParams,
    profile: DetectionProfile,
}

impl DetectionEngine {
    pub fn new(params: DetectionParams) -> Self {
        Self {
            profile: params.profile.profile(),
            params,
        }
    }

    pub fn profile(&self) -> &DetectionProfile {
        &self.profile
    }

    /// Binarize the ink band, dilating only when the profile asks for it.
    pub fn preprocess(&self, patch: &GrayImageView<'_>) -> GrayImage {
        let (lo, hi) = self.params.ink;
        let bin = binarize(patch, lo, hi);
        if self.profile.dilate_radius > 0 {
            dilate(&bin.view(), self.profile.dilate_radius)
        } else {
            bin
        }
    }

    /// Run one detection cycle against `target`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame, classifier, detector), fields(width = frame.width, height = frame.height))
    )]
    pub fn detect<C, M>(
        &self,
        frame: &RgbImageView<'_>,
        target: u8,
        classifier: &C,
        detector: &M,
    ) -> Result<DetectionOutcome, OracleError>
    where
        C: ClassifierOracle + ?Sized,
        M: MarkerOracle + ?Sized,
    {
        let found = detector.find_regions(frame, &self.params.blob)?;
        let Some(marker) = select_marker(&found) else {
            return Ok(DetectionOutcome::NoMarker);
        };

        let regions = detection_regions(&marker, &self.profile.roi);
        if !regions_in_bounds(&regions, frame.width, frame.height) {
            return Ok(DetectionOutcome::OutOfBounds { marker, regions });
        }

        let mut verdicts = Vec::with_capacity(RegionName::ALL.len());
        for (name, rect) in regions.iter() {
            let Ok(patch) = frame.crop_lightness(rect) else {
                return Ok(DetectionOutcome::OutOfBounds { marker, regions });
            };
            let processed = self.preprocess(&patch.view());
            let result = classifier.classify_patch(&processed.view())?;
            verdicts.push(RegionVerdict {
                region: name,
                rect,
                matched: result.label == target && self.profile.gate.passes(result.confidence),
                label: result.label,
                confidence: result.confidence,
            });
        }

        Ok(DetectionOutcome::Classified {
            marker,
            regions,
            verdicts,
        })
    }
}
