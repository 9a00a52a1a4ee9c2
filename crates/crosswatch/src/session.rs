//! Recognition state machine.
//!
//! A session starts in [`Mode::Learning`] and moves to [`Mode::Detecting`]
//! exactly once, when the learning engine confirms a digit. That digit is
//! the target for the rest of the session. Every call to
//! [`RecognitionSession::step`] runs exactly one engine.

use std::time::Duration;

use crosswatch_core::{ClassifierOracle, MarkerOracle, OracleError, Rect, RgbImageView};
use log::info;
use serde::{Deserialize, Serialize};

use crate::detection::{DetectionEngine, DetectionOutcome};
use crate::learning::{LearningEngine, LearningOutcome};
use crate::params::SessionParams;
use crate::report::{MatchReport, ReportLimiter};
use crate::roi::learning_region;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Learning,
    Detecting,
}

/// What one cycle did, for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CycleReport {
    Learning {
        roi: Rect,
        outcome: LearningOutcome,
    },
    /// The frame is too small to hold the learning region.
    LearningRegionInvalid { roi: Rect },
    Detecting {
        target: u8,
        outcome: DetectionOutcome,
        /// Matches cleared by the rate limiter this cycle.
        reports: Vec<MatchReport>,
    },
}

enum State {
    Learning(LearningEngine),
    Detecting { target: u8 },
}

pub struct RecognitionSession {
    state: State,
    detection: DetectionEngine,
    limiter: ReportLimiter,
}

impl RecognitionSession {
    pub fn new(params: SessionParams) -> Self {
        Self {
            state: State::Learning(LearningEngine::new(params.learning)),
            detection: DetectionEngine::new(params.detection),
            limiter: ReportLimiter::new(Duration::from_millis(params.report_interval_ms)),
        }
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            State::Learning(_) => Mode::Learning,
            State::Detecting { .. } => Mode::Detecting,
        }
    }

    /// The confirmed digit, once learning has finished.
    pub fn target(&self) -> Option<u8> {
        match self.state {
            State::Learning(_) => None,
            State::Detecting { target } => Some(target),
        }
    }

    /// Number of buffered agreeing observations while learning.
    pub fn learning_progress(&self) -> Option<usize> {
        match &self.state {
            State::Learning(engine) => Some(engine.buffer().len()),
            State::Detecting { .. } => None,
        }
    }

    /// Process one frame. `now` is the session clock used for report rate
    /// limiting. Only oracle failures are errors.
    pub fn step<C, M>(
        &mut self,
        frame: &RgbImageView<'_>,
        classifier: &C,
        detector: &M,
        now: Duration,
    ) -> Result<CycleReport, OracleError>
    where
        C: ClassifierOracle + ?Sized,
        M: MarkerOracle + ?Sized,
    {
        match &mut self.state {
            State::Learning(engine) => {
                let roi = learning_region(frame.width, frame.height);
                let Ok(patch) = frame.crop_lightness(roi) else {
                    return Ok(CycleReport::LearningRegionInvalid { roi });
                };
                let outcome = engine.observe(&patch.view(), classifier)?;
                if let LearningOutcome::Confirmed(target) = outcome {
                    info!("learned digit {target}; switching to detection");
                    self.state = State::Detecting { target };
                }
                Ok(CycleReport::Learning { roi, outcome })
            }
            State::Detecting { target } => {
                let target = *target;
                let outcome = self.detection.detect(frame, target, classifier, detector)?;
                let reports = outcome
                    .verdicts()
                    .iter()
                    .filter(|v| v.matched && self.limiter.authorize(v.region, now))
                    .map(|v| MatchReport {
                        region: v.region,
                        label: v.label,
                        confidence: v.confidence,
                        at_ms: now.as_millis() as u64,
                    })
                    .collect();
                Ok(CycleReport::Detecting {
                    target,
                    outcome,
                    reports,
                })
            }
        }
    }
}
