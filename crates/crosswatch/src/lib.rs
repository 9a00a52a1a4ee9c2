//! Learn a handwritten digit from a camera feed, then watch for it next to a
//! red cross marker.
//!
//! A [`RecognitionSession`] starts in learning mode: the center of every
//! frame is classified until the same digit has been seen with high
//! confidence on enough consecutive frames. From then on the session looks
//! for the largest red blob, classifies the patches to its left and right,
//! and reports rate-limited matches of the learned digit.
//!
//! The classifier and marker detector are injected through the
//! [`ClassifierOracle`](crosswatch_core::ClassifierOracle) and
//! [`MarkerOracle`](crosswatch_core::MarkerOracle) traits. This crate ships
//! a template-matching classifier and the connected-component detector from
//! `crosswatch-marker`.
//!
//! ## Quickstart
//!
//! ```no_run
//! use crosswatch::{
//!     BlobDetector, ImageSequenceSource, LogSink, Pipeline, PipelineParams, TemplateClassifier,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = TemplateClassifier::load(Path::new("digits.json"))?;
//! let source = ImageSequenceSource::new("frames")?;
//! let mut pipeline = Pipeline::new(
//!     source,
//!     classifier,
//!     BlobDetector::new(),
//!     LogSink,
//!     PipelineParams::default(),
//! )?;
//! let summary = pipeline.run(None)?;
//! println!("target: {:?}, reports: {}", summary.target, summary.reports.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `crosswatch::core`: images, color thresholds, morphology, oracle traits.
//! - `crosswatch::marker`: red blob detection.
//! - [`session`]: the learning/detection state machine.
//! - [`pipeline`]: frame loop over a [`FrameSource`] and a [`PresentationSink`].

pub use crosswatch_core as core;
pub use crosswatch_marker as marker;

pub mod classifier;
pub mod detection;
pub mod frame;
pub mod learning;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod roi;
pub mod session;
pub mod sink;
#[cfg(feature = "image")]
mod source;

pub use classifier::{ModelError, TemplateClassifier, TemplateModel};
pub use crosswatch_marker::BlobDetector;
pub use detection::{DetectionEngine, DetectionOutcome, Marker, RegionVerdict};
pub use frame::{FrameConfig, FrameError, FrameQueue, FrameSize, FrameSource, PixelFormat};
pub use learning::{LearningEngine, LearningOutcome};
pub use params::{
    DetectionParams, DetectionProfile, LearningParams, PipelineParams, ProfilePreset,
    SessionParams,
};
pub use pipeline::{Pipeline, PipelineError, RunSummary};
pub use report::{MatchReport, ReportLimiter};
pub use roi::{DetectionRegions, RegionName};
pub use session::{CycleReport, Mode, RecognitionSession};
pub use sink::{Color, LogSink, PresentationSink, RecordingSink, SinkEvent};
#[cfg(feature = "image")]
pub use source::ImageSequenceSource;
