//! Frame loop tying a source, both oracles and a sink to one session.

use std::time::{Duration, Instant};

use crosswatch_core::{ClassifierOracle, MarkerOracle, OracleError};
use log::{debug, info};
use serde::Serialize;

use crate::frame::{FrameClock, FrameError, FrameSource};
use crate::params::PipelineParams;
use crate::report::MatchReport;
use crate::roi::learning_region;
use crate::session::{CycleReport, Mode, RecognitionSession};
use crate::sink::{present, PresentationSink, LEARNING_PROMPT};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("{width}x{height} frames cannot hold the learning region")]
    FrameTooSmall { width: usize, height: usize },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

/// Totals for a finished run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub mode: Mode,
    pub target: Option<u8>,
    pub reports: Vec<MatchReport>,
    /// Mean processing rate over the run.
    pub fps: f32,
}

fn validate(params: &PipelineParams) -> Result<(), PipelineError> {
    if params.learning.window == 0 {
        return Err(PipelineError::InvalidParams(
            "learning window must hold at least one observation".into(),
        ));
    }
    let (width, height) = params.frame.frame_size.dimensions();
    if !learning_region(width, height).fits_within(width, height) {
        return Err(PipelineError::FrameTooSmall { width, height });
    }
    Ok(())
}

pub struct Pipeline<S, C, M, P> {
    source: S,
    classifier: C,
    detector: M,
    sink: P,
    session: RecognitionSession,
    clock: FrameClock,
}

impl<S, C, M, P> Pipeline<S, C, M, P>
where
    S: FrameSource,
    C: ClassifierOracle,
    M: MarkerOracle,
    P: PresentationSink,
{
    /// Validate the parameters, reset and configure the source, then prompt
    /// the operator.
    pub fn new(
        mut source: S,
        classifier: C,
        detector: M,
        mut sink: P,
        params: PipelineParams,
    ) -> Result<Self, PipelineError> {
        validate(&params)?;
        source.reset()?;
        source.configure(params.frame.pixel_format, params.frame.frame_size)?;
        sink.status(LEARNING_PROMPT);
        Ok(Self {
            source,
            classifier,
            detector,
            sink,
            session: RecognitionSession::new(params.session()),
            clock: FrameClock::default(),
        })
    }

    pub fn session(&self) -> &RecognitionSession {
        &self.session
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn into_sink(self) -> P {
        self.sink
    }

    /// Acquire and process one frame. Returns `None` when the source is
    /// exhausted.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn run_cycle(&mut self, now: Duration) -> Result<Option<CycleReport>, PipelineError> {
        let Some(frame) = self.source.next_frame()? else {
            return Ok(None);
        };
        let cycle = self
            .session
            .step(&frame.view(), &self.classifier, &self.detector, now)?;
        present(&cycle, &mut self.sink);
        let fps = self.clock.tick();
        debug!("frame {} processed ({fps:.1} fps)", self.clock.frames());
        Ok(Some(cycle))
    }

    /// Run until the source ends or `max_frames` frames have been processed.
    pub fn run(&mut self, max_frames: Option<usize>) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        let mut reports = Vec::new();
        let mut processed = 0usize;
        while max_frames.is_none_or(|max| processed < max) {
            let Some(cycle) = self.run_cycle(started.elapsed())? else {
                break;
            };
            if let CycleReport::Detecting { reports: r, .. } = cycle {
                reports.extend(r);
            }
            processed += 1;
        }

        let summary = RunSummary {
            frames: self.clock.frames(),
            mode: self.session.mode(),
            target: self.session.target(),
            reports,
            fps: self.clock.fps(),
        };
        info!(
            "processed {} frames, {} reports, {:.1} fps",
            summary.frames,
            summary.reports.len(),
            summary.fps
        );
        Ok(summary)
    }
}
