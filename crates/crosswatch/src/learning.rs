//! Learning confirmation.
//!
//! A noisy per-frame classifier is stabilized into a single confirmed label:
//! qualifying observations accumulate in a bounded FIFO, any non-qualifying
//! observation discards all progress, and a label is confirmed once the
//! window is full and every entry agrees.

use std::collections::VecDeque;

use crosswatch_core::{
    binarize, dilate, ClassificationResult, ClassifierOracle, GrayImage, GrayImageView,
    OracleError,
};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::LearningParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningOutcome {
    /// The observation qualified; `filled` labels are now buffered.
    Accumulating { filled: usize },
    /// The observation did not qualify and the buffer was cleared.
    Reset,
    /// The window is full of one label.
    Confirmed(u8),
}

/// Bounded FIFO of recent qualifying labels.
#[derive(Clone, Debug)]
pub struct LearningBuffer {
    labels: VecDeque<u8>,
    capacity: usize,
}

impl LearningBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            labels: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a label, evicting the oldest once over capacity.
    pub fn push(&mut self, label: u8) {
        self.labels.push_back(label);
        while self.labels.len() > self.capacity {
            self.labels.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.labels.len() == self.capacity
    }

    /// The shared label when the buffer is full and all entries agree.
    pub fn agreed_label(&self) -> Option<u8> {
        if !self.is_full() {
            return None;
        }
        let first = *self.labels.front()?;
        self.labels.iter().all(|&l| l == first).then_some(first)
    }
}

pub struct LearningEngine {
    params: LearningParams,
    buffer: LearningBuffer,
}

impl LearningEngine {
    pub fn new(params: LearningParams) -> Self {
        Self {
            buffer: LearningBuffer::new(params.window),
            params,
        }
    }

    pub fn buffer(&self) -> &LearningBuffer {
        &self.buffer
    }

    /// Binarize the ink band, then dilate strokes.
    pub fn preprocess(&self, patch: &GrayImageView<'_>) -> GrayImage {
        let (lo, hi) = self.params.ink;
        let bin = binarize(patch, lo, hi);
        dilate(&bin.view(), self.params.dilate_radius)
    }

    /// Preprocess and classify one learning patch, then update the window.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, patch, classifier), fields(width = patch.width, height = patch.height))
    )]
    pub fn observe<C: ClassifierOracle + ?Sized>(
        &mut self,
        patch: &GrayImageView<'_>,
        classifier: &C,
    ) -> Result<LearningOutcome, OracleError> {
        let processed = self.preprocess(patch);
        let result = classifier.classify_patch(&processed.view())?;
        Ok(self.record(result))
    }

    /// Window bookkeeping for one classification.
    pub fn record(&mut self, result: ClassificationResult) -> LearningOutcome {
        if result.confidence <= self.params.threshold {
            if !self.buffer.is_empty() {
                debug!(
                    "learning reset after {} observation(s): confidence {:.2}",
                    self.buffer.len(),
                    result.confidence
                );
            }
            self.buffer.clear();
            return LearningOutcome::Reset;
        }

        self.buffer.push(result.label);
        match self.buffer.agreed_label() {
            Some(label) => LearningOutcome::Confirmed(label),
            None => LearningOutcome::Accumulating {
                filled: self.buffer.len(),
            },
        }
    }
}
