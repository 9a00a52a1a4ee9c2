//! Template-matching digit classifier.
//!
//! The model artifact is a JSON document holding one normalized template per
//! digit. A patch is resampled to the template size, scaled to `[0, 1]`, and
//! scored against every template by mean squared distance; the softmax of the
//! negated distances (divided by the model temperature) is the probability
//! vector handed back to the recognition core.

use std::fs;
use std::path::Path;

use crosswatch_core::{
    sample_bilinear, ClassifierOracle, GrayImageView, OracleError, DIGIT_CLASSES,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors raised while loading a model artifact.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    Invalid(String),
}

/// On-disk model layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateModel {
    /// Side length of every square template.
    pub input_size: usize,
    /// One row-major template per digit, values in `[0, 1]`.
    pub templates: Vec<Vec<f32>>,
    /// Softmax temperature; smaller values give sharper distributions.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.05
}

#[derive(Clone, Debug)]
pub struct TemplateClassifier {
    model: TemplateModel,
}

impl TemplateClassifier {
    pub fn from_model(model: TemplateModel) -> Result<Self, ModelError> {
        if model.input_size == 0 {
            return Err(ModelError::Invalid("input_size must be positive".into()));
        }
        if model.templates.len() != DIGIT_CLASSES {
            return Err(ModelError::Invalid(format!(
                "expected {DIGIT_CLASSES} templates, found {}",
                model.templates.len()
            )));
        }
        let n = model.input_size * model.input_size;
        let bad = model
            .templates
            .iter()
            .enumerate()
            .find(|(_, t)| t.len() != n);
        if let Some((digit, t)) = bad {
            return Err(ModelError::Invalid(format!(
                "template {digit} has {} values, expected {n}",
                t.len()
            )));
        }
        if !(model.temperature.is_finite() && model.temperature > 0.0) {
            return Err(ModelError::Invalid(format!(
                "temperature must be positive, got {}",
                model.temperature
            )));
        }
        Ok(Self { model })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        Self::from_model(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn model(&self) -> &TemplateModel {
        &self.model
    }

    /// Resample `patch` to the template grid with values in `[0, 1]`.
    fn normalize(&self, patch: &GrayImageView<'_>) -> Vec<f32> {
        let n = self.model.input_size;
        let sx = patch.width as f32 / n as f32;
        let sy = patch.height as f32 / n as f32;
        let mut out = Vec::with_capacity(n * n);
        for v in 0..n {
            for u in 0..n {
                let x = (u as f32 + 0.5) * sx - 0.5;
                let y = (v as f32 + 0.5) * sy - 0.5;
                let x = x.clamp(0.0, (patch.width - 1) as f32);
                let y = y.clamp(0.0, (patch.height - 1) as f32);
                out.push(sample_bilinear(patch, x, y) / 255.0);
            }
        }
        out
    }
}

impl ClassifierOracle for TemplateClassifier {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, patch), fields(width = patch.width, height = patch.height))
    )]
    fn classify(&self, patch: &GrayImageView<'_>) -> Result<Vec<f32>, OracleError> {
        if patch.width == 0 || patch.height == 0 {
            return Err(OracleError::ClassifierUnavailable("empty input patch".into()));
        }
        let input = self.normalize(patch);
        let n = input.len() as f32;

        let logits: Vec<f32> = self
            .model
            .templates
            .iter()
            .map(|t| {
                let mse = t
                    .iter()
                    .zip(&input)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>()
                    / n;
                -mse / self.model.temperature
            })
            .collect();

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exp.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(OracleError::ClassifierUnavailable("non-finite class scores".into()));
        }
        Ok(exp.into_iter().map(|e| e / total).collect())
    }
}
