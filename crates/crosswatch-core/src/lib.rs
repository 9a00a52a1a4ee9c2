//! Core types and utilities for the crosswatch pipeline.
//!
//! This crate is intentionally small. It holds the pixel buffers, rectangle
//! geometry, color-space and morphology helpers shared by the detectors, plus
//! the oracle traits through which the recognition core talks to its
//! classifier and marker detector. It does *not* depend on any concrete
//! camera, model runtime or blob detector.

mod color;
mod image;
mod logger;
mod morphology;
mod oracle;
mod rect;

pub use color::{rgb_to_lab, Lab, LabThreshold};
pub use image::{
    sample_bilinear, GrayImage, GrayImageView, ImageError, RgbImage, RgbImageView,
};
pub use morphology::{binarize, dilate};
pub use oracle::{
    BlobParams, ClassificationResult, ClassifierOracle, MarkerOracle, OracleError, Region,
    DIGIT_CLASSES,
};
pub use rect::Rect;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
