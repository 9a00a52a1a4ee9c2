//! Color blob detector used to locate the red cross marker.
//!
//! Pixels are classified against a CIE L*a*b* box threshold, grouped into
//! 8-connected components, filtered by member-pixel count and bounding-box
//! area, and optionally merged when their bounding boxes overlap. The
//! [`BlobDetector`] wraps this as a [`crosswatch_core::MarkerOracle`].

pub mod detect;
mod detector;

pub use detect::find_blobs;
pub use detector::BlobDetector;
