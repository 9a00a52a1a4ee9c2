use crosswatch_core::{BlobParams, MarkerOracle, OracleError, Region, RgbImageView};
use log::debug;

use crate::detect::find_blobs;

/// Connected-component marker detector over LAB color thresholds.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlobDetector;

impl BlobDetector {
    pub fn new() -> Self {
        Self
    }
}

impl MarkerOracle for BlobDetector {
    fn find_regions(
        &self,
        frame: &RgbImageView<'_>,
        params: &BlobParams,
    ) -> Result<Vec<Region>, OracleError> {
        let expected = frame.width * frame.height * 3;
        if frame.data.len() != expected {
            return Err(OracleError::DetectorUnavailable(format!(
                "frame buffer holds {} bytes, {}x{} RGB needs {}",
                frame.data.len(),
                frame.width,
                frame.height,
                expected
            )));
        }
        let regions = find_blobs(frame, params);
        debug!("blob search found {} region(s)", regions.len());
        Ok(regions)
    }
}
