use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a single frame as an image, used for exemplar frames in reports.
pub trait ImageWriter: Send {
    /// Writes `frame` to `path`. When `max_side` is given, the image is
    /// downscaled so its longer side does not exceed it (aspect preserved).
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        max_side: Option<u32>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
