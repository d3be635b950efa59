use crate::detection::domain::analysis_fault::AnalysisFault;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Brow and eye boxes found in one frame, from independent detectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacialFeatures {
    pub brows: Vec<Region>,
    pub eyes: Vec<Region>,
}

impl FacialFeatures {
    /// No eye region means the subject looked away.
    pub fn has_eyes(&self) -> bool {
        !self.eyes.is_empty()
    }

    /// Union of every brow and eye box; `None` when the subject looked away.
    pub fn region_of_interest(&self) -> Option<Region> {
        if !self.has_eyes() {
            return None;
        }
        let all: Vec<Region> = self.brows.iter().chain(&self.eyes).copied().collect();
        Region::union(&all)
    }
}

/// Domain interface for locating brows and eyes in a frame.
///
/// Implementations may hold inference sessions, hence `&mut self`.
pub trait FacialFeatureDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<FacialFeatures, AnalysisFault>;
}
