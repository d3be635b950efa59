use std::path::PathBuf;

/// Properties of an opened video source.
///
/// Live sources report `total_frames == 0` since their length is unknown.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}
