use std::ops::{Deref, DerefMut};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// A sequential source of decoded frames: a video file or a live capture
/// device.
///
/// The source is opened by its constructor or an adapter-specific `open`;
/// the pipeline only reads frames and releases the handle.
pub trait VideoSource: Send {
    /// Metadata of the opened source.
    fn metadata(&self) -> &VideoMetadata;

    /// Frame count reported by the container; 0 for live sources.
    fn frame_count(&self) -> usize {
        self.metadata().total_frames
    }

    /// Reads the next frame in decode order. `Ok(None)` signals end-of-stream.
    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the underlying capture handle. Must be idempotent.
    fn release(&mut self);
}

/// Scoped ownership of a [`VideoSource`]: the source is released when the
/// guard drops, on every exit path including unwinding.
pub struct SourceGuard {
    source: Box<dyn VideoSource>,
}

impl SourceGuard {
    pub fn new(source: Box<dyn VideoSource>) -> Self {
        Self { source }
    }
}

impl Deref for SourceGuard {
    type Target = dyn VideoSource;

    fn deref(&self) -> &Self::Target {
        self.source.as_ref()
    }
}

impl DerefMut for SourceGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.source.as_mut()
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.source.release();
    }
}
