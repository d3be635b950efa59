use ndarray::{s, ArrayView3};

use crate::shared::region::Region;

/// A single decoded frame: contiguous RGB bytes in row-major order.
///
/// `index` is the frame's position in the source timeline (0-based). Pixel
/// data is opaque to the analysis layer; format conversion happens at the
/// I/O and model boundaries.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the part of the frame covered by `region`, clamped to bounds.
    ///
    /// Returns `None` when the clamped region is empty. The crop keeps the
    /// source frame's index.
    pub fn crop(&self, region: &Region) -> Option<Frame> {
        let clamped = region.clamp_to(self.width, self.height)?;
        let x = clamped.x as usize;
        let y = clamped.y as usize;
        let w = clamped.width as usize;
        let h = clamped.height as usize;

        let view = self.as_ndarray();
        let window = view.slice(s![y..y + h, x..x + w, ..]);
        let data: Vec<u8> = window.iter().copied().collect();

        Some(Frame::new(
            data,
            w as u32,
            h as u32,
            self.channels,
            self.index,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
