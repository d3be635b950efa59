/// Axis-aligned bounding box in frame pixel coordinates.
///
/// Detectors may report boxes that extend past the frame edges; use
/// [`Region::clamp_to`] before indexing pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    /// Builds a region from `(x1, y1, x2, y2)` float corners, rounding outward.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let left = x1.min(x2).floor() as i32;
        let top = y1.min(y2).floor() as i32;
        let right = x1.max(x2).ceil() as i32;
        let bottom = y1.max(y2).ceil() as i32;
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Smallest box containing every region, or `None` for an empty slice.
    pub fn union(regions: &[Region]) -> Option<Region> {
        let first = regions.first()?;
        let (mut left, mut top, mut right, mut bottom) =
            (first.x, first.y, first.right(), first.bottom());
        for r in &regions[1..] {
            left = left.min(r.x);
            top = top.min(r.y);
            right = right.max(r.right());
            bottom = bottom.max(r.bottom());
        }
        Some(Region {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }

    /// Intersection with the `frame_w` x `frame_h` frame, or `None` if nothing
    /// of the region is visible.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<Region> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.right().min(frame_w as i32);
        let bottom = self.bottom().min(frame_h as i32);
        let clamped = Region {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        };
        if clamped.is_empty() {
            None
        } else {
            Some(clamped)
        }
    }
}
