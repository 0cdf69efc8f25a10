use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a frame or patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Gaze-contingent encoding of one stereo panoramic frame.
///
/// Holds two full-resolution focus patches (one per eye), the whole
/// field-of-view crop downsampled, and the geometry needed to put the
/// pieces back onto a full-size canvas. Built by
/// [`encode`](super::encode) and consumed by [`decode`](super::decode).
#[derive(Clone, PartialEq, Eq)]
pub struct CompactFrame {
    pub(crate) focus_top: RgbImage,
    pub(crate) focus_bottom: RgbImage,
    pub(crate) blurred: RgbImage,
    /// Offset of the focus window inside the cropped window's top half
    pub(crate) focus_row: u32,
    pub(crate) focus_col: u32,
    pub(crate) cropped_size: Size,
    pub(crate) full_size: Size,
    /// Source column of the cropped window's left edge
    pub(crate) left_buffer: u32,
}

impl CompactFrame {
    pub fn focus_top(&self) -> &RgbImage {
        &self.focus_top
    }

    pub fn focus_bottom(&self) -> &RgbImage {
        &self.focus_bottom
    }

    pub fn blurred(&self) -> &RgbImage {
        &self.blurred
    }

    pub fn focus_row(&self) -> u32 {
        self.focus_row
    }

    pub fn focus_col(&self) -> u32 {
        self.focus_col
    }

    pub fn cropped_size(&self) -> Size {
        self.cropped_size
    }

    pub fn full_size(&self) -> Size {
        self.full_size
    }

    pub fn left_buffer(&self) -> u32 {
        self.left_buffer
    }

    /// True when the crop window straddles column 0.
    pub fn wraps(&self) -> bool {
        self.cropped_size.width + self.left_buffer > self.full_size.width
    }

    /// Bytes of pixel data carried by this frame
    pub fn byte_len(&self) -> usize {
        self.focus_top.as_raw().len() + self.focus_bottom.as_raw().len() + self.blurred.as_raw().len()
    }

    /// Encoded size as a fraction of `full_bytes`
    pub fn ratio(&self, full_bytes: usize) -> f64 {
        if full_bytes == 0 {
            return 0.0;
        }
        self.byte_len() as f64 / full_bytes as f64
    }
}

impl fmt::Debug for CompactFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactFrame")
            .field("focus", &Size::of(&self.focus_top))
            .field("blurred", &Size::of(&self.blurred))
            .field("focus_row", &self.focus_row)
            .field("focus_col", &self.focus_col)
            .field("cropped_size", &self.cropped_size)
            .field("full_size", &self.full_size)
            .field("left_buffer", &self.left_buffer)
            .field("bytes", &self.byte_len())
            .finish()
    }
}
