use std::time::Instant;

use image::RgbImage;

/// Stereo equirectangular frame: width spans 360° of yaw, the top half of
/// the rows is one eye and the bottom half the other.
pub type PanoramicFrame = RgbImage;

/// Decoded frame as handed over by a decode source
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub image: PanoramicFrame,

    /// Position in the stream, starting at 0
    pub sequence: u64,

    /// When the decode source produced the pixels
    pub decoded_at: Instant,
}

impl SourceFrame {
    pub fn new(image: PanoramicFrame, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            decoded_at: Instant::now(),
        }
    }

    /// A read that produced no pixels
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}
