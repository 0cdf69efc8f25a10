//! Procedurally generated stereo panoramas

use image::{Rgb, RgbImage};

use super::frame::SourceFrame;
use super::source::FrameSource;

/// Emits `frames` stereo panoramas of a fixed size, then ends the stream.
///
/// Each frame is a hue sweep over yaw with a latitude band pattern that
/// scrolls with the sequence number, so consecutive frames differ.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    frames: u64,
    sequence: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, frames: u64) -> Self {
        Self {
            width,
            height,
            frames,
            sequence: 0,
        }
    }

    pub fn render(width: u32, height: u32, sequence: u64) -> RgbImage {
        let half = (height / 2).max(1);
        let shift = (sequence % u64::from(width.max(1))) as u32;
        RgbImage::from_fn(width, height, |x, y| {
            let yaw = (x + shift) % width;
            let row = y % half;
            let r = (yaw * 255 / width.max(1)) as u8;
            let g = (row * 255 / half) as u8;
            // Left eye slightly warmer so the halves are distinguishable
            let b = if y < half { 96 } else { 160 };
            // Never fully black, decoded black marks dropped regions
            Rgb([r.max(1), g.max(1), b])
        })
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<SourceFrame> {
        if self.sequence >= self.frames {
            return None;
        }
        let image = Self::render(self.width, self.height, self.sequence);
        let frame = SourceFrame::new(image, self.sequence);
        self.sequence += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_requested_frames() {
        let mut source = SyntheticSource::new(36, 18, 3);
        let mut count = 0;
        while let Some(frame) = source.next_frame() {
            assert_eq!(frame.image.dimensions(), (36, 18));
            assert_eq!(frame.sequence, count);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_no_black_pixels() {
        let image = SyntheticSource::render(36, 18, 7);
        assert!(image.pixels().all(|p| p.0.iter().all(|&c| c > 0)));
    }
}
