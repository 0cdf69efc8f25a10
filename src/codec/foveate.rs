//! Foveated encode/decode of stereo equirectangular frames.
//!
//! The crop window is centered on the gaze yaw and may straddle the 0°/360°
//! seam, in which case it is assembled from the two column ranges on either
//! side of column 0. Inside the crop, a focus window is kept at full
//! resolution for each eye while the whole crop is downsampled.

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::angle::{angle_to_col, angle_to_row, angle_to_width, constrain_angle};
use super::compact::{CompactFrame, Size};
use crate::error::{Error, Result};

/// Resampling kernel used when downsampling and reconstructing the crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Angular geometry and downsampling parameters of the codec
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Horizontal field of view kept at all, in degrees
    pub crop_angle: f64,
    /// Horizontal extent of the full-resolution focus window, in degrees
    pub focus_h_angle: f64,
    /// Vertical extent of the focus window, in degrees of one eye's 180°
    pub focus_v_angle: f64,
    /// Downsampling factor applied to both axes of the crop
    pub blur_factor: u32,
    pub filter: ResizeFilter,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            crop_angle: 180.0,
            focus_h_angle: 30.0,
            focus_v_angle: 30.0,
            blur_factor: 3,
            filter: ResizeFilter::Triangle,
        }
    }
}

impl CodecSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.crop_angle > 0.0 && self.crop_angle <= 360.0) {
            return Err(Error::InvalidSettings(format!(
                "crop_angle must be in (0, 360], got {}",
                self.crop_angle
            )));
        }
        if !(self.focus_h_angle > 0.0 && self.focus_h_angle < self.crop_angle) {
            return Err(Error::InvalidSettings(format!(
                "focus_h_angle must be positive and smaller than crop_angle ({}), got {}",
                self.crop_angle, self.focus_h_angle
            )));
        }
        if !(self.focus_v_angle > 0.0 && self.focus_v_angle <= 180.0) {
            return Err(Error::InvalidSettings(format!(
                "focus_v_angle must be in (0, 180], got {}",
                self.focus_v_angle
            )));
        }
        if self.blur_factor == 0 {
            return Err(Error::InvalidSettings("blur_factor must be at least 1".into()));
        }
        Ok(())
    }

    /// Clamp a vertical gaze angle so the focus window fits in one eye's half.
    pub fn clamp_v_angle(&self, v_angle: f64) -> f64 {
        let half_focus = self.focus_v_angle / 2.0;
        v_angle.clamp(half_focus, 180.0 - half_focus)
    }
}

/// Encode `frame` for a viewer looking at (`h_angle`, `v_angle`) degrees.
///
/// Panics if the settings violate the crop/focus geometry or the frame is not
/// a stereo panorama (non-zero width, even non-zero height).
pub fn encode(frame: &RgbImage, h_angle: f64, v_angle: f64, settings: &CodecSettings) -> CompactFrame {
    let (width, height) = frame.dimensions();
    assert!(
        settings.focus_h_angle < settings.crop_angle,
        "focus window ({}°) must be narrower than the crop window ({}°)",
        settings.focus_h_angle,
        settings.crop_angle
    );
    assert!(settings.blur_factor > 0, "blur factor must be non-zero");
    assert!(
        width > 0 && height > 0 && height % 2 == 0,
        "stereo frame must have non-zero width and even height, got {width}x{height}"
    );

    let h_angle = constrain_angle(h_angle);
    let half_crop = settings.crop_angle / 2.0;
    let left_col = angle_to_col(constrain_angle(h_angle - half_crop), width);
    let right_col = angle_to_col(constrain_angle(h_angle + half_crop), width);

    let cropped = crop_wrapping(frame, left_col, right_col);
    let cropped_width = cropped.width();

    // Focus window, centered horizontally in the crop
    let focus_width = angle_to_width(settings.focus_h_angle, width).max(1);
    assert!(
        focus_width < cropped_width,
        "focus window ({focus_width}px) must fit inside the crop ({cropped_width}px)"
    );
    let focus_col = (cropped_width - focus_width) / 2;

    // Rows are taken from the top eye and mirrored into the bottom eye
    let half = height / 2;
    let focus_height = angle_to_row(settings.focus_v_angle, half).max(1);
    let center_row = angle_to_row(v_angle.clamp(0.0, 180.0), half);
    let focus_row = center_row
        .saturating_sub(focus_height / 2)
        .min(half - focus_height);
    assert!(focus_row + focus_height <= half);
    assert!(focus_col + focus_width <= cropped_width);

    let focus_top = imageops::crop_imm(&cropped, focus_col, focus_row, focus_width, focus_height).to_image();
    let focus_bottom =
        imageops::crop_imm(&cropped, focus_col, focus_row + half, focus_width, focus_height).to_image();

    let blur = settings.blur_factor;
    let blurred = imageops::resize(
        &cropped,
        (cropped_width / blur).max(1),
        (height / blur).max(1),
        settings.filter.into(),
    );

    trace!(
        h_angle,
        left_col,
        right_col,
        focus_row,
        focus_col,
        "encoded frame"
    );

    CompactFrame {
        focus_top,
        focus_bottom,
        blurred,
        focus_row,
        focus_col,
        cropped_size: Size::of(&cropped),
        full_size: Size::new(width, height),
        left_buffer: left_col,
    }
}

/// Reconstruct a full-size frame with the default resampling filter.
pub fn decode(compact: &CompactFrame) -> RgbImage {
    decode_with_filter(compact, ResizeFilter::default())
}

/// Reconstruct a full-size frame. Everything outside the crop window is black.
pub fn decode_with_filter(compact: &CompactFrame, filter: ResizeFilter) -> RgbImage {
    let Size {
        width: cropped_width,
        height: cropped_height,
    } = compact.cropped_size;
    let full = compact.full_size;
    assert_eq!(cropped_height, full.height, "crop must span the full frame height");
    assert!(cropped_width <= full.width && compact.left_buffer < full.width);

    let mut restored = imageops::resize(&compact.blurred, cropped_width, cropped_height, filter.into());

    let half = cropped_height / 2;
    imageops::replace(
        &mut restored,
        &compact.focus_top,
        i64::from(compact.focus_col),
        i64::from(compact.focus_row),
    );
    imageops::replace(
        &mut restored,
        &compact.focus_bottom,
        i64::from(compact.focus_col),
        i64::from(compact.focus_row + half),
    );

    let mut canvas = RgbImage::new(full.width, full.height);
    let left = compact.left_buffer;
    if cropped_width + left <= full.width {
        imageops::replace(&mut canvas, &restored, i64::from(left), 0);
    } else {
        // The crop wrapped: its head belongs at the right edge, its tail at column 0
        let head_width = full.width - left;
        let tail_width = cropped_width - head_width;
        let head = imageops::crop_imm(&restored, 0, 0, head_width, cropped_height).to_image();
        let tail = imageops::crop_imm(&restored, head_width, 0, tail_width, cropped_height).to_image();
        imageops::replace(&mut canvas, &head, i64::from(left), 0);
        imageops::replace(&mut canvas, &tail, 0, 0);
    }

    assert_eq!(
        Size::of(&canvas),
        full,
        "decoded frame must match the original dimensions"
    );
    canvas
}

/// Crop columns `[left_col, right_col)`, wrapping through column 0 when
/// `left_col >= right_col`.
fn crop_wrapping(frame: &RgbImage, left_col: u32, right_col: u32) -> RgbImage {
    let (width, height) = frame.dimensions();
    assert!(left_col < width && right_col < width);

    if left_col < right_col {
        return imageops::crop_imm(frame, left_col, 0, right_col - left_col, height).to_image();
    }

    let head_width = width - left_col;
    let mut cropped = RgbImage::new(head_width + right_col, height);
    let head = imageops::crop_imm(frame, left_col, 0, head_width, height).to_image();
    imageops::replace(&mut cropped, &head, 0, 0);
    if right_col > 0 {
        let tail = imageops::crop_imm(frame, 0, 0, right_col, height).to_image();
        imageops::replace(&mut cropped, &tail, i64::from(head_width), 0);
    }
    cropped
}
