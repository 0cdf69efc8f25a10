//! Gaze-contingent streaming of stereo equirectangular video.
//!
//! Frames are foveated on a producer thread using the latest predicted
//! viewer orientation, queued with backpressure, and reconstructed on the
//! render side.

pub mod capture;
pub mod codec;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod utils;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use capture::{BufferedSource, FrameSource, PanoramicFrame, SourceFrame, SyntheticSource};
pub use codec::{decode, encode, CodecSettings, CompactFrame};
pub use error::{Error, Result};
pub use pipeline::{BoundedQueue, OptimizerPipeline, RollingAverage, TimestampedFrame, ViewerState};

/// Environment variables override file settings, e.g.
/// `FOVEAL__CODEC__BLUR_FACTOR=4`
pub const ENV_PREFIX: &str = "FOVEAL";

/// System configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codec: CodecSettings,
    pub pipeline: PipelineConfig,
    pub viewer: ViewerConfig,
    pub source: SourceConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Encoded frames the optimizer may queue ahead of the consumer
    pub queue_capacity: usize,
    /// Decoded frames read ahead of the optimizer
    pub source_queue_capacity: usize,
    /// Empty reads tolerated before the first frame
    pub max_leading_empty_frames: u32,
    /// Samples in the latency average used for prediction
    pub latency_window: usize,
    /// Samples in the frame-time average used for fps reporting
    pub frame_time_window: usize,
    /// Pin the optimizer thread to this CPU core
    pub producer_core: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Scales tracker pitch into panorama degrees
    pub pitch_multiplier: f64,
    pub start_yaw: f64,
    /// Simulated head rotation, degrees per second
    pub yaw_rate: f64,
    /// Simulated head pitch relative to the horizon
    pub pitch: f64,
}

/// Synthetic decode source used by the demo binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub width: u32,
    pub height: u32,
    pub frames: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Render loop rate; 0 runs unpaced
    pub target_fps: u32,
    /// Log statistics every this many frames
    pub report_every: u64,
    /// Save the first reconstructed frame as an image
    pub snapshot_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            source_queue_capacity: 10,
            max_leading_empty_frames: 10,
            latency_window: 50,
            frame_time_window: 100,
            producer_core: None,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            pitch_multiplier: 90.0 / 50.0,
            start_yaw: 0.0,
            yaw_rate: 30.0,
            pitch: 0.0,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 900,
            frames: 300,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            report_every: 30,
            snapshot_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 || self.source_queue_capacity == 0 {
            return Err(Error::InvalidPipeline("queue capacities must be at least 1".into()));
        }
        if self.latency_window == 0 || self.frame_time_window == 0 {
            return Err(Error::InvalidPipeline("averaging windows must be at least 1".into()));
        }
        Ok(())
    }
}

impl Config {
    /// Layer an optional TOML file and `FOVEAL__*` environment variables over
    /// the defaults, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.codec.validate()?;
        self.pipeline.validate()?;
        if self.source.height % 2 != 0 {
            return Err(Error::InvalidSettings(format!(
                "stereo source height must be even, got {}",
                self.source.height
            )));
        }

        // One column of slack: the crop edges are floored independently
        let width = self.source.width;
        let crop_px = codec::angle::angle_to_width(self.codec.crop_angle, width);
        let focus_px = codec::angle::angle_to_width(self.codec.focus_h_angle, width).max(1);
        if focus_px + 1 >= crop_px {
            return Err(Error::InvalidSettings(format!(
                "source width {} too narrow: focus window of {}px does not fit a {}px crop",
                width, focus_px, crop_px
            )));
        }
        Ok(())
    }
}
