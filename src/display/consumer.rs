//! Render-loop side of the pipeline: warm-up, latency feedback and decode

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use super::orientation::OrientationSource;
use crate::capture::PanoramicFrame;
use crate::codec::{self, CodecSettings};
use crate::error::Result;
use crate::pipeline::{Availability, OptimizerPipeline, RollingAverage, ViewerOrientation};
use crate::PipelineConfig;

/// Reconstructed frame ready to hand to the display
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: PanoramicFrame,
    pub sequence: u64,
    /// Age of the viewer data the frame was encoded for
    pub latency: Duration,
    pub orientation: ViewerOrientation,
    /// Encoded size in bytes
    pub compact_bytes: usize,
}

/// Outcome of one render iteration
#[derive(Debug)]
pub enum Presented {
    /// A new frame arrived and was decoded
    Frame(DecodedFrame),
    /// Nothing new; keep showing the previous frame
    Hold,
    /// The stream ended and every frame has been shown
    Finished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConsumerStats {
    pub frames_shown: u64,
    pub avg_latency_ms: f64,
    pub avg_frame_time_ms: f64,
    pub avg_fps: f64,
}

/// Drives one [`OptimizerPipeline`] from the render loop.
///
/// Blocks for the first frame only; afterwards each call takes at most one
/// queued frame without waiting. Every call feeds the observed latency back
/// into orientation prediction and publishes the prediction to the shared
/// viewer state.
pub struct FrameConsumer<O> {
    pipeline: OptimizerPipeline,
    orientation: O,
    codec: CodecSettings,
    latency_ms: RollingAverage,
    frame_time_ms: RollingAverage,
    last_frame_at: Option<Instant>,
    frames_shown: u64,
}

impl<O: OrientationSource> FrameConsumer<O> {
    pub fn new(
        pipeline: OptimizerPipeline,
        orientation: O,
        codec: CodecSettings,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            pipeline,
            orientation,
            codec,
            latency_ms: RollingAverage::new(config.latency_window),
            frame_time_ms: RollingAverage::new(config.frame_time_window),
            last_frame_at: None,
            frames_shown: 0,
        }
    }

    /// Run one render iteration
    #[instrument(level = "trace", skip(self))]
    pub fn next_frame(&mut self) -> Presented {
        let warmed_up = self.frames_shown > 0;
        let taken = if warmed_up {
            self.pipeline.try_get_frame()
        } else {
            debug!("Waiting for first frame");
            self.pipeline.get_frame()
        };

        let presented = match taken {
            Some(item) => {
                let now = Instant::now();
                let latency = now.saturating_duration_since(item.timestamp);
                self.latency_ms.add_sample(latency.as_secs_f64() * 1000.0);
                metrics::histogram!("frame_latency_ms").record(latency.as_secs_f64() * 1000.0);

                if let Some(last) = self.last_frame_at {
                    let frame_time = now.saturating_duration_since(last);
                    self.frame_time_ms.add_sample(frame_time.as_secs_f64() * 1000.0);
                }
                self.last_frame_at = Some(now);

                let start = Instant::now();
                let image = codec::decode_with_filter(&item.frame, self.codec.filter);
                metrics::histogram!("decode_time_us").record(start.elapsed().as_micros() as f64);

                if !warmed_up {
                    info!("First frame received after warm-up");
                }
                self.frames_shown += 1;

                Presented::Frame(DecodedFrame {
                    image,
                    sequence: item.sequence,
                    latency,
                    orientation: item.orientation,
                    compact_bytes: item.frame.byte_len(),
                })
            }
            None if !warmed_up => Presented::Finished,
            None => match self.pipeline.availability() {
                Availability::Finished => Presented::Finished,
                _ => Presented::Hold,
            },
        };

        self.publish_prediction();
        presented
    }

    /// Predict where the viewer will look once a frame encoded now is
    /// displayed, and hand it to the optimizer.
    fn publish_prediction(&mut self) {
        let lead = Duration::from_secs_f64(self.latency_ms.average().max(0.0) / 1000.0);
        let predicted = self.orientation.predict_orientation(Instant::now() + lead);
        let orientation = ViewerOrientation::new(predicted.h_angle, predicted.v_angle, &self.codec);
        self.pipeline.viewer().update(orientation);
    }

    pub fn stats(&self) -> ConsumerStats {
        let avg_frame_time_ms = self.frame_time_ms.average();
        ConsumerStats {
            frames_shown: self.frames_shown,
            avg_latency_ms: self.latency_ms.average(),
            avg_frame_time_ms,
            avg_fps: if avg_frame_time_ms > 0.0 {
                1000.0 / avg_frame_time_ms
            } else {
                0.0
            },
        }
    }

    pub fn pipeline(&self) -> &OptimizerPipeline {
        &self.pipeline
    }

    pub fn stop(&mut self) -> Result<()> {
        self.pipeline.stop()
    }
}
