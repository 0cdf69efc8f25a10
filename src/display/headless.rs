//! Display loop without a window: paces the consumer and reports statistics

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use super::consumer::{ConsumerStats, FrameConsumer, Presented};
use super::orientation::OrientationSource;
use crate::error::Result;
use crate::DisplayConfig;

/// Totals gathered over a display run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub stats: ConsumerStats,
    /// Bytes of encoded frames received
    pub compact_bytes: usize,
    /// Bytes of the reconstructed frames
    pub full_bytes: usize,
}

impl RunSummary {
    /// Encoded size as a percentage of the reconstructed size
    pub fn ratio_percent(&self) -> f64 {
        if self.full_bytes == 0 {
            return 0.0;
        }
        self.compact_bytes as f64 / self.full_bytes as f64 * 100.0
    }
}

/// Stand-in for the headset: ticks at the display rate, pulls a frame per
/// tick and drops the pixels after optional snapshotting.
pub struct HeadlessDisplay {
    frame_interval: Duration,
    report_every: u64,
    snapshot_path: Option<PathBuf>,
}

impl HeadlessDisplay {
    pub fn new(config: &DisplayConfig) -> Self {
        let frame_interval = if config.target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(config.target_fps))
        };
        Self {
            frame_interval,
            report_every: config.report_every.max(1),
            snapshot_path: config.snapshot_path.clone(),
        }
    }

    /// Run until the stream ends or `stop` is raised
    #[instrument(skip_all, name = "display")]
    pub fn run<O: OrientationSource>(
        &mut self,
        consumer: &mut FrameConsumer<O>,
        stop: &AtomicBool,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        while !stop.load(Ordering::Acquire) {
            let tick = Instant::now();

            match consumer.next_frame() {
                Presented::Frame(frame) => {
                    summary.compact_bytes += frame.compact_bytes;
                    summary.full_bytes += frame.image.as_raw().len();

                    if let Some(path) = self.snapshot_path.take() {
                        frame.image.save(&path)?;
                        info!("Saved reconstructed frame {} to {}", frame.sequence, path.display());
                    }

                    let stats = consumer.stats();
                    if stats.frames_shown % self.report_every == 0 {
                        info!(
                            "Frame {}: latency {:.1}ms avg, {:.1} fps avg, queue depth {}",
                            frame.sequence,
                            stats.avg_latency_ms,
                            stats.avg_fps,
                            consumer.pipeline().queue_len()
                        );
                    }
                }
                Presented::Hold => {}
                Presented::Finished => {
                    info!("No frames left to show");
                    break;
                }
            }

            let elapsed = tick.elapsed();
            if elapsed < self.frame_interval {
                thread::sleep(self.frame_interval - elapsed);
            }
        }

        summary.stats = consumer.stats();
        Ok(summary)
    }
}
