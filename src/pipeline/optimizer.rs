//! Background producer that foveates frames as they are decoded

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::queue::{BoundedQueue, CloseOnDrop, QueueStats};
use super::viewer::{ViewerOrientation, ViewerState};
use crate::capture::FrameSource;
use crate::codec::{self, CodecSettings, CompactFrame};
use crate::error::{Error, Result};
use crate::{utils, PipelineConfig};

/// Encoded frame tagged with the viewer data it was produced for
#[derive(Debug, Clone)]
pub struct TimestampedFrame {
    pub frame: CompactFrame,
    pub sequence: u64,
    /// Capture instant of the orientation used to encode, not the dequeue time
    pub timestamp: Instant,
    pub orientation: ViewerOrientation,
}

/// What the consumer can expect from the queue right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// At least one frame is queued
    Ready,
    /// The producer has not delivered anything yet
    NotYetProduced,
    /// Frames were delivered and all of them have been taken
    Drained,
    /// The producer is done and the queue is empty
    Finished,
}

#[derive(Default)]
struct Flags {
    stop: AtomicBool,
    fully_buffered: AtomicBool,
}

/// Owns the optimizer thread and the queue it feeds.
///
/// The thread pulls a frame from the source, snapshots the [`ViewerState`],
/// encodes with the snapshot's angles and enqueues the result. Before each
/// frame it waits until the queue is below capacity.
pub struct OptimizerPipeline {
    queue: Arc<BoundedQueue<TimestampedFrame>>,
    viewer: Arc<ViewerState>,
    flags: Arc<Flags>,
    handle: Option<JoinHandle<()>>,
}

impl OptimizerPipeline {
    /// Start the optimizer with a fresh viewer state looking at (0°, 90°)
    pub fn spawn<S>(source: S, codec: CodecSettings, config: &PipelineConfig) -> Result<Self>
    where
        S: FrameSource + 'static,
    {
        Self::with_viewer(source, codec, config, Arc::new(ViewerState::default()))
    }

    pub fn with_viewer<S>(
        source: S,
        codec: CodecSettings,
        config: &PipelineConfig,
        viewer: Arc<ViewerState>,
    ) -> Result<Self>
    where
        S: FrameSource + 'static,
    {
        codec.validate()?;
        config.validate()?;

        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let flags = Arc::new(Flags::default());
        let producer_core = config.producer_core;

        let handle = {
            let queue = Arc::clone(&queue);
            let viewer = Arc::clone(&viewer);
            let flags = Arc::clone(&flags);
            thread::Builder::new()
                .name("optimizer".into())
                .spawn(move || {
                    if let Some(core) = producer_core {
                        utils::pin_current_thread(core);
                    }
                    run_optimizer(source, codec, &queue, &viewer, &flags);
                })
                .map_err(|source| Error::Spawn {
                    name: "optimizer",
                    source,
                })?
        };

        info!(
            "Optimizer pipeline started (queue capacity {}, crop {}°, focus {}°x{}°, blur {})",
            config.queue_capacity,
            codec.crop_angle,
            codec.focus_h_angle,
            codec.focus_v_angle,
            codec.blur_factor
        );

        Ok(Self {
            queue,
            viewer,
            flags,
            handle: Some(handle),
        })
    }

    /// Next frame in production order, blocking until one exists.
    ///
    /// Returns `None` once the stream has ended (or the pipeline was stopped)
    /// and every produced frame has been taken.
    pub fn get_frame(&self) -> Option<TimestampedFrame> {
        self.queue.dequeue()
    }

    pub fn try_get_frame(&self) -> Option<TimestampedFrame> {
        self.queue.try_dequeue()
    }

    /// Non-blocking check for a queued frame
    pub fn is_frame_available(&self) -> bool {
        self.availability() == Availability::Ready
    }

    pub fn availability(&self) -> Availability {
        if !self.queue.is_empty() {
            Availability::Ready
        } else if self.queue.is_closed() {
            Availability::Finished
        } else if self.queue.stats().enqueued == 0 {
            Availability::NotYetProduced
        } else {
            Availability::Drained
        }
    }

    /// True once the source reported end of stream
    pub fn is_fully_buffered(&self) -> bool {
        self.flags.fully_buffered.load(Ordering::Acquire)
    }

    /// Shared orientation the optimizer encodes against
    pub fn viewer(&self) -> &Arc<ViewerState> {
        &self.viewer
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Stop producing, release any blocked caller and join the thread.
    ///
    /// Frames already queued can still be drained with `get_frame`.
    pub fn stop(&mut self) -> Result<()> {
        self.flags.stop.store(true, Ordering::Release);
        self.queue.close();
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| Error::ThreadPanicked("optimizer"))?;
            debug!("Optimizer thread joined");
        }
        Ok(())
    }
}

impl Drop for OptimizerPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Optimizer shutdown: {}", e);
        }
    }
}

#[instrument(skip_all, name = "optimizer")]
fn run_optimizer<S: FrameSource>(
    mut source: S,
    codec: CodecSettings,
    queue: &BoundedQueue<TimestampedFrame>,
    viewer: &ViewerState,
    flags: &Flags,
) {
    // Also runs if encode panics, so `get_frame` callers are released
    let _close = CloseOnDrop(queue);
    let mut produced = 0u64;

    loop {
        if flags.stop.load(Ordering::Acquire) {
            debug!("Stop requested");
            break;
        }

        // Backpressure: never hold more than `capacity` encoded frames
        if !queue.wait_for_room() {
            debug!("Queue closed while waiting for room");
            break;
        }

        let Some(frame) = source.next_frame() else {
            info!("Fully buffered after {} frames", produced);
            flags.fully_buffered.store(true, Ordering::Release);
            break;
        };

        let snapshot = viewer.snapshot();
        let orientation = snapshot.orientation;

        let start = Instant::now();
        metrics::histogram!("source_frame_age_ms")
            .record(start.saturating_duration_since(frame.decoded_at).as_secs_f64() * 1000.0);
        let compact = codec::encode(&frame.image, orientation.h_angle, orientation.v_angle, &codec);
        metrics::histogram!("encode_time_us").record(start.elapsed().as_micros() as f64);

        let item = TimestampedFrame {
            frame: compact,
            sequence: frame.sequence,
            timestamp: snapshot.captured_at,
            orientation,
        };
        if queue.enqueue(item).is_err() {
            debug!("Queue closed, dropping frame {}", frame.sequence);
            break;
        }

        produced += 1;
        metrics::counter!("frames_optimized").increment(1);
        metrics::gauge!("optimizer_queue_depth").set(queue.len() as f64);
    }
}
