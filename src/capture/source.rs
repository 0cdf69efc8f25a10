//! Decode-source abstraction and the read-ahead buffering stage

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::frame::{PanoramicFrame, SourceFrame};
use crate::error::{Error, Result};
use crate::pipeline::queue::CloseOnDrop;
use crate::pipeline::BoundedQueue;

/// Supplier of decoded panoramic frames.
///
/// `None` signals end of stream. Implementations may block on I/O.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<SourceFrame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Option<SourceFrame> {
        (**self).next_frame()
    }
}

/// Adapts any iterator of images into a numbered frame source
pub struct IterSource<I> {
    frames: I,
    sequence: u64,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = PanoramicFrame> + Send,
{
    pub fn new(frames: I) -> Self {
        Self {
            frames,
            sequence: 0,
        }
    }
}

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = PanoramicFrame> + Send,
{
    fn next_frame(&mut self) -> Option<SourceFrame> {
        let image = self.frames.next()?;
        let frame = SourceFrame::new(image, self.sequence);
        self.sequence += 1;
        Some(frame)
    }
}

/// Reads ahead from a decode source on its own thread.
///
/// Frames are buffered in a [`BoundedQueue`]; the reader waits whenever the
/// queue holds `capacity` frames. Empty reads before the first good frame
/// are retried up to `max_leading_empty` times, an empty read after that
/// ends the stream.
pub struct BufferedSource {
    queue: Arc<BoundedQueue<SourceFrame>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl BufferedSource {
    pub fn spawn<S>(source: S, capacity: usize, max_leading_empty: u32) -> Result<Self>
    where
        S: FrameSource + 'static,
    {
        if capacity == 0 {
            return Err(Error::InvalidPipeline(
                "source queue capacity must be at least 1".into(),
            ));
        }

        let queue = Arc::new(BoundedQueue::new(capacity));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let queue = Arc::clone(&queue);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("frame-reader".into())
                .spawn(move || buffer_frames(source, &queue, &stop, max_leading_empty))
                .map_err(|source| Error::Spawn {
                    name: "frame-reader",
                    source,
                })?
        };

        info!("Frame reader started, buffering up to {} frames", capacity);

        Ok(Self {
            queue,
            stop,
            handle: Some(handle),
        })
    }

    /// Frames currently buffered
    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    /// True once the reader has finished and everything it read was consumed
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_closed() && self.queue.is_empty()
    }
}

fn buffer_frames<S: FrameSource>(
    mut source: S,
    queue: &BoundedQueue<SourceFrame>,
    stop: &AtomicBool,
    max_leading_empty: u32,
) {
    let _close = CloseOnDrop(queue);
    let mut buffered = 0u64;
    let mut empty_reads = 0u32;

    loop {
        if stop.load(Ordering::Acquire) || !queue.wait_for_room() {
            debug!("Frame reader stopping");
            break;
        }

        let Some(frame) = source.next_frame() else {
            info!("Decode source exhausted after {} frames", buffered);
            break;
        };

        if frame.is_empty() {
            if buffered == 0 && empty_reads < max_leading_empty {
                empty_reads += 1;
                warn!("First frame empty. Trying again ({}/{})", empty_reads, max_leading_empty);
                continue;
            }
            warn!("Empty frame after {} frames, ending stream", buffered);
            break;
        }

        if buffered == 0 && empty_reads > 0 {
            info!("First frame retrieved after {} empty reads", empty_reads);
        }

        if queue.enqueue(frame).is_err() {
            break;
        }
        buffered += 1;
    }
}

impl FrameSource for BufferedSource {
    fn next_frame(&mut self) -> Option<SourceFrame> {
        self.queue.dequeue()
    }
}

impl Drop for BufferedSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.queue.close();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Frame reader thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_iter_source_numbers_frames() {
        let mut source = IterSource::new((0..3).map(|_| RgbImage::new(4, 2)));
        let seqs: Vec<u64> = std::iter::from_fn(|| source.next_frame())
            .map(|f| f.sequence)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_buffered_source_preserves_order() {
        let frames = (0..20).map(|_| RgbImage::new(8, 4));
        let mut buffered = BufferedSource::spawn(IterSource::new(frames), 3, 0).unwrap();
        for expected in 0..20 {
            let frame = buffered.next_frame().expect("frame");
            assert_eq!(frame.sequence, expected);
        }
        assert!(buffered.next_frame().is_none());
        assert!(buffered.is_exhausted());
    }

    #[test]
    fn test_leading_empty_frames_skipped() {
        let frames = [RgbImage::new(0, 0), RgbImage::new(0, 0), RgbImage::new(8, 4)];
        let mut buffered = BufferedSource::spawn(IterSource::new(frames.into_iter()), 4, 10).unwrap();
        let first = buffered.next_frame().expect("first good frame");
        assert_eq!(first.sequence, 2);
        assert!(buffered.next_frame().is_none());
    }

    #[test]
    fn test_too_many_leading_empty_frames_end_stream() {
        let frames = (0..5).map(|_| RgbImage::new(0, 0));
        let mut buffered = BufferedSource::spawn(IterSource::new(frames), 4, 2).unwrap();
        assert!(buffered.next_frame().is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let frames = std::iter::empty::<RgbImage>();
        assert!(BufferedSource::spawn(IterSource::new(frames), 0, 0).is_err());
    }
}
