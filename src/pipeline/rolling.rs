//! Fixed-window moving average for latency and frame-time estimation

use std::fmt;

use ringbuf::{traits::*, HeapRb};

/// Average over the last `window` samples with O(1) updates.
///
/// Backed by an overwriting ring buffer: once full, each new sample evicts
/// the oldest and the running sum is adjusted by the difference.
pub struct RollingAverage {
    samples: HeapRb<f64>,
    sum: f64,
}

impl RollingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            samples: HeapRb::new(window.max(1)),
            sum: 0.0,
        }
    }

    pub fn add_sample(&mut self, sample: f64) {
        if let Some(evicted) = self.samples.push_overwrite(sample) {
            self.sum -= evicted;
        }
        self.sum += sample;
    }

    /// Mean of the samples in the window, or 0 when there are none.
    pub fn average(&self) -> f64 {
        let len = self.samples.occupied_len();
        if len == 0 {
            0.0
        } else {
            self.sum / len as f64
        }
    }

    pub fn len(&self) -> usize {
        self.samples.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window(&self) -> usize {
        self.samples.capacity().get()
    }
}

impl fmt::Debug for RollingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingAverage")
            .field("len", &self.len())
            .field("window", &self.window())
            .field("average", &self.average())
            .finish()
    }
}
