//! Blocking FIFO shared between pipeline stages

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

use crossbeam::utils::CachePadded;

/// Returned by [`BoundedQueue::enqueue`] once the queue is closed; hands the
/// rejected item back to the caller.
#[derive(PartialEq, Eq)]
pub struct EnqueueError<T>(pub T);

impl<T> EnqueueError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnqueueError(..)")
    }
}

impl<T> fmt::Display for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("enqueue on a closed queue")
    }
}

impl<T> std::error::Error for EnqueueError<T> {}

/// Queue counters, readable without taking the queue lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub enqueued: usize,
    pub dequeued: usize,
    /// Deepest the queue has been since creation
    pub peak_len: usize,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicUsize,
    dequeued: AtomicUsize,
    peak_len: AtomicUsize,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Thread-safe FIFO with a blocking dequeue.
///
/// `enqueue` never blocks. The capacity is a threshold that producers honour
/// voluntarily through [`wait_below`](Self::wait_below) before producing the
/// next item, which bounds the depth at `capacity` as long as there is a
/// single producer. Closing the queue wakes every waiter; dequeue keeps
/// draining what is left and then returns `None`.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    /// Signalled on every enqueue and on close
    not_empty: Condvar,
    /// Signalled on every dequeue and on close
    drained: Condvar,
    capacity: usize,
    counters: CachePadded<Counters>,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
            capacity,
            counters: CachePadded::new(Counters::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // Queue state stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an item. Fails only when the queue has been closed.
    pub fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(EnqueueError(item));
        }
        inner.items.push_back(item);
        let len = inner.items.len();
        drop(inner);

        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        self.counters.peak_len.fetch_max(len, Ordering::Relaxed);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the oldest item, blocking while the queue is empty.
    ///
    /// Returns `None` only once the queue is closed and fully drained.
    pub fn dequeue(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                drop(inner);
                self.on_dequeued();
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            inner = self
                .not_empty
                .wait(inner)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Remove the oldest item without blocking
    pub fn try_dequeue(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() {
            self.on_dequeued();
        }
        item
    }

    fn on_dequeued(&self) {
        self.counters.dequeued.fetch_add(1, Ordering::Relaxed);
        self.drained.notify_all();
    }

    /// Block until fewer than `threshold` items are queued.
    ///
    /// Returns `false` if the queue was closed while (or before) waiting.
    pub fn wait_below(&self, threshold: usize) -> bool {
        let mut inner = self.lock();
        loop {
            if inner.closed {
                return false;
            }
            if inner.items.len() < threshold {
                return true;
            }
            inner = self
                .drained
                .wait(inner)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Block until there is room under the queue's own capacity
    pub fn wait_for_room(&self) -> bool {
        self.wait_below(self.capacity)
    }

    /// Reject further items and wake every blocked caller
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
        self.drained.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
            peak_len: self.counters.peak_len.load(Ordering::Relaxed),
        }
    }
}

/// Closes the queue when dropped, so a thread that unwinds still releases
/// everyone blocked on it.
pub(crate) struct CloseOnDrop<'a, T>(pub(crate) &'a BoundedQueue<T>);

impl<T> Drop for CloseOnDrop<'_, T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}
