use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use foveal::pipeline::BoundedQueue;

#[test]
fn test_fifo_under_concurrency() {
    let queue = Arc::new(BoundedQueue::new(16));

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..1000u32 {
                queue.enqueue(i).unwrap();
                if i % 97 == 0 {
                    thread::yield_now();
                }
            }
            queue.close();
        })
    };

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut received = Vec::with_capacity(1000);
            while let Some(item) = queue.dequeue() {
                received.push(item);
            }
            received
        })
    };

    producer.join().unwrap();
    let received = consumer.join().unwrap();
    assert_eq!(received, (0..1000).collect::<Vec<_>>());
}

#[test]
fn test_fifo_with_backpressure() {
    let queue = Arc::new(BoundedQueue::new(4));

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..1000u32 {
                assert!(queue.wait_for_room());
                queue.enqueue(i).unwrap();
            }
            queue.close();
        })
    };

    let mut received = Vec::new();
    while let Some(item) = queue.dequeue() {
        received.push(item);
    }
    producer.join().unwrap();

    assert_eq!(received, (0..1000).collect::<Vec<_>>());
    assert!(queue.stats().peak_len <= 4);
}

#[test]
fn test_backpressure_bounds_depth_without_consumer() {
    const CAPACITY: usize = 5;
    let queue = Arc::new(BoundedQueue::new(CAPACITY));
    let produced = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let queue = Arc::clone(&queue);
        let produced = Arc::clone(&produced);
        thread::spawn(move || {
            while queue.wait_for_room() {
                if queue.enqueue(produced.load(Ordering::Relaxed)).is_err() {
                    break;
                }
                produced.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let watcher = {
        let queue = Arc::clone(&queue);
        let max_seen = Arc::clone(&max_seen);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                max_seen.fetch_max(queue.len(), Ordering::Relaxed);
                thread::yield_now();
            }
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert_eq!(queue.len(), CAPACITY);
    assert_eq!(produced.load(Ordering::Relaxed), CAPACITY);

    done.store(true, Ordering::Relaxed);
    watcher.join().unwrap();
    queue.close();
    producer.join().unwrap();

    assert!(max_seen.load(Ordering::Relaxed) <= CAPACITY + 1);
    assert!(queue.stats().peak_len <= CAPACITY);
}

#[test]
fn test_many_blocked_consumers_released_on_close() {
    let queue = Arc::new(BoundedQueue::<u8>::new(1));
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue())
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    queue.enqueue(1).unwrap();
    queue.close();

    let results: Vec<_> = waiters.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
    assert_eq!(results.iter().filter(|r| r.is_none()).count(), 3);
}
