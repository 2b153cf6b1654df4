//! Bounded MPMC queue fabric connecting the pipeline stages.
//!
//! A thin wrapper over a lock-free fixed-capacity array queue. Values are
//! moved through the queue; a successful push relinquishes the value
//! entirely. Safe for any number of concurrent producers and consumers.

use std::thread;
use std::time::Duration;

use crossbeam_queue::ArrayQueue;

/// Spins before the blocking push starts sleeping between attempts.
const PUSH_SPIN_LIMIT: u32 = 64;
const PUSH_PARK: Duration = Duration::from_micros(50);

pub struct BoundedQueue<T> {
    inner: ArrayQueue<T>,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue with a fixed capacity.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Non-blocking push; hands the value back when the queue is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        self.inner.push(value)
    }

    /// Blocks until the value is accepted or `cancelled` reports true, in
    /// which case the value is handed back.
    pub fn push_until<F>(&self, mut value: T, cancelled: F) -> Result<(), T>
    where
        F: Fn() -> bool,
    {
        let mut spins = 0u32;
        loop {
            match self.inner.push(value) {
                Ok(()) => return Ok(()),
                Err(v) => {
                    if cancelled() {
                        return Err(v);
                    }
                    value = v;
                    if spins < PUSH_SPIN_LIMIT {
                        spins += 1;
                        thread::yield_now();
                    } else {
                        thread::sleep(PUSH_PARK);
                    }
                }
            }
        }
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_push_rejects_when_full() {
        let queue = BoundedQueue::with_capacity(2);
        assert!(queue.try_push(1).is_ok());
        assert!(queue.try_push(2).is_ok());
        assert_eq!(queue.try_push(3), Err(3));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn pops_in_fifo_order() {
        let queue = BoundedQueue::with_capacity(4);
        for i in 0..4 {
            queue.try_push(i).unwrap();
        }
        for i in 0..4 {
            assert_eq!(queue.try_pop(), Some(i));
        }
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn push_until_waits_for_space() {
        let queue = Arc::new(BoundedQueue::with_capacity(1));
        queue.try_push(0u32).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push_until(1, || false))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.try_pop(), Some(0));
        producer.join().unwrap().unwrap();
        assert_eq!(queue.try_pop(), Some(1));
    }

    #[test]
    fn push_until_returns_value_on_cancellation() {
        let queue = BoundedQueue::with_capacity(1);
        queue.try_push(7u32).unwrap();

        let cancelled = AtomicBool::new(true);
        let result = queue.push_until(8, || cancelled.load(Ordering::SeqCst));
        assert_eq!(result, Err(8));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn concurrent_producers_and_consumers_move_every_value() {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 4;
        const PER_PRODUCER: usize = 1000;

        let queue = Arc::new(BoundedQueue::with_capacity(64));
        let mut handles = Vec::new();

        for p in 0..PRODUCERS {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue
                        .push_until(p * PER_PRODUCER + i, || false)
                        .expect("not cancelled");
                }
            }));
        }

        let taken = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut consumers = Vec::new();
        for _ in 0..CONSUMERS {
            let queue = Arc::clone(&queue);
            let taken = Arc::clone(&taken);
            consumers.push(thread::spawn(move || {
                let mut local = Vec::new();
                loop {
                    match queue.try_pop() {
                        Some(v) => {
                            taken.fetch_add(1, Ordering::SeqCst);
                            local.push(v);
                        }
                        None => {
                            if taken.load(Ordering::SeqCst) >= PRODUCERS * PER_PRODUCER {
                                break;
                            }
                            thread::yield_now();
                        }
                    }
                }
                local
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut seen = Vec::new();
        for handle in consumers {
            seen.extend(handle.join().unwrap());
        }
        seen.sort_unstable();
        let expected: Vec<usize> = (0..PRODUCERS * PER_PRODUCER).collect();
        assert_eq!(seen, expected);
    }
}
