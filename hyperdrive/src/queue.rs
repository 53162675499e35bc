//! A bounded, blocking, multi-producer multi-consumer FIFO queue.
//!
//! This is the hand-off point between the accept loop and the worker pool.
//! Capacity is fixed at construction (conventionally equal to the worker
//! count), so a full queue applies natural back-pressure: `push` blocks
//! until a worker has popped, which in turn blocks the accept loop, which
//! stops draining the kernel's listen backlog.
//!
//! ## Usage
//!
//! ```rust
//! # use hyperdrive::queue::BoundedQueue;
//! #
//! let queue = BoundedQueue::new(2);
//!
//! queue.push(1);
//! queue.push(2);
//!
//! assert_eq!(queue.pop(), 1);
//! assert_eq!(queue.pop(), 2);
//! ```

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// A bounded FIFO queue shared between producers and consumers.
///
/// Internally this is a single `Mutex`-guarded ring (modeled here as a
/// `VecDeque` since capacity is fixed and never reallocates past it) with
/// two condition variables standing in for the classic counting-semaphore
/// pair (`slots_free`, `slots_filled`) from the textbook bounded-buffer
/// algorithm.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

struct State<T> {
    ring: VecDeque<T>,
}

impl<T> BoundedQueue<T> {
    /// Creates a new queue that holds at most `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero: a zero-capacity queue can never be
    /// popped from or pushed to, which is never the intent of a worker hand-off
    /// queue sized to the thread count.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedQueue capacity must be non-zero");
        Self {
            capacity,
            state: Mutex::new(State {
                ring: VecDeque::with_capacity(capacity),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Pushes an element onto the back of the queue, blocking while full.
    pub fn push(&self, elem: T) {
        let mut state = self.state.lock().unwrap();
        while state.ring.len() == self.capacity {
            state = self.not_full.wait(state).unwrap();
        }
        state.ring.push_back(elem);
        self.not_empty.notify_one();
    }

    /// Pops the oldest element off the queue, blocking while empty.
    pub fn pop(&self) -> T {
        let mut state = self.state.lock().unwrap();
        while state.ring.is_empty() {
            state = self.not_empty.wait(state).unwrap();
        }
        let elem = state.ring.pop_front().unwrap();
        self.not_full.notify_one();
        elem
    }

    /// The fixed capacity of this queue.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of elements currently queued, for diagnostics and tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().ring.len()
    }

    /// Whether the queue currently holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
