//! A reader/writer lock with a configurable admission priority.
//!
//! Three priority modes are supported: [`Priority::Readers`], which favors
//! readers; [`Priority::Writers`], which favors writers; and
//! [`Priority::NWay`], which admits at most `n` readers between consecutive
//! writer turns. The file server's resource table only ever instantiates
//! `NWay` locks with `n = 1`, but all three are first-class so the type is
//! reusable wherever a differently-tuned fairness policy is wanted.
//!
//! Unlike a spinlock, waiters block on a [`Condvar`] rather than busy-polling,
//! since critical sections here can run for the duration of a filesystem
//! read or write, not a handful of instructions.
//!
//! ## Usage
//!
//! ```rust
//! # use hyperdrive::rwlock::{Priority, RwLock};
//! #
//! let lock = RwLock::new(Priority::NWay { n: 1 }, 0);
//!
//! {
//!     let mut w = lock.write();
//!     *w = 1;
//! }
//!
//! let r = lock.read();
//! assert_eq!(*r, 1);
//! ```

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};

/// Admission priority policy for an [`RwLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Readers are admitted whenever no writer is active; writers may be
    /// deferred indefinitely by a steady stream of readers.
    Readers,
    /// Writers are admitted as soon as none are active and none are
    /// waiting; readers may be deferred indefinitely by a steady stream of
    /// writers.
    Writers,
    /// At most `n` readers are admitted between consecutive writer turns,
    /// bounding writer wait time without serializing every read.
    NWay { n: u32 },
}

#[derive(Debug, Default)]
struct Counters {
    active_r: u32,
    active_w: u32,
    waiting_r: u32,
    waiting_w: u32,
    total_r: u32,
}

impl Counters {
    fn reader_admitted(&self, priority: Priority) -> bool {
        match priority {
            Priority::Readers => self.active_w == 0,
            Priority::Writers => self.active_w == 0 && self.waiting_w == 0,
            Priority::NWay { n } => {
                self.active_w == 0
                    && (self.total_r < n || (self.waiting_w == 0 && self.waiting_r > 0))
            }
        }
    }

    fn writer_admitted(&self, priority: Priority) -> bool {
        match priority {
            Priority::Readers => self.active_r == 0 && self.waiting_r == 0 && self.active_w == 0,
            Priority::Writers => self.active_w == 0 && self.active_r == 0,
            Priority::NWay { n } => {
                self.active_w == 0 && self.active_r == 0 && (self.total_r >= n || self.waiting_r == 0)
            }
        }
    }
}

/// A reader/writer lock with an explicit fairness priority.
pub struct RwLock<T: ?Sized> {
    priority: Priority,
    counters: Mutex<Counters>,
    read_cv: Condvar,
    write_cv: Condvar,
    data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send> Send for RwLock<T> {}
unsafe impl<T: ?Sized + Send> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    /// Creates a new lock wrapping `data`, admitting waiters per `priority`.
    #[must_use]
    pub fn new(priority: Priority, data: T) -> Self {
        Self {
            priority,
            counters: Mutex::new(Counters::default()),
            read_cv: Condvar::new(),
            write_cv: Condvar::new(),
            data: UnsafeCell::new(data),
        }
    }
}

impl<T: ?Sized> RwLock<T> {
    /// Blocks until a shared read lock is admitted, then returns a guard.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        let mut c = self.counters.lock().unwrap();
        c.waiting_r += 1;
        while !c.reader_admitted(self.priority) {
            c = self.read_cv.wait(c).unwrap();
        }
        c.waiting_r -= 1;
        c.active_r += 1;
        c.total_r += 1;
        drop(c);

        RwLockReadGuard { lock: self }
    }

    /// Blocks until the exclusive write lock is admitted, then returns a guard.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        let mut c = self.counters.lock().unwrap();
        c.waiting_w += 1;
        while !c.writer_admitted(self.priority) {
            c = self.write_cv.wait(c).unwrap();
        }
        c.waiting_w -= 1;
        c.active_w += 1;
        c.total_r = 0;
        drop(c);

        RwLockWriteGuard { lock: self }
    }

    fn reader_unlock(&self) {
        let mut c = self.counters.lock().unwrap();
        c.active_r -= 1;

        match self.priority {
            Priority::Writers => {
                if c.active_w == 0 && c.waiting_w == 0 {
                    drop(c);
                    self.read_cv.notify_one();
                } else {
                    drop(c);
                    self.write_cv.notify_one();
                }
            }
            Priority::Readers => {
                if c.waiting_r > 0 {
                    drop(c);
                    self.read_cv.notify_all();
                } else if c.active_r == 0 {
                    drop(c);
                    self.write_cv.notify_one();
                }
            }
            Priority::NWay { n } => {
                if c.total_r < n && c.waiting_r > 0 {
                    drop(c);
                    self.read_cv.notify_all();
                } else if c.waiting_w > 0 && c.active_r == 0 {
                    drop(c);
                    self.write_cv.notify_one();
                } else if c.waiting_w == 0 && c.waiting_r > 0 {
                    drop(c);
                    self.read_cv.notify_all();
                }
            }
        }
    }

    fn writer_unlock(&self) {
        let mut c = self.counters.lock().unwrap();
        c.active_w -= 1;

        match self.priority {
            Priority::Writers => {
                if c.waiting_w > 0 {
                    drop(c);
                    self.write_cv.notify_one();
                } else if c.waiting_r > 0 {
                    drop(c);
                    self.read_cv.notify_all();
                }
            }
            Priority::Readers | Priority::NWay { .. } => {
                if c.waiting_r == 0 {
                    drop(c);
                    self.write_cv.notify_one();
                } else {
                    drop(c);
                    self.read_cv.notify_all();
                }
            }
        }
    }
}

/// RAII guard granting shared read access. Releases on drop.
#[must_use = "if unused the lock will immediately unlock"]
pub struct RwLockReadGuard<'a, T: ?Sized> {
    lock: &'a RwLock<T>,
}

impl<T: ?Sized> Deref for RwLockReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for RwLockReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.reader_unlock();
    }
}

/// RAII guard granting exclusive write access. Releases on drop.
#[must_use = "if unused the lock will immediately unlock"]
pub struct RwLockWriteGuard<'a, T: ?Sized> {
    lock: &'a RwLock<T>,
}

impl<T: ?Sized> Deref for RwLockWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for RwLockWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for RwLockWriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.writer_unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn concurrent_reads_run_in_parallel() {
        let lock = Arc::new(RwLock::new(Priority::NWay { n: 1 }, 0));
        let barrier = Arc::new(Barrier::new(4));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let lock = lock.clone();
            let barrier = barrier.clone();
            handles.push(thread::spawn(move || {
                let _r = lock.read();
                // All four readers must be inside the critical section at once.
                barrier.wait();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn writer_excludes_readers() {
        let lock = Arc::new(RwLock::new(Priority::NWay { n: 1 }, 0));
        let w = lock.write();
        assert!(lock.counters.lock().unwrap().active_r == 0);
        drop(w);
        let _r = lock.read();
    }

    #[test]
    fn writer_excludes_writer_under_n_way() {
        let lock = Arc::new(RwLock::new(Priority::NWay { n: 1 }, 0usize));
        let w = lock.write();
        assert_eq!(lock.counters.lock().unwrap().active_w, 1);

        let lock2 = lock.clone();
        let handle = thread::spawn(move || {
            let _w2 = lock2.write();
        });

        thread::sleep(Duration::from_millis(20));
        assert_eq!(
            lock.counters.lock().unwrap().active_w,
            1,
            "a second writer must not be admitted while the first still holds the lock"
        );

        drop(w);
        handle.join().unwrap();
    }

    #[test]
    fn n_way_bounds_writer_wait_under_reader_storm() {
        let lock = Arc::new(RwLock::new(Priority::NWay { n: 1 }, 0usize));
        let stop = Arc::new(AtomicUsize::new(0));

        let mut reader_handles = Vec::new();
        for _ in 0..8 {
            let lock = lock.clone();
            let stop = stop.clone();
            reader_handles.push(thread::spawn(move || {
                while stop.load(Ordering::Relaxed) == 0 {
                    let _r = lock.read();
                    thread::yield_now();
                }
            }));
        }

        thread::sleep(Duration::from_millis(5));

        let writer_lock = lock.clone();
        let start = Instant::now();
        let w = writer_lock.write();
        let elapsed = start.elapsed();
        drop(w);

        stop.store(1, Ordering::Relaxed);
        for h in reader_handles {
            h.join().unwrap();
        }

        assert!(
            elapsed < Duration::from_secs(2),
            "writer starved for {elapsed:?} under an n=1 N_WAY lock"
        );
    }

    #[test]
    fn write_then_read_sees_write() {
        let lock = RwLock::new(Priority::NWay { n: 1 }, 0);
        {
            let mut w = lock.write();
            *w = 7;
        }
        assert_eq!(*lock.read(), 7);
    }
}
