//! A URI-keyed table of reference-counted reader/writer locks.
//!
//! Each distinct URI gets its own [`RwLock`] on first reference; subsequent
//! workers referencing the same URI join that lock's refcount instead of
//! creating a new one. The table itself never holds a lock for the duration
//! of a critical section, only for the O(W) scan and O(1) counter update
//! needed to find-or-create a slot. Blocking on the resource lock always
//! happens after the table mutex has been released, so a writer stalled on
//! one URI never serializes admission decisions for any other URI.
//!
//! ## Usage
//!
//! ```rust
//! # use hyperdrive::table::{LockMode, ResourceLockTable};
//! #
//! let table = ResourceLockTable::new(4);
//!
//! let guard = table.acquire("/a", LockMode::Shared);
//! drop(guard); // releases the lock and, since no one else joined, the slot
//! ```

use std::sync::Mutex;

use crate::rwlock::{Priority, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Whether a caller wants shared (read) or exclusive (write) access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

struct Slot {
    uri: String,
    lock: RwLock<()>,
    refcount: usize,
}

impl Slot {
    fn empty() -> Self {
        Self {
            uri: String::new(),
            lock: RwLock::new(Priority::NWay { n: 1 }, ()),
            refcount: 0,
        }
    }

    fn is_free(&self) -> bool {
        self.uri.is_empty()
    }
}

/// A fixed-size table mapping URIs to reference-counted reader/writer locks.
///
/// Sized to at least the worker count at construction, so that a worker
/// needing a fresh slot always finds one: residency can never exceed the
/// number of workers, each of which holds at most one slot at a time.
pub struct ResourceLockTable {
    slots: Mutex<Vec<Slot>>,
}

impl ResourceLockTable {
    /// Creates a table with room for `capacity` concurrently resident URIs.
    ///
    /// `capacity` should be at least the worker pool size; the table relies
    /// on that invariant to guarantee a free slot is always available.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::empty);
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Acquires the lock for `uri` in the given mode, creating or joining its
    /// slot as needed, and returns a guard that releases both the resource
    /// lock and the slot's refcount on drop.
    pub fn acquire(&self, uri: &str, mode: LockMode) -> Guard<'_> {
        // SAFETY-relevant invariant: the slot's refcount is incremented before
        // the table mutex is released, so it cannot be cleared out from under
        // us until our own `release` runs, even though other workers may
        // concurrently join or leave other slots. Its storage never moves
        // (capacity is fixed at construction and the vector never grows), so
        // the raw pointer taken here stays valid for as long as our refcount
        // keeps the slot pinned.
        let (index, lock_ptr) = {
            let mut slots = self.slots.lock().unwrap();
            let index = Self::reserve_slot(&mut slots, uri);
            (index, std::ptr::from_ref(&slots[index].lock))
        };
        let lock: &RwLock<()> = unsafe { &*lock_ptr };

        let inner = match mode {
            LockMode::Shared => Access::Read(lock.read()),
            LockMode::Exclusive => Access::Write(lock.write()),
        };

        Guard {
            table: self,
            index,
            mode,
            inner: Some(inner),
        }
    }

    /// Finds the resident slot for `uri`, or reserves a fresh one. Returns
    /// the slot's index with its refcount incremented. Caller holds the
    /// table mutex for the duration.
    fn reserve_slot(slots: &mut [Slot], uri: &str) -> usize {
        if let Some(index) = slots.iter().position(|s| s.uri == uri) {
            slots[index].refcount += 1;
            return index;
        }

        let free = slots
            .iter()
            .position(Slot::is_free)
            .expect("resource lock table exhausted: size it to at least the worker count");

        slots[free].uri = uri.to_owned();
        slots[free].refcount = 1;
        free
    }

    fn release(&self, index: usize) {
        let mut slots = self.slots.lock().unwrap();
        slots[index].refcount -= 1;
        if slots[index].refcount == 0 {
            slots[index] = Slot::empty();
        }
    }

    /// Number of currently resident (non-empty) slots, for diagnostics and tests.
    #[must_use]
    pub fn residency(&self) -> usize {
        self.slots.lock().unwrap().iter().filter(|s| !s.is_free()).count()
    }
}

enum Access<'a> {
    Read(RwLockReadGuard<'a, ()>),
    Write(RwLockWriteGuard<'a, ()>),
}

/// A scoped handle on a URI's resource lock.
///
/// Dropping the guard releases the resource lock first, then decrements the
/// slot's refcount under the table mutex, clearing the slot if it reaches
/// zero.
pub struct Guard<'a> {
    table: &'a ResourceLockTable,
    index: usize,
    mode: LockMode,
    inner: Option<Access<'a>>,
}

impl Guard<'_> {
    /// The mode this guard was acquired in.
    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        // Drop the resource-lock guard first: this calls reader_unlock or
        // writer_unlock, exactly mirroring the release order the spec
        // requires (unlock, then decrement residency).
        self.inner.take();
        self.table.release(self.index);
    }
}
