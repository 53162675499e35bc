//! Hyperdrive is the concurrency core of the file server.
//!
//! It provides the three primitives the worker pool is built on: a bounded
//! blocking queue for handing off accepted connections, an N-way fair
//! reader/writer lock, and a URI-keyed table that lends out one such lock per
//! resource with reference-counted residency.
#![warn(clippy::pedantic, clippy::nursery)]

pub mod queue;
pub mod rwlock;
pub mod table;

pub use queue::BoundedQueue;
pub use rwlock::{Priority, RwLock};
pub use table::{LockMode, ResourceLockTable};
