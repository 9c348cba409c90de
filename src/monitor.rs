//! Read/write monitor guarding the memoized and lazy value caches.
//!
//! [`ReadWriteMonitor`] admits many concurrent readers or one exclusive writer.
//! Its policy differs from `std::sync::RwLock` in ways the caches rely on:
//!
//! - A writer that is waiting blocks newly arriving readers, so a compute-once
//!   writer is never starved by a stream of cache probes.
//! - When a writer releases and no other writer waits, every waiting reader is
//!   released together.
//! - Writers are served in arrival (ticket) order.
//! - The thread that holds the write lock gets [`ReentrantAccess`] instead of
//!   deadlocking when it asks for the monitor again.

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

/// Returned when the thread holding the write lock requests the monitor again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReentrantAccess;

impl fmt::Display for ReentrantAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("monitor re-entered by the thread holding its write lock")
    }
}

impl std::error::Error for ReentrantAccess {}

#[derive(Default)]
struct MonitorState {
    readers: usize,
    waiting_writers: usize,
    writer: Option<ThreadId>,
    next_ticket: u64,
    serving: u64,
}

/// Single-writer/many-reader monitor owning the value it protects.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::ReadWriteMonitor;
///
/// let cache: ReadWriteMonitor<Option<u32>> = ReadWriteMonitor::new(None);
///
/// if cache.read().unwrap().is_none() {
///     let mut slot = cache.write().unwrap();
///     if slot.is_none() {
///         *slot = Some(42);
///     }
/// }
/// assert_eq!(*cache.read().unwrap(), Some(42));
/// ```
pub struct ReadWriteMonitor<T> {
    state: Mutex<MonitorState>,
    can_read: Condvar,
    can_write: Condvar,
    value: UnsafeCell<T>,
}

// Access to `value` is only handed out through guards, which the state machine
// keeps exclusive for writers and shared for readers.
unsafe impl<T: Send> Send for ReadWriteMonitor<T> {}
unsafe impl<T: Send + Sync> Sync for ReadWriteMonitor<T> {}

impl<T> ReadWriteMonitor<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(MonitorState::default()),
            can_read: Condvar::new(),
            can_write: Condvar::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquires shared access, waiting while a writer is active or queued.
    ///
    /// A thread must not request the write lock while holding a read guard.
    pub fn read(&self) -> Result<ReadGuard<'_, T>, ReentrantAccess> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            return Err(ReentrantAccess);
        }
        while state.writer.is_some() || state.waiting_writers > 0 {
            self.can_read.wait(&mut state);
        }
        state.readers += 1;
        Ok(ReadGuard { monitor: self })
    }

    /// Shared access if it is available without waiting.
    pub fn try_read(&self) -> Result<Option<ReadGuard<'_, T>>, ReentrantAccess> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            return Err(ReentrantAccess);
        }
        if state.writer.is_some() || state.waiting_writers > 0 {
            return Ok(None);
        }
        state.readers += 1;
        Ok(Some(ReadGuard { monitor: self }))
    }

    /// Acquires exclusive access, waiting for active readers to drain and for
    /// earlier writers to finish.
    pub fn write(&self) -> Result<WriteGuard<'_, T>, ReentrantAccess> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            return Err(ReentrantAccess);
        }
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.waiting_writers += 1;
        while state.writer.is_some() || state.readers > 0 || state.serving != ticket {
            self.can_write.wait(&mut state);
        }
        state.waiting_writers -= 1;
        state.writer = Some(me);
        Ok(WriteGuard { monitor: self })
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    fn release_read(&self) {
        let mut state = self.state.lock();
        state.readers -= 1;
        if state.readers == 0 && state.waiting_writers > 0 {
            // Only the writer holding the serving ticket may proceed.
            self.can_write.notify_all();
        }
    }

    fn release_write(&self) {
        let mut state = self.state.lock();
        state.writer = None;
        state.serving += 1;
        if state.waiting_writers > 0 {
            self.can_write.notify_all();
        } else {
            self.can_read.notify_all();
        }
    }
}

impl<T: Default> Default for ReadWriteMonitor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for ReadWriteMonitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ReadWriteMonitor")
            .field("readers", &state.readers)
            .field("waiting_writers", &state.waiting_writers)
            .field("has_writer", &state.writer.is_some())
            .finish()
    }
}

/// Shared access to a monitor's value; released on drop.
pub struct ReadGuard<'a, T> {
    monitor: &'a ReadWriteMonitor<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Readers only coexist with other readers.
        unsafe { &*self.monitor.value.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.monitor.release_read();
    }
}

/// Exclusive access to a monitor's value; released on drop.
pub struct WriteGuard<'a, T> {
    monitor: &'a ReadWriteMonitor<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.monitor.value.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // The writer is alone while this guard lives.
        unsafe { &mut *self.monitor.value.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.monitor.release_write();
    }
}
