//! Cross-thread wait-for tracking for memoized values under construction.
//!
//! A thread building a memoized value holds that value's write lock for the
//! whole computation. Two threads entering a dependency cycle from opposite
//! ends would each block on the other's lock, and neither per-call stack can
//! see the cycle. Every blocking wait is recorded here first, and a wait that
//! would close a loop fails with `Circular` instead.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::key::BindingKey;

#[derive(Default)]
struct WaitGraph {
    building: HashMap<BindingKey, ThreadId>,
    waiting: HashMap<ThreadId, BindingKey>,
}

impl WaitGraph {
    /// Chain of keys from `key` back to `key` when waiting on it from `me`
    /// would close a loop.
    fn cycle_through(&self, key: &BindingKey, me: ThreadId) -> Option<Vec<BindingKey>> {
        let mut chain = vec![key.clone()];
        let mut owner = *self.building.get(key)?;
        // Each hop visits a distinct waiting thread, unless an unrelated loop
        // exists, which the bound cuts off.
        for _ in 0..=self.waiting.len() {
            if owner == me {
                chain.push(key.clone());
                return Some(chain);
            }
            let next = self.waiting.get(&owner)?;
            chain.push(next.clone());
            owner = *self.building.get(next)?;
        }
        None
    }
}

/// Memoized keys being built and the keys threads are blocked on, for one
/// injector.
#[derive(Default)]
pub(crate) struct InFlight {
    graph: Mutex<WaitGraph>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record that the current thread is about to block on `key`.
    ///
    /// Fails with `Circular` when the thread building `key` is, directly or
    /// through other threads, waiting on a value this thread is building.
    pub(crate) fn wait_for(&self, key: &BindingKey) -> DiResult<WaitGuard<'_>> {
        let me = thread::current().id();
        let mut graph = self.graph.lock();
        if let Some(chain) = graph.cycle_through(key, me) {
            return Err(DiError::Circular(chain));
        }
        graph.waiting.insert(me, key.clone());
        Ok(WaitGuard { in_flight: self, me })
    }

    /// Record that the current thread holds the write lock of `key` and is
    /// computing its value.
    pub(crate) fn begin_build(&self, key: &BindingKey) -> BuildGuard<'_> {
        let me = thread::current().id();
        self.graph.lock().building.insert(key.clone(), me);
        BuildGuard {
            in_flight: self,
            key: key.clone(),
            me,
        }
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        let graph = self.graph.lock();
        graph.building.is_empty() && graph.waiting.is_empty()
    }
}

/// Clears the current thread's wait edge on drop.
pub(crate) struct WaitGuard<'a> {
    in_flight: &'a InFlight,
    me: ThreadId,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.graph.lock().waiting.remove(&self.me);
    }
}

/// Clears the build record on drop. Must be dropped before the write lock it
/// describes is released.
pub(crate) struct BuildGuard<'a> {
    in_flight: &'a InFlight,
    key: BindingKey,
    me: ThreadId,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        let mut graph = self.in_flight.graph.lock();
        if graph.building.get(&self.key) == Some(&self.me) {
            graph.building.remove(&self.key);
        }
    }
}
