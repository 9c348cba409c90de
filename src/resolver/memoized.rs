use tracing::trace;

use crate::error::{DiError, DiResult};
use crate::injector::Injector;
use crate::internal::{AnyArc, ResolutionStack};
use crate::monitor::ReadWriteMonitor;
use crate::resolver::{Resolver, ResolverKind};

/// Caches the first successful result of the wrapped resolver.
///
/// The cache is probed under the read lock; on a miss the write lock is
/// taken, the cache re-checked and the base resolver run with the lock held,
/// so at most one computation ever commits. Errors are not cached.
///
/// Before blocking on a value another thread is building, the wait is
/// checked against the injector's in-flight builds, so two threads entering
/// a cycle from opposite ends fail with `Circular` instead of deadlocking.
pub struct MemoizedResolver {
    base: Box<dyn Resolver>,
    value: ReadWriteMonitor<Option<AnyArc>>,
}

impl MemoizedResolver {
    pub fn new(base: Box<dyn Resolver>) -> Self {
        Self {
            base,
            value: ReadWriteMonitor::new(None),
        }
    }

    pub fn is_computed(&self) -> bool {
        self.value.read().map(|v| v.is_some()).unwrap_or(false)
    }

    // Only reachable when a provider created during construction asks for the
    // value being built, on the same thread.
    fn reentered(stack: &ResolutionStack) -> DiError {
        let mut chain = stack.keys().to_vec();
        if let Some(last) = chain.last().cloned() {
            chain.push(last);
        }
        DiError::Circular(chain)
    }
}

impl Resolver for MemoizedResolver {
    fn resolve(&self, injector: &Injector, stack: &mut ResolutionStack) -> DiResult<AnyArc> {
        if let Some(cached) = self.value.try_read().map_err(|_| Self::reentered(stack))? {
            if let Some(value) = cached.as_ref() {
                return Ok(value.clone());
            }
        }

        // The key this resolver is bound under, entered by the injector.
        let key = stack.keys().last().cloned();
        let in_flight = injector.in_flight();

        let mut slot = {
            let _waiting = match &key {
                Some(key) => Some(in_flight.wait_for(key)?),
                None => None,
            };
            self.value.write().map_err(|_| Self::reentered(stack))?
        };
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }

        // Declared after `slot` so the record is cleared before the lock is released.
        let _building = key.as_ref().map(|key| in_flight.begin_build(key));
        let value = self.base.resolve(injector, stack)?;
        trace!(depth = stack.len(), "Memoized value computed");
        *slot = Some(value.clone());
        Ok(value)
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Memoized
    }
}
