//! Per-call resolution stack used for cycle and depth detection.

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};
use crate::key::BindingKey;

/// Maximum number of nested resolutions before `DepthExceeded`.
pub const MAX_DEPTH: usize = 1024;

/// Ordered set of the keys currently being resolved by one top-level call.
///
/// A fresh, empty stack is created for every public injector query and for
/// every `Provider::get`; resolvers thread the same stack through their
/// recursive calls.
#[derive(Debug, Default, Clone)]
pub struct ResolutionStack {
    keys: SmallVec<[BindingKey; 8]>,
}

impl ResolutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Keys in resolution order, outermost first.
    pub fn keys(&self) -> &[BindingKey] {
        &self.keys
    }

    /// Enter `key`, failing on a cycle or when the depth guard trips.
    ///
    /// The cycle chain runs from the first occurrence of `key` through the
    /// repeated `key`.
    pub(crate) fn enter(&mut self, key: &BindingKey) -> DiResult<()> {
        if let Some(start) = self.keys.iter().position(|k| k == key) {
            let mut chain: Vec<BindingKey> = self.keys[start..].to_vec();
            chain.push(key.clone());
            return Err(DiError::Circular(chain));
        }
        if self.keys.len() >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(self.keys.len()));
        }
        self.keys.push(key.clone());
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.keys.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;
    struct C;

    #[test]
    fn test_cycle_chain_starts_at_first_occurrence() {
        let mut stack = ResolutionStack::new();
        stack.enter(&BindingKey::of::<A>()).unwrap();
        stack.enter(&BindingKey::of::<B>()).unwrap();
        stack.enter(&BindingKey::of::<C>()).unwrap();

        let err = stack.enter(&BindingKey::of::<B>()).unwrap_err();
        let chain = err.cycle().unwrap();
        assert_eq!(
            chain,
            &[BindingKey::of::<B>(), BindingKey::of::<C>(), BindingKey::of::<B>()]
        );
        // A failed enter leaves the stack untouched.
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_depth_guard() {
        let mut stack = ResolutionStack::new();
        for i in 0..MAX_DEPTH {
            let key = BindingKey::dict_element(
                crate::key::DictType::of::<i64, ()>(),
                i as i64,
                None,
            )
            .unwrap();
            stack.enter(&key).unwrap();
        }
        let err = stack.enter(&BindingKey::of::<A>()).unwrap_err();
        assert!(matches!(err, DiError::DepthExceeded(MAX_DEPTH)));
    }

    #[test]
    fn test_leave_pops() {
        let mut stack = ResolutionStack::new();
        stack.enter(&BindingKey::of::<A>()).unwrap();
        stack.leave();
        assert!(stack.is_empty());
        assert!(!stack.contains(&BindingKey::of::<A>()));
    }
}
