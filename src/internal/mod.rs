//! Internal implementation details.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};

pub(crate) mod in_flight;
pub(crate) mod stack;

pub use stack::{ResolutionStack, MAX_DEPTH};

/// Type-erased resolved value. Always wraps an `Arc<T>` so `T` may be unsized.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type BindingMap<V> = std::collections::HashMap<crate::key::BindingKey, V, ahash::RandomState>;

#[cfg(not(feature = "ahash"))]
pub(crate) type BindingMap<V> = std::collections::HashMap<crate::key::BindingKey, V>;

/// Erase a shared value for storage in a resolver.
#[inline]
pub fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    Arc::new(value)
}

/// Recover the shared value from an erased one.
#[inline]
pub fn downcast<T: ?Sized + Send + Sync + 'static>(value: &AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Fixed;
    impl Named for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_erase_preserves_identity() {
        let value = Arc::new(5u32);
        let erased = erase(value.clone());
        let back = downcast::<u32>(&erased).unwrap();
        assert!(Arc::ptr_eq(&value, &back));
    }

    #[test]
    fn test_erase_unsized() {
        let value: Arc<dyn Named> = Arc::new(Fixed);
        let erased = erase(value);
        assert_eq!(downcast::<dyn Named>(&erased).unwrap().name(), "fixed");
        assert!(matches!(downcast::<u32>(&erased), Err(DiError::TypeMismatch(_))));
    }
}
