//! Deferred access to bound values.
//!
//! A [`Provider`] yields a value on demand instead of at construction time.
//! [`InjectorProvider`] re-resolves its key on every call, [`InstanceProvider`]
//! hands out a fixed value, and [`Lazy`] caches the first successful result of
//! another provider.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::DiResult;
use crate::injector::Injector;
use crate::internal::downcast;
use crate::key::BindingKey;

mod lazy;

pub use lazy::Lazy;

/// Source of values of type `T`.
pub trait Provider<T: ?Sized>: Send + Sync {
    fn get(&self) -> DiResult<Arc<T>>;

    /// The key this provider resolves, when it is backed by an injector.
    fn binding_key(&self) -> Option<&BindingKey> {
        None
    }
}

/// Resolves `key` through the injector afresh on every `get`.
///
/// Each call starts a new resolution stack, so a provider obtained during
/// construction of `X` can later be used to fetch another `X` without a
/// cycle error.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Binder, DiResult, Provider, Signature};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> DiResult<()> {
/// let calls = Arc::new(AtomicU32::new(0));
/// let counter = calls.clone();
///
/// let mut binder = Binder::new();
/// binder.bind::<u32>().to_constructor(&Signature::new(), move |_| {
///     Ok(counter.fetch_add(1, Ordering::SeqCst))
/// })?;
/// let injector = binder.build();
///
/// let provider = injector.get_provider::<u32>();
/// assert_eq!(calls.load(Ordering::SeqCst), 0);
/// assert_eq!(*provider.get()?, 0);
/// assert_eq!(*provider.get()?, 1);
/// # Ok(())
/// # }
/// ```
pub struct InjectorProvider<T: ?Sized> {
    injector: Injector,
    key: BindingKey,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> InjectorProvider<T> {
    pub fn new(injector: Injector, key: BindingKey) -> Self {
        Self {
            injector,
            key,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }
}

impl<T: ?Sized> Clone for InjectorProvider<T> {
    fn clone(&self) -> Self {
        Self {
            injector: self.injector.clone(),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for InjectorProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorProvider").field("key", &self.key).finish()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Provider<T> for InjectorProvider<T> {
    fn get(&self) -> DiResult<Arc<T>> {
        let value = self.injector.resolve_key(&self.key)?;
        downcast::<T>(&value)
    }

    fn binding_key(&self) -> Option<&BindingKey> {
        Some(&self.key)
    }
}

/// Always returns the same value.
#[derive(Debug)]
pub struct InstanceProvider<T: ?Sized> {
    value: Arc<T>,
}

impl<T: ?Sized> InstanceProvider<T> {
    pub fn new(value: Arc<T>) -> Self {
        Self { value }
    }
}

impl<T: ?Sized> Clone for InstanceProvider<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<T: ?Sized + Send + Sync> Provider<T> for InstanceProvider<T> {
    fn get(&self) -> DiResult<Arc<T>> {
        Ok(self.value.clone())
    }
}
