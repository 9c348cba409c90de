//! Resolution strategies.
//!
//! A [`Resolver`] produces the value bound to one key. Resolvers may recurse
//! into the injector through [`Injector::get_instance_internal`], threading
//! the caller's [`ResolutionStack`] so cycles are caught.

use std::fmt;
use std::sync::Arc;

use crate::error::DiResult;
use crate::injector::Injector;
use crate::internal::{downcast, erase, AnyArc, ResolutionStack};
use crate::key::BindingKey;

mod constructor;
mod dict;
mod memoized;

pub use constructor::{Arg, Args, ConstructorResolver};
pub use dict::{DictAggregate, DictResolver};
pub use memoized::MemoizedResolver;

/// Which strategy a resolver implements, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Instance,
    Delegated,
    Constructor,
    Memoized,
    DictAggregate,
    Custom,
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolverKind::Instance => "instance",
            ResolverKind::Delegated => "delegated",
            ResolverKind::Constructor => "constructor",
            ResolverKind::Memoized => "memoized",
            ResolverKind::DictAggregate => "dict",
            ResolverKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Strategy producing the value for one binding key.
///
/// User resolvers may implement this directly and register it with
/// `BindingBuilder::to_resolver`.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{erase, AnyArc, Binder, DiResult, Injector, ResolutionStack, Resolver};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// struct Counter(AtomicU32);
///
/// impl Resolver for Counter {
///     fn resolve(&self, _: &Injector, _: &mut ResolutionStack) -> DiResult<AnyArc> {
///         Ok(erase(Arc::new(self.0.fetch_add(1, Ordering::SeqCst))))
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut binder = Binder::new();
/// binder.bind::<u32>().to_resolver(Counter(AtomicU32::new(0)))?;
/// let injector = binder.build();
/// assert_eq!(*injector.get_instance::<u32>()?, 0);
/// assert_eq!(*injector.get_instance::<u32>()?, 1);
/// # Ok(())
/// # }
/// ```
pub trait Resolver: Send + Sync {
    fn resolve(&self, injector: &Injector, stack: &mut ResolutionStack) -> DiResult<AnyArc>;

    fn kind(&self) -> ResolverKind {
        ResolverKind::Custom
    }

    /// The dict view of an aggregating resolver.
    fn as_dict_aggregate(&self) -> Option<&dyn DictAggregate> {
        None
    }

    fn as_dict_aggregate_mut(&mut self) -> Option<&mut dyn DictAggregate> {
        None
    }
}

/// Always returns the same precomputed value.
pub struct InstanceResolver {
    value: AnyArc,
}

impl InstanceResolver {
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self { value: erase(value) }
    }

    /// Wrap a value that is already erased.
    pub fn from_erased(value: AnyArc) -> Self {
        Self { value }
    }
}

impl Resolver for InstanceResolver {
    fn resolve(&self, _: &Injector, _: &mut ResolutionStack) -> DiResult<AnyArc> {
        Ok(self.value.clone())
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Instance
    }
}

type Cast = Box<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;

/// Forwards resolution to another key, optionally converting the result.
pub struct DelegatedResolver {
    target: BindingKey,
    cast: Option<Cast>,
}

impl DelegatedResolver {
    /// Alias whose target already resolves to the requested type.
    pub fn new(target: BindingKey) -> Self {
        Self { target, cast: None }
    }

    /// Alias to `U`'s binding, converting `Arc<U>` into `Arc<T>` (typically an
    /// unsizing coercion to a trait object).
    pub fn with_cast<U, T, F>(target: BindingKey, cast: F) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<U>) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            target,
            cast: Some(Box::new(move |value| Ok(erase(cast(downcast::<U>(&value)?))))),
        }
    }

    pub fn target(&self) -> &BindingKey {
        &self.target
    }
}

impl Resolver for DelegatedResolver {
    fn resolve(&self, injector: &Injector, stack: &mut ResolutionStack) -> DiResult<AnyArc> {
        let value = injector.get_instance_internal(&self.target, stack)?;
        match &self.cast {
            Some(cast) => cast(value),
            None => Ok(value),
        }
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Delegated
    }
}
