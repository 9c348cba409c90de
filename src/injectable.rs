//! Self-describing types and the registry behind auto-registration.
//!
//! A type implementing [`Injectable`] knows how to build itself from injected
//! arguments. Registering it in an [`InjectableRegistry`] lets an injector
//! resolve the type's untagged key even when no binding was declared for it.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::debug;

use crate::binder::{Binder, Module};
use crate::error::DiResult;
use crate::factory::{factory_resolver, AssistedFactory, AssistedInjectable};
use crate::key::{BindingKey, TypeDescriptor};
use crate::resolver::{Args, ConstructorResolver, MemoizedResolver, Resolver};
use crate::signature::Signature;

/// A type that can construct itself from injected dependencies.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Args, Binder, DiResult, Injectable, Signature};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     const MEMOIZED: bool = true;
///     fn signature() -> Signature { Signature::new() }
///     fn construct(_: &Args<'_>) -> DiResult<Self> { Ok(Clock) }
/// }
///
/// struct Scheduler { clock: Arc<Clock> }
/// impl Injectable for Scheduler {
///     fn signature() -> Signature { Signature::new().value::<Clock>("clock") }
///     fn construct(args: &Args<'_>) -> DiResult<Self> {
///         Ok(Scheduler { clock: args.value("clock")? })
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut binder = Binder::new();
/// binder.install_class::<Clock>()?.install_class::<Scheduler>()?;
/// let injector = binder.build();
///
/// let a = injector.get_instance::<Scheduler>()?;
/// let b = injector.get_instance::<Scheduler>()?;
/// assert!(Arc::ptr_eq(&a.clock, &b.clock));
/// # Ok(())
/// # }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Whether the type's binding caches its first instance.
    const MEMOIZED: bool = false;

    fn signature() -> Signature;

    fn construct(args: &Args<'_>) -> DiResult<Self>;

    /// The resolver used for the type's untagged binding.
    fn create_resolver() -> DiResult<Box<dyn Resolver>> {
        let constructor = ConstructorResolver::from_source(&Self::signature(), Self::construct)?;
        if Self::MEMOIZED {
            Ok(Box::new(MemoizedResolver::new(Box::new(constructor))))
        } else {
            Ok(Box::new(constructor))
        }
    }
}

/// Module binding an [`Injectable`] under its untagged key.
pub struct ClassModule<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> ClassModule<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T: Injectable> Default for ClassModule<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Injectable> Module for ClassModule<T> {
    fn configure(&self, binder: &mut Binder) -> DiResult<()> {
        binder.add_binding(BindingKey::of::<T>(), T::create_resolver()?)?;
        Ok(())
    }
}

type ResolverFactory = fn() -> DiResult<Box<dyn Resolver>>;

static GLOBAL: OnceCell<Arc<InjectableRegistry>> = OnceCell::new();

/// Explicit mapping from types to the resolvers an injector synthesizes for
/// them on first use.
#[derive(Default)]
pub struct InjectableRegistry {
    factories: RwLock<HashMap<TypeDescriptor, ResolverFactory>>,
}

impl InjectableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`Binder::build`].
    pub fn global() -> Arc<InjectableRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(InjectableRegistry::new()))
            .clone()
    }

    /// Make `T` auto-injectable. The signature is validated now, so a bad
    /// declaration fails here rather than on first resolution.
    pub fn register<T: Injectable>(&self) -> DiResult<()> {
        T::create_resolver()?;
        self.insert(TypeDescriptor::of::<T>(), T::create_resolver);
        Ok(())
    }

    /// Make `AssistedFactory<T>` auto-injectable.
    pub fn register_factory<T: AssistedInjectable>(&self) -> DiResult<()> {
        factory_resolver::<T>()?;
        self.insert(TypeDescriptor::of::<AssistedFactory<T>>(), factory_resolver::<T>);
        Ok(())
    }

    fn insert(&self, ty: TypeDescriptor, factory: ResolverFactory) {
        debug!(ty = %ty, "Injectable registered");
        self.factories.write().insert(ty, factory);
    }

    pub fn is_injectable(&self, ty: TypeDescriptor) -> bool {
        self.factories.read().contains_key(&ty)
    }

    /// A new resolver for `ty`, or `None` when the type is not registered.
    pub fn create_resolver(&self, ty: TypeDescriptor) -> DiResult<Option<Box<dyn Resolver>>> {
        let factory = self.factories.read().get(&ty).copied();
        factory.map(|f| f()).transpose()
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InjectableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectableRegistry")
            .field("types", &self.len())
            .finish()
    }
}

/// Register `T` in the global registry.
pub fn register_injectable<T: Injectable>() -> DiResult<()> {
    InjectableRegistry::global().register::<T>()
}
