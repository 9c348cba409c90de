//! Assisted injection: factories that combine caller-supplied parameters
//! with injected dependencies.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binder::{Binder, Module};
use crate::error::DiResult;
use crate::injector::Injector;
use crate::key::BindingKey;
use crate::resolver::{Args, ConstructorResolver, Resolver};
use crate::signature::{DependencySource, ParamBinding, Signature};

/// A type built from runtime parameters plus injected dependencies.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Args, AssistedFactory, AssistedInjectable, Binder, DiResult, Signature};
/// use std::sync::Arc;
///
/// struct Endpoint { base: String }
///
/// struct Request { url: String }
///
/// impl AssistedInjectable for Request {
///     type Params = &'static str;
///
///     fn signature() -> Signature {
///         Signature::new().value::<Endpoint>("endpoint")
///     }
///
///     fn construct(path: &'static str, args: &Args<'_>) -> DiResult<Self> {
///         let endpoint: Arc<Endpoint> = args.value("endpoint")?;
///         Ok(Request { url: format!("{}{}", endpoint.base, path) })
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut binder = Binder::new();
/// binder.bind::<Endpoint>().to_instance(Endpoint { base: "https://api".into() })?;
/// binder.install_factory::<Request>()?;
///
/// let factory = binder.build().get_instance::<AssistedFactory<Request>>()?;
/// assert_eq!(factory.create("/users")?.url, "https://api/users");
/// # Ok(())
/// # }
/// ```
pub trait AssistedInjectable: Sized + Send + Sync + 'static {
    /// Arguments supplied by the caller of [`AssistedFactory::create`].
    type Params;

    /// The injected part of the constructor.
    fn signature() -> Signature;

    fn construct(params: Self::Params, args: &Args<'_>) -> DiResult<Self>;
}

/// Creates `T` on demand. Injected dependencies are resolved on each
/// [`create`](Self::create) call, never when the factory itself is built.
pub struct AssistedFactory<T> {
    injector: Injector,
    deps: Arc<[ParamBinding]>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AssistedInjectable> AssistedFactory<T> {
    pub fn create(&self, params: T::Params) -> DiResult<T> {
        let args = Args::collect(&self.injector, &self.deps, |key| {
            self.injector.resolve_key(key)
        })?;
        T::construct(params, &args)
    }

    /// The injected parameters, in declaration order.
    pub fn dependencies(&self) -> &[ParamBinding] {
        &self.deps
    }
}

impl<T> fmt::Debug for AssistedFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistedFactory")
            .field("type", &std::any::type_name::<T>())
            .field("deps", &self.deps.len())
            .finish()
    }
}

pub(crate) fn factory_resolver<T: AssistedInjectable>() -> DiResult<Box<dyn Resolver>> {
    let deps: Arc<[ParamBinding]> = T::signature().dependencies()?.into();
    Ok(Box::new(ConstructorResolver::new(
        Vec::new(),
        move |args: &Args<'_>| {
            Ok(AssistedFactory::<T> {
                injector: args.injector().clone(),
                deps: deps.clone(),
                _marker: PhantomData,
            })
        },
    )))
}

/// Module binding `AssistedFactory<T>`.
pub(crate) struct FactoryModule<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: AssistedInjectable> FactoryModule<T> {
    pub(crate) fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T: AssistedInjectable> Module for FactoryModule<T> {
    fn configure(&self, binder: &mut Binder) -> DiResult<()> {
        binder.add_binding(BindingKey::of::<AssistedFactory<T>>(), factory_resolver::<T>()?)?;
        Ok(())
    }
}
