use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::injector::Injector;
use crate::internal::{downcast, erase, AnyArc, ResolutionStack};
use crate::key::BindingKey;
use crate::provider::{InjectorProvider, Lazy};
use crate::resolver::{Resolver, ResolverKind};
use crate::signature::{AccessMode, DependencySource, ParamBinding};

/// One named argument handed to a constructor factory.
pub enum Arg {
    /// Resolved before the factory ran.
    Value(AnyArc),
    /// Not resolved; the factory receives a provider or lazy for the key.
    Deferred(BindingKey, AccessMode),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(_) => f.write_str("Value(..)"),
            Arg::Deferred(key, mode) => write!(f, "Deferred({}, {:?})", key, mode),
        }
    }
}

/// Named argument bundle received by a constructor factory.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Args, Binder, DiResult, Signature};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Client { config: Arc<Config> }
///
/// # fn main() -> DiResult<()> {
/// let mut binder = Binder::new();
/// binder.bind::<Config>().to_instance(Config { url: "db://local".into() })?;
/// binder.bind::<Client>().to_constructor(
///     &Signature::new().value::<Config>("config"),
///     |args: &Args<'_>| Ok(Client { config: args.value("config")? }),
/// )?;
///
/// let client = binder.build().get_instance::<Client>()?;
/// assert_eq!(client.config.url, "db://local");
/// # Ok(())
/// # }
/// ```
pub struct Args<'a> {
    injector: &'a Injector,
    entries: Vec<(String, Arg)>,
}

impl<'a> Args<'a> {
    pub fn new(injector: &'a Injector, entries: Vec<(String, Arg)>) -> Self {
        Self { injector, entries }
    }

    /// Build the bundle for `params`, resolving value-mode entries through
    /// `resolve` and deferring the rest.
    pub(crate) fn collect(
        injector: &'a Injector,
        params: &[ParamBinding],
        mut resolve: impl FnMut(&BindingKey) -> DiResult<AnyArc>,
    ) -> DiResult<Self> {
        let mut entries = Vec::with_capacity(params.len());
        for param in params {
            let key = param.dependency.key();
            let arg = match param.dependency.mode() {
                AccessMode::Value => Arg::Value(resolve(key)?),
                mode => Arg::Deferred(key.clone(), mode),
            };
            entries.push((param.name.clone(), arg));
        }
        Ok(Self::new(injector, entries))
    }

    fn entry(&self, name: &str) -> DiResult<&Arg> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, arg)| arg)
            .ok_or_else(|| DiError::configuration(format!("no argument named `{}`", name)))
    }

    fn deferred(&self, name: &str, wanted: AccessMode) -> DiResult<&BindingKey> {
        match self.entry(name)? {
            Arg::Deferred(key, mode) if *mode == wanted => Ok(key),
            other => Err(DiError::configuration(format!(
                "argument `{}` was requested as {:?} but is {:?}",
                name, wanted, other
            ))),
        }
    }

    /// A value-mode argument.
    pub fn value<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        match self.entry(name)? {
            Arg::Value(value) => downcast::<T>(value),
            other => Err(DiError::configuration(format!(
                "argument `{}` was requested as a value but is {:?}",
                name, other
            ))),
        }
    }

    /// A provider-mode argument.
    pub fn provider<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> DiResult<InjectorProvider<T>> {
        let key = self.deferred(name, AccessMode::Provider)?;
        Ok(InjectorProvider::new(self.injector.clone(), key.clone()))
    }

    /// A lazy-mode argument.
    pub fn lazy<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Lazy<T>> {
        let key = self.deferred(name, AccessMode::Lazy)?;
        Ok(Lazy::new(InjectorProvider::<T>::new(
            self.injector.clone(),
            key.clone(),
        )))
    }

    pub fn injector(&self) -> &'a Injector {
        self.injector
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type Factory = Box<dyn Fn(&Args<'_>) -> DiResult<AnyArc> + Send + Sync>;

/// Builds a fresh value on every resolution from a factory and its ordered
/// parameter bindings.
pub struct ConstructorResolver {
    params: Vec<ParamBinding>,
    factory: Factory,
}

impl ConstructorResolver {
    pub fn new<T, F>(params: Vec<ParamBinding>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            params,
            factory: Box::new(move |args| Ok(erase(Arc::new(factory(args)?)))),
        }
    }

    /// Factory returning an already shared (possibly unsized) value.
    pub fn shared<T, F>(params: Vec<ParamBinding>, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Args<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            params,
            factory: Box::new(move |args| Ok(erase(factory(args)?))),
        }
    }

    /// Derive the parameters from `source`, failing on a bad declaration.
    pub fn from_source<S, T, F>(source: &S, factory: F) -> DiResult<Self>
    where
        S: DependencySource + ?Sized,
        T: Send + Sync + 'static,
        F: Fn(&Args<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Ok(Self::new(source.dependencies()?, factory))
    }

    pub fn params(&self) -> &[ParamBinding] {
        &self.params
    }
}

impl Resolver for ConstructorResolver {
    fn resolve(&self, injector: &Injector, stack: &mut ResolutionStack) -> DiResult<AnyArc> {
        let args = Args::collect(injector, &self.params, |key| {
            injector.get_instance_internal(key, stack)
        })?;
        (self.factory)(&args)
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Constructor
    }
}
