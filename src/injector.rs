//! The resolution engine.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::binder::Binder;
use crate::descriptors::BindingDescriptor;
use crate::error::{DiError, DiResult};
use crate::injectable::InjectableRegistry;
use crate::internal::in_flight::InFlight;
use crate::internal::{downcast, AnyArc, BindingMap, ResolutionStack};
use crate::key::{BindingKey, DictKey, DictOf};
use crate::provider::InjectorProvider;
use crate::resolver::Resolver;

/// Resolves values from a frozen set of bindings.
///
/// Created by [`Binder::build`]. Cloning is cheap and clones share the same
/// bindings and memoized values. The only mutation after construction is
/// auto-registration of [`Injectable`](crate::Injectable) types found in the
/// registry, which is serialized by an internal lock.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Binder, DiResult};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut binder = Binder::new();
/// binder.bind::<English>().to_instance(English)?;
/// binder.bind::<dyn Greeter>().to_type::<English, _>(|e| e as Arc<dyn Greeter>)?;
/// binder.bind::<String>().with_tag("name").to_instance("world".to_string())?;
///
/// let injector = binder.build();
/// assert_eq!(injector.get_instance::<dyn Greeter>()?.greet(), "hello");
/// assert_eq!(injector.get_tagged::<String>("name")?.as_str(), "world");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

struct InjectorInner {
    bindings: Mutex<BindingMap<Arc<dyn Resolver>>>,
    registry: Arc<InjectableRegistry>,
    in_flight: InFlight,
}

impl Injector {
    /// Freeze `binder`'s bindings, falling back to the global injectable
    /// registry for unbound types.
    pub fn new(binder: Binder) -> Self {
        Self::with_registry(binder, InjectableRegistry::global())
    }

    /// Freeze `binder`'s bindings with an explicit injectable registry.
    pub fn with_registry(binder: Binder, registry: Arc<InjectableRegistry>) -> Self {
        let bindings: BindingMap<Arc<dyn Resolver>> = binder
            .into_bindings()
            .into_iter()
            .map(|(key, resolver)| (key, Arc::from(resolver)))
            .collect();
        debug!(bindings = bindings.len(), "Injector created");
        Self {
            inner: Arc::new(InjectorInner {
                bindings: Mutex::new(bindings),
                registry,
                in_flight: InFlight::new(),
            }),
        }
    }

    /// Resolve the untagged binding of `T`.
    pub fn get_instance<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let value = self.resolve_key(&BindingKey::of::<T>())?;
        downcast::<T>(&value)
    }

    pub fn get_tagged<T: ?Sized + Send + Sync + 'static>(&self, tag: &str) -> DiResult<Arc<T>> {
        let value = self.resolve_key(&BindingKey::tagged::<T>(tag)?)?;
        downcast::<T>(&value)
    }

    /// Provider for the untagged binding of `T`. Nothing is resolved until
    /// the provider's `get`.
    pub fn get_provider<T: ?Sized + Send + Sync + 'static>(&self) -> InjectorProvider<T> {
        InjectorProvider::new(self.clone(), BindingKey::of::<T>())
    }

    pub fn get_tagged_provider<T: ?Sized + Send + Sync + 'static>(
        &self,
        tag: &str,
    ) -> DiResult<InjectorProvider<T>> {
        Ok(InjectorProvider::new(self.clone(), BindingKey::tagged::<T>(tag)?))
    }

    /// The assembled dict multibinding `DictOf<K, V>`.
    pub fn get_dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> DiResult<Arc<DictOf<K, V>>> {
        let value = self.resolve_key(&BindingKey::dict::<K, V>(None))?;
        downcast::<DictOf<K, V>>(&value)
    }

    pub fn get_tagged_dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(
        &self,
        tag: &str,
    ) -> DiResult<Arc<DictOf<K, V>>> {
        let key = BindingKey::dict::<K, V>(None).with_tag(crate::key::Tag::new(tag)?)?;
        let value = self.resolve_key(&key)?;
        downcast::<DictOf<K, V>>(&value)
    }

    /// Type-erased resolution of `key` with a fresh resolution stack.
    pub fn resolve_key(&self, key: &BindingKey) -> DiResult<AnyArc> {
        let mut stack = ResolutionStack::new();
        self.get_instance_internal(key, &mut stack)
    }

    /// Recursive core used by resolvers: detect cycles, look up (or
    /// auto-register) the resolver, and run it with `key` on the stack.
    pub fn get_instance_internal(
        &self,
        key: &BindingKey,
        stack: &mut ResolutionStack,
    ) -> DiResult<AnyArc> {
        if let Err(err) = stack.enter(key) {
            if let DiError::Circular(_) = &err {
                debug!(key = %key, error = %err, "Circular dependency detected");
            }
            return Err(err);
        }
        trace!(key = %key, depth = stack.len(), "Resolving");

        let result = self
            .get_resolver(key)
            .and_then(|resolver| resolver.resolve(self, stack));

        stack.leave();
        result
    }

    fn get_resolver(&self, key: &BindingKey) -> DiResult<Arc<dyn Resolver>> {
        let mut bindings = self.inner.bindings.lock();
        if let Some(resolver) = bindings.get(key) {
            return Ok(resolver.clone());
        }

        if let Some(ty) = key.untagged_type() {
            if let Some(resolver) = self.inner.registry.create_resolver(ty)? {
                debug!(key = %key, "Auto-registering injectable");
                let resolver: Arc<dyn Resolver> = Arc::from(resolver);
                bindings.insert(key.clone(), resolver.clone());
                return Ok(resolver);
            }
        }

        Err(DiError::Unresolved(key.clone()))
    }

    pub(crate) fn in_flight(&self) -> &InFlight {
        &self.inner.in_flight
    }

    /// Whether `key` has a resolver, bound or auto-registered so far.
    pub fn contains(&self, key: &BindingKey) -> bool {
        self.inner.bindings.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.bindings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptors of every current binding, ordered by key.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        let bindings = self.inner.bindings.lock();
        BindingDescriptor::collect(bindings.iter().map(|(k, r)| (k, r.kind())))
    }

    /// Multi-line dump of every binding, for troubleshooting wiring.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut out = String::from("Injector bindings:\n");
        for descriptor in self.descriptors() {
            out.push_str(&format!("  {} => {}\n", descriptor.key, descriptor.kind));
        }
        out
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("bindings", &self.len())
            .finish()
    }
}
