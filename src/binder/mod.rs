//! Binding registration.
//!
//! A [`Binder`] collects bindings from code and [`Module`]s, then freezes them
//! into an [`Injector`] with [`Binder::build`].

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::descriptors::BindingDescriptor;
use crate::error::{DiError, DiResult};
use crate::factory::{AssistedInjectable, FactoryModule};
use crate::injectable::{ClassModule, Injectable};
use crate::injector::Injector;
use crate::internal::BindingMap;
use crate::key::{BindingKey, DictKey, DictType, Discriminator, Tag, TypeDescriptor};
use crate::resolver::{
    Args, ConstructorResolver, DelegatedResolver, DictResolver, InstanceResolver,
    MemoizedResolver, Resolver,
};
use crate::signature::DependencySource;

pub mod module_system;

pub use module_system::{create_injector, Module, ModuleId};

/// Mutable registry of bindings, used at configuration time only.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Args, Binder, DiResult, Signature};
/// use std::sync::Arc;
///
/// struct Pool { size: u32 }
/// struct Repo { pool: Arc<Pool> }
///
/// # fn main() -> DiResult<()> {
/// let mut binder = Binder::new();
/// binder
///     .bind::<Pool>()
///     .with_memoization()
///     .to_constructor(&Signature::new(), |_| Ok(Pool { size: 4 }))?;
/// binder.bind::<Repo>().to_constructor(
///     &Signature::new().value::<Pool>("pool"),
///     |args: &Args<'_>| Ok(Repo { pool: args.value("pool")? }),
/// )?;
///
/// let injector = binder.build();
/// let a = injector.get_instance::<Repo>()?;
/// let b = injector.get_instance::<Repo>()?;
/// assert!(!Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&a.pool, &b.pool));
/// assert_eq!(a.pool.size, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Binder {
    bindings: BindingMap<Box<dyn Resolver>>,
    installed_modules: HashSet<ModuleId>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a binding for `T`.
    pub fn bind<T: ?Sized + Send + Sync + 'static>(&mut self) -> BindingBuilder<'_, T> {
        BindingBuilder::new(self, Subject::Simple)
    }

    /// Start a contribution of one `V` to the dict `DictOf<K, V>`.
    ///
    /// The dict must already be installed with [`install_dict`](Self::install_dict)
    /// (or its tagged variant) and the contribution needs
    /// [`with_key`](BindingBuilder::with_key).
    pub fn bind_to_dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> BindingBuilder<'_, V> {
        BindingBuilder::new(
            self,
            Subject::DictElement {
                dict: DictType::of::<K, V>(),
                discriminator: None,
            },
        )
    }

    /// Seed the untagged dict `DictOf<K, V>`. Installing it again is a no-op.
    pub fn install_dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> DiResult<&mut Self> {
        self.seed_dict::<K, V>(None)
    }

    pub fn install_tagged_dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(
        &mut self,
        tag: &str,
    ) -> DiResult<&mut Self> {
        self.seed_dict::<K, V>(Some(Tag::new(tag)?))
    }

    fn seed_dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(
        &mut self,
        tag: Option<Tag>,
    ) -> DiResult<&mut Self> {
        let key = BindingKey::dict::<K, V>(tag.clone());
        if let Some(existing) = self.bindings.get(&key) {
            if existing.as_dict_aggregate().is_none() {
                return Err(DiError::DuplicateBinding(key));
            }
            return Ok(self);
        }
        debug!(key = %key, "Dict installed");
        self.bindings
            .insert(key, Box::new(DictResolver::<K, V>::new(tag)));
        Ok(self)
    }

    /// Register `resolver` under `key`.
    ///
    /// A dict element key is first recorded in its dict's aggregate, which
    /// must already be installed and rejects a repeated discriminator as a
    /// configuration error.
    pub fn add_binding(
        &mut self,
        key: BindingKey,
        resolver: Box<dyn Resolver>,
    ) -> DiResult<&mut Self> {
        if let BindingKey::DictElement(element) = &key {
            let container = BindingKey::from(element.container_key());
            let aggregate = self
                .bindings
                .get_mut(&container)
                .and_then(|r| r.as_dict_aggregate_mut())
                .ok_or_else(|| {
                    DiError::configuration(format!(
                        "dict {} must be installed before contributing {}",
                        container, key
                    ))
                })?;
            aggregate.add_key(element.clone())?;
        } else if self.bindings.contains_key(&key) {
            return Err(DiError::DuplicateBinding(key));
        }

        debug!(key = %key, kind = %resolver.kind(), "Binding registered");
        self.bindings.insert(key, resolver);
        Ok(self)
    }

    /// Install `module` unless a module with the same identity already is.
    pub fn install_module<M: Module>(&mut self, module: M) -> DiResult<&mut Self> {
        self.install_dyn(&module)
    }

    pub fn install_boxed(&mut self, module: Box<dyn Module>) -> DiResult<&mut Self> {
        self.install_dyn(module.as_ref())
    }

    fn install_dyn(&mut self, module: &dyn Module) -> DiResult<&mut Self> {
        let id = module.identity();
        if !self.installed_modules.insert(id.clone()) {
            debug!(module = %id, "Module already installed");
            return Ok(self);
        }
        debug!(module = %id, "Installing module");
        if let Err(err) = module.configure(self) {
            self.installed_modules.remove(&id);
            return Err(err);
        }
        Ok(self)
    }

    /// Bind an [`Injectable`] type through its [`ClassModule`].
    pub fn install_class<T: Injectable>(&mut self) -> DiResult<&mut Self> {
        self.install_module(ClassModule::<T>::new())
    }

    /// Bind [`AssistedFactory<T>`](crate::AssistedFactory).
    pub fn install_factory<T: AssistedInjectable>(&mut self) -> DiResult<&mut Self> {
        self.install_module(FactoryModule::<T>::new())
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn is_installed(&self, id: &ModuleId) -> bool {
        self.installed_modules.contains(id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        BindingDescriptor::collect(self.bindings.iter().map(|(k, r)| (k, r.kind())))
    }

    /// Freeze the bindings into an injector backed by the global injectable
    /// registry.
    pub fn build(self) -> Injector {
        Injector::new(self)
    }

    pub(crate) fn into_bindings(self) -> BindingMap<Box<dyn Resolver>> {
        self.bindings
    }
}

enum Subject {
    Simple,
    DictElement {
        dict: DictType,
        discriminator: Option<Discriminator>,
    },
}

/// Fluent builder for one binding, returned by [`Binder::bind`] and
/// [`Binder::bind_to_dict`].
///
/// Modifiers record misuse and the terminal method reports it, so a chain
/// has a single `?` at its end. Terminals consume the builder.
#[must_use = "a binding is only registered by a terminal method such as `to_instance`"]
pub struct BindingBuilder<'a, T: ?Sized> {
    binder: &'a mut Binder,
    subject: Subject,
    tag: Option<Tag>,
    memoize: bool,
    error: Option<DiError>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<'a, T: ?Sized + Send + Sync + 'static> BindingBuilder<'a, T> {
    fn new(binder: &'a mut Binder, subject: Subject) -> Self {
        Self {
            binder,
            subject,
            tag: None,
            memoize: false,
            error: None,
            _marker: PhantomData,
        }
    }

    fn fail(mut self, err: DiError) -> Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        if self.tag.is_some() {
            return self.fail(DiError::configuration("binding is already tagged"));
        }
        match Tag::new(tag) {
            Ok(tag) => {
                self.tag = Some(tag);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Cache the first successful result for the injector's lifetime.
    pub fn with_memoization(mut self) -> Self {
        if self.memoize {
            return self.fail(DiError::configuration("binding is already memoized"));
        }
        self.memoize = true;
        self
    }

    /// Discriminator of a dict contribution.
    pub fn with_key(mut self, discriminator: impl Into<Discriminator>) -> Self {
        match &mut self.subject {
            Subject::DictElement { discriminator: slot @ None, .. } => {
                *slot = Some(discriminator.into());
                self
            }
            Subject::DictElement { .. } => {
                self.fail(DiError::configuration("dict key is already set"))
            }
            Subject::Simple => self.fail(DiError::configuration(
                "with_key applies only to dict contributions",
            )),
        }
    }

    /// Bind to a fixed shared value.
    pub fn to_shared(self, value: Arc<T>) -> DiResult<&'a mut Binder> {
        if self.memoize {
            return Err(DiError::configuration(
                "instance bindings cannot be memoized",
            ));
        }
        self.finish(Box::new(InstanceResolver::new(value)))
    }

    /// Alias to the untagged binding of `U`, converting its value with `cast`.
    pub fn to_type<U, F>(self, cast: F) -> DiResult<&'a mut Binder>
    where
        U: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<U>) -> Arc<T> + Send + Sync + 'static,
    {
        let resolver = DelegatedResolver::with_cast::<U, T, F>(BindingKey::of::<U>(), cast);
        self.finish(Box::new(resolver))
    }

    /// Alias to the binding of `T` under `target` tag.
    pub fn to_tagged(self, target: &str) -> DiResult<&'a mut Binder> {
        let key = match BindingKey::tagged::<T>(target) {
            Ok(key) => key,
            Err(err) => return Err(self.error.unwrap_or(err)),
        };
        self.finish(Box::new(DelegatedResolver::new(key)))
    }

    pub fn to_resolver(self, resolver: impl Resolver + 'static) -> DiResult<&'a mut Binder> {
        self.finish(Box::new(resolver))
    }

    /// Bind to a factory returning a shared value, with parameters derived
    /// from `source`.
    pub fn to_shared_constructor<S, F>(self, source: &S, factory: F) -> DiResult<&'a mut Binder>
    where
        S: DependencySource + ?Sized,
        F: Fn(&Args<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let params = match source.dependencies() {
            Ok(params) => params,
            Err(err) => return Err(self.error.unwrap_or(err)),
        };
        self.finish(Box::new(ConstructorResolver::shared(params, factory)))
    }

    fn finish(self, resolver: Box<dyn Resolver>) -> DiResult<&'a mut Binder> {
        let BindingBuilder {
            binder,
            subject,
            tag,
            memoize,
            error,
            ..
        } = self;
        if let Some(err) = error {
            return Err(err);
        }
        let key = match subject {
            Subject::Simple => BindingKey::simple(TypeDescriptor::of::<T>(), tag),
            Subject::DictElement { dict, discriminator } => {
                let discriminator = discriminator.ok_or_else(|| {
                    DiError::configuration(format!(
                        "dict contribution to {} needs with_key",
                        dict.map()
                    ))
                })?;
                BindingKey::dict_element(dict, discriminator, tag)?
            }
        };
        let resolver: Box<dyn Resolver> = if memoize {
            Box::new(MemoizedResolver::new(resolver))
        } else {
            resolver
        };
        binder.add_binding(key, resolver)
    }
}

impl<'a, T: Send + Sync + 'static> BindingBuilder<'a, T> {
    /// Bind to a fixed value.
    pub fn to_instance(self, value: T) -> DiResult<&'a mut Binder> {
        self.to_shared(Arc::new(value))
    }

    /// Bind to a factory producing a fresh `T` per resolution (or once, with
    /// memoization), with parameters derived from `source`.
    pub fn to_constructor<S, F>(self, source: &S, factory: F) -> DiResult<&'a mut Binder>
    where
        S: DependencySource + ?Sized,
        F: Fn(&Args<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let params = match source.dependencies() {
            Ok(params) => params,
            Err(err) => return Err(self.error.unwrap_or(err)),
        };
        self.finish(Box::new(ConstructorResolver::new(params, factory)))
    }
}

impl<T: ?Sized> std::fmt::Debug for BindingBuilder<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingBuilder")
            .field("type", &std::any::type_name::<T>())
            .field("tag", &self.tag)
            .field("memoize", &self.memoize)
            .finish()
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("bindings", &self.bindings.len())
            .field("installed_modules", &self.installed_modules.len())
            .finish()
    }
}
