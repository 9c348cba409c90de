//! Module system for grouped, idempotent binding registration.

use std::fmt;
use std::sync::Arc;

use crate::binder::Binder;
use crate::error::DiResult;
use crate::key::TypeDescriptor;

/// A unit of configuration that contributes bindings to a [`Binder`].
///
/// A binder installs each module identity at most once; installing it again
/// is a silent no-op. The default identity is the module's type, so two
/// values of one module type count as the same module unless
/// [`identity`](Module::identity) is overridden.
///
/// # Example
///
/// ```rust
/// use ferrous_inject::{Binder, DiResult, Module};
///
/// struct Settings { retries: u32 }
///
/// struct SettingsModule;
///
/// impl Module for SettingsModule {
///     fn configure(&self, binder: &mut Binder) -> DiResult<()> {
///         binder.bind::<Settings>().to_instance(Settings { retries: 3 })?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut binder = Binder::new();
/// binder.install_module(SettingsModule)?;
/// // Same identity: skipped instead of failing with a duplicate binding.
/// binder.install_module(SettingsModule)?;
///
/// let injector = binder.build();
/// assert_eq!(injector.get_instance::<Settings>()?.retries, 3);
/// # Ok(())
/// # }
/// ```
pub trait Module: 'static {
    /// Register this module's bindings (and install any modules it needs).
    fn configure(&self, binder: &mut Binder) -> DiResult<()>;

    fn identity(&self) -> ModuleId {
        ModuleId::of::<Self>()
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum ModuleIdRepr {
    Type(TypeDescriptor),
    Named(TypeDescriptor, Arc<str>),
}

/// Identity under which a module is installed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ModuleId(ModuleIdRepr);

impl ModuleId {
    pub fn of<M: ?Sized + 'static>() -> Self {
        ModuleId(ModuleIdRepr::Type(TypeDescriptor::of::<M>()))
    }

    /// Identity distinguishing several configurations of one module type.
    pub fn named<M: ?Sized + 'static>(name: impl AsRef<str>) -> Self {
        ModuleId(ModuleIdRepr::Named(
            TypeDescriptor::of::<M>(),
            Arc::from(name.as_ref()),
        ))
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ModuleIdRepr::Type(ty) => write!(f, "{}", ty),
            ModuleIdRepr::Named(ty, name) => write!(f, "{}({})", ty, name),
        }
    }
}

/// Build an injector from a list of modules.
///
/// ```rust
/// use ferrous_inject::{create_injector, Binder, DiResult, Module};
///
/// struct Answer;
/// impl Module for Answer {
///     fn configure(&self, binder: &mut Binder) -> DiResult<()> {
///         binder.bind::<u64>().to_instance(42)?;
///         Ok(())
///     }
/// }
///
/// let injector = create_injector(vec![Box::new(Answer)]).unwrap();
/// assert_eq!(*injector.get_instance::<u64>().unwrap(), 42);
/// ```
pub fn create_injector(modules: Vec<Box<dyn Module>>) -> DiResult<crate::Injector> {
    let mut binder = Binder::new();
    for module in modules {
        binder.install_boxed(module)?;
    }
    Ok(binder.build())
}
