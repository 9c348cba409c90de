//! # ferrous-inject
//!
//! Thread-safe object-graph injection for Rust: declare bindings from keys to
//! construction strategies, then let an [`Injector`] build and wire values on
//! demand.
//!
//! ## Features
//!
//! - **Keyed bindings**: a type, optionally qualified by a tag
//! - **Strategies**: fixed instances, aliases, constructors and memoized constructors
//! - **Dict multibindings**: contributions collected into a `HashMap`
//! - **Deferred access**: providers and one-shot [`Lazy`] values
//! - **Cycle detection**: circular graphs fail with the full key chain
//! - **Self-describing types**: [`Injectable`] types bind themselves
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{Args, Binder, DiResult, Signature};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! # fn main() -> DiResult<()> {
//! let mut binder = Binder::new();
//! binder.bind::<Database>().to_instance(Database {
//!     url: "postgres://localhost".to_string(),
//! })?;
//! binder.bind::<UserService>().to_constructor(
//!     &Signature::new().value::<Database>("db"),
//!     |args: &Args<'_>| Ok(UserService { db: args.value("db")? }),
//! )?;
//!
//! let injector = binder.build();
//! let users = injector.get_instance::<UserService>()?;
//! assert_eq!(users.db.url, "postgres://localhost");
//! # Ok(())
//! # }
//! ```
//!
//! ## Dict Multibindings
//!
//! ```rust
//! use ferrous_inject::{Binder, DiResult};
//!
//! # fn main() -> DiResult<()> {
//! let mut binder = Binder::new();
//! binder.install_dict::<String, u32>()?;
//! binder.bind_to_dict::<String, u32>().with_key("a").to_instance(1)?;
//! binder.bind_to_dict::<String, u32>().with_key("b").to_instance(2)?;
//!
//! let dict = binder.build().get_dict::<String, u32>()?;
//! assert_eq!(*dict["a"], 1);
//! assert_eq!(*dict["b"], 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for configuration and cycle
//! detection, `trace` for each resolution step). Install any subscriber to
//! see them.

// Module declarations
pub mod binder;
pub mod descriptors;
pub mod error;
pub mod factory;
pub mod injectable;
pub mod injector;
pub mod key;
pub mod monitor;
pub mod provider;
pub mod resolver;
pub mod signature;

// Internal modules
mod internal;

// Re-exports
pub use binder::{create_injector, Binder, BindingBuilder, Module, ModuleId};
pub use descriptors::BindingDescriptor;
pub use error::{DiError, DiResult};
pub use factory::{AssistedFactory, AssistedInjectable};
pub use injectable::{register_injectable, ClassModule, Injectable, InjectableRegistry};
pub use injector::Injector;
pub use internal::{downcast, erase, AnyArc, ResolutionStack, MAX_DEPTH};
pub use key::{
    BindingKey, DictElementKey, DictKey, DictKeyKind, DictOf, DictType, Discriminator, SimpleKey,
    Tag, TypeDescriptor,
};
pub use monitor::{ReadGuard, ReadWriteMonitor, ReentrantAccess, WriteGuard};
pub use provider::{InjectorProvider, InstanceProvider, Lazy, Provider};
pub use resolver::{
    Arg, Args, ConstructorResolver, DelegatedResolver, DictAggregate, DictResolver,
    InstanceResolver, MemoizedResolver, Resolver, ResolverKind,
};
pub use signature::{AccessMode, Dependency, DependencySource, ParamBinding, Signature};
