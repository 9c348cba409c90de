//! Dependency derivation: turning a constructor's declared parameters into
//! `(name, key, access mode)` triples.
//!
//! The resolution engine never inspects types on its own. A constructor
//! describes what it needs through a [`DependencySource`], usually a
//! [`Signature`] built with the typed helpers below.

use std::collections::HashSet;

use crate::error::{DiError, DiResult};
use crate::key::{BindingKey, DictKey, Tag};

/// How a constructor wants a dependency delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Resolved before the constructor runs.
    Value,
    /// Handed over as a provider; resolved afresh on each `get`.
    Provider,
    /// Handed over as a `Lazy`; resolved on first `get` and cached.
    Lazy,
}

/// A binding key together with the access mode it is requested in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    key: BindingKey,
    mode: AccessMode,
}

impl Dependency {
    pub fn of(key: BindingKey, mode: AccessMode) -> Self {
        Self { key, mode }
    }

    pub fn value<T: ?Sized + 'static>() -> Self {
        Self::of(BindingKey::of::<T>(), AccessMode::Value)
    }

    pub fn provider<T: ?Sized + 'static>() -> Self {
        Self::of(BindingKey::of::<T>(), AccessMode::Provider)
    }

    pub fn lazy<T: ?Sized + 'static>() -> Self {
        Self::of(BindingKey::of::<T>(), AccessMode::Lazy)
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

/// One constructor parameter bound to its dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    pub name: String,
    pub dependency: Dependency,
}

impl ParamBinding {
    pub fn new(name: impl Into<String>, dependency: Dependency) -> Self {
        Self { name: name.into(), dependency }
    }
}

/// Anything that can list the dependencies of a constructor.
pub trait DependencySource {
    /// Ordered parameter bindings, or a `Configuration` error describing why
    /// the declaration is unusable.
    fn dependencies(&self) -> DiResult<Vec<ParamBinding>>;
}

impl DependencySource for Vec<ParamBinding> {
    fn dependencies(&self) -> DiResult<Vec<ParamBinding>> {
        check_unique(self.iter().map(|p| p.name.as_str()))?;
        Ok(self.clone())
    }
}

impl DependencySource for [ParamBinding] {
    fn dependencies(&self) -> DiResult<Vec<ParamBinding>> {
        check_unique(self.iter().map(|p| p.name.as_str()))?;
        Ok(self.to_vec())
    }
}

#[derive(Debug, Clone)]
struct Param {
    name: String,
    annotation: Option<Dependency>,
}

#[derive(Debug, Clone)]
enum Override {
    Tag(String),
    Dependency(Dependency),
}

/// Declared constructor parameters plus user overrides.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{AccessMode, BindingKey, DependencySource, Signature};
///
/// struct Database;
/// struct Settings;
///
/// let deps = Signature::new()
///     .value::<Database>("db")
///     .provider::<Settings>("settings")
///     .with_tag("db", "replica")
///     .dependencies()
///     .unwrap();
///
/// assert_eq!(deps[0].dependency.key(), &BindingKey::tagged::<Database>("replica").unwrap());
/// assert_eq!(deps[1].dependency.mode(), AccessMode::Provider);
///
/// // An untyped parameter needs an explicit dependency.
/// assert!(Signature::new().untyped("x").dependencies().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
    overrides: Vec<(String, Override)>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    fn param(mut self, name: &str, annotation: Option<Dependency>) -> Self {
        self.params.push(Param { name: name.to_string(), annotation });
        self
    }

    /// Parameter receiving a resolved `Arc<T>`.
    pub fn value<T: ?Sized + 'static>(self, name: &str) -> Self {
        self.param(name, Some(Dependency::value::<T>()))
    }

    /// Parameter receiving a provider of `T`.
    pub fn provider<T: ?Sized + 'static>(self, name: &str) -> Self {
        self.param(name, Some(Dependency::provider::<T>()))
    }

    /// Parameter receiving a `Lazy<T>`.
    pub fn lazy<T: ?Sized + 'static>(self, name: &str) -> Self {
        self.param(name, Some(Dependency::lazy::<T>()))
    }

    /// Parameter receiving the assembled `DictOf<K, V>`.
    pub fn dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(self, name: &str) -> Self {
        self.param(
            name,
            Some(Dependency::of(BindingKey::dict::<K, V>(None), AccessMode::Value)),
        )
    }

    /// Parameter with no type information; it must receive an explicit
    /// dependency through [`with_dependency`](Self::with_dependency).
    pub fn untyped(self, name: &str) -> Self {
        self.param(name, None)
    }

    /// Resolve the annotated parameter `param` under `tag`.
    pub fn with_tag(mut self, param: &str, tag: &str) -> Self {
        self.overrides
            .push((param.to_string(), Override::Tag(tag.to_string())));
        self
    }

    /// Replace the dependency of `param` entirely.
    pub fn with_dependency(mut self, param: &str, dependency: Dependency) -> Self {
        self.overrides
            .push((param.to_string(), Override::Dependency(dependency)));
        self
    }
}

impl DependencySource for Signature {
    fn dependencies(&self) -> DiResult<Vec<ParamBinding>> {
        check_unique(self.params.iter().map(|p| p.name.as_str()))?;

        let mut seen = HashSet::new();
        for (name, _) in &self.overrides {
            if !self.params.iter().any(|p| &p.name == name) {
                return Err(DiError::configuration(format!(
                    "override names unknown parameter `{}`",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(DiError::configuration(format!(
                    "parameter `{}` is overridden more than once",
                    name
                )));
            }
        }

        self.params
            .iter()
            .map(|param| {
                let over = self
                    .overrides
                    .iter()
                    .find(|(name, _)| name == &param.name)
                    .map(|(_, o)| o);

                let dependency = match (over, &param.annotation) {
                    (Some(Override::Dependency(dep)), _) => dep.clone(),
                    (Some(Override::Tag(tag)), Some(annotation)) => Dependency::of(
                        annotation.key().with_tag(Tag::new(tag)?)?,
                        annotation.mode(),
                    ),
                    (Some(Override::Tag(_)), None) => {
                        return Err(DiError::configuration(format!(
                            "tag override on untyped parameter `{}`",
                            param.name
                        )))
                    }
                    (None, Some(annotation)) => annotation.clone(),
                    (None, None) => {
                        return Err(DiError::configuration(format!(
                            "parameter `{}` has no type and no explicit dependency",
                            param.name
                        )))
                    }
                };
                Ok(ParamBinding::new(param.name.clone(), dependency))
            })
            .collect()
    }
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>) -> DiResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(DiError::configuration(format!(
                "parameter `{}` is declared more than once",
                name
            )));
        }
    }
    Ok(())
}
