//! Binding descriptors for introspection and diagnostics.

use crate::key::BindingKey;
use crate::resolver::ResolverKind;

/// Binding descriptor for introspection and diagnostics
///
/// Describes one registered binding: its key and the strategy that resolves
/// it. Available from both [`Binder::descriptors`](crate::Binder::descriptors)
/// and [`Injector::descriptors`](crate::Injector::descriptors).
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Binder, ResolverKind};
///
/// let mut binder = Binder::new();
/// binder.bind::<u32>().to_instance(5).unwrap();
/// binder.bind::<u16>().with_tag("port").with_memoization()
///     .to_constructor(&ferrous_inject::Signature::new(), |_| Ok(8080u16)).unwrap();
///
/// let descriptors = binder.descriptors();
/// let port = descriptors.iter().find(|d| d.tag() == Some("port")).unwrap();
/// assert_eq!(port.kind, ResolverKind::Memoized);
/// assert_eq!(port.type_name(), "u16");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    /// The binding key
    pub key: BindingKey,
    /// Resolution strategy
    pub kind: ResolverKind,
}

impl BindingDescriptor {
    pub fn new(key: BindingKey, kind: ResolverKind) -> Self {
        Self { key, kind }
    }

    /// Get the bound type name; for dict elements, the dict map type
    pub fn type_name(&self) -> &'static str {
        self.key.type_name()
    }

    /// Get the tag, or None for untagged bindings
    pub fn tag(&self) -> Option<&str> {
        self.key.tag().map(|t| t.as_str())
    }

    /// Whether this binding is one contribution to a dict multibinding
    pub fn is_dict_element(&self) -> bool {
        matches!(self.key, BindingKey::DictElement(_))
    }

    pub(crate) fn collect<'a>(
        bindings: impl Iterator<Item = (&'a BindingKey, ResolverKind)>,
    ) -> Vec<BindingDescriptor> {
        let mut out: Vec<BindingDescriptor> = bindings
            .map(|(key, kind)| BindingDescriptor::new(key.clone(), kind))
            .collect();
        out.sort_by_cached_key(|d| d.key.to_string());
        out
    }
}
