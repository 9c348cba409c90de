//! Binding key types for the injection container.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{DiError, DiResult};

/// Identity of a Rust type used inside binding keys.
///
/// Equality and hashing use the `TypeId` only; the name is kept for
/// diagnostics. Every descriptor is well-formed by construction because it can
/// only be built from a real type.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::TypeDescriptor;
///
/// let a = TypeDescriptor::of::<String>();
/// let b = TypeDescriptor::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "alloc::string::String");
/// assert_ne!(a, TypeDescriptor::of::<str>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    /// Descriptor for `T`, which may be unsized (`str`, `dyn Trait`).
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The `std::any::type_name` of the described type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeDescriptor {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self.name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Qualifier distinguishing several bindings of the same type.
///
/// Tags must be non-empty.
///
/// ```rust
/// use ferrous_inject::Tag;
///
/// assert_eq!(Tag::new("primary").unwrap().as_str(), "primary");
/// assert!(Tag::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(Arc<str>);

impl Tag {
    pub fn new(tag: impl AsRef<str>) -> DiResult<Self> {
        let tag = tag.as_ref();
        if tag.is_empty() {
            return Err(DiError::configuration("binding tags must not be empty"));
        }
        Ok(Tag(Arc::from(tag)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The value produced by a dict multibinding.
pub type DictOf<K, V> = HashMap<K, Arc<V>>;

/// The kinds of keys a dict multibinding may be indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictKeyKind {
    Str,
    Int,
    Type,
}

/// Element discriminator of one dict contribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminator {
    Str(String),
    Int(i64),
    Type(TypeDescriptor),
}

impl Discriminator {
    pub fn kind(&self) -> DictKeyKind {
        match self {
            Discriminator::Str(_) => DictKeyKind::Str,
            Discriminator::Int(_) => DictKeyKind::Int,
            Discriminator::Type(_) => DictKeyKind::Type,
        }
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::Str(s) => write!(f, "{:?}", s),
            Discriminator::Int(i) => write!(f, "{}", i),
            Discriminator::Type(t) => write!(f, "{}", t),
        }
    }
}

impl From<&str> for Discriminator {
    fn from(value: &str) -> Self {
        Discriminator::Str(value.to_string())
    }
}

impl From<String> for Discriminator {
    fn from(value: String) -> Self {
        Discriminator::Str(value)
    }
}

impl From<i64> for Discriminator {
    fn from(value: i64) -> Self {
        Discriminator::Int(value)
    }
}

impl From<i32> for Discriminator {
    fn from(value: i32) -> Self {
        Discriminator::Int(i64::from(value))
    }
}

impl From<TypeDescriptor> for Discriminator {
    fn from(value: TypeDescriptor) -> Self {
        Discriminator::Type(value)
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for String {}
    impl Sealed for i64 {}
    impl Sealed for super::TypeDescriptor {}
}

/// Key types a dict multibinding can be indexed by: `String`, `i64` and
/// `TypeDescriptor`.
pub trait DictKey: sealed::Sealed + Eq + Hash + Clone + Send + Sync + 'static {
    const KIND: DictKeyKind;

    /// Recover the map key from a contribution's discriminator.
    fn from_discriminator(discriminator: &Discriminator) -> Option<Self>;
}

impl DictKey for String {
    const KIND: DictKeyKind = DictKeyKind::Str;

    fn from_discriminator(discriminator: &Discriminator) -> Option<Self> {
        match discriminator {
            Discriminator::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl DictKey for i64 {
    const KIND: DictKeyKind = DictKeyKind::Int;

    fn from_discriminator(discriminator: &Discriminator) -> Option<Self> {
        match discriminator {
            Discriminator::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl DictKey for TypeDescriptor {
    const KIND: DictKeyKind = DictKeyKind::Type;

    fn from_discriminator(discriminator: &Discriminator) -> Option<Self> {
        match discriminator {
            Discriminator::Type(t) => Some(*t),
            _ => None,
        }
    }
}

/// Descriptor of a dict multibinding container, `DictOf<K, V>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictType {
    map: TypeDescriptor,
    key_kind: DictKeyKind,
    value: TypeDescriptor,
}

impl DictType {
    pub fn of<K: DictKey, V: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            map: TypeDescriptor::of::<DictOf<K, V>>(),
            key_kind: K::KIND,
            value: TypeDescriptor::of::<V>(),
        }
    }

    /// Descriptor of the assembled map type.
    pub fn map(&self) -> TypeDescriptor {
        self.map
    }

    pub fn key_kind(&self) -> DictKeyKind {
        self.key_kind
    }

    pub fn value(&self) -> TypeDescriptor {
        self.value
    }
}

/// Key of an ordinary binding: a type plus an optional tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleKey {
    ty: TypeDescriptor,
    tag: Option<Tag>,
}

impl SimpleKey {
    pub fn new(ty: TypeDescriptor, tag: Option<Tag>) -> Self {
        Self { ty, tag }
    }

    pub fn type_descriptor(&self) -> TypeDescriptor {
        self.ty
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}

/// Key of one contribution to a dict multibinding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictElementKey {
    dict: DictType,
    discriminator: Discriminator,
    tag: Option<Tag>,
}

impl DictElementKey {
    /// Fails when the discriminator kind does not match the dict's key kind.
    pub fn new(dict: DictType, discriminator: Discriminator, tag: Option<Tag>) -> DiResult<Self> {
        if discriminator.kind() != dict.key_kind() {
            return Err(DiError::configuration(format!(
                "discriminator {} is a {:?} key but {} is keyed by {:?}",
                discriminator,
                discriminator.kind(),
                dict.map(),
                dict.key_kind()
            )));
        }
        Ok(Self { dict, discriminator, tag })
    }

    pub fn dict(&self) -> DictType {
        self.dict
    }

    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Key of the aggregate this element contributes to.
    pub fn container_key(&self) -> SimpleKey {
        SimpleKey::new(self.dict.map(), self.tag.clone())
    }
}

/// Key for binding storage and lookup.
///
/// Two keys built from equal parts are equal and hash equally, regardless of
/// where they were built.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{BindingKey, DictType};
///
/// let plain = BindingKey::of::<u32>();
/// let port = BindingKey::tagged::<u32>("port").unwrap();
/// assert_ne!(plain, port);
/// assert_eq!(port, BindingKey::tagged::<u32>("port").unwrap());
/// assert_eq!(port.to_string(), "u32#port");
///
/// let element = BindingKey::dict_element(DictType::of::<String, i32>(), "a", None).unwrap();
/// assert!(element.to_string().ends_with("[\"a\"]"));
///
/// // Integer discriminators cannot index a string-keyed dict.
/// assert!(BindingKey::dict_element(DictType::of::<String, i32>(), 7, None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingKey {
    Simple(SimpleKey),
    DictElement(DictElementKey),
}

impl BindingKey {
    /// Untagged key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        BindingKey::Simple(SimpleKey::new(TypeDescriptor::of::<T>(), None))
    }

    pub fn tagged<T: ?Sized + 'static>(tag: &str) -> DiResult<Self> {
        Ok(BindingKey::Simple(SimpleKey::new(
            TypeDescriptor::of::<T>(),
            Some(Tag::new(tag)?),
        )))
    }

    pub fn simple(ty: TypeDescriptor, tag: Option<Tag>) -> Self {
        BindingKey::Simple(SimpleKey::new(ty, tag))
    }

    /// Key of the aggregate `DictOf<K, V>` itself.
    pub fn dict<K: DictKey, V: ?Sized + Send + Sync + 'static>(tag: Option<Tag>) -> Self {
        BindingKey::Simple(SimpleKey::new(DictType::of::<K, V>().map(), tag))
    }

    pub fn dict_element(
        dict: DictType,
        discriminator: impl Into<Discriminator>,
        tag: Option<Tag>,
    ) -> DiResult<Self> {
        Ok(BindingKey::DictElement(DictElementKey::new(
            dict,
            discriminator.into(),
            tag,
        )?))
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            BindingKey::Simple(k) => k.tag(),
            BindingKey::DictElement(k) => k.tag(),
        }
    }

    /// The bound type; for dict elements, the aggregate map type.
    pub fn type_descriptor(&self) -> TypeDescriptor {
        match self {
            BindingKey::Simple(k) => k.type_descriptor(),
            BindingKey::DictElement(k) => k.dict().map(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_descriptor().name()
    }

    /// The type of an untagged simple key, the only shape eligible for
    /// auto-registration.
    pub fn untagged_type(&self) -> Option<TypeDescriptor> {
        match self {
            BindingKey::Simple(k) if k.tag().is_none() => Some(k.type_descriptor()),
            _ => None,
        }
    }

    /// Same simple key under a different tag.
    pub fn with_tag(&self, tag: Tag) -> DiResult<Self> {
        match self {
            BindingKey::Simple(k) => Ok(BindingKey::simple(k.type_descriptor(), Some(tag))),
            BindingKey::DictElement(_) => Err(DiError::configuration(format!(
                "cannot retag dict element key {}",
                self
            ))),
        }
    }
}

impl From<SimpleKey> for BindingKey {
    fn from(key: SimpleKey) -> Self {
        BindingKey::Simple(key)
    }
}

impl From<DictElementKey> for BindingKey {
    fn from(key: DictElementKey) -> Self {
        BindingKey::DictElement(key)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKey::Simple(k) => write!(f, "{}", k.type_descriptor())?,
            BindingKey::DictElement(k) => {
                write!(f, "{}[{}]", k.dict().map(), k.discriminator())?
            }
        }
        if let Some(tag) = self.tag() {
            write!(f, "#{}", tag)?;
        }
        Ok(())
    }
}
