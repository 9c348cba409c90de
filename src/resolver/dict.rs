use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::injector::Injector;
use crate::internal::{downcast, erase, AnyArc, ResolutionStack};
use crate::key::{BindingKey, DictElementKey, DictKey, DictOf, DictType, Tag};
use crate::resolver::{Resolver, ResolverKind};

/// Object-safe view of a dict aggregate, used by the binder to register
/// contributions without knowing `K` and `V`.
pub trait DictAggregate {
    fn dict_type(&self) -> DictType;

    fn tag(&self) -> Option<&Tag>;

    fn element_keys(&self) -> &[DictElementKey];

    /// Register one contribution. The key must belong to this dict and tag,
    /// and its discriminator must be new.
    fn add_key(&mut self, key: DictElementKey) -> DiResult<()>;
}

/// Assembles `DictOf<K, V>` from every registered contribution.
pub struct DictResolver<K, V: ?Sized> {
    tag: Option<Tag>,
    keys: Vec<DictElementKey>,
    _marker: PhantomData<fn() -> (K, Arc<V>)>,
}

impl<K: DictKey, V: ?Sized + Send + Sync + 'static> DictResolver<K, V> {
    pub fn new(tag: Option<Tag>) -> Self {
        Self {
            tag,
            keys: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<K: DictKey, V: ?Sized + Send + Sync + 'static> DictAggregate for DictResolver<K, V> {
    fn dict_type(&self) -> DictType {
        DictType::of::<K, V>()
    }

    fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    fn element_keys(&self) -> &[DictElementKey] {
        &self.keys
    }

    fn add_key(&mut self, key: DictElementKey) -> DiResult<()> {
        if key.dict() != self.dict_type() || key.tag() != self.tag.as_ref() {
            return Err(DiError::configuration(format!(
                "{} does not belong to this dict",
                BindingKey::from(key)
            )));
        }
        if self
            .keys
            .iter()
            .any(|k| k.discriminator() == key.discriminator())
        {
            return Err(DiError::configuration(format!(
                "duplicate dict discriminator in {}",
                BindingKey::from(key)
            )));
        }
        self.keys.push(key);
        Ok(())
    }
}

impl<K: DictKey, V: ?Sized + Send + Sync + 'static> Resolver for DictResolver<K, V> {
    fn resolve(&self, injector: &Injector, stack: &mut ResolutionStack) -> DiResult<AnyArc> {
        let mut map = DictOf::<K, V>::with_capacity(self.keys.len());
        for element in &self.keys {
            let discriminator = K::from_discriminator(element.discriminator())
                .ok_or(DiError::TypeMismatch(std::any::type_name::<K>()))?;
            let value = injector.get_instance_internal(&element.clone().into(), stack)?;
            map.insert(discriminator, downcast::<V>(&value)?);
        }
        Ok(erase(Arc::new(map)))
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::DictAggregate
    }

    fn as_dict_aggregate(&self) -> Option<&dyn DictAggregate> {
        Some(self)
    }

    fn as_dict_aggregate_mut(&mut self) -> Option<&mut dyn DictAggregate> {
        Some(self)
    }
}
