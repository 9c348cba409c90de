/// Unit tests for BindingDescriptor methods
use ferrous_inject::{
    BindingDescriptor, BindingKey, DictType, ResolverKind, Signature,
};

#[test]
fn test_descriptor_tag_untagged() {
    let descriptor = BindingDescriptor::new(BindingKey::of::<String>(), ResolverKind::Instance);
    assert_eq!(descriptor.tag(), None);
    assert_eq!(descriptor.type_name(), "alloc::string::String");
    assert!(!descriptor.is_dict_element());
}

#[test]
fn test_descriptor_tag_tagged() {
    let descriptor = BindingDescriptor::new(
        BindingKey::tagged::<u32>("database_port").unwrap(),
        ResolverKind::Constructor,
    );
    assert_eq!(descriptor.tag(), Some("database_port"));
    assert_eq!(descriptor.type_name(), "u32");
}

#[test]
fn test_descriptor_dict_element() {
    let key = BindingKey::dict_element(DictType::of::<String, u8>(), "a", None).unwrap();
    let descriptor = BindingDescriptor::new(key, ResolverKind::Instance);
    assert!(descriptor.is_dict_element());
    assert!(descriptor.type_name().contains("HashMap"));
}

#[test]
fn test_resolver_kind_display() {
    assert_eq!(ResolverKind::Instance.to_string(), "instance");
    assert_eq!(ResolverKind::DictAggregate.to_string(), "dict");
    assert_eq!(ResolverKind::Custom.to_string(), "custom");
}

#[test]
fn test_descriptors_are_sorted_and_complete() {
    let mut binder = ferrous_inject::Binder::new();
    binder.bind::<u8>().with_tag("b").to_instance(1).unwrap();
    binder.bind::<u8>().with_tag("a").to_instance(2).unwrap();
    binder
        .bind::<u16>()
        .to_constructor(&Signature::new(), |_| Ok(3u16))
        .unwrap();

    let keys: Vec<String> = binder.descriptors().iter().map(|d| d.key.to_string()).collect();
    assert_eq!(keys, vec!["u16", "u8#a", "u8#b"]);
}

#[cfg(feature = "diagnostics")]
#[test]
fn test_debug_string() {
    let mut binder = ferrous_inject::Binder::new();
    binder.bind::<u8>().to_instance(1).unwrap();
    let dump = binder.build().to_debug_string();
    assert!(dump.contains("u8 => instance"));
}
