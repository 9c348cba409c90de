/// Property-based tests for resolution
///
/// These tests verify that resolution behavior follows expected patterns
/// regardless of the specific values or graph shape used.
use ferrous_inject::{Binder, BindingKey, DiError, Signature};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ServiceA {
    value: String,
}

// Property: instance bindings always hand back the bound value itself
proptest! {
    #[test]
    fn instance_resolution_consistency(service_value in "\\PC{0,50}") {
        let value = Arc::new(ServiceA { value: service_value.clone() });
        let mut binder = Binder::new();
        binder.bind::<ServiceA>().to_shared(value.clone()).unwrap();

        let injector = binder.build();
        let resolved1 = injector.get_instance::<ServiceA>().unwrap();
        let resolved2 = injector.get_instance::<ServiceA>().unwrap();

        prop_assert!(Arc::ptr_eq(&resolved1, &value));
        prop_assert!(Arc::ptr_eq(&resolved1, &resolved2));
        prop_assert_eq!(&resolved1.value, &service_value);
    }
}

// Property: dict assembly equals the contributed map, whatever the insertion order
proptest! {
    #[test]
    fn dict_round_trip(entries in prop::collection::hash_map("[a-z]{1,8}", any::<i32>(), 0..12)) {
        let mut binder = Binder::new();
        binder.install_dict::<String, i32>().unwrap();
        for (key, value) in &entries {
            binder
                .bind_to_dict::<String, i32>()
                .with_key(key.as_str())
                .to_instance(*value)
                .unwrap();
        }

        let dict = binder.build().get_dict::<String, i32>().unwrap();
        let assembled: HashMap<String, i32> =
            dict.iter().map(|(k, v)| (k.clone(), **v)).collect();
        prop_assert_eq!(assembled, entries);
    }
}

// Property: an alias chain of any length resolves to the end of the chain
proptest! {
    #[test]
    fn alias_chain_resolves_to_target(length in 1usize..32, target in any::<u64>()) {
        let mut binder = Binder::new();
        for i in 0..length {
            binder
                .bind::<u64>()
                .with_tag(&format!("link{}", i))
                .to_tagged(&format!("link{}", i + 1))
                .unwrap();
        }
        binder
            .bind::<u64>()
            .with_tag(&format!("link{}", length))
            .to_instance(target)
            .unwrap();

        let injector = binder.build();
        prop_assert_eq!(*injector.get_tagged::<u64>("link0").unwrap(), target);
    }
}

// Property: closing an alias chain into a ring is always reported as a cycle
// that starts and ends at the same key
proptest! {
    #[test]
    fn alias_ring_is_circular(length in 1usize..24, start in 0usize..24) {
        let start = start % length;
        let mut binder = Binder::new();
        for i in 0..length {
            binder
                .bind::<u64>()
                .with_tag(&format!("ring{}", i))
                .to_tagged(&format!("ring{}", (i + 1) % length))
                .unwrap();
        }

        let result = binder.build().get_tagged::<u64>(&format!("ring{}", start));
        match result {
            Err(DiError::Circular(chain)) => {
                prop_assert_eq!(chain.len(), length + 1);
                prop_assert_eq!(&chain[0], &chain[length]);
                prop_assert_eq!(
                    &chain[0],
                    &BindingKey::tagged::<u64>(&format!("ring{}", start)).unwrap()
                );
            }
            other => prop_assert!(false, "expected Circular, got {:?}", other),
        }
    }
}

// Property: optional registration decides between success and Unresolved
proptest! {
    #[test]
    fn registration_decides_resolution(register in any::<bool>(), memoize in any::<bool>()) {
        let mut binder = Binder::new();
        if register {
            let builder = binder.bind::<u16>();
            let builder = if memoize { builder.with_memoization() } else { builder };
            builder.to_constructor(&Signature::new(), |_| Ok(7u16)).unwrap();
        }

        let result = binder.build().get_instance::<u16>();
        if register {
            prop_assert_eq!(*result.unwrap(), 7);
        } else {
            let is_unresolved = matches!(result, Err(DiError::Unresolved(_)));
            prop_assert!(is_unresolved);
        }
    }
}
