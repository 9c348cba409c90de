#![no_main]

use ferrous_inject::{Binder, DiError, Lazy, Provider, Signature};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

trait TestTrait: Send + Sync {
    fn get_value(&self) -> u32;
}

struct TestServiceImpl {
    value: u32,
}

impl TestTrait for TestServiceImpl {
    fn get_value(&self) -> u32 {
        self.value
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let pattern = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let register = pattern % 2 == 0;

    let mut binder = Binder::new();
    if register {
        binder.bind::<u32>().to_instance(pattern).unwrap();
        binder
            .bind::<dyn TestTrait>()
            .to_shared(Arc::new(TestServiceImpl { value: 100 }))
            .unwrap();
        binder
            .bind::<String>()
            .with_memoization()
            .to_constructor(&Signature::new().value::<u32>("n"), |args| {
                Ok(format!("n={}", args.value::<u32>("n")?))
            })
            .unwrap();
    }
    let injector = binder.build();

    match (pattern >> 1) % 5 {
        0 => {
            let result = injector.get_instance::<u32>();
            if register {
                assert_eq!(*result.unwrap(), pattern);
            } else {
                assert!(matches!(result, Err(DiError::Unresolved(_))));
            }
        }
        1 => {
            let result = injector.get_instance::<dyn TestTrait>();
            assert_eq!(result.is_ok(), register);
            if let Ok(service) = result {
                assert_eq!(service.get_value(), 100);
            }
        }
        2 => {
            let first = injector.get_instance::<String>();
            let second = injector.get_instance::<String>();
            if register {
                assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
            } else {
                assert!(first.is_err() && second.is_err());
            }
        }
        3 => {
            let provider = injector.get_provider::<u32>();
            assert_eq!(provider.get().is_ok(), register);
        }
        _ => {
            let lazy = Lazy::new(injector.get_provider::<String>());
            assert_eq!(lazy.get().is_ok(), register);
            assert_eq!(lazy.is_initialized(), register);
        }
    }
});
