#![no_main]

use ferrous_inject::{Binder, DiError, Signature};
use libfuzzer_sys::fuzz_target;

// Arbitrary tags and dict keys either register or fail with a
// configuration error, never panic.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let pattern = data[0];
    let text = String::from_utf8_lossy(&data[1..]).into_owned();

    let mut binder = Binder::new();
    let result = match pattern % 5 {
        0 => binder.bind::<String>().with_tag(&text).to_instance(text.clone()).map(|_| ()),
        1 => binder
            .bind::<String>()
            .with_tag(&text)
            .with_memoization()
            .to_constructor(&Signature::new(), |_| Ok(String::from("made")))
            .map(|_| ()),
        2 => binder.bind::<String>().with_tag("target").to_tagged(&text).map(|_| ()),
        3 => binder.install_dict::<String, u8>().and_then(|b| {
            b.bind_to_dict::<String, u8>()
                .with_key(text.as_str())
                .to_instance(pattern)
                .map(|_| ())
        }),
        _ => binder.install_tagged_dict::<String, u8>(&text).map(|_| ()),
    };

    match result {
        Ok(()) => {
            let injector = binder.build();
            assert_eq!(injector.len(), binder_len_hint(pattern));
        }
        Err(err) => assert!(err.is_configuration(), "unexpected error {:?}", err),
    }

    // Registering the same key twice is always rejected.
    if !text.is_empty() {
        let mut binder = Binder::new();
        binder.bind::<u8>().with_tag(&text).to_instance(1).unwrap();
        let second = binder.bind::<u8>().with_tag(&text).to_instance(2);
        assert!(matches!(second, Err(DiError::DuplicateBinding(_))));
    }
});

fn binder_len_hint(pattern: u8) -> usize {
    match pattern % 5 {
        3 => 2,
        _ => 1,
    }
}
