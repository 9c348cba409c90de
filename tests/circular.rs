use ferrous_inject::{
    Args, Binder, BindingKey, DiError, DiResult, Injector, Provider, Signature, MAX_DEPTH,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

fn expect_cycle<T: std::fmt::Debug>(result: DiResult<T>) -> Vec<BindingKey> {
    match result {
        Err(DiError::Circular(chain)) => chain,
        other => panic!("Expected Circular error, got {:?}", other),
    }
}

#[test]
fn test_self_circular_dependency() {
    struct SelfReferencing;

    let mut binder = Binder::new();
    binder
        .bind::<SelfReferencing>()
        .to_constructor(
            &Signature::new().value::<SelfReferencing>("me"),
            |_| Ok(SelfReferencing),
        )
        .unwrap();

    let chain = expect_cycle(binder.build().get_instance::<SelfReferencing>().map(|_| ()));
    assert_eq!(
        chain,
        vec![BindingKey::of::<SelfReferencing>(), BindingKey::of::<SelfReferencing>()]
    );
}

#[test]
fn test_two_level_circular() {
    struct A;
    struct B;

    let mut binder = Binder::new();
    binder
        .bind::<A>()
        .to_constructor(&Signature::new().value::<B>("b"), |_| Ok(A))
        .unwrap();
    binder
        .bind::<B>()
        .to_constructor(&Signature::new().value::<A>("a"), |_| Ok(B))
        .unwrap();

    let injector = binder.build();
    let chain = expect_cycle(injector.get_instance::<A>().map(|_| ()));
    assert_eq!(
        chain,
        vec![BindingKey::of::<A>(), BindingKey::of::<B>(), BindingKey::of::<A>()]
    );

    let err = injector.get_instance::<B>().map(|_| ()).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Circular dependency:"));
    assert!(message.contains("B") && message.contains("A"));
}

#[test]
fn test_cycle_chain_starts_at_repeated_key() {
    struct Root;
    struct A;
    struct B;
    struct C;

    let mut binder = Binder::new();
    binder
        .bind::<Root>()
        .to_constructor(&Signature::new().value::<A>("a"), |_| Ok(Root))
        .unwrap();
    binder
        .bind::<A>()
        .to_constructor(&Signature::new().value::<B>("b"), |_| Ok(A))
        .unwrap();
    binder
        .bind::<B>()
        .to_constructor(&Signature::new().value::<C>("c"), |_| Ok(B))
        .unwrap();
    binder
        .bind::<C>()
        .to_constructor(&Signature::new().value::<A>("a"), |_| Ok(C))
        .unwrap();

    let chain = expect_cycle(binder.build().get_instance::<Root>().map(|_| ()));
    assert_eq!(
        chain,
        vec![
            BindingKey::of::<A>(),
            BindingKey::of::<B>(),
            BindingKey::of::<C>(),
            BindingKey::of::<A>()
        ]
    );
}

#[test]
fn test_alias_cycle() {
    let mut binder = Binder::new();
    binder.bind::<u8>().with_tag("a").to_tagged("b").unwrap();
    binder.bind::<u8>().with_tag("b").to_tagged("a").unwrap();

    let chain = expect_cycle(binder.build().get_tagged::<u8>("a"));
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0], chain[2]);
}

#[test]
fn test_provider_breaks_cycle() {
    struct Parent {
        children: ferrous_inject::InjectorProvider<Child>,
    }
    struct Child {
        parent: Arc<Parent>,
    }

    let mut binder = Binder::new();
    binder
        .bind::<Parent>()
        .with_memoization()
        .to_constructor(&Signature::new().provider::<Child>("children"), |args: &Args<'_>| {
            Ok(Parent { children: args.provider("children")? })
        })
        .unwrap();
    binder
        .bind::<Child>()
        .to_constructor(&Signature::new().value::<Parent>("parent"), |args: &Args<'_>| {
            Ok(Child { parent: args.value("parent")? })
        })
        .unwrap();

    let injector = binder.build();
    let parent = injector.get_instance::<Parent>().unwrap();
    let child = parent.children.get().unwrap();
    assert!(Arc::ptr_eq(&child.parent, &parent));
}

#[test]
fn test_provider_reentering_memoized_value_reports_cycle() {
    struct Eager;

    let mut binder = Binder::new();
    binder
        .bind::<Eager>()
        .with_memoization()
        .to_constructor(&Signature::new().provider::<Eager>("me"), |args: &Args<'_>| {
            // Asking for the value under construction on the same thread.
            let me = args.provider::<Eager>("me")?;
            me.get()?;
            Ok(Eager)
        })
        .unwrap();

    let injector = binder.build();
    let chain = expect_cycle(injector.get_instance::<Eager>().map(|_| ()));
    assert!(chain.iter().all(|k| *k == BindingKey::of::<Eager>()));

    // The failure was not cached and the lock was released.
    let chain = expect_cycle(injector.get_instance::<Eager>().map(|_| ()));
    assert!(!chain.is_empty());
}

#[test]
fn test_failed_resolution_leaves_injector_usable() {
    struct A;
    struct B;

    let mut binder = Binder::new();
    binder
        .bind::<A>()
        .to_constructor(&Signature::new().value::<B>("b"), |_| Ok(A))
        .unwrap();
    binder
        .bind::<B>()
        .to_constructor(&Signature::new().value::<A>("a"), |_| Ok(B))
        .unwrap();
    binder.bind::<u8>().to_instance(7).unwrap();

    let injector = binder.build();
    assert!(injector.get_instance::<A>().is_err());
    assert_eq!(*injector.get_instance::<u8>().unwrap(), 7);
}

#[test]
fn test_depth_guard() {
    // A chain of distinct keys longer than the guard: u64#0 -> u64#1 -> ...
    fn chained(depth: usize) -> Injector {
        let mut binder = Binder::new();
        for i in 0..depth {
            let next = format!("{}", i + 1);
            binder
                .bind::<u64>()
                .with_tag(&i.to_string())
                .to_tagged(&next)
                .unwrap();
        }
        binder
            .bind::<u64>()
            .with_tag(&depth.to_string())
            .to_instance(depth as u64)
            .unwrap();
        binder.build()
    }

    let shallow = chained(16);
    assert_eq!(*shallow.get_tagged::<u64>("0").unwrap(), 16);

    // An unoptimized build overflows a default 2 MiB thread stack a few
    // hundred alias frames short of MAX_DEPTH, so give the guard room.
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| chained(MAX_DEPTH + 8).get_tagged::<u64>("0").map(|v| *v))
        .unwrap();
    match handle.join().unwrap() {
        Err(DiError::DepthExceeded(depth)) => assert_eq!(depth, MAX_DEPTH),
        other => panic!("Expected DepthExceeded, got {:?}", other),
    }
}

#[test]
fn test_memoized_cycle_entered_from_two_threads() {
    struct A;
    struct B;

    // Both threads take their first write lock before either reaches the
    // other binding. Later constructions skip the rendezvous.
    let rendezvous = Arc::new(Barrier::new(2));
    let arrivals = Arc::new(AtomicUsize::new(0));

    let mut binder = Binder::new();
    binder
        .bind::<u8>()
        .with_tag("sync")
        .to_constructor(&Signature::new(), move |_| {
            if arrivals.fetch_add(1, Ordering::SeqCst) < 2 {
                rendezvous.wait();
            }
            Ok(0u8)
        })
        .unwrap();
    binder
        .bind::<A>()
        .with_memoization()
        .to_constructor(
            &Signature::new()
                .value::<u8>("sync")
                .with_tag("sync", "sync")
                .value::<B>("b"),
            |_| Ok(A),
        )
        .unwrap();
    binder
        .bind::<B>()
        .with_memoization()
        .to_constructor(
            &Signature::new()
                .value::<u8>("sync")
                .with_tag("sync", "sync")
                .value::<A>("a"),
            |_| Ok(B),
        )
        .unwrap();
    let injector = binder.build();

    let (tx, rx) = mpsc::channel();
    let handles: Vec<_> = (0..2)
        .map(|i| {
            let injector = injector.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let result = if i == 0 {
                    injector.get_instance::<A>().map(|_| ())
                } else {
                    injector.get_instance::<B>().map(|_| ())
                };
                tx.send(result).unwrap();
            })
        })
        .collect();

    for _ in 0..2 {
        let result = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("threads resolving a memoized cycle deadlocked");
        let chain = expect_cycle(result);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first(), chain.last());
        assert!(chain.contains(&BindingKey::of::<A>()));
        assert!(chain.contains(&BindingKey::of::<B>()));
    }
    for h in handles {
        h.join().unwrap();
    }
}
