/// Concurrent access integration tests
///
/// These tests verify that memoized bindings, lazy values and
/// auto-registration stay consistent when many threads race on them.
use ferrous_inject::{
    Args, Binder, DiResult, Injectable, InjectableRegistry, Injector, InjectorProvider, Lazy,
    Provider, Signature,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

// ===== Test Services =====

#[derive(Debug)]
pub struct CounterService {
    count: AtomicU32,
}

impl CounterService {
    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

struct SlowSingleton;

impl Injectable for SlowSingleton {
    const MEMOIZED: bool = true;

    fn signature() -> Signature {
        Signature::new()
    }

    fn construct(_: &Args<'_>) -> DiResult<Self> {
        thread::sleep(Duration::from_millis(10));
        Ok(SlowSingleton)
    }
}

fn memoized_counter(builds: Arc<AtomicU32>) -> Injector {
    let mut binder = Binder::new();
    binder
        .bind::<CounterService>()
        .with_memoization()
        .to_constructor(&Signature::new(), move |_| {
            builds.fetch_add(1, Ordering::SeqCst);
            // Widen the race window.
            thread::sleep(Duration::from_millis(20));
            Ok(CounterService { count: AtomicU32::new(0) })
        })
        .unwrap();
    binder.build()
}

// ===== Integration Tests =====

#[test]
fn test_memoized_concurrent_first_resolution() {
    let builds = Arc::new(AtomicU32::new(0));
    let injector = memoized_counter(builds.clone());
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let injector = injector.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                injector.get_instance::<CounterService>().unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<CounterService>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for r in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], r));
    }
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_memoized_shared_state_across_threads() {
    let injector = memoized_counter(Arc::new(AtomicU32::new(0)));

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|_| {
                for _ in 0..100 {
                    injector.get_instance::<CounterService>().unwrap().increment();
                }
            });
        }
    })
    .unwrap();

    let counter = injector.get_instance::<CounterService>().unwrap();
    assert_eq!(counter.count.load(Ordering::SeqCst), 800);
}

#[test]
fn test_lazy_concurrent_single_computation() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();

    let mut binder = Binder::new();
    binder
        .bind::<String>()
        .to_constructor(&Signature::new(), move |_| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(format!("value-{}", n))
        })
        .unwrap();
    let injector = binder.build();

    let lazy: Lazy<String> = Lazy::new(injector.get_provider::<String>());
    let barrier = Barrier::new(12);

    let values: Vec<Arc<String>> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..12)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    lazy.get().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    assert_eq!(values[0].as_str(), "value-0");
    assert!(lazy.is_initialized());
}

#[test]
fn test_providers_are_independent_per_thread() {
    let builds = Arc::new(AtomicU32::new(0));
    let seen = builds.clone();

    let mut binder = Binder::new();
    binder
        .bind::<u32>()
        .to_constructor(&Signature::new(), move |_| Ok(seen.fetch_add(1, Ordering::SeqCst)))
        .unwrap();
    let provider: InjectorProvider<u32> = binder.build().get_provider::<u32>();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = provider.clone();
            thread::spawn(move || {
                (0..10).map(|_| *provider.get().unwrap()).collect::<Vec<u32>>()
            })
        })
        .collect();

    let mut all: Vec<u32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    all.sort_unstable();
    all.dedup();
    // Every call produced a distinct fresh value.
    assert_eq!(all.len(), 80);
    assert_eq!(builds.load(Ordering::SeqCst), 80);
}

#[test]
fn test_concurrent_auto_registration() {
    let registry = Arc::new(InjectableRegistry::new());
    registry.register::<SlowSingleton>().unwrap();
    let injector = Injector::with_registry(Binder::new(), registry);
    let barrier = Arc::new(Barrier::new(10));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let injector = injector.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                injector.get_instance::<SlowSingleton>().unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<SlowSingleton>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for r in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], r));
    }
    assert_eq!(injector.len(), 1);
}

#[test]
fn test_memoized_dependency_chain_under_contention() {
    struct Leaf;
    struct Branch {
        leaf: Arc<Leaf>,
    }

    let leaves = Arc::new(AtomicU32::new(0));
    let seen = leaves.clone();

    let mut binder = Binder::new();
    binder
        .bind::<Leaf>()
        .with_memoization()
        .to_constructor(&Signature::new(), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Leaf)
        })
        .unwrap();
    binder
        .bind::<Branch>()
        .to_constructor(&Signature::new().value::<Leaf>("leaf"), |args: &Args<'_>| {
            Ok(Branch { leaf: args.value("leaf")? })
        })
        .unwrap();
    let injector = binder.build();

    let branches: Vec<Arc<Branch>> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|_| injector.get_instance::<Branch>().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(leaves.load(Ordering::SeqCst), 1);
    assert!(branches.iter().all(|b| Arc::ptr_eq(&b.leaf, &branches[0].leaf)));
}
