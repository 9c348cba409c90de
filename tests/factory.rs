use ferrous_inject::{
    Args, AssistedFactory, AssistedInjectable, Binder, BindingKey, DiResult, InjectableRegistry,
    Injector, Signature,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct Clock {
    now: u64,
}

struct Session {
    user: String,
    clock: Arc<Clock>,
    ids: ferrous_inject::InjectorProvider<u32>,
}

impl AssistedInjectable for Session {
    type Params = String;

    fn signature() -> Signature {
        Signature::new().value::<Clock>("clock").provider::<u32>("ids")
    }

    fn construct(user: String, args: &Args<'_>) -> DiResult<Self> {
        Ok(Session {
            user,
            clock: args.value("clock")?,
            ids: args.provider("ids")?,
        })
    }
}

fn binder_with(counter: Arc<AtomicU32>) -> Binder {
    let mut binder = Binder::new();
    binder
        .bind::<Clock>()
        .to_constructor(&Signature::new(), |_| Ok(Clock { now: 1_700_000_000 }))
        .unwrap();
    binder
        .bind::<u32>()
        .to_constructor(&Signature::new(), move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
        .unwrap();
    binder
}

#[test]
fn test_factory_mixes_params_and_dependencies() {
    let mut binder = binder_with(Arc::new(AtomicU32::new(0)));
    binder.install_factory::<Session>().unwrap();

    let factory = binder.build().get_instance::<AssistedFactory<Session>>().unwrap();
    let alice = factory.create("alice".to_string()).unwrap();
    let bob = factory.create("bob".to_string()).unwrap();

    assert_eq!(alice.user, "alice");
    assert_eq!(bob.user, "bob");
    assert_eq!(alice.clock.now, 1_700_000_000);
    // Value dependencies are resolved afresh for each created object.
    assert!(!Arc::ptr_eq(&alice.clock, &bob.clock));
    assert_eq!(factory.dependencies().len(), 2);
}

#[test]
fn test_factory_creation_resolves_nothing() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut binder = binder_with(counter.clone());
    binder.install_factory::<Session>().unwrap();

    let factory = binder.build().get_instance::<AssistedFactory<Session>>().unwrap();
    let session = factory.create("carol".to_string()).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    use ferrous_inject::Provider;
    assert_eq!(*session.ids.get().unwrap(), 0);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_factory_missing_dependency_fails_on_create() {
    let mut binder = Binder::new();
    binder.install_factory::<Session>().unwrap();

    let factory = binder.build().get_instance::<AssistedFactory<Session>>().unwrap();
    assert!(factory.create("dave".to_string()).is_err());
}

#[test]
fn test_factory_install_is_idempotent() {
    let mut binder = Binder::new();
    binder
        .install_factory::<Session>()
        .unwrap()
        .install_factory::<Session>()
        .unwrap();
    assert!(binder.contains(&BindingKey::of::<AssistedFactory<Session>>()));
    assert_eq!(binder.len(), 1);
}

#[test]
fn test_registered_factory_is_auto_injectable() {
    let registry = Arc::new(InjectableRegistry::new());
    registry.register_factory::<Session>().unwrap();

    let injector = Injector::with_registry(binder_with(Arc::new(AtomicU32::new(0))), registry);
    let factory = injector.get_instance::<AssistedFactory<Session>>().unwrap();
    assert_eq!(factory.create("erin".to_string()).unwrap().user, "erin");
}
