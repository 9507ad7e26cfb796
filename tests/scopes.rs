use ferrous_beans::{ArgValue, BeanSpec, ContextFactory, DiError, ErrorKind, Scope, TypeDescriptor, TypeRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

struct Widget {
    serial: usize,
}

fn counting_registry(created: Arc<AtomicUsize>, delay: Duration) -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register(TypeDescriptor::builder::<Widget>("Widget").constructor(&[], move |_| {
            thread::sleep(delay);
            Ok(Widget { serial: created.fetch_add(1, Ordering::SeqCst) })
        }))
        .unwrap();
    registry
}

#[test]
fn test_prototype_creates_distinct_instances() {
    let created = Arc::new(AtomicUsize::new(0));
    let context = ContextFactory::new()
        .with_registry(counting_registry(created.clone(), Duration::ZERO))
        .with(BeanSpec::new("Widget").with_id("widget").with_scope(Scope::Prototype))
        .build()
        .unwrap();

    let a = context.get_named::<Widget>("widget").unwrap();
    let b = context.get_named::<Widget>("widget").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.serial, b.serial);
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[test]
fn test_singleton_is_built_lazily_and_once() {
    let created = Arc::new(AtomicUsize::new(0));
    let context = ContextFactory::new()
        .with_registry(counting_registry(created.clone(), Duration::ZERO))
        .with(BeanSpec::new("Widget").with_id("widget"))
        .build()
        .unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 0);

    let a = context.get_named::<Widget>("widget").unwrap();
    let b = context.get_bean::<Widget>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[test]
fn test_singleton_under_concurrent_first_access() {
    const THREADS: usize = 16;
    let created = Arc::new(AtomicUsize::new(0));
    let context = ContextFactory::new()
        .with_registry(counting_registry(created.clone(), Duration::from_millis(20)))
        .with(BeanSpec::new("Widget").with_id("widget"))
        .build()
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let context = context.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                context.get_named::<Widget>("widget").unwrap()
            })
        })
        .collect();

    let widgets: Vec<Arc<Widget>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(created.load(Ordering::SeqCst), 1);
    for widget in &widgets[1..] {
        assert!(Arc::ptr_eq(&widgets[0], widget));
    }
}

#[derive(Debug)]
struct Flaky;

#[test]
fn test_failed_singleton_build_can_be_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let mut registry = TypeRegistry::new();
    registry
        .register(TypeDescriptor::builder::<Flaky>("Flaky").constructor(&[], move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err("warming up".into());
            }
            Ok(Flaky)
        }))
        .unwrap();

    let context = ContextFactory::new()
        .with_registry(registry)
        .with(BeanSpec::new("Flaky").with_id("flaky"))
        .build()
        .unwrap();

    let err = context.get_named::<Flaky>("flaky").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert_eq!(
        err.to_string(),
        "Failed to instantiate bean 'flaky' of type 'Flaky': warming up"
    );

    let first = context.get_named::<Flaky>("flaky").unwrap();
    let second = context.get_named::<Flaky>("flaky").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[derive(Debug)]
struct Fragile;

#[test]
fn test_constructor_panics_become_instantiation_errors() {
    let mut registry = TypeRegistry::new();
    registry
        .register(TypeDescriptor::builder::<Fragile>("Fragile").constructor(&["string"], |args| {
            let text = args.text(0)?;
            if text == "boom" {
                panic!("boom");
            }
            Ok(Fragile)
        }))
        .unwrap();

    let context = ContextFactory::new()
        .with_registry(registry)
        .with(
            BeanSpec::new("Fragile")
                .with_id("fragile")
                .with_scope(Scope::Prototype)
                .arg(ArgValue::literal("boom")),
        )
        .build()
        .unwrap();

    match context.get_named::<Fragile>("fragile") {
        Err(DiError::Instantiation { bean, type_name, source }) => {
            assert_eq!(bean, "fragile");
            assert_eq!(type_name, "Fragile");
            assert_eq!(source.to_string(), "constructor panicked: boom");
        }
        other => panic!("expected an instantiation error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_scope_names_parse() {
    assert_eq!("prototype".parse::<Scope>().unwrap(), Scope::Prototype);
    assert_eq!("singleton".parse::<Scope>().unwrap(), Scope::Singleton);
    assert_eq!(Scope::default(), Scope::Singleton);
    assert!("request".parse::<Scope>().is_err());
}
