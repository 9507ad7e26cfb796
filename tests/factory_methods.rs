use ferrous_beans::{
    ArgValue, BeanSpec, ContextFactory, DiError, ErrorKind, FactorySpec, Scope, TypeDescriptor, TypeRegistry,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

struct Connection {
    url: String,
    pooled: bool,
}

struct Pool {
    url: String,
    handed_out: AtomicUsize,
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            TypeDescriptor::builder::<Connection>("Connection")
                .static_method("open", &["string"], "Connection", |args| {
                    Ok(Connection { url: args.text(0)?, pooled: false })
                })
                .static_method("open", &["string", "bool"], "Connection", |args| {
                    Ok(Connection { url: args.text(0)?, pooled: args.value(1)? })
                }),
        )
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder::<Pool>("Pool")
                .constructor(&["string"], |args| {
                    Ok(Pool { url: args.text(0)?, handed_out: AtomicUsize::new(0) })
                })
                .method("connect", &[], "Connection", |pool: &Pool, _| {
                    pool.handed_out.fetch_add(1, Ordering::SeqCst);
                    Ok(Connection { url: pool.url.clone(), pooled: true })
                }),
        )
        .unwrap();
    registry
}

#[test]
fn test_static_factory_on_named_type() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(
            BeanSpec::from_factory(FactorySpec::on_type("Connection", "open"))
                .with_id("conn")
                .arg(ArgValue::literal("db://main")),
        )
        .build()
        .unwrap();

    let conn = context.get_named::<Connection>("conn").unwrap();
    assert_eq!(conn.url, "db://main");
    assert!(!conn.pooled);
    assert_eq!(
        context.get_bean_reference("conn").unwrap().value_type().unwrap().name(),
        "Connection"
    );
}

#[test]
fn test_static_factory_on_own_type_picks_overload_by_arity() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(
            BeanSpec::new("Connection")
                .with_id("conn")
                .with_factory(FactorySpec::local("open"))
                .arg(ArgValue::literal("db://replica"))
                .arg(ArgValue::literal("true")),
        )
        .build()
        .unwrap();

    let conn = context.get_named::<Connection>("conn").unwrap();
    assert_eq!(conn.url, "db://replica");
    assert!(conn.pooled);
}

#[test]
fn test_instance_factory_on_another_bean() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(BeanSpec::new("Pool").with_id("pool").arg(ArgValue::literal("db://pooled")))
        .with(
            BeanSpec::from_factory(FactorySpec::on_bean("pool", "connect"))
                .with_id("conn")
                .with_scope(Scope::Prototype),
        )
        .build()
        .unwrap();

    let a = context.get_named::<Connection>("conn").unwrap();
    let b = context.get_named::<Connection>("conn").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.url, "db://pooled");
    assert!(a.pooled);
    assert_eq!(context.get_named::<Pool>("pool").unwrap().handed_out.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unknown_factory_method() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(BeanSpec::new("Pool").with_id("pool").arg(ArgValue::literal("db://pooled")))
        .with(BeanSpec::from_factory(FactorySpec::on_bean("pool", "open")).with_id("conn"))
        .build()
        .unwrap();

    let err = context.get_bean_reference("conn").unwrap().value().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Bean 'conn': no applicable factory method 'open' on 'Pool' for 0 argument(s)"
    );
}

#[derive(Debug)]
struct Service {
    started: AtomicBool,
}

fn service_registry(activations: Arc<AtomicUsize>) -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            TypeDescriptor::builder::<Service>("Service")
                .constructor(&[], |_| Ok(Service { started: AtomicBool::new(false) }))
                .activation("start", move |service: &Service| {
                    activations.fetch_add(1, Ordering::SeqCst);
                    service.started.store(true, Ordering::SeqCst);
                    Ok(())
                })
                .activation("fail", |_: &Service| Err("refused to start".into())),
        )
        .unwrap();
    registry
}

#[test]
fn test_activation_runs_once_per_construction() {
    let activations = Arc::new(AtomicUsize::new(0));
    let context = ContextFactory::new()
        .with_registry(service_registry(activations.clone()))
        .with(BeanSpec::new("Service").with_id("single").with_activation("start"))
        .with(
            BeanSpec::new("Service")
                .with_id("many")
                .with_scope(Scope::Prototype)
                .with_activation("start"),
        )
        .build()
        .unwrap();

    assert!(context.get_named::<Service>("single").unwrap().started.load(Ordering::SeqCst));
    context.get_named::<Service>("single").unwrap();
    assert_eq!(activations.load(Ordering::SeqCst), 1);

    context.get_named::<Service>("many").unwrap();
    context.get_named::<Service>("many").unwrap();
    assert_eq!(activations.load(Ordering::SeqCst), 3);
}

#[test]
fn test_activation_failures() {
    let context = ContextFactory::new()
        .with_registry(service_registry(Arc::new(AtomicUsize::new(0))))
        .with(BeanSpec::new("Service").with_id("unknown").with_activation("launch"))
        .with(BeanSpec::new("Service").with_id("failing").with_activation("fail"))
        .build()
        .unwrap();

    let err = context.get_named::<Service>("unknown").unwrap_err();
    assert!(matches!(err, DiError::UnknownActivation { ref hook, .. } if hook == "launch"));
    assert_eq!(err.to_string(), "Bean 'unknown': type 'Service' has no activation hook 'launch'");

    let err = context.get_named::<Service>("failing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert_eq!(
        err.to_string(),
        "Failed to instantiate bean 'failing' of type 'Service': refused to start"
    );
}
