use ferrous_beans::{
    ArgValue, BeanKind, BeanSpec, ContextFactory, ContextObserver, DiError, Number, TypeDescriptor, TypeHandle,
    TypeRegistry,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct Config {
    host: String,
    port: i32,
    verbose: bool,
}

struct Server {
    config: Arc<Config>,
    name: String,
}

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

struct French;

impl Greeter for French {
    fn greet(&self) -> String {
        "bonjour".to_string()
    }
}

struct Meter {
    reading: Number,
}

struct TypeHolder {
    ty: TypeHandle,
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            TypeDescriptor::builder::<Config>("Config").constructor(&["string", "i32", "bool"], |args| {
                Ok(Config {
                    host: args.text(0)?,
                    port: args.value(1)?,
                    verbose: args.value(2)?,
                })
            }),
        )
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder::<Server>("Server").constructor(&["Config", "string"], |args| {
                Ok(Server {
                    config: args.get(0)?,
                    name: args.text(1)?,
                })
            }),
        )
        .unwrap();
    registry
        .register(TypeDescriptor::interface::<dyn Greeter>("Greeter"))
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder::<English>("English")
                .implements("Greeter", |e: Arc<English>| e as Arc<dyn Greeter>)
                .constructor(&[], |_| Ok(English)),
        )
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder::<French>("French")
                .implements("Greeter", |f: Arc<French>| f as Arc<dyn Greeter>)
                .constructor(&[], |_| Ok(French)),
        )
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder::<Meter>("Meter")
                .constructor(&["number"], |args| Ok(Meter { reading: args.value(0)? })),
        )
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder::<TypeHolder>("TypeHolder")
                .constructor(&["type"], |args| Ok(TypeHolder { ty: args.value(0)? })),
        )
        .unwrap();
    registry
}

fn config_spec(id: &str) -> BeanSpec {
    BeanSpec::new("Config")
        .with_id(id)
        .arg(ArgValue::literal("localhost"))
        .arg(ArgValue::literal("8080"))
        .arg(ArgValue::literal("true"))
}

#[test]
fn test_literals_coerce_to_parameter_types() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(config_spec("config"))
        .build()
        .unwrap();

    let config = context.get_named::<Config>("config").unwrap();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 8080);
    assert!(config.verbose);
}

#[test]
fn test_references_share_the_singleton() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(config_spec("config"))
        .with(
            BeanSpec::new("Server")
                .with_id("server")
                .arg(ArgValue::reference("config"))
                .arg(ArgValue::literal("main")),
        )
        .build()
        .unwrap();

    let server = context.get_named::<Server>("server").unwrap();
    let config = context.get_named::<Config>("config").unwrap();
    assert_eq!(server.name, "main");
    assert!(Arc::ptr_eq(&server.config, &config));
}

#[test]
fn test_nested_beans_are_bound_under_their_ids() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(
            BeanSpec::new("Server")
                .with_id("server")
                .arg(ArgValue::bean(config_spec("inner")))
                .arg(ArgValue::literal("nested")),
        )
        .build()
        .unwrap();

    assert!(context.contains("inner"));
    let server = context.get_named::<Server>("server").unwrap();
    let inner = context.get_named::<Config>("inner").unwrap();
    assert!(Arc::ptr_eq(&server.config, &inner));

    let nested = context.descriptors().iter().find(|d| d.id == "inner").unwrap();
    assert_eq!(nested.kind, BeanKind::Nested);
}

#[test]
fn test_lookup_by_type_picks_the_nearest() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(config_spec("config"))
        .with(BeanSpec::new("French").with_id("french"))
        .with(BeanSpec::new("English").with_id("english"))
        .build()
        .unwrap();

    // Both greeters are one step away; declaration order decides.
    let greeter = context.get_bean_trait::<dyn Greeter>().unwrap();
    assert_eq!(greeter.greet(), "bonjour");

    let english = context.get_named_trait::<dyn Greeter>("english").unwrap();
    assert_eq!(english.greet(), "hello");

    let config = context.get_bean::<Config>().unwrap();
    assert_eq!(config.port, 8080);
}

#[test]
fn test_missing_beans() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(config_spec("config"))
        .build()
        .unwrap();

    assert!(matches!(context.get_bean::<Server>(), Err(DiError::NoBeanOfType(_))));
    assert!(matches!(context.get_named::<Config>("nope"), Err(DiError::NotFound(ref id)) if id == "nope"));

    let server = context.type_named("Server").unwrap();
    let err = context.get_bean_by_id("config", &server).unwrap_err();
    assert_eq!(err.to_string(), "Bean 'config' is a 'Config', not a 'Server'");
}

#[test]
#[should_panic(expected = "Failed to resolve")]
fn test_get_required_panics_when_missing() {
    let context = ContextFactory::new().with_registry(registry()).build().unwrap();
    let _ = context.get_required::<Config>();
}

#[test]
fn test_numeric_values_widen_to_number() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with_external::<i32>("answer", 42)
        .with(BeanSpec::new("Meter").with_id("from-ref").arg(ArgValue::reference("answer")))
        .with(BeanSpec::new("Meter").with_id("from-text").arg(ArgValue::literal("2.5")))
        .build()
        .unwrap();

    assert_eq!(context.get_named::<Meter>("from-ref").unwrap().reading, Number::Integer(42));
    assert_eq!(context.get_named::<Meter>("from-text").unwrap().reading, Number::Float(2.5));
}

#[test]
fn test_type_literals_resolve_to_handles() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(BeanSpec::new("TypeHolder").with_id("holder").arg(ArgValue::literal("Config[]")))
        .build()
        .unwrap();

    let holder = context.get_named::<TypeHolder>("holder").unwrap();
    assert_eq!(holder.ty.name(), "Config[]");
    assert_eq!(Some(holder.ty.clone()), context.type_named("Config[]"));
}

#[test]
fn test_typed_reference_overrides_the_bean_type() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with_external::<i64>("big", 9)
        .with(
            BeanSpec::new("Meter")
                .with_id("meter")
                .arg(ArgValue::typed_reference("big", "number")),
        )
        .build()
        .unwrap();

    assert_eq!(context.get_named::<Meter>("meter").unwrap().reading, Number::Integer(9));
}

#[test]
fn test_bean_references_can_be_inspected() {
    let context = ContextFactory::new()
        .with_registry(registry())
        .with(config_spec("config"))
        .build()
        .unwrap();

    let handle = context.get_bean_reference("config").unwrap();
    assert_eq!(handle.value_type().unwrap().name(), "Config");
    let any = context.type_named("any").unwrap();
    assert!(handle.is_resolvable_as(&any));
    let config = handle.value().unwrap();
    assert_eq!(config.downcast_ref::<Config>().unwrap().host, "localhost");
}

#[derive(Default)]
struct Recording {
    events: Mutex<Vec<String>>,
}

impl ContextObserver for Recording {
    fn constructing(&self, bean: &str, type_name: &str) {
        self.events.lock().unwrap().push(format!("start {} {}", bean, type_name));
    }

    fn constructed(&self, bean: &str, _type_name: &str, _duration: Duration) {
        self.events.lock().unwrap().push(format!("done {}", bean));
    }

    fn construction_failed(&self, bean: &str, _error: &DiError) {
        self.events.lock().unwrap().push(format!("fail {}", bean));
    }
}

#[test]
fn test_observers_see_every_construction() {
    let observer = Arc::new(Recording::default());
    let context = ContextFactory::new()
        .with_registry(registry())
        .with_observer(observer.clone())
        .with(config_spec("config"))
        .with(
            BeanSpec::new("Server")
                .with_id("server")
                .arg(ArgValue::reference("config"))
                .arg(ArgValue::literal("main")),
        )
        .with(BeanSpec::new("Meter").with_id("broken").arg(ArgValue::literal("nan?")))
        .build()
        .unwrap();

    context.get_named::<Server>("server").unwrap();
    context.get_named::<Server>("server").unwrap();
    assert!(context.get_named::<Meter>("broken").is_err());

    let events = observer.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start server Server",
            "start config Config",
            "done config",
            "done server",
            "start broken Meter",
            "fail broken",
        ]
    );
}
