//! # ferrous-beans
//!
//! Declarative object-graph construction for Rust: describe components
//! ("beans") as data, and get back an immutable, thread-safe [`Context`] that
//! wires them together on demand.
//!
//! ## Features
//!
//! - **Declarative specifications**: implementation type, scope, constructor
//!   arguments (literals, nested beans, references, lists) as plain data
//! - **Constructor selection by specificity**: the narrowest applicable
//!   signature wins, text parameters lose to typed ones
//! - **Morphing**: text coerces into numbers, type handles or any type with a
//!   registered parser; lists become arrays of the parameter's element type
//! - **Scopes**: prototype (fresh per request) and singleton (built once,
//!   double-checked locking)
//! - **Hierarchical contexts**: local bindings shadow the parent's
//! - **Artifact isolation**: types loaded per URI into their own registry
//! - **Cycle detection**: cyclic declarations are rejected before anything is
//!   constructed
//! - **Factory methods and activation hooks**
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_beans::{ArgValue, BeanSpec, ContextFactory, TypeDescriptor, TypeRegistry};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//!     pool_size: i32,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! // Describe the types the container may construct
//! let mut registry = TypeRegistry::new();
//! registry
//!     .register(
//!         TypeDescriptor::builder::<Database>("Database").constructor(&["string", "i32"], |args| {
//!             Ok(Database { url: args.text(0)?, pool_size: args.value(1)? })
//!         }),
//!     )
//!     .unwrap();
//! registry
//!     .register(
//!         TypeDescriptor::builder::<UserService>("UserService")
//!             .constructor(&["Database"], |args| Ok(UserService { db: args.get(0)? })),
//!     )
//!     .unwrap();
//!
//! // Declare the beans
//! let context = ContextFactory::new()
//!     .with_registry(registry)
//!     .with(
//!         BeanSpec::new("Database")
//!             .with_id("db")
//!             .arg(ArgValue::literal("postgres://localhost"))
//!             .arg(ArgValue::literal("16")),
//!     )
//!     .with(BeanSpec::new("UserService").with_id("users").arg(ArgValue::reference("db")))
//!     .build()
//!     .unwrap();
//!
//! let users = context.get_required_named::<UserService>("users");
//! assert_eq!(users.db.url, "postgres://localhost");
//! assert_eq!(users.db.pool_size, 16);
//! assert!(Arc::ptr_eq(&users.db, &context.get_required::<Database>()));
//! ```
//!
//! ## Scopes
//!
//! - **Singleton** (default): constructed on first request, then shared
//! - **Prototype**: constructed on every request
//!
//! ## Cargo features
//!
//! - `config`: serde support for the declaration types and
//!   [`ContextSpec::from_json`](crate::ContextSpec::from_json)

pub mod artifact;
#[cfg(feature = "config")]
pub mod config;
pub mod context;
pub mod definition;
pub mod descriptors;
pub mod error;
pub mod observer;
pub mod property;
pub mod scope;
pub mod types;

mod factory;
mod internal;

pub use artifact::{ArtifactHolder, ArtifactLoader, Registrar, StaticArtifactLoader};
#[cfg(feature = "config")]
pub use config::ContextSpec;
pub use context::{Context, ContextFactory, PropertyHandle, ResolverContext};
pub use definition::{ArgSpec, ArgValue, ArtifactSpec, BeanSpec, FactorySpec, ListSpec};
pub use descriptors::{BeanDescriptor, BeanKind};
pub use error::{BoxError, ConstructorPanic, DiError, DiResult, ErrorKind, SharedError};
pub use observer::{ContextObserver, TracingObserver};
pub use property::{BeanReference, ConstantProperty, ExternalInstance, ListProperty, Property, PropertyRef};
pub use scope::Scope;
pub use types::{
    AnyArc, Args, Instance, MethodSignature, Number, Sequence, Shape, Signature, TypeDescriptor,
    TypeDescriptorBuilder, TypeHandle, TypeRegistry,
};
pub use url::Url;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        id: usize,
    }

    static CREATED: AtomicUsize = AtomicUsize::new(0);

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeDescriptor::builder::<Counter>("Counter").constructor(&[], |_| {
                Ok(Counter { id: CREATED.fetch_add(1, Ordering::SeqCst) })
            }))
            .unwrap();
        registry
    }

    #[test]
    fn singleton_is_shared_and_prototype_is_not() {
        let context = ContextFactory::new()
            .with_registry(registry())
            .with(BeanSpec::new("Counter").with_id("one"))
            .with(BeanSpec::new("Counter").with_id("many").with_scope(Scope::Prototype))
            .build()
            .unwrap();

        let a = context.get_named::<Counter>("one").unwrap();
        let b = context.get_named::<Counter>("one").unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));

        let c = context.get_named::<Counter>("many").unwrap();
        let d = context.get_named::<Counter>("many").unwrap();
        assert_ne!(c.id, d.id);
    }

    #[test]
    fn unknown_bean_is_not_found() {
        let context = ContextFactory::new().build().unwrap();
        let err = context.get_bean_reference("missing").unwrap_err();
        assert_eq!(err.to_string(), "Bean not found: missing");
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }
}
