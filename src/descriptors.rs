//! Bean descriptors for introspection and diagnostics.

use crate::scope::Scope;

/// Where a bound identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeanKind {
    /// Top-level declaration
    Declared,
    /// Declared inline as another bean's argument
    Nested,
    /// Already-live instance supplied to the factory
    External,
}

/// Bean descriptor for introspection and diagnostics
///
/// Describes one identifier bound in a [`Context`](crate::Context), in the
/// order lookups by type consider them.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanKind, BeanSpec, ContextFactory, Scope, TypeDescriptor, TypeRegistry};
///
/// struct Clock;
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(TypeDescriptor::builder::<Clock>("Clock").constructor(&[], |_| Ok(Clock)))
///     .unwrap();
///
/// let context = ContextFactory::new()
///     .with_registry(registry)
///     .with_external::<i32>("port", 8080)
///     .with(BeanSpec::new("Clock").with_id("clock").with_scope(Scope::Prototype))
///     .build()
///     .unwrap();
///
/// let descriptors = context.descriptors();
/// assert_eq!(descriptors[0].id, "port");
/// assert_eq!(descriptors[0].kind, BeanKind::External);
/// assert_eq!(descriptors[1].type_name.as_deref(), Some("Clock"));
/// assert_eq!(descriptors[1].scope, Some(Scope::Prototype));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanDescriptor {
    /// Bound identifier, possibly synthesised
    pub id: String,
    /// Declared implementation type, or the value's type for externals
    pub type_name: Option<String>,
    /// Scope of declared beans; `None` for externals
    pub scope: Option<Scope>,
    /// Artifact the implementation type is loaded from
    pub artifact: Option<String>,
    pub kind: BeanKind,
}

impl BeanDescriptor {
    /// Whether the identifier was generated rather than declared.
    pub fn is_synthesized(&self) -> bool {
        self.kind != BeanKind::External && self.id.contains('#')
    }
}
