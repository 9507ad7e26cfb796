//! Loading contexts: name to type maps with parent delegation.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{TypeDescriptorBuilder, TypeHandle};
use crate::error::DiResult;

/// A loading context mapping type names to registered types.
///
/// Lookups that miss locally are delegated to the parent registry. Every
/// registry created with [`TypeRegistry::new`] sits on top of the core
/// registry, so the built-in names (`any`, `string`, `number`, `i8`, `i16`,
/// `i32`, `i64`, `f32`, `f64`, `char`, `bool`, `type`) always resolve.
///
/// Besides plain names, [`resolve`](Self::resolve) understands the sequence
/// forms `T[]` and `list<T>`.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{TypeDescriptor, TypeRegistry};
///
/// struct Port(u16);
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(TypeDescriptor::builder::<Port>("Port").parser(|s: &str| s.parse().map(Port)))
///     .unwrap();
///
/// assert!(registry.resolve("Port").is_some());
/// assert_eq!(registry.resolve("Port[]").unwrap().name(), "Port[]");
/// assert_eq!(registry.resolve("list<i32>").unwrap().name(), "list<i32>");
/// assert!(registry.resolve("Missing").is_none());
/// ```
pub struct TypeRegistry {
    types: HashMap<String, TypeHandle>,
    by_type_id: HashMap<TypeId, TypeHandle>,
    parent: Option<Arc<TypeRegistry>>,
}

impl TypeRegistry {
    /// Creates an empty registry delegating to the core registry.
    pub fn new() -> Self {
        Self::with_parent(builtin::registry().clone())
    }

    /// Creates an empty registry delegating to `parent`.
    pub fn with_parent(parent: Arc<TypeRegistry>) -> Self {
        Self {
            types: HashMap::new(),
            by_type_id: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// The shared registry of core types.
    pub fn core() -> Arc<TypeRegistry> {
        builtin::registry().clone()
    }

    fn root() -> Self {
        Self {
            types: HashMap::new(),
            by_type_id: HashMap::new(),
            parent: None,
        }
    }

    /// Resolves the builder's type references and adds the resulting type.
    ///
    /// Registering a name that already exists locally replaces the earlier
    /// type; previously returned handles keep pointing at the old descriptor.
    pub fn register<T: ?Sized>(&mut self, builder: TypeDescriptorBuilder<T>) -> DiResult<TypeHandle> {
        let descriptor = builder.resolve(self)?;
        let name = descriptor.name().to_string();
        let type_id = descriptor.type_id();
        let handle = TypeHandle::named(descriptor);
        if let Some(type_id) = type_id {
            self.by_type_id.insert(type_id, handle.clone());
        }
        self.types.insert(name, handle.clone());
        Ok(handle)
    }

    /// Looks a type up by name, locally first and then through the parents.
    pub fn resolve(&self, name: &str) -> Option<TypeHandle> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return self.resolve(element).map(TypeHandle::array);
        }
        if let Some(element) = name.strip_prefix("list<").and_then(|rest| rest.strip_suffix('>')) {
            return self.resolve(element).map(TypeHandle::list);
        }
        match self.types.get(name) {
            Some(handle) => Some(handle.clone()),
            None => self.parent.as_ref().and_then(|p| p.resolve(name)),
        }
    }

    /// Looks a type up by the Rust type its values carry.
    pub fn lookup_type_id(&self, type_id: TypeId) -> Option<TypeHandle> {
        match self.by_type_id.get(&type_id) {
            Some(handle) => Some(handle.clone()),
            None => self.parent.as_ref().and_then(|p| p.lookup_type_id(type_id)),
        }
    }

    /// Whether `name` is registered in this registry itself, ignoring parents.
    pub fn defines(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn parent(&self) -> Option<&Arc<TypeRegistry>> {
        self.parent.as_ref()
    }

    /// Names registered locally.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry")
            .field("types", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

pub(crate) mod builtin {
    use std::sync::Arc;

    use once_cell::sync::Lazy;

    use super::TypeRegistry;
    use crate::error::DiResult;
    use crate::types::{Number, TypeDescriptor, TypeHandle};

    struct Core {
        registry: Arc<TypeRegistry>,
        any: TypeHandle,
        string: TypeHandle,
        type_handle: TypeHandle,
    }

    static CORE: Lazy<Core> = Lazy::new(|| build().expect("core type descriptors are well formed"));

    macro_rules! integer {
        ($registry:expr, $ty:ty, $name:literal) => {
            $registry.register(
                TypeDescriptor::builder::<$ty>($name)
                    .parser(|s: &str| s.parse::<$ty>())
                    .extends_with("number", |v: &$ty| Number::Integer(*v as i64))
                    .core(),
            )?
        };
    }

    macro_rules! float {
        ($registry:expr, $ty:ty, $name:literal) => {
            $registry.register(
                TypeDescriptor::builder::<$ty>($name)
                    .parser(|s: &str| s.parse::<$ty>())
                    .extends_with("number", |v: &$ty| Number::Float(*v as f64))
                    .core(),
            )?
        };
    }

    fn build() -> DiResult<Core> {
        let mut registry = TypeRegistry::root();
        let any = registry.register(TypeDescriptor::abstract_type("any").core())?;
        let string = registry.register(TypeDescriptor::builder::<String>("string").core())?;
        registry.register(
            TypeDescriptor::builder::<Number>("number")
                .parser(|s: &str| s.parse::<Number>())
                .core(),
        )?;
        integer!(registry, i8, "i8");
        integer!(registry, i16, "i16");
        integer!(registry, i32, "i32");
        integer!(registry, i64, "i64");
        float!(registry, f32, "f32");
        float!(registry, f64, "f64");
        registry.register(
            TypeDescriptor::builder::<char>("char")
                .parser(|s: &str| s.parse::<char>())
                .core(),
        )?;
        registry.register(
            TypeDescriptor::builder::<bool>("bool")
                .parser(|s: &str| s.parse::<bool>())
                .core(),
        )?;
        let type_handle = registry.register(TypeDescriptor::builder::<TypeHandle>("type").core())?;

        Ok(Core {
            registry: Arc::new(registry),
            any,
            string,
            type_handle,
        })
    }

    pub(crate) fn registry() -> &'static Arc<TypeRegistry> {
        &CORE.registry
    }

    pub(crate) fn any() -> &'static TypeHandle {
        &CORE.any
    }

    pub(crate) fn string() -> &'static TypeHandle {
        &CORE.string
    }

    pub(crate) fn type_handle() -> &'static TypeHandle {
        &CORE.type_handle
    }
}
