//! The built, queryable object graph.
//!
//! A [`Context`] is produced by [`ContextFactory::build`] and never changes
//! afterwards. Beans are looked up by identifier or by nearest type, with
//! delegation to an optional parent when the local lookup misses. Instances
//! are constructed lazily on first request.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::artifact::{ArtifactHolder, ArtifactLoader};
use crate::descriptors::BeanDescriptor;
use crate::error::{DiError, DiResult};
use crate::observer::Observers;
use crate::property::PropertyRef;
use crate::types::{Instance, TypeHandle, TypeRegistry};

mod factory;
mod resolver;

pub use factory::ContextFactory;
pub use resolver::ResolverContext;

pub(crate) struct ContextInner {
    pub(crate) properties: IndexMap<String, PropertyRef>,
    pub(crate) descriptors: Vec<BeanDescriptor>,
    pub(crate) artifacts: HashMap<String, Arc<ArtifactHolder>>,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) loader: Arc<dyn ArtifactLoader>,
    pub(crate) observers: Observers,
    pub(crate) parent: Option<Context>,
}

/// Immutable graph of bean properties.
///
/// Cloning is cheap and yields a handle to the same graph; a child context
/// keeps its parent alive.
///
/// # Thread Safety
///
/// `Context` is `Send + Sync`. Traversal takes no locks; the only
/// synchronisation is per singleton on its first construction and per literal
/// or list on its first coercion.
///
/// # Examples
///
/// ```
/// use ferrous_beans::{ArgValue, BeanSpec, ContextFactory, TypeDescriptor, TypeRegistry};
///
/// struct Greeter { greeting: String }
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(
///         TypeDescriptor::builder::<Greeter>("Greeter")
///             .constructor(&["string"], |args| Ok(Greeter { greeting: args.text(0)? })),
///     )
///     .unwrap();
///
/// let context = ContextFactory::new()
///     .with_registry(registry)
///     .with(BeanSpec::new("Greeter").with_id("greeter").arg(ArgValue::literal("hello")))
///     .build()
///     .unwrap();
///
/// let greeter = context.get_named::<Greeter>("greeter").unwrap();
/// assert_eq!(greeter.greeting, "hello");
/// ```
#[derive(Clone)]
pub struct Context {
    pub(crate) inner: Arc<ContextInner>,
}

impl Context {
    /// Resolver over this context, for evaluating properties directly.
    pub fn resolver(&self) -> ResolverContext<'_> {
        ResolverContext::new(self)
    }

    pub(crate) fn lookup(&self, id: &str) -> Option<(PropertyRef, Context)> {
        match self.inner.properties.get(id) {
            Some(property) => Some((property.clone(), self.clone())),
            None => self.inner.parent.as_ref().and_then(|p| p.lookup(id)),
        }
    }

    /// The property bound to `id` here or in a parent, paired with its owner.
    pub fn get_bean_reference(&self, id: &str) -> DiResult<PropertyHandle> {
        self.lookup(id)
            .map(|(property, owner)| PropertyHandle { property, owner })
            .ok_or_else(|| DiError::NotFound(id.to_string()))
    }

    /// The bean bound to `id`, as an instance of `target`.
    ///
    /// A local miss delegates entirely to the parent. A bean whose type is not
    /// assignable to `target` is reported as [`DiError::BeanNotOfType`].
    pub fn get_bean_by_id(&self, id: &str, target: &TypeHandle) -> DiResult<Instance> {
        let handle = self.get_bean_reference(id)?;
        let actual = handle.value_type()?;
        if !actual.is_assignable_to(target) {
            return Err(DiError::BeanNotOfType {
                bean: id.to_string(),
                expected: target.name(),
                actual: actual.name(),
            });
        }
        handle.morph(target)?.value()
    }

    /// The local bean whose type is nearest to `target`, else the parent's.
    ///
    /// Distance counts generalisation steps from a bean's type to `target`.
    /// Equally near beans are decided by declaration order (external instances
    /// first, then top-level beans, then nested beans); callers should not
    /// depend on that choice.
    pub fn get_bean_of(&self, target: &TypeHandle) -> DiResult<Instance> {
        match self.nearest(target) {
            Some(property) => {
                let cx = self.resolver();
                property.morph(&cx, target)?.value(&cx)
            }
            None => match &self.inner.parent {
                Some(parent) => parent.get_bean_of(target),
                None => Err(DiError::NoBeanOfType(target.name())),
            },
        }
    }

    fn nearest(&self, target: &TypeHandle) -> Option<PropertyRef> {
        let cx = self.resolver();
        let mut best: Option<(u32, &PropertyRef)> = None;
        for (id, property) in &self.inner.properties {
            let ty = match property.value_type(&cx) {
                Ok(ty) => ty,
                Err(error) => {
                    debug!(bean = %id, %error, "skipping bean with unresolvable type");
                    continue;
                }
            };
            if let Some(distance) = ty.distance(target) {
                if best.map_or(true, |(nearest, _)| distance < nearest) {
                    best = Some((distance, property));
                    if distance == 0 {
                        break;
                    }
                }
            }
        }
        best.map(|(_, property)| property.clone())
    }

    /// The registered type carrying Rust values of type `T`.
    pub fn type_of<T: ?Sized + 'static>(&self) -> Option<TypeHandle> {
        self.inner.registry.lookup_type_id(TypeId::of::<T>())
    }

    /// Resolves a type name, including `T[]` and `list<T>` forms.
    pub fn type_named(&self, name: &str) -> Option<TypeHandle> {
        self.inner.registry.resolve(name)
    }

    /// The nearest bean of the type registered for `T`.
    pub fn get_bean<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let ty = self.type_of::<T>().ok_or_else(|| no_bean_of::<T>())?;
        self.get_bean_of(&ty)?
            .downcast::<T>()
            .ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// The bean `id` as a `T`.
    pub fn get_named<T: Any + Send + Sync>(&self, id: &str) -> DiResult<Arc<T>> {
        let ty = self
            .type_of::<T>()
            .ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))?;
        self.get_bean_by_id(id, &ty)?
            .downcast::<T>()
            .ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// The nearest bean of the interface type registered for `T`.
    pub fn get_bean_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let ty = self.type_of::<T>().ok_or_else(|| no_bean_of::<T>())?;
        self.get_bean_of(&ty)?
            .downcast_trait::<T>()
            .ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// The bean `id` viewed through the interface type registered for `T`.
    pub fn get_named_trait<T: ?Sized + Send + Sync + 'static>(&self, id: &str) -> DiResult<Arc<T>> {
        let ty = self
            .type_of::<T>()
            .ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))?;
        self.get_bean_by_id(id, &ty)?
            .downcast_trait::<T>()
            .ok_or_else(|| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// Like [`get_bean`](Self::get_bean), panicking on failure.
    pub fn get_required<T: Any + Send + Sync>(&self) -> Arc<T> {
        self.get_bean::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Like [`get_named`](Self::get_named), panicking on failure.
    pub fn get_required_named<T: Any + Send + Sync>(&self, id: &str) -> Arc<T> {
        self.get_named::<T>(id)
            .unwrap_or_else(|e| panic!("Failed to resolve named {} ({}): {}", std::any::type_name::<T>(), id, e))
    }

    /// Like [`get_bean_trait`](Self::get_bean_trait), panicking on failure.
    pub fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_bean_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Whether `id` is bound here or in a parent.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.properties.contains_key(id)
            || self.inner.parent.as_ref().map_or(false, |p| p.contains(id))
    }

    /// Locally bound identifiers in lookup order.
    pub fn bean_ids(&self) -> impl Iterator<Item = &str> {
        self.inner.properties.keys().map(String::as_str)
    }

    /// Descriptors of the locally bound beans in lookup order.
    pub fn descriptors(&self) -> &[BeanDescriptor] {
        &self.inner.descriptors
    }

    /// A declared artifact by identifier.
    pub fn artifact(&self, id: &str) -> Option<&ArtifactHolder> {
        self.inner.artifacts.get(id).map(Arc::as_ref)
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.inner.registry
    }

    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("beans", &self.bean_ids().collect::<Vec<_>>())
            .field("artifacts", &self.inner.artifacts.keys().collect::<Vec<_>>())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

fn no_bean_of<T: ?Sized>() -> DiError {
    DiError::NoBeanOfType(std::any::type_name::<T>().to_string())
}

/// A property together with the context that owns it.
///
/// Returned by [`Context::get_bean_reference`] for callers that want to
/// inspect or defer resolution.
#[derive(Clone)]
pub struct PropertyHandle {
    property: PropertyRef,
    owner: Context,
}

impl PropertyHandle {
    pub fn property(&self) -> &PropertyRef {
        &self.property
    }

    /// The context the property is bound in.
    pub fn owner(&self) -> &Context {
        &self.owner
    }

    pub fn value(&self) -> DiResult<Instance> {
        self.property.value(&self.owner.resolver())
    }

    pub fn value_type(&self) -> DiResult<TypeHandle> {
        self.property.value_type(&self.owner.resolver())
    }

    pub fn is_resolvable_as(&self, target: &TypeHandle) -> bool {
        self.property.is_resolvable_as(&self.owner.resolver(), target)
    }

    pub fn morph(&self, target: &TypeHandle) -> DiResult<PropertyHandle> {
        let property = self.property.clone().morph(&self.owner.resolver(), target)?;
        Ok(PropertyHandle { property, owner: self.owner.clone() })
    }
}

impl fmt::Debug for PropertyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHandle")
            .field("type", &self.value_type().map(|t| t.name()).ok())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn context_is_send_and_sync() {
        assert_send_sync::<Context>();
        assert_send_sync::<PropertyHandle>();
    }

    #[test]
    fn externals_resolve_by_id_and_type() {
        let context = ContextFactory::new()
            .with_external::<i64>("big", 7)
            .with_external::<String>("name", "beans".to_string())
            .build()
            .unwrap();

        assert_eq!(*context.get_named::<i64>("big").unwrap(), 7);
        assert_eq!(*context.get_bean::<String>().unwrap(), "beans");
        assert!(context.contains("name"));
        assert_eq!(context.bean_ids().collect::<Vec<_>>(), vec!["big", "name"]);
    }

    #[test]
    fn wrong_type_by_id_is_typed_error() {
        let context = ContextFactory::new().with_external::<i64>("big", 7).build().unwrap();
        let string = context.type_named("string").unwrap();
        let err = context.get_bean_by_id("big", &string).unwrap_err();
        assert_eq!(err.to_string(), "Bean 'big' is a 'i64', not a 'string'");
    }

    #[test]
    fn nearest_type_prefers_exact_match() {
        let context = ContextFactory::new()
            .with_external::<i32>("small", 1)
            .with_external::<crate::Number>("exact", crate::Number::Float(2.5))
            .build()
            .unwrap();
        let number = context.type_named("number").unwrap();
        let value = context.get_bean_of(&number).unwrap();
        assert_eq!(value.downcast_ref::<crate::Number>(), Some(&crate::Number::Float(2.5)));
    }
}
