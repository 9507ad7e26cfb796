//! Properties: values obtainable now or later.
//!
//! Every node of a context's graph is a [`Property`]. A property can report
//! the type it currently produces, answer whether it could be adapted to
//! another type, adapt itself ("morph"), and produce its value. The owning
//! [`Context`](crate::Context) is supplied on each call through a
//! [`ResolverContext`], so properties never hold a reference back to it.

use std::fmt;
use std::sync::Arc;

use crate::context::ResolverContext;
use crate::error::DiResult;
use crate::types::{incompatible, Instance, TypeHandle};

mod constant;
mod list;
mod reference;

pub use constant::ConstantProperty;
pub use list::ListProperty;
pub use reference::BeanReference;

/// Shared handle to a property.
pub type PropertyRef = Arc<dyn Property>;

/// A node of the context graph.
///
/// # Contract
///
/// - [`is_resolvable_as`](Self::is_resolvable_as) has no side effects.
/// - [`morph`](Self::morph) to the type the property already produces
///   returns the same property.
/// - [`morph`](Self::morph) either returns a property that can produce the
///   requested type or fails with [`DiError::IncompatibleMorph`](crate::DiError::IncompatibleMorph)
///   or a coercion error. It never changes `self`.
pub trait Property: Send + Sync {
    /// Produces the value, constructing it if needed.
    fn value(&self, cx: &ResolverContext<'_>) -> DiResult<Instance>;

    /// The type of the values this property produces.
    fn value_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle>;

    /// Whether [`morph`](Self::morph) to `target` would succeed.
    fn is_resolvable_as(&self, cx: &ResolverContext<'_>, target: &TypeHandle) -> bool;

    /// Adapts this property to produce values of `target`.
    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef>;
}

impl fmt::Debug for dyn Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Property")
    }
}

/// Morph for properties whose value is fixed: same property for the same
/// type, a widening view for supertypes, an error otherwise.
pub(crate) fn narrow(property: PropertyRef, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
    let current = property.value_type(cx)?;
    if current == *target {
        Ok(property)
    } else if current.is_assignable_to(target) {
        Ok(Arc::new(NarrowedProperty { inner: property, target: target.clone() }))
    } else {
        Err(incompatible(&current, target))
    }
}

/// Whether a property producing `current` can be viewed as `target`.
pub(crate) fn assignable(current: DiResult<TypeHandle>, target: &TypeHandle) -> bool {
    current.map(|t| t.is_assignable_to(target)).unwrap_or(false)
}

/// A view of another property at one of its supertypes.
///
/// Shares the underlying property, so a narrowed singleton still yields the
/// single instance.
pub(crate) struct NarrowedProperty {
    inner: PropertyRef,
    target: TypeHandle,
}

impl Property for NarrowedProperty {
    fn value(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        let value = self.inner.value(cx)?;
        value
            .upcast(&self.target)
            .ok_or_else(|| incompatible(value.type_handle(), &self.target))
    }

    fn value_type(&self, _cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        Ok(self.target.clone())
    }

    fn is_resolvable_as(&self, _cx: &ResolverContext<'_>, target: &TypeHandle) -> bool {
        self.target.is_assignable_to(target)
    }

    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
        if self.target == *target {
            return Ok(self);
        }
        if !self.target.is_assignable_to(target) {
            return Err(incompatible(&self.target, target));
        }
        narrow(self.inner.clone(), cx, target)
    }
}

/// An already-live instance bound under an identifier.
pub struct ExternalInstance {
    instance: Instance,
}

impl ExternalInstance {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }
}

impl Property for ExternalInstance {
    fn value(&self, _cx: &ResolverContext<'_>) -> DiResult<Instance> {
        Ok(self.instance.clone())
    }

    fn value_type(&self, _cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        Ok(self.instance.type_handle().clone())
    }

    fn is_resolvable_as(&self, _cx: &ResolverContext<'_>, target: &TypeHandle) -> bool {
        self.instance.type_handle().is_assignable_to(target)
    }

    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
        narrow(self, cx, target)
    }
}
