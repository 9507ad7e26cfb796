//! Resolver context handed to properties.

use std::sync::Arc;

use super::Context;
use crate::artifact::ArtifactLoader;
use crate::error::{DiError, DiResult};
use crate::observer::Observers;
use crate::property::PropertyRef;
use crate::types::TypeRegistry;

/// The context a property is evaluated against.
///
/// Properties do not store their owning [`Context`]; every property operation
/// receives one of these instead. Referenced properties found in a parent
/// context are evaluated against the parent's resolver. While a bean's
/// arguments are resolved, type names resolve in the bean's loading context.
///
/// # Examples
///
/// ```
/// use ferrous_beans::ContextFactory;
///
/// let context = ContextFactory::new()
///     .with_external::<i32>("answer", 42)
///     .build()
///     .unwrap();
///
/// let cx = context.resolver();
/// let (property, owner) = cx.lookup("answer").unwrap();
/// let value = property.value(&owner.resolver()).unwrap();
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// ```
#[derive(Clone, Copy)]
pub struct ResolverContext<'a> {
    context: &'a Context,
    registry: &'a Arc<TypeRegistry>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(context: &'a Context) -> Self {
        Self {
            context,
            registry: &context.inner.registry,
        }
    }

    /// The same context, resolving type names in `registry`.
    pub(crate) fn within<'b>(&self, registry: &'b Arc<TypeRegistry>) -> ResolverContext<'b>
    where
        'a: 'b,
    {
        ResolverContext {
            context: self.context,
            registry,
        }
    }

    /// The context being resolved against.
    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// The registry type names resolve in.
    pub fn registry(&self) -> &'a Arc<TypeRegistry> {
        self.registry
    }

    /// The context's own registry, whatever the current loading context.
    pub(crate) fn ambient(&self) -> &'a Arc<TypeRegistry> {
        &self.context.inner.registry
    }

    /// Finds the property bound to `id` here or in a parent, with the context
    /// that owns it.
    pub fn lookup(&self, id: &str) -> DiResult<(PropertyRef, Context)> {
        self.context
            .lookup(id)
            .ok_or_else(|| DiError::NotFound(id.to_string()))
    }

    pub(crate) fn loader(&self) -> &'a dyn ArtifactLoader {
        self.context.inner.loader.as_ref()
    }

    pub(crate) fn observers(&self) -> &'a Observers {
        &self.context.inner.observers
    }
}
