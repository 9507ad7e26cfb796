use std::sync::Arc;

use super::BeanInstanceFactory;
use crate::context::ResolverContext;
use crate::error::DiResult;
use crate::property::{assignable, narrow, Property, PropertyRef};
use crate::types::{Instance, TypeHandle};

/// Constructs a fresh instance on every request.
pub(crate) struct PrototypeBeanFactory {
    base: BeanInstanceFactory,
}

impl PrototypeBeanFactory {
    pub(crate) fn new(base: BeanInstanceFactory) -> Self {
        Self { base }
    }
}

impl Property for PrototypeBeanFactory {
    fn value(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        self.base.construct(cx)
    }

    fn value_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        self.base.value_type(cx)
    }

    fn is_resolvable_as(&self, cx: &ResolverContext<'_>, target: &TypeHandle) -> bool {
        assignable(self.base.value_type(cx), target)
    }

    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
        narrow(self, cx, target)
    }
}
