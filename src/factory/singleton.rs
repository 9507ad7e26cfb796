use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{trace, warn};

use super::BeanInstanceFactory;
use crate::context::ResolverContext;
use crate::error::DiResult;
use crate::property::{assignable, narrow, Property, PropertyRef};
use crate::types::{Instance, TypeHandle};

/// Constructs at most once per context and shares the instance.
///
/// Unbuilt until the first successful construction. The first caller to find
/// it unbuilt takes the build lock, checks again and builds; concurrent callers
/// wait on the lock and then read the stored instance. A failed build releases
/// the lock and leaves the factory unbuilt.
pub(crate) struct SingletonBeanFactory {
    base: BeanInstanceFactory,
    instance: OnceCell<Instance>,
    build_lock: Mutex<()>,
}

impl SingletonBeanFactory {
    pub(crate) fn new(base: BeanInstanceFactory) -> Self {
        Self {
            base,
            instance: OnceCell::new(),
            build_lock: Mutex::new(()),
        }
    }
}

impl Property for SingletonBeanFactory {
    fn value(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        if let Some(instance) = self.instance.get() {
            return Ok(instance.clone());
        }

        let _guard = self.build_lock.lock();
        if let Some(instance) = self.instance.get() {
            return Ok(instance.clone());
        }
        match self.base.construct(cx) {
            Ok(instance) => {
                trace!(bean = %self.base.id(), "singleton built");
                Ok(self.instance.get_or_init(|| instance).clone())
            }
            Err(error) => {
                warn!(bean = %self.base.id(), %error, "singleton construction failed");
                Err(error)
            }
        }
    }

    fn value_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        match self.instance.get() {
            Some(instance) => Ok(instance.type_handle().clone()),
            None => self.base.value_type(cx),
        }
    }

    fn is_resolvable_as(&self, cx: &ResolverContext<'_>, target: &TypeHandle) -> bool {
        assignable(self.value_type(cx), target)
    }

    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
        narrow(self, cx, target)
    }
}
