use std::sync::Arc;

use super::{Property, PropertyRef};
use crate::context::{Context, ResolverContext};
use crate::error::{DiError, DiResult};
use crate::types::{incompatible, Instance, TypeHandle};

/// Named indirection to another property.
///
/// The referenced property is looked up through the context on every call,
/// locally first and then through the parents, and is evaluated against the
/// context that owns it. An optional type name overrides the type the
/// reference produces; it names a type of the declaring bean's loading
/// context.
pub struct BeanReference {
    id: String,
    type_name: Option<String>,
    declared_by: Option<String>,
    target: Option<TypeHandle>,
}

impl BeanReference {
    pub fn new(id: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            type_name,
            declared_by: None,
            target: None,
        }
    }

    /// Records the bean whose argument this reference is.
    pub fn declared_by(mut self, bean: impl Into<String>) -> Self {
        self.declared_by = Some(bean.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn referenced(&self, cx: &ResolverContext<'_>) -> DiResult<(PropertyRef, Context)> {
        cx.lookup(&self.id)
    }

    fn override_type(&self, cx: &ResolverContext<'_>) -> DiResult<Option<TypeHandle>> {
        if let Some(target) = &self.target {
            return Ok(Some(target.clone()));
        }
        match &self.type_name {
            None => Ok(None),
            Some(name) => cx.registry().resolve(name).map(Some).ok_or_else(|| DiError::TypeNotFound {
                bean: self.declared_by.clone().unwrap_or_else(|| self.id.clone()),
                type_name: name.clone(),
                artifact: None,
            }),
        }
    }
}

impl Property for BeanReference {
    fn value(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        let (property, owner) = self.referenced(cx)?;
        let owner_cx = owner.resolver();
        match self.override_type(cx)? {
            Some(target) => property.morph(&owner_cx, &target)?.value(&owner_cx),
            None => property.value(&owner_cx),
        }
    }

    fn value_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        if let Some(target) = self.override_type(cx)? {
            return Ok(target);
        }
        let (property, owner) = self.referenced(cx)?;
        property.value_type(&owner.resolver())
    }

    fn is_resolvable_as(&self, cx: &ResolverContext<'_>, target: &TypeHandle) -> bool {
        let (property, owner) = match self.referenced(cx) {
            Ok(found) => found,
            Err(_) => return false,
        };
        let owner_cx = owner.resolver();
        match self.override_type(cx) {
            Ok(Some(own)) => own.is_assignable_to(target) && property.is_resolvable_as(&owner_cx, &own),
            Ok(None) => property.is_resolvable_as(&owner_cx, target),
            Err(_) => false,
        }
    }

    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
        let current = self.value_type(cx)?;
        if current == *target {
            return Ok(self);
        }
        if !self.is_resolvable_as(cx, target) {
            return Err(incompatible(&current, target));
        }
        Ok(Arc::new(BeanReference {
            id: self.id.clone(),
            type_name: self.type_name.clone(),
            declared_by: self.declared_by.clone(),
            target: Some(target.clone()),
        }))
    }
}
