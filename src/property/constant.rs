use std::sync::Arc;

use parking_lot::Mutex;

use super::{Property, PropertyRef};
use crate::context::ResolverContext;
use crate::error::{DiError, DiResult};
use crate::types::coerce::{can_coerce, coerce};
use crate::types::{builtin, incompatible, Instance, TypeHandle};

/// A literal, coerced lazily into its declared or target type.
///
/// A literal with neither stays text. A declared type or a morph commits it to
/// a target, after which application types with a parser or a single `string`
/// constructor are allowed. The coerced value is memoised.
pub struct ConstantProperty {
    text: String,
    declared: Option<String>,
    target: Option<TypeHandle>,
    memo: Mutex<Option<Instance>>,
}

impl ConstantProperty {
    /// A literal with an optional declared type name.
    pub fn new(text: impl Into<String>, declared: Option<String>) -> Self {
        Self {
            text: text.into(),
            declared,
            target: None,
            memo: Mutex::new(None),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn retarget(&self, target: TypeHandle) -> Self {
        Self {
            text: self.text.clone(),
            declared: self.declared.clone(),
            target: Some(target),
            memo: Mutex::new(None),
        }
    }

    fn declared_type(&self, cx: &ResolverContext<'_>) -> DiResult<Option<TypeHandle>> {
        match &self.declared {
            None => Ok(None),
            Some(name) => cx.registry().resolve(name).map(Some).ok_or_else(|| DiError::Coercion {
                text: self.text.clone(),
                target: name.clone(),
                reason: "type is not registered".to_string(),
            }),
        }
    }

    fn coerce_now(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        let declared = self.declared_type(cx)?;
        match (&self.target, declared) {
            (Some(target), Some(declared)) => {
                let value = coerce(&self.text, &declared, cx.registry())?;
                value.upcast(target).ok_or_else(|| incompatible(&declared, target))
            }
            (Some(target), None) => {
                let value = coerce(&self.text, target, cx.registry())?;
                Ok(value.upcast(target).unwrap_or(value))
            }
            (None, Some(declared)) => coerce(&self.text, &declared, cx.registry()),
            (None, None) => coerce(&self.text, builtin::string(), cx.registry()),
        }
    }
}

impl Property for ConstantProperty {
    fn value(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        let mut memo = self.memo.lock();
        if let Some(value) = memo.as_ref() {
            return Ok(value.clone());
        }
        let value = self.coerce_now(cx)?;
        *memo = Some(value.clone());
        Ok(value)
    }

    fn value_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        if let Some(target) = &self.target {
            return Ok(target.clone());
        }
        match self.declared_type(cx)? {
            Some(declared) => Ok(declared),
            None => Ok(builtin::string().clone()),
        }
    }

    fn is_resolvable_as(&self, cx: &ResolverContext<'_>, target: &TypeHandle) -> bool {
        match self.declared_type(cx) {
            Ok(Some(declared)) => declared.is_assignable_to(target) && can_coerce(&self.text, &declared, cx.registry()),
            Ok(None) => can_coerce(&self.text, target, cx.registry()),
            Err(_) => false,
        }
    }

    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
        if self.value_type(cx).map_or(false, |current| current == *target) {
            return Ok(self);
        }
        if !self.is_resolvable_as(cx, target) {
            let current = self.value_type(cx)?;
            return Err(incompatible(&current, target));
        }
        Ok(Arc::new(self.retarget(target.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, ContextFactory, Number, TypeDescriptor, TypeRegistry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context() -> Context {
        ContextFactory::new().build().unwrap()
    }

    #[test]
    fn untargeted_constant_is_text() {
        let context = context();
        let cx = context.resolver();
        let constant = ConstantProperty::new("42", None);
        assert_eq!(constant.value_type(&cx).unwrap().name(), "string");
        assert_eq!(constant.value(&cx).unwrap().downcast_ref::<String>().unwrap(), "42");
    }

    #[test]
    fn morph_commits_to_target() {
        let context = context();
        let cx = context.resolver();
        let i32_type = context.type_named("i32").unwrap();
        let constant: PropertyRef = Arc::new(ConstantProperty::new("42", None));
        let morphed = constant.clone().morph(&cx, &i32_type).unwrap();
        assert_eq!(morphed.value(&cx).unwrap().downcast_ref::<i32>(), Some(&42));

        let again = morphed.clone().morph(&cx, &i32_type).unwrap();
        assert!(Arc::ptr_eq(&morphed, &again));

        let string = context.type_named("string").unwrap();
        let text = constant.clone().morph(&cx, &string).unwrap();
        assert!(Arc::ptr_eq(&constant, &text));
    }

    #[test]
    fn declared_type_widens_to_target() {
        let context = context();
        let cx = context.resolver();
        let number = context.type_named("number").unwrap();
        let constant: PropertyRef = Arc::new(ConstantProperty::new("7", Some("i64".to_string())));
        assert!(constant.is_resolvable_as(&cx, &number));
        let value = constant.morph(&cx, &number).unwrap().value(&cx).unwrap();
        assert_eq!(value.downcast_ref::<Number>(), Some(&Number::Integer(7)));
    }

    #[test]
    fn incompatible_morph_fails_cleanly() {
        let context = context();
        let cx = context.resolver();
        let boolean = context.type_named("bool").unwrap();
        let constant: PropertyRef = Arc::new(ConstantProperty::new("maybe", None));
        assert!(!constant.is_resolvable_as(&cx, &boolean));
        let err = constant.clone().morph(&cx, &boolean).unwrap_err();
        assert_eq!(err.to_string(), "Cannot morph 'string' into 'bool'");
        assert_eq!(constant.value(&cx).unwrap().downcast_ref::<String>().unwrap(), "maybe");
    }

    struct Hostname(String);

    #[test]
    fn untargeted_constant_never_constructs_application_types() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeDescriptor::builder::<Hostname>("Hostname").constructor(&["string"], move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Hostname(args.text(0)?))
            }))
            .unwrap();
        let context = ContextFactory::new().with_registry(registry).build().unwrap();
        let cx = context.resolver();
        let hostname = context.type_named("Hostname").unwrap();

        let constant: PropertyRef = Arc::new(ConstantProperty::new("example.org", None));
        assert!(constant.is_resolvable_as(&cx, &hostname));
        assert_eq!(constant.value(&cx).unwrap().type_handle().name(), "string");
        assert_eq!(built.load(Ordering::SeqCst), 0);

        let committed = constant.morph(&cx, &hostname).unwrap().value(&cx).unwrap();
        assert_eq!(committed.downcast_ref::<Hostname>().unwrap().0, "example.org");
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }
}
