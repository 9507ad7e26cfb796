use std::sync::Arc;

use parking_lot::Mutex;

use super::{narrow, Property, PropertyRef};
use crate::context::ResolverContext;
use crate::error::{DiError, DiResult};
use crate::types::{builtin, incompatible, Instance, Sequence, Shape, TypeHandle};

/// An ordered list of nested properties materialised as a [`Sequence`].
///
/// Morphing to `T[]` or `list<T>` re-targets the shape and the element type;
/// the items themselves are morphed to the element type when the sequence is
/// built, in declaration order.
pub struct ListProperty {
    items: Vec<PropertyRef>,
    element: Element,
    shape: Shape,
    memo: Mutex<Option<Instance>>,
}

enum Element {
    Declared(Option<String>),
    Resolved(TypeHandle),
}

impl ListProperty {
    /// A list of `items` with an optional declared element type name.
    pub fn new(items: Vec<PropertyRef>, element_type: Option<String>, shape: Shape) -> Self {
        Self {
            items,
            element: Element::Declared(element_type),
            shape,
            memo: Mutex::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn element_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        match &self.element {
            Element::Resolved(element) => Ok(element.clone()),
            Element::Declared(None) => Ok(builtin::any().clone()),
            Element::Declared(Some(name)) => cx.registry().resolve(name).ok_or_else(|| DiError::Coercion {
                text: format!("[{} items]", self.items.len()),
                target: name.clone(),
                reason: "element type is not registered".to_string(),
            }),
        }
    }

    fn items_resolvable_as(&self, cx: &ResolverContext<'_>, element: &TypeHandle) -> bool {
        self.items.iter().all(|item| item.is_resolvable_as(cx, element))
    }
}

impl Property for ListProperty {
    fn value(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        let mut memo = self.memo.lock();
        if let Some(value) = memo.as_ref() {
            return Ok(value.clone());
        }
        let element = self.element_type(cx)?;
        let items = self
            .items
            .iter()
            .map(|item| item.clone().morph(cx, &element)?.value(cx))
            .collect::<DiResult<Vec<_>>>()?;
        let ty = TypeHandle::sequence(self.shape, element.clone());
        let value = Instance::new(ty, Sequence::new(self.shape, element, items));
        *memo = Some(value.clone());
        Ok(value)
    }

    fn value_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        Ok(TypeHandle::sequence(self.shape, self.element_type(cx)?))
    }

    fn is_resolvable_as(&self, cx: &ResolverContext<'_>, target: &TypeHandle) -> bool {
        if target.is_any() {
            return true;
        }
        match target.as_sequence() {
            Some((_, element)) => self.items_resolvable_as(cx, element),
            None => false,
        }
    }

    fn morph(self: Arc<Self>, cx: &ResolverContext<'_>, target: &TypeHandle) -> DiResult<PropertyRef> {
        let current = self.value_type(cx)?;
        if current == *target {
            return Ok(self);
        }
        let (shape, element) = match target.as_sequence() {
            Some(sequence) => sequence,
            None if target.is_any() => return narrow(self, cx, target),
            None => return Err(incompatible(&current, target)),
        };
        if !self.items_resolvable_as(cx, element) {
            return Err(incompatible(&current, target));
        }
        Ok(Arc::new(ListProperty {
            items: self.items.clone(),
            element: Element::Resolved(element.clone()),
            shape,
            memo: Mutex::new(None),
        }))
    }
}
