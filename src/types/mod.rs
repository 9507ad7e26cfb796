//! Type model standing in for runtime reflection.
//!
//! Every type a context can construct is described by a [`TypeDescriptor`]
//! registered in a [`TypeRegistry`]. Descriptors carry the supertypes a value
//! may be widened to, the public constructor signatures, optional
//! parse-from-text support, factory methods and activation hooks. Resolution
//! works purely against these descriptors, so the ranking and coercion rules
//! stay independent of how the descriptors were produced.

use std::any::{Any, TypeId};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{BoxError, DiError};

pub(crate) mod coerce;
mod descriptor;
mod registry;
pub(crate) mod specificity;

pub use descriptor::{MethodSignature, Signature, TypeDescriptor, TypeDescriptorBuilder};
pub use registry::TypeRegistry;
pub(crate) use registry::builtin;

/// Type-erased shared value.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Container shape of a list property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Shape {
    /// Growable list (`list<T>`)
    #[default]
    List,
    /// Fixed-size array (`T[]`)
    Array,
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" | "vec" => Ok(Shape::List),
            "array" => Ok(Shape::Array),
            other => Err(other.to_string()),
        }
    }
}

pub(crate) enum TypeKind {
    Named(TypeDescriptor),
    Sequence { shape: Shape, element: TypeHandle },
}

/// Handle to a resolved type.
///
/// Named handles compare by descriptor identity: the same name registered in
/// two isolated registries yields two distinct types. Sequence handles compare
/// structurally.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeKind>);

impl TypeHandle {
    pub(crate) fn named(descriptor: TypeDescriptor) -> Self {
        TypeHandle(Arc::new(TypeKind::Named(descriptor)))
    }

    /// Sequence type of the given shape and element type.
    pub fn sequence(shape: Shape, element: TypeHandle) -> Self {
        TypeHandle(Arc::new(TypeKind::Sequence { shape, element }))
    }

    /// Array type `element[]`.
    pub fn array(element: TypeHandle) -> Self {
        Self::sequence(Shape::Array, element)
    }

    /// List type `list<element>`.
    pub fn list(element: TypeHandle) -> Self {
        Self::sequence(Shape::List, element)
    }

    pub(crate) fn kind(&self) -> &TypeKind {
        &self.0
    }

    /// The descriptor behind a named type, `None` for sequences.
    pub fn descriptor(&self) -> Option<&TypeDescriptor> {
        match &*self.0 {
            TypeKind::Named(descriptor) => Some(descriptor),
            TypeKind::Sequence { .. } => None,
        }
    }

    /// Shape and element type of a sequence type.
    pub fn as_sequence(&self) -> Option<(Shape, &TypeHandle)> {
        match &*self.0 {
            TypeKind::Sequence { shape, element } => Some((*shape, element)),
            TypeKind::Named(_) => None,
        }
    }

    /// Display name, e.g. `i32`, `i32[]` or `list<string>`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Rust `TypeId` of the values this type carries, if any.
    pub fn type_id(&self) -> Option<TypeId> {
        self.descriptor().and_then(|d| d.type_id())
    }

    pub(crate) fn is_any(&self) -> bool {
        self == registry::builtin::any()
    }

    pub(crate) fn is_string(&self) -> bool {
        self == registry::builtin::string()
    }

    pub(crate) fn is_core(&self) -> bool {
        match &*self.0 {
            TypeKind::Named(descriptor) => descriptor.is_core(),
            TypeKind::Sequence { element, .. } => element.is_core(),
        }
    }

    /// Number of generalization steps from `self` to `target`.
    ///
    /// `Some(0)` for the same type, `Some(n)` when `target` is reached after
    /// `n` supertype steps, `None` when `target` is not assignable from `self`.
    /// `any` is one step from every other type, however deep its hierarchy.
    /// Sequences are covariant in their element type and never change shape.
    pub fn distance(&self, target: &TypeHandle) -> Option<u32> {
        if self == target {
            return Some(0);
        }
        if target.is_any() {
            return Some(1);
        }
        match &*self.0 {
            TypeKind::Named(descriptor) => descriptor
                .supertypes()
                .iter()
                .filter_map(|s| s.handle.distance(target))
                .min()
                .map(|d| d + 1),
            TypeKind::Sequence { shape, element } => match &*target.0 {
                TypeKind::Sequence { shape: target_shape, element: target_element }
                    if shape == target_shape =>
                {
                    element.distance(target_element)
                }
                _ => None,
            },
        }
    }

    /// Whether a value of `self` may be used where `target` is expected.
    pub fn is_assignable_to(&self, target: &TypeHandle) -> bool {
        self.distance(target).is_some()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        match (&*self.0, &*other.0) {
            (TypeKind::Named(_), TypeKind::Named(_)) => Arc::ptr_eq(&self.0, &other.0),
            (
                TypeKind::Sequence { shape: a, element: ea },
                TypeKind::Sequence { shape: b, element: eb },
            ) => a == b && ea == eb,
            _ => false,
        }
    }
}

impl Eq for TypeHandle {}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            TypeKind::Named(descriptor) => f.write_str(descriptor.name()),
            TypeKind::Sequence { shape: Shape::Array, element } => write!(f, "{}[]", element),
            TypeKind::Sequence { shape: Shape::List, element } => write!(f, "list<{}>", element),
        }
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self)
    }
}

/// A live value tagged with the type it was produced or widened as.
#[derive(Clone)]
pub struct Instance {
    ty: TypeHandle,
    value: AnyArc,
}

impl Instance {
    /// Wraps `value` as an instance of `ty`.
    pub fn new<T: Any + Send + Sync>(ty: TypeHandle, value: T) -> Self {
        Self { ty, value: Arc::new(value) }
    }

    /// Wraps an already shared value.
    pub fn from_arc(ty: TypeHandle, value: AnyArc) -> Self {
        Self { ty, value }
    }

    pub fn type_handle(&self) -> &TypeHandle {
        &self.ty
    }

    pub fn value(&self) -> &AnyArc {
        &self.value
    }

    /// Typed shared access to a concrete value.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Typed access to a value stored as a trait object (`Arc<dyn Trait>`).
    pub fn downcast_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Whether both instances share the same underlying value.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Widens this instance to `target`, applying each supertype conversion
    /// along the shortest path. `None` when `target` is not assignable.
    pub fn upcast(&self, target: &TypeHandle) -> Option<Instance> {
        if self.ty == *target {
            return Some(self.clone());
        }
        if target.is_any() {
            return Some(Instance { ty: target.clone(), value: self.value.clone() });
        }
        match (self.ty.kind(), target.kind()) {
            (TypeKind::Named(descriptor), _) => {
                let (step, _) = descriptor
                    .supertypes()
                    .iter()
                    .filter_map(|s| s.handle.distance(target).map(|d| (s, d)))
                    .min_by_key(|(_, d)| *d)?;
                let value = match &step.upcast {
                    Some(convert) => convert(self.value.clone()),
                    None => self.value.clone(),
                };
                Instance { ty: step.handle.clone(), value }.upcast(target)
            }
            (
                TypeKind::Sequence { shape, .. },
                TypeKind::Sequence { shape: target_shape, element: target_element },
            ) if shape == target_shape => {
                let sequence = self.value.downcast_ref::<Sequence>()?;
                let items = sequence
                    .iter()
                    .map(|item| item.upcast(target_element))
                    .collect::<Option<Vec<_>>>()?;
                Some(Instance::new(
                    target.clone(),
                    Sequence::new(*shape, target_element.clone(), items),
                ))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("type", &self.ty.name()).finish_non_exhaustive()
    }
}

/// Materialized value of a list or array property.
pub struct Sequence {
    shape: Shape,
    element: TypeHandle,
    items: Vec<Instance>,
}

impl Sequence {
    pub fn new(shape: Shape, element: TypeHandle, items: Vec<Instance>) -> Self {
        Self { shape, element, items }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn element_type(&self) -> &TypeHandle {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.items.iter()
    }

    /// Clones every element out as `T`; `None` if any element is not a `T`.
    pub fn to_vec<T: Any + Send + Sync + Clone>(&self) -> Option<Vec<T>> {
        self.items.iter().map(|i| i.downcast_ref::<T>().cloned()).collect()
    }

    /// Shares every element as `Arc<T>`; `None` if any element is not a `T`.
    pub fn to_arcs<T: Any + Send + Sync>(&self) -> Option<Vec<Arc<T>>> {
        self.items.iter().map(|i| i.downcast::<T>()).collect()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("shape", &self.shape)
            .field("element", &self.element.name())
            .field("len", &self.items.len())
            .finish()
    }
}

/// Value of the core `number` type.
///
/// Every numeric primitive widens into a `Number`, so a constructor taking
/// `number` accepts any integer or floating point argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl FromStr for Number {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Number::Integer(i));
        }
        s.parse::<f64>()
            .map(Number::Float)
            .map_err(|_| format!("'{}' is not a number", s).into())
    }
}

/// Resolved argument values handed to constructors and factory methods.
pub struct Args {
    items: Vec<Instance>,
}

impl Args {
    pub fn new(items: Vec<Instance>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn instance(&self, index: usize) -> Result<&Instance, BoxError> {
        self.items
            .get(index)
            .ok_or_else(|| format!("argument {} out of range ({} supplied)", index, self.items.len()).into())
    }

    /// Shared access to argument `index` as a concrete `T`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        let instance = self.instance(index)?;
        instance.downcast::<T>().ok_or_else(|| mismatch::<T>(index, instance))
    }

    /// Cloned argument `index` as a concrete `T`.
    pub fn value<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T, BoxError> {
        let instance = self.instance(index)?;
        instance.downcast_ref::<T>().cloned().ok_or_else(|| mismatch::<T>(index, instance))
    }

    pub fn text(&self, index: usize) -> Result<String, BoxError> {
        self.value::<String>(index)
    }

    /// Argument `index` as a trait object registered through an interface type.
    pub fn trait_object<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        let instance = self.instance(index)?;
        instance
            .downcast_trait::<T>()
            .ok_or_else(|| mismatch::<Arc<T>>(index, instance))
    }

    pub fn sequence(&self, index: usize) -> Result<Arc<Sequence>, BoxError> {
        self.get::<Sequence>(index)
    }
}

fn mismatch<T: ?Sized>(index: usize, instance: &Instance) -> BoxError {
    format!(
        "argument {} is a '{}', not a {}",
        index,
        instance.type_handle(),
        std::any::type_name::<T>()
    )
    .into()
}

pub(crate) fn incompatible(from: &TypeHandle, to: &TypeHandle) -> DiError {
    DiError::IncompatibleMorph { from: from.name(), to: to.name() }
}
