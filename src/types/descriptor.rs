//! Type descriptors and their builder.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{AnyArc, Args, Instance, Shape, TypeHandle};
use crate::error::{BoxError, DiError, DiResult};
use crate::types::TypeRegistry;

pub(crate) type Thunk = Arc<dyn Fn(&Args) -> Result<AnyArc, BoxError> + Send + Sync>;
pub(crate) type MethodThunk = Arc<dyn Fn(&Instance, &Args) -> Result<AnyArc, BoxError> + Send + Sync>;
pub(crate) type ParseFn = Arc<dyn Fn(&str) -> Result<AnyArc, BoxError> + Send + Sync>;
pub(crate) type UpcastFn = Arc<dyn Fn(AnyArc) -> AnyArc + Send + Sync>;
pub(crate) type ActivateFn = Arc<dyn Fn(&AnyArc) -> Result<(), BoxError> + Send + Sync>;

pub(crate) struct Supertype {
    pub(crate) handle: TypeHandle,
    pub(crate) upcast: Option<UpcastFn>,
}

/// A type named in a signature.
///
/// A type may mention itself in its own signatures before it is registered,
/// so such references stay symbolic and are bound to the owning handle on use.
#[derive(Clone)]
pub(crate) enum TypeRef {
    Own,
    Sequence(Shape, Box<TypeRef>),
    Named(TypeHandle),
}

impl TypeRef {
    fn bind(&self, owner: &TypeHandle) -> TypeHandle {
        match self {
            TypeRef::Own => owner.clone(),
            TypeRef::Sequence(shape, element) => TypeHandle::sequence(*shape, element.bind(owner)),
            TypeRef::Named(handle) => handle.clone(),
        }
    }

    fn label(&self) -> String {
        match self {
            TypeRef::Own => "Self".to_string(),
            TypeRef::Sequence(Shape::Array, element) => format!("{}[]", element.label()),
            TypeRef::Sequence(Shape::List, element) => format!("list<{}>", element.label()),
            TypeRef::Named(handle) => handle.name(),
        }
    }
}

fn bind_all(refs: &[TypeRef], owner: &TypeHandle) -> Vec<TypeHandle> {
    refs.iter().map(|r| r.bind(owner)).collect()
}

/// A public constructor: ordered parameter types plus the invocation thunk.
#[derive(Clone)]
pub struct Signature {
    params: Vec<TypeRef>,
    invoke: Thunk,
}

impl Signature {
    /// Parameter types, with references to the declaring type bound to `owner`.
    pub fn params(&self, owner: &TypeHandle) -> Vec<TypeHandle> {
        bind_all(&self.params, owner)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn invoke(&self, args: &Args) -> Result<AnyArc, BoxError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", join(&self.params))
    }
}

#[derive(Clone)]
pub(crate) enum MethodInvoker {
    Static(Thunk),
    Instance(MethodThunk),
}

/// A named factory method, static or bound to a receiver.
#[derive(Clone)]
pub struct MethodSignature {
    name: String,
    params: Vec<TypeRef>,
    returns: TypeRef,
    invoker: MethodInvoker,
}

impl MethodSignature {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self, owner: &TypeHandle) -> Vec<TypeHandle> {
        bind_all(&self.params, owner)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self, owner: &TypeHandle) -> TypeHandle {
        self.returns.bind(owner)
    }

    pub fn is_static(&self) -> bool {
        matches!(self.invoker, MethodInvoker::Static(_))
    }

    pub(crate) fn invoke(&self, receiver: Option<&Instance>, args: &Args) -> Result<AnyArc, BoxError> {
        match (&self.invoker, receiver) {
            (MethodInvoker::Static(thunk), _) => thunk(args),
            (MethodInvoker::Instance(thunk), Some(receiver)) => thunk(receiver, args),
            (MethodInvoker::Instance(_), None) => {
                Err(format!("method '{}' requires a receiver", self.name).into())
            }
        }
    }
}

impl fmt::Debug for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) -> {}", self.name, join(&self.params), self.returns.label())
    }
}

fn join(params: &[TypeRef]) -> String {
    params.iter().map(TypeRef::label).collect::<Vec<_>>().join(", ")
}

/// Everything the resolution engine knows about one type.
///
/// Built with [`TypeDescriptor::builder`], [`TypeDescriptor::interface`] or
/// [`TypeDescriptor::abstract_type`] and made resolvable by
/// [`TypeRegistry::register`].
pub struct TypeDescriptor {
    name: String,
    type_id: Option<TypeId>,
    supertypes: Vec<Supertype>,
    constructors: Vec<Signature>,
    parser: Option<ParseFn>,
    methods: Vec<MethodSignature>,
    activators: HashMap<String, ActivateFn>,
    core: bool,
}

impl TypeDescriptor {
    /// Starts describing the concrete Rust type `T` under `name`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_beans::{TypeDescriptor, TypeRegistry};
    ///
    /// struct Greeter { greeting: String }
    ///
    /// let mut registry = TypeRegistry::new();
    /// let greeter = registry
    ///     .register(
    ///         TypeDescriptor::builder::<Greeter>("Greeter")
    ///             .constructor(&["string"], |args| Ok(Greeter { greeting: args.text(0)? })),
    ///     )
    ///     .unwrap();
    /// assert_eq!(greeter.name(), "Greeter");
    /// assert_eq!(greeter.descriptor().unwrap().constructors().len(), 1);
    /// ```
    pub fn builder<T: Any + Send + Sync>(name: impl Into<String>) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new(name.into(), Some(TypeId::of::<T>()))
    }

    /// Starts describing a trait-object type; its values are stored as `Arc<T>`.
    pub fn interface<T: ?Sized + Send + Sync + 'static>(name: impl Into<String>) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new(name.into(), Some(TypeId::of::<T>()))
    }

    /// Starts describing a purely nominal type with no Rust counterpart.
    pub fn abstract_type(name: impl Into<String>) -> TypeDescriptorBuilder<dyn Any + Send + Sync> {
        TypeDescriptorBuilder::new(name.into(), None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub(crate) fn supertypes(&self) -> &[Supertype] {
        &self.supertypes
    }

    /// Names of the direct supertypes.
    pub fn supertype_names(&self) -> Vec<String> {
        self.supertypes.iter().map(|s| s.handle.name()).collect()
    }

    pub fn constructors(&self) -> &[Signature] {
        &self.constructors
    }

    pub fn methods_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MethodSignature> + 'a {
        let name = name.to_string();
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    pub(crate) fn parse(&self, text: &str) -> Option<Result<AnyArc, BoxError>> {
        self.parser.as_ref().map(|parse| parse(text))
    }

    pub(crate) fn activator(&self, hook: &str) -> Option<&ActivateFn> {
        self.activators.get(hook)
    }

    /// Whether this is one of the built-in core types.
    pub fn is_core(&self) -> bool {
        self.core
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("supertypes", &self.supertype_names())
            .field("constructors", &self.constructors)
            .field("methods", &self.methods)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

struct PendingSignature {
    params: Vec<String>,
    invoke: Thunk,
}

struct PendingMethod {
    name: String,
    params: Vec<String>,
    returns: String,
    invoker: MethodInvoker,
}

/// Builder for a [`TypeDescriptor`].
///
/// Type names are kept as text until [`TypeRegistry::register`] resolves them,
/// so supertypes and parameter types must be registered first. A signature
/// may name the type being described.
pub struct TypeDescriptorBuilder<T: ?Sized> {
    name: String,
    type_id: Option<TypeId>,
    supertypes: Vec<(String, Option<UpcastFn>)>,
    constructors: Vec<PendingSignature>,
    parser: Option<ParseFn>,
    methods: Vec<PendingMethod>,
    activators: HashMap<String, ActivateFn>,
    core: bool,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> TypeDescriptorBuilder<T> {
    fn new(name: String, type_id: Option<TypeId>) -> Self {
        Self {
            name,
            type_id,
            supertypes: Vec::new(),
            constructors: Vec::new(),
            parser: None,
            methods: Vec::new(),
            activators: HashMap::new(),
            core: false,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares `supertype` assignable from this type without converting the value.
    pub fn extends(mut self, supertype: &str) -> Self {
        self.supertypes.push((supertype.to_string(), None));
        self
    }

    /// Registers a static factory method returning an `R` registered as `returns`.
    pub fn static_method<R, F>(mut self, name: &str, params: &[&str], returns: &str, f: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&Args) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        let thunk: Thunk = Arc::new(move |args| f(args).map(|v| Arc::new(v) as AnyArc));
        self.methods.push(PendingMethod {
            name: name.to_string(),
            params: to_names(params),
            returns: returns.to_string(),
            invoker: MethodInvoker::Static(thunk),
        });
        self
    }

    pub(crate) fn core(mut self) -> Self {
        self.core = true;
        self
    }

    pub(crate) fn resolve(self, registry: &TypeRegistry) -> DiResult<TypeDescriptor> {
        let owner = self.name.clone();
        let unknown = |name: &str| DiError::UnknownTypeReference {
            owner: owner.clone(),
            type_name: name.to_string(),
        };
        let reference = |name: &str| type_ref(name, &owner, registry).ok_or_else(|| unknown(name));
        let reference_all = |names: &[String]| names.iter().map(|n| reference(n)).collect::<DiResult<Vec<_>>>();

        let supertypes = self
            .supertypes
            .into_iter()
            .map(|(name, upcast)| {
                let handle = registry.resolve(&name).ok_or_else(|| unknown(&name))?;
                Ok(Supertype { handle, upcast })
            })
            .collect::<DiResult<Vec<_>>>()?;
        let constructors = self
            .constructors
            .into_iter()
            .map(|c| Ok(Signature { params: reference_all(&c.params)?, invoke: c.invoke }))
            .collect::<DiResult<Vec<_>>>()?;
        let methods = self
            .methods
            .into_iter()
            .map(|m| {
                Ok(MethodSignature {
                    params: reference_all(&m.params)?,
                    returns: reference(&m.returns)?,
                    name: m.name,
                    invoker: m.invoker,
                })
            })
            .collect::<DiResult<Vec<_>>>()?;

        Ok(TypeDescriptor {
            name: self.name,
            type_id: self.type_id,
            supertypes,
            constructors,
            parser: self.parser,
            methods,
            activators: self.activators,
            core: self.core,
        })
    }
}

impl<T: Any + Send + Sync> TypeDescriptorBuilder<T> {
    /// Adds a public constructor taking parameters of the named types.
    pub fn constructor<F>(mut self, params: &[&str], f: F) -> Self
    where
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let invoke: Thunk = Arc::new(move |args| f(args).map(|v| Arc::new(v) as AnyArc));
        self.constructors.push(PendingSignature { params: to_names(params), invoke });
        self
    }

    /// Static parse-from-text factory used when coercing literals.
    pub fn parser<F, E>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.parser = Some(Arc::new(move |text| {
            f(text).map(|v| Arc::new(v) as AnyArc).map_err(Into::into)
        }));
        self
    }

    /// Declares `supertype` assignable from this type, converting the value with `f`.
    pub fn extends_with<S, F>(mut self, supertype: &str, f: F) -> Self
    where
        S: Any + Send + Sync,
        F: Fn(&T) -> S + Send + Sync + 'static,
    {
        let upcast: UpcastFn = Arc::new(move |value: AnyArc| {
            if let Some(v) = value.downcast_ref::<T>() {
                return Arc::new(f(v)) as AnyArc;
            }
            value
        });
        self.supertypes.push((supertype.to_string(), Some(upcast)));
        self
    }

    /// Declares that this type implements the interface type `interface`.
    ///
    /// Widening wraps the value as the `Arc<U>` trait object the interface
    /// type stores.
    pub fn implements<U, F>(mut self, interface: &str, f: F) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        let upcast: UpcastFn = Arc::new(move |value: AnyArc| match value.clone().downcast::<T>() {
            Ok(v) => Arc::new(f(v)) as AnyArc,
            Err(_) => value,
        });
        self.supertypes.push((interface.to_string(), Some(upcast)));
        self
    }

    /// Registers an instance factory method invoked on a receiver of this type.
    pub fn method<R, F>(mut self, name: &str, params: &[&str], returns: &str, f: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&T, &Args) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        let method_name = name.to_string();
        let thunk: MethodThunk = Arc::new(move |receiver: &Instance, args| {
            let this = receiver.downcast_ref::<T>().ok_or_else(|| -> BoxError {
                format!("receiver of '{}' is a '{}'", method_name, receiver.type_handle()).into()
            })?;
            f(this, args).map(|v| Arc::new(v) as AnyArc)
        });
        self.methods.push(PendingMethod {
            name: name.to_string(),
            params: to_names(params),
            returns: returns.to_string(),
            invoker: MethodInvoker::Instance(thunk),
        });
        self
    }

    /// Registers an activation hook callable by name after construction.
    pub fn activation<F>(mut self, hook: &str, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let hook_name = hook.to_string();
        let activate: ActivateFn = Arc::new(move |value: &AnyArc| {
            let this = value.downcast_ref::<T>().ok_or_else(|| -> BoxError {
                format!("activation hook '{}' applied to a foreign value", hook_name).into()
            })?;
            f(this)
        });
        self.activators.insert(hook.to_string(), activate);
        self
    }
}

/// Resolves `name` for a signature of `owner`, keeping self-references symbolic.
fn type_ref(name: &str, owner: &str, registry: &TypeRegistry) -> Option<TypeRef> {
    let name = name.trim();
    if name == owner {
        return Some(TypeRef::Own);
    }
    if let Some(element) = name.strip_suffix("[]") {
        return type_ref(element, owner, registry).map(|e| TypeRef::Sequence(Shape::Array, Box::new(e)));
    }
    if let Some(element) = name.strip_prefix("list<").and_then(|rest| rest.strip_suffix('>')) {
        return type_ref(element, owner, registry).map(|e| TypeRef::Sequence(Shape::List, Box::new(e)));
    }
    registry.resolve(name).map(TypeRef::Named)
}

fn to_names(params: &[&str]) -> Vec<String> {
    params.iter().map(|p| p.to_string()).collect()
}
