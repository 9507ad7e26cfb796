//! Constructing properties.
//!
//! [`BeanInstanceFactory`] is the construction primitive shared by both
//! scopes: it resolves the implementation type (through the bean's artifact
//! when it names one), selects the most specific applicable constructor or
//! factory method, morphs and evaluates the arguments, invokes, and runs the
//! activation hook. [`PrototypeBeanFactory`] and [`SingletonBeanFactory`]
//! decide how often that happens.

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::artifact::ArtifactHolder;
use crate::context::ResolverContext;
use crate::error::{BoxError, DiError, DiResult};
use crate::internal::catch_panics;
use crate::property::PropertyRef;
use crate::types::specificity::select_most_specific;
use crate::types::{AnyArc, Args, Instance, MethodSignature, Signature, TypeHandle, TypeRegistry};

mod prototype;
mod singleton;

pub(crate) use prototype::PrototypeBeanFactory;
pub(crate) use singleton::SingletonBeanFactory;

/// How a bean obtains its instance when it does not use a constructor.
pub(crate) enum FactoryMethod {
    /// Instance method on another bean's value
    Instance { receiver: PropertyRef, method: String },
    /// Static method of a named type, or of the bean's own type
    Static { type_name: Option<String>, method: String },
}

impl FactoryMethod {
    fn name(&self) -> &str {
        match self {
            FactoryMethod::Instance { method, .. } | FactoryMethod::Static { method, .. } => method,
        }
    }
}

pub(crate) struct BeanInstanceFactory {
    id: String,
    type_name: Option<String>,
    artifact: Option<Arc<ArtifactHolder>>,
    args: Vec<PropertyRef>,
    factory: Option<FactoryMethod>,
    activation: Option<String>,
    implementation: OnceCell<TypeHandle>,
}

impl BeanInstanceFactory {
    pub(crate) fn new(
        id: String,
        type_name: Option<String>,
        artifact: Option<Arc<ArtifactHolder>>,
        args: Vec<PropertyRef>,
        factory: Option<FactoryMethod>,
        activation: Option<String>,
    ) -> Self {
        Self {
            id,
            type_name,
            artifact,
            args,
            factory,
            activation,
            implementation: OnceCell::new(),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    fn display_type(&self) -> String {
        match (&self.type_name, &self.factory) {
            (Some(type_name), _) => type_name.clone(),
            (None, Some(factory)) => format!("{}()", factory.name()),
            (None, None) => "<unknown>".to_string(),
        }
    }

    /// The loading context this bean resolves type names in.
    fn registry(&self, cx: &ResolverContext<'_>) -> DiResult<Arc<TypeRegistry>> {
        match &self.artifact {
            Some(artifact) => artifact.registry(cx.loader(), cx.ambient()),
            None => Ok(cx.ambient().clone()),
        }
    }

    fn resolve_type(&self, name: &str, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        self.registry(cx)?.resolve(name).ok_or_else(|| DiError::TypeNotFound {
            bean: self.id.clone(),
            type_name: name.to_string(),
            artifact: self.artifact.as_ref().map(|a| a.id().to_string()),
        })
    }

    /// Resolves and caches the implementation type.
    pub(crate) fn implementation_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        self.implementation
            .get_or_try_init(|| {
                let name = self
                    .type_name
                    .as_deref()
                    .ok_or_else(|| DiError::MissingImplementation(self.id.clone()))?;
                self.resolve_type(name, cx)
            })
            .cloned()
    }

    fn select_constructor<'t>(&self, ty: &'t TypeHandle, cx: &ResolverContext<'_>) -> DiResult<&'t Signature> {
        let constructors = ty.descriptor().map(|d| d.constructors()).unwrap_or(&[]);
        select_most_specific(constructors, ty, &self.args, cx).ok_or_else(|| DiError::NoApplicableConstructor {
            bean: self.id.clone(),
            type_name: ty.name(),
            arguments: self.args.len(),
        })
    }

    fn method_owner(&self, factory: &FactoryMethod, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        match factory {
            FactoryMethod::Instance { receiver, .. } => receiver.value_type(cx),
            FactoryMethod::Static { type_name: Some(name), .. } => self.resolve_type(name, cx),
            FactoryMethod::Static { type_name: None, .. } => self.implementation_type(cx),
        }
    }

    fn select_method<'t>(
        &self,
        factory: &FactoryMethod,
        owner: &'t TypeHandle,
        cx: &ResolverContext<'_>,
    ) -> DiResult<&'t MethodSignature> {
        let wants_static = matches!(factory, FactoryMethod::Static { .. });
        let candidates: Vec<&MethodSignature> = owner
            .descriptor()
            .map(|d| d.methods_named(factory.name()).filter(|m| m.is_static() == wants_static).collect())
            .unwrap_or_default();
        select_most_specific(candidates, owner, &self.args, cx).ok_or_else(|| DiError::NoApplicableMethod {
            bean: self.id.clone(),
            type_name: owner.name(),
            method: factory.name().to_string(),
            arguments: self.args.len(),
        })
    }

    /// The type of the instances this bean produces.
    pub(crate) fn value_type(&self, cx: &ResolverContext<'_>) -> DiResult<TypeHandle> {
        match &self.factory {
            Some(factory) => {
                let registry = self.registry(cx)?;
                let cx = &cx.within(&registry);
                let owner = self.method_owner(factory, cx)?;
                Ok(self.select_method(factory, &owner, cx)?.returns(&owner))
            }
            None => self.implementation_type(cx),
        }
    }

    /// Runs the full construction algorithm once.
    pub(crate) fn construct(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        let observers = cx.observers();
        if !observers.has_observers() {
            return self.build(cx);
        }
        let type_name = self.display_type();
        let start = Instant::now();
        observers.constructing(&self.id, &type_name);
        let result = self.build(cx);
        match &result {
            Ok(_) => observers.constructed(&self.id, &type_name, start.elapsed()),
            Err(error) => observers.construction_failed(&self.id, error),
        }
        result
    }

    fn build(&self, cx: &ResolverContext<'_>) -> DiResult<Instance> {
        trace!(bean = %self.id, "constructing bean");
        let registry = self.registry(cx)?;
        let cx = &cx.within(&registry);
        let instance = match &self.factory {
            None => {
                let ty = self.implementation_type(cx)?;
                let constructor = self.select_constructor(&ty, cx)?;
                let args = self.evaluate(&constructor.params(&ty), &ty, cx)?;
                let value = self.invoke(&ty, || constructor.invoke(&args))?;
                Instance::from_arc(ty, value)
            }
            Some(factory) => {
                let owner = self.method_owner(factory, cx)?;
                let method = self.select_method(factory, &owner, cx)?;
                let receiver = match factory {
                    FactoryMethod::Instance { receiver, .. } => Some(receiver.value(cx)?),
                    FactoryMethod::Static { .. } => None,
                };
                let args = self.evaluate(&method.params(&owner), &owner, cx)?;
                let returns = method.returns(&owner);
                let value = self.invoke(&returns, || method.invoke(receiver.as_ref(), &args))?;
                Instance::from_arc(returns, value)
            }
        };
        self.activate(&instance)?;
        Ok(instance)
    }

    fn evaluate(&self, params: &[TypeHandle], ty: &TypeHandle, cx: &ResolverContext<'_>) -> DiResult<Args> {
        let values = self
            .args
            .iter()
            .zip(params)
            .enumerate()
            .map(|(index, (arg, param))| {
                arg.clone()
                    .morph(cx, param)
                    .and_then(|arg| arg.value(cx))
                    .map_err(|e| self.argument_error(ty, index, e))
            })
            .collect::<DiResult<Vec<_>>>()?;
        Ok(Args::new(values))
    }

    /// Attributes a coercion or morph failure to the argument that caused it.
    fn argument_error(&self, ty: &TypeHandle, index: usize, error: DiError) -> DiError {
        match error {
            DiError::Coercion { .. } | DiError::IncompatibleMorph { .. } => DiError::Argument {
                bean: self.id.clone(),
                type_name: ty.name(),
                index,
                source: Box::new(error),
            },
            other => other,
        }
    }

    fn invoke<F>(&self, ty: &TypeHandle, f: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> Result<AnyArc, BoxError>,
    {
        catch_panics(f).map_err(|source| DiError::Instantiation {
            bean: self.id.clone(),
            type_name: ty.name(),
            source: Arc::from(source),
        })
    }

    fn activate(&self, instance: &Instance) -> DiResult<()> {
        let hook = match &self.activation {
            Some(hook) => hook,
            None => return Ok(()),
        };
        let ty = instance.type_handle();
        let activator = ty
            .descriptor()
            .and_then(|d| d.activator(hook))
            .ok_or_else(|| DiError::UnknownActivation {
                bean: self.id.clone(),
                type_name: ty.name(),
                hook: hook.clone(),
            })?;
        trace!(bean = %self.id, hook = %hook, "activating bean");
        let value = instance.value();
        catch_panics(|| activator(value)).map_err(|source| DiError::Instantiation {
            bean: self.id.clone(),
            type_name: ty.name(),
            source: Arc::from(source),
        })
    }
}
