use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::{Context, ContextInner};
use crate::artifact::{ArtifactHolder, ArtifactLoader, StaticArtifactLoader};
use crate::definition::{ArgSpec, ArgValue, ArtifactSpec, BeanSpec};
use crate::descriptors::{BeanDescriptor, BeanKind};
use crate::error::{DiError, DiResult};
use crate::factory::{BeanInstanceFactory, FactoryMethod, PrototypeBeanFactory, SingletonBeanFactory};
use crate::internal::detect_cycles;
use crate::observer::{ContextObserver, Observers};
use crate::property::{BeanReference, ConstantProperty, ExternalInstance, ListProperty, PropertyRef};
use crate::scope::Scope;
use crate::types::{AnyArc, Instance, Shape, TypeRegistry};

enum External {
    Instance(Instance),
    Typed { type_id: TypeId, rust_name: &'static str, value: AnyArc },
}

/// Builder assembling a [`Context`] from bean specifications.
///
/// Nothing is validated until [`build`](Self::build); every declaration
/// error surfaces there, before any constructor runs.
///
/// # Examples
///
/// ```
/// use ferrous_beans::{ArgValue, BeanSpec, ContextFactory, Scope, TypeDescriptor, TypeRegistry};
///
/// struct Pool { size: i32 }
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(
///         TypeDescriptor::builder::<Pool>("Pool")
///             .constructor(&["i32"], |args| Ok(Pool { size: args.value(0)? })),
///     )
///     .unwrap();
///
/// let context = ContextFactory::new()
///     .with_registry(registry)
///     .with(BeanSpec::new("Pool").with_scope(Scope::Prototype).arg(ArgValue::literal("8")))
///     .build()
///     .unwrap();
///
/// assert_eq!(context.get_required_named::<Pool>("Pool#1").size, 8);
/// ```
#[derive(Default)]
pub struct ContextFactory {
    artifacts: Vec<ArtifactSpec>,
    beans: Vec<BeanSpec>,
    externals: Vec<(String, External)>,
    parent: Option<Context>,
    registry: Option<TypeRegistry>,
    loader: Option<Arc<dyn ArtifactLoader>>,
    observers: Observers,
}

impl ContextFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares artifact `id` at `uri`. The URI is parsed by [`build`](Self::build).
    pub fn with_artifact(mut self, id: impl Into<String>, uri: impl Into<String>) -> Self {
        self.artifacts.push(ArtifactSpec::new(id, uri));
        self
    }

    /// Adds a top-level bean declaration.
    pub fn with(mut self, spec: BeanSpec) -> Self {
        self.beans.push(spec);
        self
    }

    /// Binds an already-live instance under `id`.
    pub fn with_external_bean(mut self, id: impl Into<String>, instance: Instance) -> Self {
        self.externals.push((id.into(), External::Instance(instance)));
        self
    }

    /// Binds `value` under `id` as the type registered for `T`.
    pub fn with_external<T: Any + Send + Sync>(mut self, id: impl Into<String>, value: T) -> Self {
        self.externals.push((
            id.into(),
            External::Typed {
                type_id: TypeId::of::<T>(),
                rust_name: std::any::type_name::<T>(),
                value: Arc::new(value),
            },
        ));
        self
    }

    /// Binds a trait object under `id` as the interface type registered for `T`.
    pub fn with_external_trait<T: ?Sized + Send + Sync + 'static>(mut self, id: impl Into<String>, value: Arc<T>) -> Self {
        self.externals.push((
            id.into(),
            External::Typed {
                type_id: TypeId::of::<T>(),
                rust_name: std::any::type_name::<T>(),
                value: Arc::new(value),
            },
        ));
        self
    }

    /// Falls back to `parent` for identifiers and types not bound locally.
    ///
    /// Unless overridden, the parent's registry and artifact loader are used.
    pub fn with_parent(mut self, parent: Context) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Ambient registry for type names of beans without an artifact.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_artifact_loader(mut self, loader: impl ArtifactLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Registers a construction observer.
    pub fn with_observer(mut self, observer: Arc<dyn ContextObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Adds every artifact and bean of a parsed specification.
    #[cfg(feature = "config")]
    pub fn with_spec(mut self, spec: crate::config::ContextSpec) -> Self {
        self.artifacts.extend(spec.artifacts);
        self.beans.extend(spec.beans);
        self
    }

    /// Validates the declarations and assembles the property graph.
    ///
    /// No bean is constructed here; construction happens on first lookup.
    pub fn build(self) -> DiResult<Context> {
        let ContextFactory { artifacts, beans, externals, parent, registry, loader, observers } = self;

        let registry = match (registry, &parent) {
            (Some(registry), _) => Arc::new(registry),
            (None, Some(parent)) => parent.inner.registry.clone(),
            (None, None) => Arc::new(TypeRegistry::new()),
        };
        let loader: Arc<dyn ArtifactLoader> = match (loader, &parent) {
            (Some(loader), _) => loader,
            (None, Some(parent)) => parent.inner.loader.clone(),
            (None, None) => Arc::new(StaticArtifactLoader::new()),
        };

        let artifacts = declare_artifacts(artifacts)?;

        let mut counters = HashMap::new();
        let beans = beans
            .into_iter()
            .map(|spec| normalize(spec, &mut counters))
            .collect::<DiResult<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for (id, _) in &externals {
            if !seen.insert(id.clone()) {
                return Err(DiError::DuplicateBean(id.clone()));
            }
        }
        for bean in &beans {
            check_unique(bean, &mut seen)?;
        }

        detect_cycles(&beans)?;

        let mut properties: IndexMap<String, PropertyRef> = IndexMap::new();
        let mut descriptors = Vec::new();
        for (id, external) in externals {
            let instance = match external {
                External::Instance(instance) => instance,
                External::Typed { type_id, rust_name, value } => {
                    let ty = registry.lookup_type_id(type_id).ok_or_else(|| DiError::TypeNotFound {
                        bean: id.clone(),
                        type_name: rust_name.to_string(),
                        artifact: None,
                    })?;
                    Instance::from_arc(ty, value)
                }
            };
            descriptors.push(BeanDescriptor {
                id: id.clone(),
                type_name: Some(instance.type_handle().name()),
                scope: None,
                artifact: None,
                kind: BeanKind::External,
            });
            properties.insert(id, Arc::new(ExternalInstance::new(instance)));
        }

        let mut assembler = Assembler { artifacts: &artifacts, nested: Vec::new() };
        for bean in &beans {
            let (id, property) = assembler.bean(bean)?;
            descriptors.push(describe(bean, BeanKind::Declared));
            properties.insert(id, property);
        }
        for (id, property, descriptor) in assembler.nested {
            descriptors.push(descriptor);
            properties.insert(id, property);
        }

        debug!(
            beans = properties.len(),
            artifacts = artifacts.len(),
            has_parent = parent.is_some(),
            "context built"
        );

        Ok(Context {
            inner: Arc::new(ContextInner {
                properties,
                descriptors,
                artifacts,
                registry,
                loader,
                observers,
                parent,
            }),
        })
    }
}

fn declare_artifacts(specs: Vec<ArtifactSpec>) -> DiResult<HashMap<String, Arc<ArtifactHolder>>> {
    let mut artifacts: HashMap<String, Arc<ArtifactHolder>> = HashMap::new();
    for spec in specs {
        let holder = ArtifactHolder::parse(&spec.id, &spec.uri)?;
        match artifacts.get(&spec.id) {
            Some(existing) if existing.uri() != holder.uri() => {
                return Err(DiError::DuplicateArtifact {
                    artifact: spec.id,
                    first: existing.uri().to_string(),
                    second: holder.uri().to_string(),
                });
            }
            Some(_) => {}
            None => {
                artifacts.insert(spec.id, Arc::new(holder));
            }
        }
    }
    Ok(artifacts)
}

/// Assigns missing identifiers, orders arguments and validates list shapes,
/// recursively.
fn normalize(mut spec: BeanSpec, counters: &mut HashMap<String, usize>) -> DiResult<BeanSpec> {
    if spec.id.is_none() {
        let base = spec.display_type();
        let n = counters.entry(base.clone()).or_insert(0);
        *n += 1;
        spec.id = Some(format!("{}#{}", base, n));
    }
    let id = spec.display_id().to_string();

    let has_type = spec.type_name.is_some();
    match &spec.factory {
        None if !has_type => return Err(DiError::MissingImplementation(id)),
        Some(factory) if factory.bean.is_none() && factory.type_name.is_none() && !has_type => {
            return Err(DiError::MissingImplementation(id));
        }
        _ => {}
    }

    let args = order_args(&id, std::mem::take(&mut spec.args))?;
    spec.args = args
        .into_iter()
        .map(|arg| {
            Ok(ArgSpec {
                index: arg.index,
                value: normalize_value(&id, arg.value, counters)?,
            })
        })
        .collect::<DiResult<Vec<_>>>()?;
    Ok(spec)
}

fn normalize_value(bean: &str, value: ArgValue, counters: &mut HashMap<String, usize>) -> DiResult<ArgValue> {
    match value {
        ArgValue::Bean(nested) => Ok(ArgValue::Bean(Box::new(normalize(*nested, counters)?))),
        ArgValue::List(mut list) => {
            if let Some(container) = &list.container {
                container.parse::<Shape>().map_err(|shape| DiError::UnknownShape {
                    bean: bean.to_string(),
                    shape,
                })?;
            }
            list.items = list
                .items
                .into_iter()
                .map(|item| normalize_value(bean, item, counters))
                .collect::<DiResult<Vec<_>>>()?;
            Ok(ArgValue::List(list))
        }
        other => Ok(other),
    }
}

/// Places explicitly indexed arguments at their positions and fills the
/// remaining positions with unindexed arguments in declaration order.
fn order_args(bean: &str, args: Vec<ArgSpec>) -> DiResult<Vec<ArgSpec>> {
    let count = args.len();
    let mut slots: Vec<Option<ArgValue>> = vec![None; count];
    let mut positional = Vec::new();
    for arg in args {
        match arg.index {
            Some(index) if index >= count => {
                return Err(DiError::SparseArguments { bean: bean.to_string(), index, count });
            }
            Some(index) if slots[index].is_some() => {
                return Err(DiError::DuplicateArgumentIndex { bean: bean.to_string(), index });
            }
            Some(index) => slots[index] = Some(arg.value),
            None => positional.push(arg.value),
        }
    }
    let mut positional = positional.into_iter();
    Ok(slots
        .into_iter()
        .enumerate()
        .filter_map(|(index, slot)| {
            slot.or_else(|| positional.next())
                .map(|value| ArgSpec { index: Some(index), value })
        })
        .collect())
}

fn check_unique(bean: &BeanSpec, seen: &mut HashSet<String>) -> DiResult<()> {
    let id = bean.display_id();
    if !seen.insert(id.to_string()) {
        return Err(DiError::DuplicateBean(id.to_string()));
    }
    bean.args.iter().try_for_each(|arg| check_value(&arg.value, seen))
}

fn check_value(value: &ArgValue, seen: &mut HashSet<String>) -> DiResult<()> {
    match value {
        ArgValue::Bean(nested) => check_unique(nested, seen),
        ArgValue::List(list) => list.items.iter().try_for_each(|item| check_value(item, seen)),
        ArgValue::Literal { .. } | ArgValue::Ref { .. } => Ok(()),
    }
}

fn describe(spec: &BeanSpec, kind: BeanKind) -> BeanDescriptor {
    BeanDescriptor {
        id: spec.display_id().to_string(),
        type_name: spec.type_name.clone(),
        scope: Some(spec.scope),
        artifact: spec.artifact.clone(),
        kind,
    }
}

/// Turns normalized specifications into properties, depth first.
struct Assembler<'a> {
    artifacts: &'a HashMap<String, Arc<ArtifactHolder>>,
    nested: Vec<(String, PropertyRef, BeanDescriptor)>,
}

impl Assembler<'_> {
    fn bean(&mut self, spec: &BeanSpec) -> DiResult<(String, PropertyRef)> {
        let id = spec.display_id().to_string();
        let artifact = match &spec.artifact {
            Some(name) => Some(self.artifacts.get(name).cloned().ok_or_else(|| DiError::UnknownArtifact {
                bean: id.clone(),
                artifact: name.clone(),
            })?),
            None => None,
        };

        let mut args = Vec::with_capacity(spec.args.len());
        for arg in &spec.args {
            args.push(self.value(&id, &arg.value)?);
        }

        let factory = spec.factory.as_ref().map(|factory| match &factory.bean {
            Some(bean) => FactoryMethod::Instance {
                receiver: Arc::new(BeanReference::new(bean.clone(), None).declared_by(&id)) as PropertyRef,
                method: factory.method.clone(),
            },
            None => FactoryMethod::Static {
                type_name: factory.type_name.clone(),
                method: factory.method.clone(),
            },
        });

        let base = BeanInstanceFactory::new(
            id.clone(),
            spec.type_name.clone(),
            artifact,
            args,
            factory,
            spec.activation.clone(),
        );
        let property: PropertyRef = match spec.scope {
            Scope::Prototype => Arc::new(PrototypeBeanFactory::new(base)),
            Scope::Singleton => Arc::new(SingletonBeanFactory::new(base)),
        };
        Ok((id, property))
    }

    fn value(&mut self, owner: &str, value: &ArgValue) -> DiResult<PropertyRef> {
        let property: PropertyRef = match value {
            ArgValue::Literal { text, type_name } => Arc::new(ConstantProperty::new(text.clone(), type_name.clone())),
            ArgValue::Ref { id, type_name } => {
                Arc::new(BeanReference::new(id.clone(), type_name.clone()).declared_by(owner))
            }
            ArgValue::Bean(nested) => {
                let (id, property) = self.bean(nested)?;
                self.nested.push((id, property.clone(), describe(nested, BeanKind::Nested)));
                property
            }
            ArgValue::List(list) => {
                let shape = match &list.container {
                    Some(container) => container.parse().unwrap_or_default(),
                    None => Shape::default(),
                };
                let mut items = Vec::with_capacity(list.items.len());
                for item in &list.items {
                    items.push(self.value(owner, item)?);
                }
                Arc::new(ListProperty::new(items, list.element_type.clone(), shape))
            }
        };
        Ok(property)
    }
}
