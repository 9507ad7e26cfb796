//! Declarative bean specifications.
//!
//! These are the in-memory records a context is built from. They are plain
//! data: whatever produced them (a file parser, a network resource or code)
//! is irrelevant to the container. With the `config` feature they
//! deserialize from JSON, see [`ContextSpec`](crate::config::ContextSpec).

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// Declaration of one bean.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{ArgValue, BeanSpec, Scope};
///
/// let spec = BeanSpec::new("Server")
///     .with_id("server")
///     .with_scope(Scope::Prototype)
///     .arg(ArgValue::literal("8080"))
///     .arg(ArgValue::reference("logger"));
///
/// assert_eq!(spec.id.as_deref(), Some("server"));
/// assert_eq!(spec.args.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct BeanSpec {
    /// Identifier; synthesised as `<type>#<n>` when absent
    pub id: Option<String>,
    /// Implementation type name
    #[cfg_attr(feature = "config", serde(rename = "type"))]
    pub type_name: Option<String>,
    pub scope: Scope,
    /// Artifact the implementation type is loaded from
    pub artifact: Option<String>,
    /// Produce the instance through a factory method instead of a constructor
    pub factory: Option<FactorySpec>,
    /// Activation hook invoked on every constructed instance
    pub activation: Option<String>,
    pub args: Vec<ArgSpec>,
}

impl BeanSpec {
    /// A singleton of the named implementation type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// A bean produced purely by a factory method.
    pub fn from_factory(factory: FactorySpec) -> Self {
        Self {
            factory: Some(factory),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    pub fn with_factory(mut self, factory: FactorySpec) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_activation(mut self, hook: impl Into<String>) -> Self {
        self.activation = Some(hook.into());
        self
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: ArgValue) -> Self {
        self.args.push(ArgSpec { index: None, value });
        self
    }

    /// Adds an argument at an explicit position.
    pub fn arg_at(mut self, index: usize, value: ArgValue) -> Self {
        self.args.push(ArgSpec { index: Some(index), value });
        self
    }

    /// Identifier, or the implementation type name when none was given yet.
    pub fn display_id(&self) -> &str {
        self.id
            .as_deref()
            .or(self.type_name.as_deref())
            .unwrap_or("<anonymous>")
    }

    pub(crate) fn display_type(&self) -> String {
        match (&self.type_name, &self.factory) {
            (Some(type_name), _) => type_name.clone(),
            (None, Some(factory)) => factory.to_string(),
            (None, None) => "<unknown>".to_string(),
        }
    }
}

/// One constructor argument.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct ArgSpec {
    /// Explicit position; unindexed arguments fill the remaining positions in order
    #[cfg_attr(feature = "config", serde(default))]
    pub index: Option<usize>,
    #[cfg_attr(feature = "config", serde(flatten))]
    pub value: ArgValue,
}

/// What an argument supplies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ArgValue {
    /// Text coerced into the parameter type
    Literal {
        text: String,
        #[cfg_attr(feature = "config", serde(default, rename = "type"))]
        type_name: Option<String>,
    },
    /// A nested bean declaration
    Bean(Box<BeanSpec>),
    /// Another bean by identifier, optionally viewed as another type
    Ref {
        id: String,
        #[cfg_attr(feature = "config", serde(default, rename = "type"))]
        type_name: Option<String>,
    },
    /// A list or array of nested arguments
    List(ListSpec),
}

impl ArgValue {
    pub fn literal(text: impl Into<String>) -> Self {
        ArgValue::Literal { text: text.into(), type_name: None }
    }

    pub fn typed_literal(text: impl Into<String>, type_name: impl Into<String>) -> Self {
        ArgValue::Literal { text: text.into(), type_name: Some(type_name.into()) }
    }

    pub fn bean(spec: BeanSpec) -> Self {
        ArgValue::Bean(Box::new(spec))
    }

    pub fn reference(id: impl Into<String>) -> Self {
        ArgValue::Ref { id: id.into(), type_name: None }
    }

    pub fn typed_reference(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        ArgValue::Ref { id: id.into(), type_name: Some(type_name.into()) }
    }

    pub fn list(items: Vec<ArgValue>) -> Self {
        ArgValue::List(ListSpec { items, element_type: None, container: None })
    }
}

/// A nested list argument.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ListSpec {
    pub items: Vec<ArgValue>,
    /// Declared element type name
    pub element_type: Option<String>,
    /// `list` (default) or `array`
    pub container: Option<String>,
}

impl ListSpec {
    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }
}

/// Factory-method indirection.
///
/// With `bean` set the method is an instance method of that bean's value;
/// with `type_name` set it is a static method of that type; with neither it
/// is a static method of the declaring bean's own implementation type.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct FactorySpec {
    pub bean: Option<String>,
    #[cfg_attr(feature = "config", serde(rename = "type"))]
    pub type_name: Option<String>,
    pub method: String,
}

impl FactorySpec {
    /// Instance method `method` of bean `bean`.
    pub fn on_bean(bean: impl Into<String>, method: impl Into<String>) -> Self {
        Self { bean: Some(bean.into()), type_name: None, method: method.into() }
    }

    /// Static method `method` of type `type_name`.
    pub fn on_type(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self { bean: None, type_name: Some(type_name.into()), method: method.into() }
    }

    /// Static method `method` of the declaring bean's own type.
    pub fn local(method: impl Into<String>) -> Self {
        Self { bean: None, type_name: None, method: method.into() }
    }
}

impl std::fmt::Display for FactorySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.bean, &self.type_name) {
            (Some(bean), _) => write!(f, "{}.{}()", bean, self.method),
            (None, Some(type_name)) => write!(f, "{}::{}()", type_name, self.method),
            (None, None) => write!(f, "{}()", self.method),
        }
    }
}

/// Artifact declaration: identifier plus source URI.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct ArtifactSpec {
    pub id: String,
    pub uri: String,
}

impl ArtifactSpec {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self { id: id.into(), uri: uri.into() }
    }
}
