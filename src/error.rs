//! Error types for context assembly and bean resolution.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by user-supplied constructors, parsers and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared, cloneable cause carried inside [`DiError`].
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Broad category of a [`DiError`].
///
/// Lets callers tell a bad declaration apart from a bad implementation type
/// without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The declarative input is malformed.
    Declaration,
    /// A type, bean, constructor or coercion could not be resolved.
    Resolution,
    /// A constructor, factory method or activation hook failed.
    Construction,
    /// The declared dependency graph is cyclic.
    Graph,
}

/// Context assembly and resolution errors.
///
/// Every variant names enough of the declaration (bean identifier,
/// implementation type, argument count or target type) to locate the faulty
/// declaration.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{DiError, ErrorKind};
///
/// let err = DiError::Circular {
///     bean: "a".to_string(),
///     type_name: "Service".to_string(),
///     path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
/// };
/// assert_eq!(err.kind(), ErrorKind::Graph);
/// assert_eq!(err.to_string(), "Circular reference at bean 'a' (Service): a -> b -> a");
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Explicit argument indices leave a gap
    #[error("Bean '{bean}': argument index {index} is out of range for {count} arguments")]
    SparseArguments { bean: String, index: usize, count: usize },
    /// Two arguments claim the same explicit index
    #[error("Bean '{bean}': argument index {index} declared more than once")]
    DuplicateArgumentIndex { bean: String, index: usize },
    /// List container shape is neither `list` nor `array`
    #[error("Bean '{bean}': unknown container shape '{shape}'")]
    UnknownShape { bean: String, shape: String },
    /// Artifact URI does not parse
    #[error("Artifact '{artifact}': invalid URI '{uri}': {reason}")]
    InvalidArtifactUri { artifact: String, uri: String, reason: String },
    /// Artifact identifier redeclared with another URI
    #[error("Artifact '{artifact}' declared with conflicting URIs '{first}' and '{second}'")]
    DuplicateArtifact { artifact: String, first: String, second: String },
    /// Bean names an artifact that was never declared
    #[error("Bean '{bean}' references undeclared artifact '{artifact}'")]
    UnknownArtifact { bean: String, artifact: String },
    /// Identifier used by more than one bean
    #[error("Bean identifier '{0}' declared more than once")]
    DuplicateBean(String),
    /// Bean has neither an implementation type nor a factory method to fall back on
    #[error("Bean '{0}' declares neither an implementation type nor a factory method")]
    MissingImplementation(String),
    /// Type descriptor refers to an unregistered type
    #[error("Type '{owner}' refers to unregistered type '{type_name}'")]
    UnknownTypeReference { owner: String, type_name: String },
    /// Serialized specification could not be read
    #[error("Invalid context specification: {0}")]
    InvalidSpec(String),

    /// Implementation type is not registered in the applicable loading context
    #[error("Bean '{bean}': type '{type_name}' not found{}", in_artifact(.artifact))]
    TypeNotFound { bean: String, type_name: String, artifact: Option<String> },
    /// Artifact loader failed to produce an isolated registry
    #[error("Artifact '{artifact}' at '{uri}' is unavailable: {source}")]
    ArtifactUnavailable { artifact: String, uri: String, source: SharedError },
    /// No constructor matches the declared arguments
    #[error("Bean '{bean}': no applicable constructor on '{type_name}' for {arguments} argument(s)")]
    NoApplicableConstructor { bean: String, type_name: String, arguments: usize },
    /// No factory method matches the declared arguments
    #[error("Bean '{bean}': no applicable factory method '{method}' on '{type_name}' for {arguments} argument(s)")]
    NoApplicableMethod { bean: String, type_name: String, method: String, arguments: usize },
    /// Activation hook is not registered on the instance's type
    #[error("Bean '{bean}': type '{type_name}' has no activation hook '{hook}'")]
    UnknownActivation { bean: String, type_name: String, hook: String },
    /// Property cannot be adapted to the requested type
    #[error("Cannot morph '{from}' into '{to}'")]
    IncompatibleMorph { from: String, to: String },
    /// Literal text could not be converted into the target type
    #[error("Cannot coerce '{text}' into '{target}': {reason}")]
    Coercion { text: String, target: String, reason: String },
    /// A declared argument could not be adapted to its parameter
    #[error("Bean '{bean}': argument {index} of '{type_name}' is invalid: {source}")]
    Argument { bean: String, type_name: String, index: usize, source: Box<DiError> },
    /// Identifier not bound in the context or any parent
    #[error("Bean not found: {0}")]
    NotFound(String),
    /// No bean assignable to the requested type in the context or any parent
    #[error("No bean assignable to type: {0}")]
    NoBeanOfType(String),
    /// Bean exists but does not satisfy the requested type
    #[error("Bean '{bean}' is a '{actual}', not a '{expected}'")]
    BeanNotOfType { bean: String, expected: String, actual: String },
    /// Typed downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(String),

    /// Constructor, factory method or activation hook failed
    #[error("Failed to instantiate bean '{bean}' of type '{type_name}': {source}")]
    Instantiation { bean: String, type_name: String, source: SharedError },

    /// Declared graph reaches a bean from itself
    #[error("Circular reference at bean '{bean}' ({type_name}): {}", .path.join(" -> "))]
    Circular { bean: String, type_name: String, path: Vec<String> },
}

fn in_artifact(artifact: &Option<String>) -> String {
    match artifact {
        Some(id) => format!(" in artifact '{}'", id),
        None => String::new(),
    }
}

impl DiError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiError::SparseArguments { .. }
            | DiError::DuplicateArgumentIndex { .. }
            | DiError::UnknownShape { .. }
            | DiError::InvalidArtifactUri { .. }
            | DiError::DuplicateArtifact { .. }
            | DiError::UnknownArtifact { .. }
            | DiError::DuplicateBean(_)
            | DiError::MissingImplementation(_)
            | DiError::UnknownTypeReference { .. }
            | DiError::InvalidSpec(_) => ErrorKind::Declaration,
            DiError::TypeNotFound { .. }
            | DiError::ArtifactUnavailable { .. }
            | DiError::NoApplicableConstructor { .. }
            | DiError::NoApplicableMethod { .. }
            | DiError::UnknownActivation { .. }
            | DiError::IncompatibleMorph { .. }
            | DiError::Coercion { .. }
            | DiError::NotFound(_)
            | DiError::NoBeanOfType(_)
            | DiError::BeanNotOfType { .. }
            | DiError::TypeMismatch(_) => ErrorKind::Resolution,
            DiError::Argument { source, .. } => source.kind(),
            DiError::Instantiation { .. } => ErrorKind::Construction,
            DiError::Circular { .. } => ErrorKind::Graph,
        }
    }
}

/// Panic payload captured while invoking a constructor, factory method or hook.
///
/// Surfaces as the `source` of [`DiError::Instantiation`].
#[derive(Debug, Clone, Error)]
#[error("constructor panicked: {0}")]
pub struct ConstructorPanic(pub String);

/// Result type for context operations
///
/// A convenience alias for `Result<T, DiError>` used throughout ferrous-beans.
pub type DiResult<T> = Result<T, DiError>;
