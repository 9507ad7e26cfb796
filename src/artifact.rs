//! Artifact isolation: external code sources loaded into their own registries.
//!
//! An artifact is identified by a URI. The first bean that needs a type from
//! it asks the context's [`ArtifactLoader`] for an isolated [`TypeRegistry`];
//! the result is cached in the [`ArtifactHolder`] and shared by every bean
//! naming the same artifact. Isolated registries delegate to the ambient
//! registry for names they do not define themselves.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::error::{BoxError, DiError, DiResult};
use crate::types::TypeRegistry;

/// Produces the isolated registry for an artifact URI.
pub trait ArtifactLoader: Send + Sync {
    /// Loads the artifact at `uri` into a new registry whose parent is `parent`.
    fn load(&self, uri: &Url, parent: &Arc<TypeRegistry>) -> Result<TypeRegistry, BoxError>;
}

/// Registration function run against a fresh isolated registry.
pub type Registrar = Arc<dyn Fn(&mut TypeRegistry) -> DiResult<()> + Send + Sync>;

/// Loader backed by registration functions known ahead of time.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{StaticArtifactLoader, TypeDescriptor, Url};
///
/// struct Plugin;
///
/// let loader = StaticArtifactLoader::new().with(
///     Url::parse("memory://plugins/v1").unwrap(),
///     |registry| {
///         registry.register(
///             TypeDescriptor::builder::<Plugin>("Plugin").constructor(&[], |_| Ok(Plugin)),
///         )?;
///         Ok(())
///     },
/// );
/// assert!(loader.knows(&Url::parse("memory://plugins/v1").unwrap()));
/// ```
#[derive(Clone, Default)]
pub struct StaticArtifactLoader {
    registrars: HashMap<Url, Registrar>,
}

impl StaticArtifactLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the registration function for `uri`, replacing any earlier one.
    pub fn with<F>(mut self, uri: Url, registrar: F) -> Self
    where
        F: Fn(&mut TypeRegistry) -> DiResult<()> + Send + Sync + 'static,
    {
        self.registrars.insert(uri, Arc::new(registrar));
        self
    }

    pub fn knows(&self, uri: &Url) -> bool {
        self.registrars.contains_key(uri)
    }
}

impl ArtifactLoader for StaticArtifactLoader {
    fn load(&self, uri: &Url, parent: &Arc<TypeRegistry>) -> Result<TypeRegistry, BoxError> {
        let registrar = self
            .registrars
            .get(uri)
            .ok_or_else(|| format!("no artifact is available at '{}'", uri))?;
        let mut registry = TypeRegistry::with_parent(parent.clone());
        registrar(&mut registry)?;
        Ok(registry)
    }
}

impl fmt::Debug for StaticArtifactLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticArtifactLoader")
            .field("uris", &self.registrars.keys().map(Url::as_str).collect::<Vec<_>>())
            .finish()
    }
}

/// A declared artifact and its lazily loaded registry.
///
/// Two holders are equal when both identifier and URI match.
pub struct ArtifactHolder {
    id: String,
    uri: Url,
    registry: OnceCell<Arc<TypeRegistry>>,
}

impl ArtifactHolder {
    /// Parses `uri` and declares the artifact `id`.
    pub fn parse(id: &str, uri: &str) -> DiResult<Self> {
        let parsed = Url::parse(uri).map_err(|e| DiError::InvalidArtifactUri {
            artifact: id.to_string(),
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            id: id.to_string(),
            uri: parsed,
            registry: OnceCell::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn is_loaded(&self) -> bool {
        self.registry.get().is_some()
    }

    /// The isolated registry, loading it on first use.
    ///
    /// Concurrent first callers block until one load finishes; a failed load
    /// leaves the holder unloaded.
    pub fn registry(&self, loader: &dyn ArtifactLoader, ambient: &Arc<TypeRegistry>) -> DiResult<Arc<TypeRegistry>> {
        self.registry
            .get_or_try_init(|| {
                debug!(artifact = %self.id, uri = %self.uri, "loading artifact");
                loader
                    .load(&self.uri, ambient)
                    .map(Arc::new)
                    .map_err(|e| DiError::ArtifactUnavailable {
                        artifact: self.id.clone(),
                        uri: self.uri.to_string(),
                        source: Arc::from(e),
                    })
            })
            .cloned()
    }
}

impl PartialEq for ArtifactHolder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.uri == other.uri
    }
}

impl Eq for ArtifactHolder {}

impl Hash for ArtifactHolder {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.uri.hash(state);
    }
}

impl fmt::Debug for ArtifactHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactHolder")
            .field("id", &self.id)
            .field("uri", &self.uri.as_str())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
