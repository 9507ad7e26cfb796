//! Serialized context specifications.
//!
//! A [`ContextSpec`] is the JSON form of everything a
//! [`ContextFactory`](crate::ContextFactory) is built from: artifact
//! declarations and bean declarations. External instances, parents, registries
//! and observers are runtime objects and stay on the factory builder.
//!
//! ```json
//! {
//!   "artifacts": [{ "id": "plugins", "uri": "memory://plugins" }],
//!   "beans": [
//!     {
//!       "id": "pool",
//!       "type": "Pool",
//!       "scope": "singleton",
//!       "args": [
//!         { "kind": "literal", "text": "8" },
//!         { "kind": "ref", "id": "logger", "index": 1 },
//!         { "kind": "list", "items": [{ "kind": "literal", "text": "a" }], "container": "array" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::definition::{ArtifactSpec, BeanSpec};
use crate::error::{DiError, DiResult};

/// Artifacts and beans of one context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSpec {
    pub artifacts: Vec<ArtifactSpec>,
    pub beans: Vec<BeanSpec>,
}

impl ContextSpec {
    /// Parses a specification from JSON text.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_beans::ContextSpec;
    ///
    /// let spec = ContextSpec::from_json(r#"{ "beans": [{ "type": "Clock", "scope": "prototype" }] }"#).unwrap();
    /// assert_eq!(spec.beans[0].type_name.as_deref(), Some("Clock"));
    /// ```
    pub fn from_json(text: &str) -> DiResult<Self> {
        serde_json::from_str(text).map_err(|e| DiError::InvalidSpec(e.to_string()))
    }

    pub fn to_json(&self) -> DiResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DiError::InvalidSpec(e.to_string()))
    }
}
