//! Bean scope definitions.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::DiError;

/// Bean scopes controlling how many instances a declaration produces
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::Scope;
///
/// assert_eq!("prototype".parse::<Scope>().unwrap(), Scope::Prototype);
/// assert_eq!(Scope::default(), Scope::Singleton);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Scope {
    /// New instance per request, never cached
    ///
    /// Every resolution runs the full construction algorithm. The caller owns
    /// the returned instance.
    Prototype,
    /// Single instance per context, cached for the context's lifetime
    ///
    /// Built by the first caller that finds it unbuilt; concurrent callers
    /// block on the build lock and then share the memoized instance.
    #[default]
    Singleton,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Prototype => f.write_str("prototype"),
            Scope::Singleton => f.write_str("singleton"),
        }
    }
}

impl FromStr for Scope {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prototype" => Ok(Scope::Prototype),
            "singleton" => Ok(Scope::Singleton),
            other => Err(DiError::InvalidSpec(format!("unknown scope '{}'", other))),
        }
    }
}
