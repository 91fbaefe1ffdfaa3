//! Binding lifecycle scopes.
//!
//! - [`Scope::Transient`]: new instance on every resolve
//! - [`Scope::Singleton`]: built once, then served from the caches
//! - [`Scope::Instance`]: a fixed value supplied at registration time
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle policy of a binding.
///
/// # Examples
/// ```
/// use rabita_container::scope::Scope;
///
/// assert!(Scope::Singleton.is_singleton());
/// assert!(Scope::Instance.is_cached());
/// assert!(!Scope::Transient.is_cached());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// New instance created on every resolve call.
    ///
    /// # When to use
    /// - Lightweight stateless services
    /// - Objects with mutable state that shouldn't be shared
    Transient,

    /// Built on first resolve, cached for the container's lifetime.
    ///
    /// # When to use
    /// - Connection pools
    /// - Configuration objects
    Singleton,

    /// A pre-built value registered with `instance()`.
    Instance,
}

impl Scope {
    /// Returns `true` if resolved values outlive a single resolve call.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Scope::Singleton | Scope::Instance)
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Transient => write!(f, "Transient"),
            Scope::Singleton => write!(f, "Singleton"),
            Scope::Instance => write!(f, "Instance"),
        }
    }
}
