//! Abstract identifiers.
//!
//! [`Identifier`] names anything the container can resolve: an abstract,
//! a class, an alias or a tag member. The 64-bit hash is computed once at
//! construction so cycle checks, fast-lookup probing and snapshot
//! fingerprints never rehash the string.

use std::any::type_name;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::RandomState;
use once_cell::sync::Lazy;
use rabita_support::rendering::shorten_type_name;

// Fixed seeds: snapshot fingerprints must not change between processes.
static IDENTIFIER_HASHER: Lazy<RandomState> = Lazy::new(|| {
    RandomState::with_seeds(
        0x5261_6269_7461_0001,
        0x9e37_79b9_7f4a_7c15,
        0xc2b2_ae3d_27d4_eb4f,
        0x1656_67b1_9e37_79f9,
    )
});

/// Name of something the container can resolve.
///
/// Cloning is cheap (an `Arc<str>` plus a copied hash).
///
/// # Examples
/// ```
/// use rabita_container::key::Identifier;
///
/// let db = Identifier::new("App\\Database");
/// assert_eq!(db.as_str(), "App\\Database");
/// assert_eq!(db, Identifier::from("App\\Database"));
///
/// struct Mailer;
/// let mailer = Identifier::of::<Mailer>();
/// assert!(mailer.as_str().ends_with("Mailer"));
/// ```
#[derive(Clone)]
pub struct Identifier {
    name: Arc<str>,
    hash: u64,
}

impl Identifier {
    /// Creates an identifier from any string-like name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let hash = IDENTIFIER_HASHER.hash_one(&*name);
        Self { name, hash }
    }

    /// Creates an identifier named after the Rust type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(type_name::<T>())
    }

    /// Returns the full name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the precomputed hash.
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Returns the last path segment, for compact diagnostics.
    pub fn short_name(&self) -> String {
        shorten_type_name(&self.name)
    }
}

impl PartialEq for Identifier {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Hash first, full string only on a match.
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self::new(name.as_str())
    }
}

impl From<&Identifier> for Identifier {
    fn from(id: &Identifier) -> Self {
        id.clone()
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.name)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
