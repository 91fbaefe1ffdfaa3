//! Type-erased values flowing through the container.
//!
//! - [`Instance`]: a shared, resolved value
//! - [`Parameters`]: named values supplied by the caller of `make_with`
//! - [`Arguments`]: the constructor arguments built by autowiring

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// A resolved value. Cloning shares the same underlying object, so two
/// clones are the same instance in the identity sense ([`Instance::ptr_eq`]).
///
/// # Examples
/// ```
/// use rabita_container::instance::Instance;
///
/// struct Config { debug: bool }
///
/// let instance = Instance::new(Config { debug: true });
/// let config = instance.downcast::<Config>().unwrap();
/// assert!(config.debug);
/// assert!(instance.ptr_eq(&instance.clone()));
/// ```
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Wraps an existing `Arc` without reallocating.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
        }
    }

    /// Returns the shared value if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    #[inline]
    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Name of the concrete Rust type stored.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.type_name)
    }
}

/// Named values supplied to `make_with`, matched against constructor
/// parameter names before any autowiring happens.
///
/// ```
/// use rabita_container::instance::{Instance, Parameters};
///
/// let params = Parameters::new().with("dsn", Instance::new(String::from("sqlite::memory:")));
/// assert!(params.get("dsn").is_some());
/// assert!(params.get("user").is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Parameters {
    entries: Vec<(String, Instance)>,
}

impl Parameters {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds (or replaces) a named value.
    pub fn with(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Instance) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Error when a constructor reads an argument it cannot use.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("{class}: argument #{index} was not supplied")]
    Missing { class: String, index: usize },

    #[error("{class}: argument #{index} is null")]
    Null { class: String, index: usize },

    #[error("{class}: argument #{index} is {found}, expected {expected}")]
    WrongType {
        class: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// The argument prefix handed to a constructor.
///
/// Autowiring stops early when a trailing parameter has a default, so
/// `len()` may be smaller than the declared parameter count; `None`
/// entries are nulls supplied for nullable parameters.
#[derive(Clone, Copy)]
pub struct Arguments<'a> {
    class: &'a str,
    values: &'a [Option<Instance>],
}

impl<'a> Arguments<'a> {
    pub fn new(class: &'a str, values: &'a [Option<Instance>]) -> Self {
        Self { class, values }
    }

    /// No arguments at all.
    pub fn empty(class: &'a str) -> Self {
        Self { class, values: &[] }
    }

    /// The class being constructed.
    #[inline]
    pub fn class(&self) -> &'a str {
        self.class
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `true` if the argument at `index` is part of the built prefix.
    #[inline]
    pub fn is_supplied(&self, index: usize) -> bool {
        index < self.values.len()
    }

    /// Raw access; `None` if not supplied or null.
    pub fn instance(&self, index: usize) -> Option<&'a Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Reads a required argument.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, ArgumentError> {
        match self.values.get(index) {
            None => Err(ArgumentError::Missing {
                class: self.class.to_string(),
                index,
            }),
            Some(None) => Err(ArgumentError::Null {
                class: self.class.to_string(),
                index,
            }),
            Some(Some(instance)) => self.cast(index, instance),
        }
    }

    /// Reads an optional argument: absent or null is `Ok(None)`.
    pub fn optional<T: Any + Send + Sync>(
        &self,
        index: usize,
    ) -> Result<Option<Arc<T>>, ArgumentError> {
        match self.values.get(index) {
            None | Some(None) => Ok(None),
            Some(Some(instance)) => self.cast(index, instance).map(Some),
        }
    }

    fn cast<T: Any + Send + Sync>(
        &self,
        index: usize,
        instance: &Instance,
    ) -> Result<Arc<T>, ArgumentError> {
        instance
            .downcast::<T>()
            .ok_or_else(|| ArgumentError::WrongType {
                class: self.class.to_string(),
                index,
                expected: type_name::<T>(),
                found: instance.type_name(),
            })
    }
}

impl fmt::Debug for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("class", &self.class)
            .field("values", &self.values)
            .finish()
    }
}
