//! Binding registry: stores the explicit bindings of one container.
//!
//! The registry maps an abstract [`Identifier`] to a shared [`Binding`]
//! record describing what it resolves to and for how long the result lives.
//! Contextual overrides live next to it in [`ContextualStore`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::container::Container;
use crate::error::Result;
use crate::instance::{Instance, Parameters};
use crate::key::Identifier;
use crate::scope::Scope;

/// Closure concrete: receives the container (to resolve its own
/// dependencies) and the caller's parameters.
pub type ClosureFn = Arc<dyn Fn(&mut Container, &Parameters) -> Result<Instance> + Send + Sync>;

/// What an abstract is bound to.
#[derive(Clone)]
pub enum Concrete {
    /// A class to autowire.
    Class(Identifier),
    /// A closure invoked on every resolution that is not cached.
    Closure(ClosureFn),
    /// A pre-built value.
    Value(Instance),
}

impl Concrete {
    pub fn class(name: impl Into<Identifier>) -> Self {
        Concrete::Class(name.into())
    }

    /// # Examples
    /// ```
    /// use rabita_container::binding::Concrete;
    /// use rabita_container::instance::Instance;
    ///
    /// let concrete = Concrete::closure(|_container, _params| Ok(Instance::new(42u32)));
    /// assert_eq!(concrete.kind(), "closure");
    /// ```
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&mut Container, &Parameters) -> Result<Instance> + Send + Sync + 'static,
    {
        Concrete::Closure(Arc::new(f))
    }

    pub fn value(value: Instance) -> Self {
        Concrete::Value(value)
    }

    /// Short kind name for logs and [`BindingInfo`](crate::container::BindingInfo).
    pub fn kind(&self) -> &'static str {
        match self {
            Concrete::Class(_) => "class",
            Concrete::Closure(_) => "closure",
            Concrete::Value(_) => "value",
        }
    }

    /// Human-readable description of the target.
    pub fn label(&self) -> String {
        match self {
            Concrete::Class(class) => class.to_string(),
            Concrete::Closure(_) => "<closure>".to_string(),
            Concrete::Value(value) => format!("<{}>", value.type_name()),
        }
    }
}

impl From<&str> for Concrete {
    fn from(class: &str) -> Self {
        Concrete::Class(Identifier::new(class))
    }
}

impl From<String> for Concrete {
    fn from(class: String) -> Self {
        Concrete::Class(Identifier::new(class))
    }
}

impl From<Identifier> for Concrete {
    fn from(class: Identifier) -> Self {
        Concrete::Class(class)
    }
}

impl From<&Identifier> for Concrete {
    fn from(class: &Identifier) -> Self {
        Concrete::Class(class.clone())
    }
}

impl From<Instance> for Concrete {
    fn from(value: Instance) -> Self {
        Concrete::Value(value)
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concrete::{}({})", self.kind(), self.label())
    }
}

/// One explicit binding.
///
/// `resolved` is only ever set for singleton bindings whose instance is
/// cached; it is atomic because in-flight resolutions share the record.
pub struct Binding {
    pub abstract_id: Identifier,
    pub concrete: Concrete,
    pub scope: Scope,
    pub cached_instance: Option<Instance>,
    resolved: AtomicBool,
}

impl Binding {
    pub fn new(abstract_id: Identifier, concrete: Concrete, scope: Scope) -> Self {
        let cached_instance = match (&concrete, scope) {
            (Concrete::Value(value), Scope::Instance) => Some(value.clone()),
            _ => None,
        };

        Self {
            abstract_id,
            concrete,
            scope,
            cached_instance,
            resolved: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    pub(crate) fn mark_resolved(&self) {
        if self.scope.is_singleton() {
            self.resolved.store(true, Ordering::Release);
        }
    }

    pub(crate) fn reset_resolved(&self) {
        self.resolved.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("abstract", &self.abstract_id)
            .field("concrete", &self.concrete)
            .field("scope", &self.scope)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Abstract → binding.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: AHashMap<Identifier, Arc<Binding>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding, returning the one it replaced.
    pub fn insert(&mut self, binding: Binding) -> Option<Arc<Binding>> {
        let key = binding.abstract_id.clone();
        debug!(
            key = %key,
            scope = %binding.scope,
            concrete = %binding.concrete.label(),
            "Registered binding"
        );

        let previous = self.bindings.insert(key, Arc::new(binding));
        if let Some(old) = &previous {
            trace!(key = %old.abstract_id, "Replaced binding");
        }
        previous
    }

    pub fn get(&self, key: &Identifier) -> Option<&Arc<Binding>> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &Identifier) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn remove(&mut self, key: &Identifier) -> Option<Arc<Binding>> {
        self.bindings.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Binding>> {
        self.bindings.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Identifier> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Order-independent fingerprint of the bound abstracts.
    pub fn fingerprint(&self) -> u64 {
        self.bindings
            .keys()
            .fold(0, |acc, key| acc ^ key.hash_value())
    }
}

/// An override applied only when `requester` asks for `dependency`.
#[derive(Debug, Clone)]
pub struct ContextualBinding {
    pub requester: Identifier,
    pub dependency: Identifier,
    pub implementation: Concrete,
}

/// `(requester, dependency)` → override.
#[derive(Debug, Default)]
pub struct ContextualStore {
    entries: AHashMap<(Identifier, Identifier), Arc<ContextualBinding>>,
}

impl ContextualStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, binding: ContextualBinding) {
        debug!(
            requester = %binding.requester,
            dependency = %binding.dependency,
            implementation = %binding.implementation.label(),
            "Registered contextual binding"
        );
        self.entries.insert(
            (binding.requester.clone(), binding.dependency.clone()),
            Arc::new(binding),
        );
    }

    pub fn get(&self, requester: &Identifier, dependency: &Identifier) -> Option<&Arc<ContextualBinding>> {
        self.entries
            .get(&(requester.clone(), dependency.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
