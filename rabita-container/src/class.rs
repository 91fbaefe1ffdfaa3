//! Class descriptors and the collaborators that consume them.
//!
//! A [`ClassDescriptor`] is the statically declared shape of something the
//! container can build: its kind, its ordered constructor parameters and
//! the closure that constructs it. Descriptors are served by a
//! [`ClassProvider`] and turned into objects by an [`ObjectMaterializer`].
//!
//! # Examples
//! ```
//! use rabita_container::class::{ClassCatalog, ClassDescriptor, ClassProvider, ParamDescriptor};
//! use rabita_container::instance::Instance;
//! use rabita_container::key::Identifier;
//!
//! struct Logger;
//! struct Mailer { logger: std::sync::Arc<Logger> }
//!
//! let catalog = ClassCatalog::new()
//!     .with(ClassDescriptor::class("App\\Logger").constructor(|_| Ok(Instance::new(Logger))))
//!     .with(
//!         ClassDescriptor::class("App\\Mailer")
//!             .param(ParamDescriptor::class("logger", "App\\Logger"))
//!             .constructor(|args| Ok(Instance::new(Mailer { logger: args.get(0)? }))),
//!     );
//!
//! assert!(catalog.describe(&Identifier::new("App\\Mailer")).is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::BoxError;
use crate::instance::{Arguments, Instance};
use crate::key::Identifier;

/// Builds an instance from the resolved constructor arguments.
pub type ConstructFn = Arc<dyn Fn(Arguments<'_>) -> Result<Instance, BoxError> + Send + Sync>;

/// What sort of type a descriptor describes. Only [`ClassKind::Concrete`]
/// can be instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concrete,
    Interface,
    Abstract,
    Trait,
}

impl ClassKind {
    #[inline]
    pub fn is_instantiable(&self) -> bool {
        matches!(self, ClassKind::Concrete)
    }
}

/// Declared type of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// A class or interface the container can resolve; this is a type hint.
    Class(Identifier),
    /// A scalar or other builtin type; never autowired.
    Builtin(&'static str),
    /// No declared type.
    Untyped,
}

/// One declared constructor parameter.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: ParamType,
    pub nullable: bool,
    /// Only the fact that a default exists; the value belongs to the constructor.
    pub has_default: bool,
    pub variadic: bool,
}

impl ParamDescriptor {
    fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            has_default: false,
            variadic: false,
        }
    }

    /// A parameter type-hinted with a resolvable class.
    pub fn class(name: impl Into<String>, class: impl Into<Identifier>) -> Self {
        Self::new(name, ParamType::Class(class.into()))
    }

    /// A parameter type-hinted with the Rust type `T`.
    pub fn of<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Class(Identifier::of::<T>()))
    }

    pub fn builtin(name: impl Into<String>, ty: &'static str) -> Self {
        Self::new(name, ParamType::Builtin(ty))
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Untyped)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Statically declared shape of a class.
#[derive(Clone)]
pub struct ClassDescriptor {
    pub name: Identifier,
    pub kind: ClassKind,
    pub params: Vec<ParamDescriptor>,
    pub has_constructor: bool,
    construct: Option<ConstructFn>,
}

impl ClassDescriptor {
    fn with_kind(name: impl Into<Identifier>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            params: Vec::new(),
            has_constructor: false,
            construct: None,
        }
    }

    /// A concrete, instantiable class.
    pub fn class(name: impl Into<Identifier>) -> Self {
        Self::with_kind(name, ClassKind::Concrete)
    }

    /// A concrete class named after the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::class(Identifier::of::<T>())
    }

    pub fn interface(name: impl Into<Identifier>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    pub fn abstract_class(name: impl Into<Identifier>) -> Self {
        Self::with_kind(name, ClassKind::Abstract)
    }

    pub fn trait_(name: impl Into<Identifier>) -> Self {
        Self::with_kind(name, ClassKind::Trait)
    }

    /// Appends a constructor parameter.
    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the constructor. It receives the built argument prefix.
    pub fn constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn(Arguments<'_>) -> Result<Instance, BoxError> + Send + Sync + 'static,
    {
        self.has_constructor = true;
        self.construct = Some(Arc::new(construct));
        self
    }

    /// For classes without a constructor: how to create the bare object.
    pub fn instantiate_with<F>(mut self, create: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.has_constructor = false;
        self.construct = Some(Arc::new(move |_| Ok(create())));
        self
    }

    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.kind.is_instantiable()
    }

    /// The construction routine, if one was declared.
    pub fn construct_fn(&self) -> Option<&ConstructFn> {
        self.construct.as_ref()
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("has_constructor", &self.has_constructor)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Class Descriptor Provider
// ═══════════════════════════════════════════

/// Answers "what does class X look like?". Must be side-effect free.
pub trait ClassProvider: Send + Sync {
    fn describe(&self, class: &Identifier) -> Option<Arc<ClassDescriptor>>;

    /// Names known to this provider, used for "did you mean?" suggestions.
    fn known_classes(&self) -> Vec<Identifier> {
        Vec::new()
    }
}

/// Link-time class registration, collected by [`ClassCatalog::from_inventory`].
///
/// ```rust,ignore
/// inventory::submit! {
///     ClassRegistration::new(|| ClassDescriptor::class("App\\Clock").instantiate_with(|| Instance::new(Clock)))
/// }
/// ```
pub struct ClassRegistration {
    describe: fn() -> ClassDescriptor,
}

impl ClassRegistration {
    pub const fn new(describe: fn() -> ClassDescriptor) -> Self {
        Self { describe }
    }
}

inventory::collect!(ClassRegistration);

static GLOBAL_CATALOG: Lazy<Arc<ClassCatalog>> = Lazy::new(|| Arc::new(ClassCatalog::from_inventory()));

/// The default [`ClassProvider`]: a concurrent map of descriptors that
/// many single-threaded containers can share.
#[derive(Default)]
pub struct ClassCatalog {
    classes: DashMap<Identifier, Arc<ClassDescriptor>>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from every `inventory::submit!`-ed [`ClassRegistration`].
    pub fn from_inventory() -> Self {
        let catalog = Self::new();
        for registration in inventory::iter::<ClassRegistration> {
            catalog.register((registration.describe)());
        }
        debug!(classes = catalog.len(), "Collected class registrations");
        catalog
    }

    /// Shared catalog built lazily from inventory on first use.
    pub fn global() -> Arc<ClassCatalog> {
        GLOBAL_CATALOG.clone()
    }

    /// Adds or replaces a descriptor.
    pub fn register(&self, descriptor: ClassDescriptor) {
        debug!(class = %descriptor.name, kind = ?descriptor.kind, params = descriptor.params.len(), "Registered class");
        self.classes
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    pub fn with(self, descriptor: ClassDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn contains(&self, class: &Identifier) -> bool {
        self.classes.contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassProvider for ClassCatalog {
    fn describe(&self, class: &Identifier) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(class).map(|entry| entry.value().clone())
    }

    fn known_classes(&self) -> Vec<Identifier> {
        self.classes.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl fmt::Debug for ClassCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCatalog")
            .field("classes", &self.classes.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Object Materializer
// ═══════════════════════════════════════════

/// Turns a descriptor plus resolved arguments into an object.
pub trait ObjectMaterializer: Send + Sync {
    fn materialize(&self, class: &ClassDescriptor, args: Arguments<'_>) -> Result<Instance, BoxError>;
}

/// Default materializer: calls the descriptor's construction routine.
/// Classes without a constructor receive no arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructorMaterializer;

impl ObjectMaterializer for ConstructorMaterializer {
    fn materialize(&self, class: &ClassDescriptor, args: Arguments<'_>) -> Result<Instance, BoxError> {
        let construct = class
            .construct_fn()
            .ok_or_else(|| format!("{} declares no construction routine", class.name))?;

        if class.has_constructor {
            construct(args)
        } else {
            construct(Arguments::empty(args.class()))
        }
    }
}
