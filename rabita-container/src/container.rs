//! # The Container — heart of Rabita
//!
//! Resolves abstracts into instances, autowiring constructor parameters
//! from class descriptors and honouring explicit bindings, contextual
//! overrides, aliases and the singleton caches.
//!
//! # Resolution order
//! ```text
//! make(abstract)
//!   ├─ alias chain              (≤ max_alias_depth hops)
//!   ├─ fast lookup hit?         → return
//!   ├─ instance cache hit?      → return
//!   ├─ compiled factory?        → invoke   (no requester, no parameters)
//!   ├─ push resolution context  → CircularDependency on repeat
//!   ├─ contextual binding?      → resolve its implementation
//!   ├─ explicit binding?        → resolve concrete, cache if singleton
//!   ├─ otherwise                → autowire
//!   └─ pop resolution context
//! ```
//!
//! # Examples
//! ```rust
//! use rabita_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Logger;
//! struct Mailer {
//!     logger: Arc<Logger>,
//! }
//!
//! let catalog = ClassCatalog::new()
//!     .with(ClassDescriptor::class("App\\Logger").constructor(|_| Ok(Instance::new(Logger))))
//!     .with(
//!         ClassDescriptor::class("App\\Mailer")
//!             .param(ParamDescriptor::class("logger", "App\\Logger"))
//!             .constructor(|args| Ok(Instance::new(Mailer { logger: args.get(0)? }))),
//!     );
//!
//! let mut container = Container::builder().classes(Arc::new(catalog)).build();
//! container.singleton("App\\Logger", "App\\Logger");
//!
//! let mailer: Arc<Mailer> = container.get("App\\Mailer").expect("Failed to resolve");
//! let logger: Arc<Logger> = container.get("App\\Logger").expect("Failed to resolve");
//! assert!(Arc::ptr_eq(&mailer.logger, &logger));
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use rabita_support::rendering::{render_chain, suggest_similar};
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::binding::{Binding, BindingRegistry, Concrete, ContextualBinding, ContextualStore};
use crate::class::{ClassCatalog, ClassDescriptor, ClassProvider, ConstructorMaterializer, ObjectMaterializer};
use crate::compiler;
use crate::context::ResolutionContext;
use crate::error::{CircularDependencyError, NotFoundError, NotFoundReason, RabitaError, Result};
use crate::factory::Factory;
use crate::fast_lookup::FastLookup;
use crate::instance::{Instance, Parameters};
use crate::key::Identifier;
use crate::metadata::{ClassMetadata, MetadataCache};
use crate::provider::{Registrar, ServiceProvider};
use crate::scope::Scope;
use crate::settings::ContainerSettings;
use crate::snapshot::{InstanceCodec, Snapshot, SnapshotError, SnapshotStore};

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from settings and collaborators.
///
/// Anything not supplied falls back to a default: the global
/// inventory-backed [`ClassCatalog`], the [`ConstructorMaterializer`]
/// and no snapshot store.
///
/// ```rust,ignore
/// let container = Container::builder()
///     .settings(settings)
///     .classes(Arc::new(catalog))
///     .snapshot(Arc::new(FileSnapshotStore::from_settings(&settings)), Arc::new(JsonCodec))
///     .build();
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    settings: ContainerSettings,
    classes: Option<Arc<dyn ClassProvider>>,
    materializer: Option<Arc<dyn ObjectMaterializer>>,
    snapshot: Option<SnapshotLink>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Where class descriptors come from.
    pub fn classes(mut self, classes: Arc<dyn ClassProvider>) -> Self {
        self.classes = Some(classes);
        self
    }

    pub fn materializer(mut self, materializer: Arc<dyn ObjectMaterializer>) -> Self {
        self.materializer = Some(materializer);
        self
    }

    /// Attaches a singleton snapshot store and the codec for its payloads.
    pub fn snapshot(mut self, store: Arc<dyn SnapshotStore>, codec: Arc<dyn InstanceCodec>) -> Self {
        self.snapshot = Some(SnapshotLink { store, codec });
        self
    }

    pub fn build(self) -> Container {
        let classes = self
            .classes
            .unwrap_or_else(|| ClassCatalog::global() as Arc<dyn ClassProvider>);
        let materializer = self
            .materializer
            .unwrap_or_else(|| Arc::new(ConstructorMaterializer));

        debug!(
            fast_lookup_groups = self.settings.fast_lookup_groups(),
            snapshot = self.snapshot.is_some(),
            "Building container"
        );

        Container {
            fast_cache: FastLookup::new(self.settings.fast_lookup_groups()),
            instances: AHashMap::new(),
            bindings: BindingRegistry::new(),
            contextual: ContextualStore::new(),
            aliases: AHashMap::new(),
            tags: AHashMap::new(),
            context: ResolutionContext::new(),
            metadata: MetadataCache::new(),
            factories: AHashMap::new(),
            compilation_enabled: false,
            classes,
            materializer,
            settings: self.settings,
            snapshot: self.snapshot,
            snapshot_attempted: false,
            dirty: false,
        }
    }
}

#[derive(Clone)]
struct SnapshotLink {
    store: Arc<dyn SnapshotStore>,
    codec: Arc<dyn InstanceCodec>,
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Dependency-injection container for one unit of work.
///
/// A container is used from one thread at a time; workers that need
/// their own container share a [`ClassCatalog`] instead.
pub struct Container {
    pub(crate) fast_cache: FastLookup<Instance>,
    pub(crate) instances: AHashMap<Identifier, Instance>,
    pub(crate) bindings: BindingRegistry,
    pub(crate) contextual: ContextualStore,
    pub(crate) aliases: AHashMap<Identifier, Identifier>,
    pub(crate) tags: AHashMap<Identifier, Vec<Identifier>>,
    pub(crate) context: ResolutionContext,
    pub(crate) metadata: MetadataCache,
    pub(crate) factories: AHashMap<Identifier, Arc<Factory>>,
    pub(crate) compilation_enabled: bool,
    pub(crate) classes: Arc<dyn ClassProvider>,
    pub(crate) materializer: Arc<dyn ObjectMaterializer>,
    settings: ContainerSettings,
    snapshot: Option<SnapshotLink>,
    snapshot_attempted: bool,
    dirty: bool,
}

/// Serializable view of one binding, as returned by [`Container::bindings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingInfo {
    #[serde(rename = "abstract")]
    pub abstract_name: String,
    pub concrete_kind: &'static str,
    pub concrete: String,
    pub scope: Scope,
    pub resolved: bool,
}

impl Container {
    /// A container backed by the global class catalog.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// A container with default settings over `classes`.
    pub fn with_classes(classes: Arc<dyn ClassProvider>) -> Self {
        Self::builder().classes(classes).build()
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    // ── Resolution ──

    /// Resolves `abstract_id`.
    pub fn make(&mut self, abstract_id: impl Into<Identifier>) -> Result<Instance> {
        self.make_with(abstract_id, &Parameters::new())
    }

    /// Resolves `abstract_id`, matching `params` to constructor parameters
    /// by name before autowiring the rest.
    pub fn make_with(
        &mut self,
        abstract_id: impl Into<Identifier>,
        params: &Parameters,
    ) -> Result<Instance> {
        let id = abstract_id.into();
        self.ensure_snapshot_loaded();
        self.resolve_abstract(&id, params, None)
    }

    /// Resolves `abstract_id` and downcasts it to `T`.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.get("App\\Database")?;
    /// ```
    pub fn get<T: Any + Send + Sync>(&mut self, abstract_id: impl Into<Identifier>) -> Result<Arc<T>> {
        let key = abstract_id.into();
        let instance = self.make(&key)?;

        instance
            .downcast::<T>()
            .ok_or_else(|| RabitaError::TypeMismatch {
                key,
                expected: type_name::<T>(),
            })
    }

    /// Resolves the abstract named after the Rust type `T`.
    pub fn resolve<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
        self.get::<T>(Identifier::of::<T>())
    }

    /// Resolves every abstract tagged with `tag`, in tagging order.
    pub fn tagged(&mut self, tag: impl Into<Identifier>) -> Result<Vec<Instance>> {
        let tag = tag.into();
        let members = self.tags.get(&tag).cloned().unwrap_or_default();

        members
            .iter()
            .map(|member| self.make(member))
            .collect()
    }

    /// Fetch-or-build the metadata of `class`.
    pub fn metadata(&mut self, class: impl Into<Identifier>) -> Result<Arc<ClassMetadata>> {
        let class = class.into();
        let descriptor = self.describe(&class)?;
        Ok(self.metadata.fetch_or_build(&descriptor))
    }

    // ── Registration ──

    /// Binds `abstract_id` to `concrete` with the given scope, replacing
    /// any previous binding together with its cached instance and
    /// compiled factory. Binding an alias rebinds its target.
    pub fn bind(
        &mut self,
        abstract_id: impl Into<Identifier>,
        concrete: impl Into<Concrete>,
        scope: Scope,
    ) -> &mut Self {
        let id = self.resolve_alias(&abstract_id.into());
        self.drop_stale(&id);
        self.bindings
            .insert(Binding::new(id, concrete.into(), scope));
        self
    }

    pub fn transient(&mut self, abstract_id: impl Into<Identifier>, concrete: impl Into<Concrete>) -> &mut Self {
        self.bind(abstract_id, concrete, Scope::Transient)
    }

    pub fn singleton(&mut self, abstract_id: impl Into<Identifier>, concrete: impl Into<Concrete>) -> &mut Self {
        self.bind(abstract_id, concrete, Scope::Singleton)
    }

    /// Binds a class to itself.
    pub fn bind_self(&mut self, abstract_id: impl Into<Identifier>, scope: Scope) -> &mut Self {
        let id = self.resolve_alias(&abstract_id.into());
        self.bind(id.clone(), id, scope)
    }

    /// Registers a pre-built value. It is served from the caches from now on.
    pub fn instance(&mut self, abstract_id: impl Into<Identifier>, value: Instance) -> &mut Self {
        let id = self.resolve_alias(&abstract_id.into());
        self.bind(id.clone(), Concrete::Value(value.clone()), Scope::Instance);

        debug!(key = %id, ty = value.type_name(), "Registered instance");
        self.instances.insert(id.clone(), value.clone());
        if !self.fast_cache.insert(id, value) {
            trace!("Fast lookup full, instance served from instance cache");
        }
        self.dirty = true;
        self
    }

    /// Makes `alias` resolve as `abstract_id`.
    pub fn alias(&mut self, abstract_id: impl Into<Identifier>, alias: impl Into<Identifier>) -> &mut Self {
        let target = abstract_id.into();
        let alias = alias.into();

        if alias == target {
            warn!(alias = %alias, "Ignoring alias to itself");
            return self;
        }

        debug!(from = %alias, to = %target, "Registered alias");
        self.aliases.insert(alias, target);
        self
    }

    /// Adds `abstracts` to `tag`. Repeated calls accumulate.
    pub fn tag<I, A>(&mut self, abstracts: I, tag: impl Into<Identifier>) -> &mut Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Identifier>,
    {
        let tag = tag.into();
        let members = self.tags.entry(tag.clone()).or_default();
        let before = members.len();
        members.extend(abstracts.into_iter().map(Into::into));

        debug!(tag = %tag, added = members.len() - before, "Tagged abstracts");
        self
    }

    /// Starts a contextual binding: `when(requester).needs(abstract).give(implementation)`.
    pub fn when(&mut self, requester: impl Into<Identifier>) -> ContextualBindingBuilder<'_> {
        let requester = requester.into();
        let requester = self.resolve_alias(&requester);
        ContextualBindingBuilder {
            container: self,
            requester,
        }
    }

    /// Registers every binding of a [`ServiceProvider`].
    pub fn register_provider(&mut self, provider: &dyn ServiceProvider) -> &mut Self {
        debug!(provider = provider.name(), "Registering provider");
        provider.register(self);
        self
    }

    // ── Lifecycle ──

    /// Removes every binding, alias, tag, contextual binding, cached
    /// instance and compiled factory. Class metadata is kept.
    pub fn flush(&mut self) {
        debug!(bindings = self.bindings.len(), "Flushing container");
        self.bindings.clear();
        self.contextual.clear();
        self.aliases.clear();
        self.tags.clear();
        self.instances.clear();
        self.fast_cache.clear();
        self.factories.clear();
        self.compilation_enabled = false;
        self.context.clear();
    }

    /// Drops the cached instance of `abstract_id` from both caches.
    pub fn forget_instance(&mut self, abstract_id: impl Into<Identifier>) {
        let id = self.resolve_alias(&abstract_id.into());
        self.instances.remove(&id);
        self.fast_cache.remove(&id);
        if let Some(binding) = self.bindings.get(&id) {
            binding.reset_resolved();
        }
        trace!(key = %id, "Forgot instance");
    }

    pub fn forget_instances(&mut self) {
        self.instances.clear();
        self.fast_cache.clear();
        for binding in self.bindings.iter() {
            binding.reset_resolved();
        }
    }

    /// Compiles a factory for every class-backed binding and enables
    /// compiled resolution. Returns how many factories were compiled.
    #[instrument(skip(self), name = "container_compile")]
    pub fn compile(&mut self) -> usize {
        let compiled = compiler::compile_all(self);
        info!(compiled, bindings = self.bindings.len(), "Compiled factories");
        compiled
    }

    pub fn is_compiled(&self) -> bool {
        self.compilation_enabled
    }

    /// Drops every compiled factory and returns to plain autowiring.
    pub fn clear_compiled(&mut self) {
        self.factories.clear();
        self.compilation_enabled = false;
    }

    // ── Queries ──

    /// `true` if `abstract_id` is bound or names an instantiable class,
    /// i.e. [`Container::make`] has something to build.
    pub fn has(&self, abstract_id: impl Into<Identifier>) -> bool {
        let id = self.resolve_alias(&abstract_id.into());
        self.bindings.contains(&id)
            || self
                .classes
                .describe(&id)
                .is_some_and(|descriptor| descriptor.is_instantiable())
    }

    /// `true` if `abstract_id`, after following aliases, has a binding.
    pub fn bound(&self, abstract_id: impl Into<Identifier>) -> bool {
        let id = self.resolve_alias(&abstract_id.into());
        self.bindings.contains(&id)
    }

    /// `true` if a singleton or instance is cached for `abstract_id`.
    pub fn resolved(&self, abstract_id: impl Into<Identifier>) -> bool {
        let id = self.resolve_alias(&abstract_id.into());
        self.instances.contains_key(&id)
            || self
                .bindings
                .get(&id)
                .is_some_and(|binding| binding.is_resolved())
    }

    pub fn is_alias(&self, name: impl Into<Identifier>) -> bool {
        self.aliases.contains_key(&name.into())
    }

    /// Every binding, sorted by abstract.
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let mut infos: Vec<BindingInfo> = self
            .bindings
            .iter()
            .map(|binding| BindingInfo {
                abstract_name: binding.abstract_id.to_string(),
                concrete_kind: binding.concrete.kind(),
                concrete: binding.concrete.label(),
                scope: binding.scope,
                resolved: binding.is_resolved(),
            })
            .collect();
        infos.sort_by(|a, b| a.abstract_name.cmp(&b.abstract_name));
        infos
    }

    // ── Snapshots ──

    /// Loads cached singletons from the attached store. Only entries whose
    /// abstract is currently bound as a singleton and not yet cached are
    /// taken. Returns how many were loaded.
    #[instrument(skip(self), name = "snapshot_load")]
    pub fn load_snapshot(&mut self) -> std::result::Result<usize, SnapshotError> {
        self.snapshot_attempted = true;
        let Some(link) = self.snapshot.clone() else {
            return Ok(0);
        };

        let fingerprint = self.bindings.fingerprint();
        let Some(bytes) = link.store.load(fingerprint)? else {
            debug!(location = %link.store.locate(fingerprint), "No snapshot for this binding set");
            return Ok(0);
        };
        let snapshot = Snapshot::decode(&bytes)?;

        let mut loaded = 0;
        for (key, value) in snapshot.entries {
            let id = Identifier::new(key);
            let Some(binding) = self.bindings.get(&id).cloned() else {
                continue;
            };
            if !binding.scope.is_singleton() || self.instances.contains_key(&id) {
                continue;
            }
            let Some(instance) = link.codec.decode(&id, &value) else {
                continue;
            };

            self.instances.insert(id.clone(), instance.clone());
            self.fast_cache.insert(id, instance);
            binding.mark_resolved();
            loaded += 1;
        }

        info!(loaded, location = %link.store.locate(fingerprint), "Loaded singleton snapshot");
        Ok(loaded)
    }

    /// Writes every cached singleton the codec accepts. Returns how many
    /// entries were written.
    #[instrument(skip(self), name = "snapshot_save")]
    pub fn save_snapshot(&mut self) -> std::result::Result<usize, SnapshotError> {
        let Some(link) = self.snapshot.clone() else {
            return Ok(0);
        };

        let mut keys: Vec<&Identifier> = self
            .instances
            .keys()
            .filter(|key| {
                self.bindings
                    .get(key)
                    .is_some_and(|binding| binding.scope.is_singleton())
            })
            .collect();
        keys.sort();

        let entries: Vec<(String, Vec<u8>)> = keys
            .into_iter()
            .filter_map(|key| {
                let bytes = link.codec.encode(key, &self.instances[key])?;
                Some((key.to_string(), bytes))
            })
            .collect();
        let snapshot = Snapshot { entries };

        let fingerprint = self.bindings.fingerprint();
        link.store.save(fingerprint, &snapshot.encode())?;
        self.dirty = false;

        info!(saved = snapshot.entries.len(), location = %link.store.locate(fingerprint), "Saved singleton snapshot");
        Ok(snapshot.entries.len())
    }

    /// Deletes the stored snapshot for the current binding set.
    pub fn clear_snapshot(&mut self) -> std::result::Result<(), SnapshotError> {
        match &self.snapshot {
            Some(link) => link.store.remove(self.bindings.fingerprint()),
            None => Ok(()),
        }
    }

    pub fn snapshot_location(&self) -> Option<String> {
        self.snapshot
            .as_ref()
            .map(|link| link.store.locate(self.bindings.fingerprint()))
    }

    /// `true` once a singleton was cached after the last save.
    pub fn is_snapshot_dirty(&self) -> bool {
        self.dirty
    }

    fn ensure_snapshot_loaded(&mut self) {
        if self.snapshot_attempted
            || self.snapshot.is_none()
            || !self.settings.auto_load_snapshot
            || self.bindings.is_empty()
        {
            return;
        }

        if let Err(err) = self.load_snapshot() {
            warn!(error = %err, "Failed to load singleton snapshot");
        }
    }

    // ═══════════════════════════════════════════
    // Resolution engine
    // ═══════════════════════════════════════════

    /// Follows the alias chain. Past `max_alias_depth` hops the requested
    /// name is used unchanged.
    pub(crate) fn resolve_alias(&self, id: &Identifier) -> Identifier {
        let mut current = id;
        for _ in 0..self.settings.max_alias_depth {
            match self.aliases.get(current) {
                Some(next) => {
                    trace!(from = %current, to = %next, "Following alias");
                    current = next;
                }
                None => return current.clone(),
            }
        }

        if self.aliases.contains_key(current) {
            warn!(
                alias = %id,
                max_depth = self.settings.max_alias_depth,
                "Alias chain too deep, using requested name"
            );
            return id.clone();
        }
        current.clone()
    }

    pub(crate) fn resolve_abstract(
        &mut self,
        abstract_id: &Identifier,
        params: &Parameters,
        requester: Option<&Identifier>,
    ) -> Result<Instance> {
        let id = self.resolve_alias(abstract_id);

        if let Some(hit) = self.fast_cache.find(&id) {
            trace!(key = %id, "Fast lookup hit");
            return Ok(hit.clone());
        }
        if let Some(hit) = self.instances.get(&id) {
            trace!(key = %id, "Instance cache hit");
            return Ok(hit.clone());
        }

        if self.compilation_enabled && requester.is_none() && params.is_empty() {
            if let Some(factory) = self.factories.get(&id).cloned() {
                trace!(key = %id, "Compiled factory hit");
                return factory.invoke(self);
            }
        }

        if !self.context.push(&id) {
            return Err(self.circular(&id));
        }
        let result = self.resolve_uncached(&id, params, requester);
        self.context.pop();
        result
    }

    fn resolve_uncached(
        &mut self,
        id: &Identifier,
        params: &Parameters,
        requester: Option<&Identifier>,
    ) -> Result<Instance> {
        if let Some(requester) = requester {
            if !self.contextual.is_empty() {
                if let Some(contextual) = self.contextual.get(requester, id).cloned() {
                    trace!(requester = %requester, key = %id, "Contextual binding hit");
                    return self.resolve_concrete(&contextual.implementation, params);
                }
            }
        }

        if let Some(binding) = self.bindings.get(id).cloned() {
            if binding.scope == Scope::Instance {
                if let Some(value) = &binding.cached_instance {
                    return Ok(value.clone());
                }
            }

            let instance = self.resolve_concrete(&binding.concrete, params)?;
            if binding.scope.is_singleton() {
                self.store_singleton(id, &instance);
            }
            return Ok(instance);
        }

        self.autowire(id, params)
    }

    fn resolve_concrete(&mut self, concrete: &Concrete, params: &Parameters) -> Result<Instance> {
        match concrete {
            Concrete::Closure(closure) => closure(self, params),
            Concrete::Class(class) => self.autowire(class, params),
            Concrete::Value(value) => Ok(value.clone()),
        }
    }

    /// Cached instance from either cache.
    pub(crate) fn cached(&self, id: &Identifier) -> Option<Instance> {
        self.fast_cache
            .find(id)
            .or_else(|| self.instances.get(id))
            .cloned()
    }

    /// Caches a singleton in both caches and marks its binding resolved.
    pub(crate) fn store_singleton(&mut self, id: &Identifier, instance: &Instance) {
        self.instances.insert(id.clone(), instance.clone());
        if !self.fast_cache.insert(id.clone(), instance.clone()) {
            trace!(key = %id, "Fast lookup full, singleton served from instance cache");
        }
        if let Some(binding) = self.bindings.get(id) {
            binding.mark_resolved();
        }
        self.dirty = true;
    }

    pub(crate) fn describe(&self, class: &Identifier) -> Result<Arc<ClassDescriptor>> {
        self.classes
            .describe(class)
            .ok_or_else(|| self.not_found(NotFoundReason::UnknownClass { class: class.clone() }))
    }

    pub(crate) fn not_found(&self, reason: NotFoundReason) -> RabitaError {
        let suggestions = match &reason {
            NotFoundReason::UnknownClass { class } => self.suggestions_for(class),
            _ => Vec::new(),
        };
        RabitaError::NotFound(NotFoundError::new(reason).with_suggestions(suggestions))
    }

    pub(crate) fn circular(&self, rejected: &Identifier) -> RabitaError {
        let chain = self.context.chain_with(rejected);
        warn!(chain = %render_chain(&chain), "Circular dependency detected");
        RabitaError::CircularDependency(CircularDependencyError { chain })
    }

    fn suggestions_for(&self, requested: &Identifier) -> Vec<String> {
        let mut names = self.classes.known_classes();
        names.extend(self.bindings.keys().cloned());
        names.extend(self.aliases.keys().cloned());
        suggest_similar(requested.as_str(), names.iter().map(Identifier::as_str), 3)
    }

    fn drop_stale(&mut self, id: &Identifier) {
        self.instances.remove(id);
        self.fast_cache.remove(id);
        self.factories.remove(id);
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.len())
            .field("aliases", &self.aliases.len())
            .field("instances", &self.instances.len())
            .field("factories", &self.factories.len())
            .field("compiled", &self.compilation_enabled)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Contextual binding builder
// ═══════════════════════════════════════════

/// First step of `when(..).needs(..).give(..)`.
pub struct ContextualBindingBuilder<'c> {
    container: &'c mut Container,
    requester: Identifier,
}

impl<'c> ContextualBindingBuilder<'c> {
    pub fn needs(self, abstract_id: impl Into<Identifier>) -> ContextualNeeds<'c> {
        let dependency = self.container.resolve_alias(&abstract_id.into());
        ContextualNeeds {
            container: self.container,
            requester: self.requester,
            dependency,
        }
    }
}

/// Second step: only `give` remains.
pub struct ContextualNeeds<'c> {
    container: &'c mut Container,
    requester: Identifier,
    dependency: Identifier,
}

impl<'c> ContextualNeeds<'c> {
    pub fn give(self, implementation: impl Into<Concrete>) -> &'c mut Container {
        self.container.contextual.add(ContextualBinding {
            requester: self.requester,
            dependency: self.dependency,
            implementation: implementation.into(),
        });
        self.container
    }
}

// Providers register straight into the container.
impl Registrar for Container {
    fn register_binding(&mut self, abstract_id: Identifier, concrete: Concrete, scope: Scope) {
        self.bind(abstract_id, concrete, scope);
    }

    fn register_instance(&mut self, abstract_id: Identifier, value: Instance) {
        self.instance(abstract_id, value);
    }

    fn register_alias(&mut self, abstract_id: Identifier, alias: Identifier) {
        self.alias(abstract_id, alias);
    }

    fn register_tag(&mut self, abstracts: Vec<Identifier>, tag: Identifier) {
        self.tag(abstracts, tag);
    }

    fn register_contextual(&mut self, requester: Identifier, dependency: Identifier, implementation: Concrete) {
        self.when(requester).needs(dependency).give(implementation);
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{BindingInfo, Container, ContainerBuilder};
    pub use crate::binding::Concrete;
    pub use crate::class::{
        ClassCatalog, ClassDescriptor, ClassProvider, ClassRegistration, ObjectMaterializer,
        ParamDescriptor,
    };
    pub use crate::error::{BoxError, RabitaError, Result};
    pub use crate::instance::{Arguments, Instance, Parameters};
    pub use crate::key::Identifier;
    pub use crate::provider::{Registrar, ServiceProvider};
    pub use crate::scope::Scope;
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
