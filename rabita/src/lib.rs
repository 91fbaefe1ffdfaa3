//! # Rabita — autowiring dependency injection for Rust
//!
//! Classes are declared once as [`ClassDescriptor`]s; the [`Container`]
//! resolves them by name, building constructor arguments from type hints,
//! explicit bindings, contextual overrides and aliases.
//!
//! ```rust
//! use rabita::prelude::*;
//! use std::sync::Arc;
//!
//! struct Clock;
//! struct Scheduler {
//!     clock: Arc<Clock>,
//! }
//!
//! let catalog = ClassCatalog::new()
//!     .with(ClassDescriptor::class("App\\Clock").instantiate_with(|| Instance::new(Clock)))
//!     .with(
//!         ClassDescriptor::class("App\\Scheduler")
//!             .param(ParamDescriptor::class("clock", "App\\Clock"))
//!             .constructor(|args| Ok(Instance::new(Scheduler { clock: args.get(0)? }))),
//!     );
//!
//! let mut container = Container::with_classes(Arc::new(catalog));
//! container.singleton("App\\Clock", "App\\Clock");
//! container.alias("App\\Scheduler", "scheduler");
//!
//! let scheduler: Arc<Scheduler> = container.get("scheduler").unwrap();
//! let clock: Arc<Clock> = container.get("App\\Clock").unwrap();
//! assert!(Arc::ptr_eq(&scheduler.clock, &clock));
//! ```

pub use rabita_container::*;
pub use rabita_support as support;
