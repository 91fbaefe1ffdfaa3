//! Core resolution engine for Rabita DI.

pub mod autowire;
pub mod binding;
pub mod class;
pub mod compiler;
pub mod container;
pub mod context;
pub mod error;
pub mod factory;
pub mod fast_lookup;
pub mod instance;
pub mod key;
pub mod metadata;
pub mod provider;
pub mod scope;
pub mod scratch;
pub mod settings;
pub mod snapshot;

pub use container::{Container, ContainerBuilder, prelude};
pub use error::{RabitaError, Result};
pub use instance::{Instance, Parameters};
pub use key::Identifier;
pub use scope::Scope;
