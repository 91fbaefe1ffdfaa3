//! Factory compiler.
//!
//! Turns class metadata into a [`Factory`] when every required parameter
//! can be resolved by type, and compiles every class-backed binding of a
//! container in one pass.

use std::sync::Arc;

use tracing::trace;

use crate::binding::Concrete;
use crate::class::ClassDescriptor;
use crate::container::Container;
use crate::factory::Factory;
use crate::key::Identifier;
use crate::metadata::ClassMetadata;
use crate::scope::Scope;

/// Largest parameter count a factory is compiled for.
pub const MAX_ARITY: usize = 8;

pub struct Compiler;

impl Compiler {
    /// Instantiable, at most [`MAX_ARITY`] parameters, and every parameter
    /// without a default carries a type hint.
    pub fn can_compile(metadata: &ClassMetadata) -> bool {
        metadata.instantiable
            && metadata.params.len() <= MAX_ARITY
            && metadata
                .params
                .iter()
                .all(|param| param.has_default || param.type_hint.is_some())
    }

    /// Compiles a factory serving `key`. The dependency list is the
    /// type-hinted prefix of the parameters, ending at the first
    /// defaulted parameter without a hint.
    pub fn compile(
        key: Identifier,
        metadata: &ClassMetadata,
        descriptor: Arc<ClassDescriptor>,
        is_singleton: bool,
    ) -> Option<Factory> {
        if !Self::can_compile(metadata) {
            return None;
        }

        let mut dependencies = Vec::with_capacity(metadata.params.len());
        for param in &metadata.params {
            if param.type_hint.is_some() {
                dependencies.push(param.clone());
            } else if param.has_default {
                break;
            } else {
                return None;
            }
        }

        Some(Factory::new(key, descriptor, dependencies, is_singleton))
    }
}

/// Compiles every binding whose concrete is a class, skipping closure and
/// value concretes and instance-scoped bindings, then enables compiled
/// resolution. Returns the number of factories compiled.
pub(crate) fn compile_all(container: &mut Container) -> usize {
    let candidates: Vec<(Identifier, Identifier, bool)> = container
        .bindings
        .iter()
        .filter(|binding| binding.scope != Scope::Instance)
        .filter_map(|binding| match &binding.concrete {
            Concrete::Class(class) => Some((
                binding.abstract_id.clone(),
                class.clone(),
                binding.scope.is_singleton(),
            )),
            Concrete::Closure(_) | Concrete::Value(_) => None,
        })
        .collect();

    let mut compiled = 0;
    for (key, class, is_singleton) in candidates {
        let Some(descriptor) = container.classes.describe(&class) else {
            trace!(key = %key, class = %class, "Skipping unknown class");
            continue;
        };
        let metadata = container.metadata.fetch_or_build(&descriptor);

        match Compiler::compile(key.clone(), &metadata, descriptor, is_singleton) {
            Some(factory) => {
                trace!(key = %key, class = %class, strategy = ?factory.strategy(), "Compiled factory");
                container.factories.insert(key, Arc::new(factory));
                compiled += 1;
            }
            None => trace!(key = %key, class = %class, "Binding is not compilable"),
        }
    }

    container.compilation_enabled = true;
    compiled
}
