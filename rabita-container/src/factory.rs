//! Compiled factories.
//!
//! A [`Factory`] is a precomputed resolution plan for one abstract: the
//! class to build, its type-hinted dependency prefix and an invocation
//! [`Strategy`] picked by arity. Every strategy stages the same arguments
//! the generic loop would; the fan-out only removes loop overhead for the
//! common small arities.

use std::fmt;
use std::sync::Arc;

use crate::autowire::{Fallback, dependency_fallback};
use crate::class::ClassDescriptor;
use crate::container::Container;
use crate::error::{RabitaError, Result};
use crate::instance::{Arguments, Instance, Parameters};
use crate::key::Identifier;
use crate::metadata::ParamInfo;
use crate::scratch::ArgBuffer;

/// Invocation strategy, chosen by the number of resolved dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Nullary,
    Unary,
    Binary,
    /// 3 to 8 dependencies.
    Loop,
}

impl Strategy {
    pub fn for_arity(arity: usize) -> Self {
        match arity {
            0 => Strategy::Nullary,
            1 => Strategy::Unary,
            2 => Strategy::Binary,
            _ => Strategy::Loop,
        }
    }
}

pub struct Factory {
    key: Identifier,
    class_name: Identifier,
    descriptor: Arc<ClassDescriptor>,
    dependencies: Vec<ParamInfo>,
    strategy: Strategy,
    is_singleton: bool,
    has_constructor: bool,
}

impl Factory {
    /// `dependencies` must all carry a type hint.
    pub(crate) fn new(
        key: Identifier,
        descriptor: Arc<ClassDescriptor>,
        dependencies: Vec<ParamInfo>,
        is_singleton: bool,
    ) -> Self {
        Self {
            key,
            class_name: descriptor.name.clone(),
            has_constructor: descriptor.has_constructor,
            strategy: Strategy::for_arity(dependencies.len()),
            descriptor,
            dependencies,
            is_singleton,
        }
    }

    /// The abstract (or class, for autowired classes) this factory serves.
    pub fn key(&self) -> &Identifier {
        &self.key
    }

    pub fn class_name(&self) -> &Identifier {
        &self.class_name
    }

    pub fn dependency_names(&self) -> impl Iterator<Item = &Identifier> {
        self.dependencies
            .iter()
            .filter_map(|param| param.type_hint.as_ref())
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.dependencies.len()
    }

    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.is_singleton
    }

    #[inline]
    pub fn has_constructor(&self) -> bool {
        self.has_constructor
    }

    /// Builds an instance. The key is pushed on the resolution context for
    /// the duration, and singletons are cached under the key.
    pub fn invoke(&self, container: &mut Container) -> Result<Instance> {
        if !container.context.push(&self.key) {
            return Err(container.circular(&self.key));
        }
        let result = self.build(container);
        container.context.pop();

        let instance = result?;
        if self.is_singleton {
            container.store_singleton(&self.key, &instance);
        }
        Ok(instance)
    }

    fn build(&self, container: &mut Container) -> Result<Instance> {
        let mut args = ArgBuffer::acquire(self.dependencies.len());

        match self.strategy {
            Strategy::Nullary => {}
            Strategy::Unary => {
                self.stage(container, 0, &mut args)?;
            }
            Strategy::Binary => {
                if self.stage(container, 0, &mut args)? {
                    self.stage(container, 1, &mut args)?;
                }
            }
            Strategy::Loop => {
                for index in 0..self.dependencies.len() {
                    if !self.stage(container, index, &mut args)? {
                        break;
                    }
                }
            }
        }

        container
            .materializer
            .materialize(&self.descriptor, Arguments::new(self.class_name.as_str(), &args))
            .map_err(|source| RabitaError::InstantiationFailed {
                class: self.class_name.clone(),
                source,
            })
    }

    /// Resolves dependency `index` into `args`. Returns `false` once the
    /// argument list must stop.
    fn stage(&self, container: &mut Container, index: usize, args: &mut ArgBuffer) -> Result<bool> {
        let param = &self.dependencies[index];
        let Some(hint) = &param.type_hint else {
            return Ok(false);
        };

        match self.resolve_dependency(container, hint) {
            Ok(instance) => {
                args.push(Some(instance));
                Ok(true)
            }
            Err(err) => match dependency_fallback(&self.class_name, param, hint, err)? {
                Fallback::Null => {
                    args.push(None);
                    Ok(true)
                }
                Fallback::Stop => Ok(false),
            },
        }
    }

    fn resolve_dependency(&self, container: &mut Container, dependency: &Identifier) -> Result<Instance> {
        let id = container.resolve_alias(dependency);

        if container.contextual.get(&self.class_name, &id).is_none() {
            if let Some(hit) = container.cached(&id) {
                return Ok(hit);
            }
            if let Some(factory) = container.factories.get(&id).cloned() {
                return factory.invoke(container);
            }
        }

        container.resolve_abstract(&id, &Parameters::new(), Some(&self.class_name))
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("key", &self.key)
            .field("class", &self.class_name)
            .field("dependencies", &self.dependency_names().collect::<Vec<_>>())
            .field("strategy", &self.strategy)
            .field("singleton", &self.is_singleton)
            .finish()
    }
}
