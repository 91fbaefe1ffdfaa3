//! Autowiring: building a class from its cached constructor metadata.
//!
//! Arguments are staged in an [`ArgBuffer`] in declared order. For each
//! parameter the first rule that applies wins:
//!
//! 1. a caller-supplied value with the same name
//! 2. the type hint, resolved with this class as requester; if that fails
//!    with `NotFound`, a nullable parameter gets `None` and a defaulted one
//!    ends the argument list
//! 3. no hint but a default, or variadic: the argument list ends here
//! 4. otherwise the parameter is unresolvable

use std::sync::Arc;

use tracing::trace;

use crate::compiler::Compiler;
use crate::container::Container;
use crate::error::{NotFoundError, NotFoundReason, RabitaError, Result};
use crate::instance::{Arguments, Instance, Parameters};
use crate::key::Identifier;
use crate::metadata::{ClassMetadata, ParamInfo};
use crate::scratch::ArgBuffer;

/// What to do after a type-hinted dependency could not be found.
pub(crate) enum Fallback {
    /// Pass `None` and continue.
    Null,
    /// Stop building arguments; the constructor's defaults take over.
    Stop,
}

/// Shared by autowiring and compiled factories. Only `NotFound` falls
/// back; every other error is returned unchanged.
pub(crate) fn dependency_fallback(
    class: &Identifier,
    param: &ParamInfo,
    dependency: &Identifier,
    err: RabitaError,
) -> Result<Fallback> {
    let cause = match err {
        RabitaError::NotFound(cause) => cause,
        other => return Err(other),
    };

    if param.nullable {
        trace!(class = %class, param = %param.name, "Dependency not found, passing null");
        return Ok(Fallback::Null);
    }
    if param.has_default {
        trace!(class = %class, param = %param.name, "Dependency not found, using defaults");
        return Ok(Fallback::Stop);
    }

    Err(RabitaError::NotFound(NotFoundError::new(
        NotFoundReason::UnresolvableDependency {
            class: class.clone(),
            parameter: param.name.clone(),
            dependency: dependency.clone(),
            cause: Box::new(cause),
        },
    )))
}

impl Container {
    pub(crate) fn autowire(&mut self, class: &Identifier, params: &Parameters) -> Result<Instance> {
        let descriptor = self.describe(class)?;
        let metadata = self.metadata.fetch_or_build(&descriptor);

        if !metadata.instantiable {
            return Err(self.not_found(NotFoundReason::NotInstantiable { class: class.clone() }));
        }

        let mut args = ArgBuffer::acquire(metadata.params.len());
        self.build_arguments(class, &metadata, params, &mut args)?;

        let instance = self
            .materializer
            .materialize(&descriptor, Arguments::new(class.as_str(), &args))
            .map_err(|source| RabitaError::InstantiationFailed {
                class: class.clone(),
                source,
            })?;
        drop(args);

        if self.compilation_enabled
            && !self.factories.contains_key(class)
            && !self.bindings.contains(class)
        {
            if let Some(factory) = Compiler::compile(class.clone(), &metadata, descriptor, false) {
                trace!(class = %class, arity = factory.arity(), "Compiled factory while autowiring");
                self.factories.insert(class.clone(), Arc::new(factory));
            }
        }

        Ok(instance)
    }

    fn build_arguments(
        &mut self,
        class: &Identifier,
        metadata: &ClassMetadata,
        params: &Parameters,
        args: &mut ArgBuffer,
    ) -> Result<()> {
        let no_params = Parameters::new();

        for param in &metadata.params {
            if let Some(value) = params.get(&param.name) {
                args.push(Some(value.clone()));
                continue;
            }

            if let Some(hint) = &param.type_hint {
                match self.resolve_abstract(hint, &no_params, Some(class)) {
                    Ok(value) => args.push(Some(value)),
                    Err(err) => match dependency_fallback(class, param, hint, err)? {
                        Fallback::Null => args.push(None),
                        Fallback::Stop => break,
                    },
                }
                continue;
            }

            if param.has_default || param.variadic {
                break;
            }

            return Err(self.not_found(NotFoundReason::UnresolvableParameter {
                class: class.clone(),
                parameter: param.name.clone(),
            }));
        }

        Ok(())
    }
}
