//! Reflection metadata cache.
//!
//! [`ClassMetadata`] is the parsed view of a class descriptor that
//! autowiring and the factory compiler work from. It is built once per
//! class and shared (`Arc`) with any resolution currently reading it.

use std::sync::Arc;

use ahash::AHashMap;
use tracing::trace;

use crate::class::{ClassDescriptor, ParamDescriptor, ParamType};
use crate::key::Identifier;

/// One constructor parameter as autowiring sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    /// Set only for class-typed parameters; builtins are not hints.
    pub type_hint: Option<Identifier>,
    pub nullable: bool,
    pub has_default: bool,
    pub variadic: bool,
}

impl From<&ParamDescriptor> for ParamInfo {
    fn from(param: &ParamDescriptor) -> Self {
        let type_hint = match &param.ty {
            ParamType::Class(class) => Some(class.clone()),
            ParamType::Builtin(_) | ParamType::Untyped => None,
        };

        Self {
            name: param.name.clone(),
            type_hint,
            nullable: param.nullable,
            has_default: param.has_default,
            variadic: param.variadic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub class_name: Identifier,
    pub params: Vec<ParamInfo>,
    pub instantiable: bool,
}

/// Class name → metadata, owned by one container.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: AHashMap<Identifier, Arc<ClassMetadata>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: &Identifier) -> Option<Arc<ClassMetadata>> {
        self.entries.get(class).cloned()
    }

    /// Parses a descriptor. Non-instantiable classes get zero parameters.
    pub fn build(descriptor: &ClassDescriptor) -> ClassMetadata {
        let instantiable = descriptor.is_instantiable();
        let params = if instantiable {
            descriptor.params.iter().map(ParamInfo::from).collect()
        } else {
            Vec::new()
        };

        ClassMetadata {
            class_name: descriptor.name.clone(),
            params,
            instantiable,
        }
    }

    pub fn put(&mut self, metadata: ClassMetadata) -> Arc<ClassMetadata> {
        let metadata = Arc::new(metadata);
        self.entries
            .insert(metadata.class_name.clone(), metadata.clone());
        metadata
    }

    pub fn fetch_or_build(&mut self, descriptor: &ClassDescriptor) -> Arc<ClassMetadata> {
        if let Some(hit) = self.entries.get(&descriptor.name) {
            return hit.clone();
        }

        trace!(class = %descriptor.name, "Building class metadata");
        self.put(Self::build(descriptor))
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
