//! Error types for Rabita container operations.
//!
//! Every failure names the class, parameter or chain involved and ends
//! with a hint line.

use std::fmt;

use rabita_support::rendering::render_chain;

use crate::key::Identifier;

/// Boxed error produced by constructors and the object materializer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Rabita operations.
#[derive(Debug, thiserror::Error)]
pub enum RabitaError {
    /// Unknown class, non-instantiable class or unresolvable parameter.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// An abstract was requested while already being resolved.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// The object materializer failed to construct the class.
    #[error("Failed to instantiate {class}: {source}")]
    InstantiationFailed {
        class: Identifier,
        #[source]
        source: BoxError,
    },

    /// `get::<T>()` resolved an instance of a different type.
    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch {
        key: Identifier,
        expected: &'static str,
    },
}

impl RabitaError {
    /// Returns `true` for [`RabitaError::NotFound`].
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RabitaError::NotFound(_))
    }

    #[inline]
    pub fn is_circular(&self) -> bool {
        matches!(self, RabitaError::CircularDependency(_))
    }
}

/// What could not be found.
#[derive(Debug)]
pub enum NotFoundReason {
    /// No class descriptor exists for the name.
    UnknownClass { class: Identifier },

    /// The class is an interface, abstract class or trait.
    NotInstantiable { class: Identifier },

    /// A type-hinted parameter could not be resolved and has no fallback.
    UnresolvableDependency {
        class: Identifier,
        parameter: String,
        dependency: Identifier,
        cause: Box<NotFoundError>,
    },

    /// A parameter with no type hint, no default and no supplied value.
    UnresolvableParameter { class: Identifier, parameter: String },
}

/// Error when a class or one of its parameters cannot be resolved.
#[derive(Debug)]
pub struct NotFoundError {
    pub reason: NotFoundReason,
    /// Registered names close to the requested one ("did you mean?").
    pub suggestions: Vec<String>,
}

impl NotFoundError {
    pub fn new(reason: NotFoundReason) -> Self {
        Self {
            reason,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// The class the failure is reported against.
    pub fn class(&self) -> &Identifier {
        match &self.reason {
            NotFoundReason::UnknownClass { class }
            | NotFoundReason::NotInstantiable { class }
            | NotFoundReason::UnresolvableDependency { class, .. }
            | NotFoundReason::UnresolvableParameter { class, .. } => class,
        }
    }

    /// The offending parameter name, when the failure is about a parameter.
    pub fn parameter(&self) -> Option<&str> {
        match &self.reason {
            NotFoundReason::UnresolvableDependency { parameter, .. }
            | NotFoundReason::UnresolvableParameter { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            NotFoundReason::UnknownClass { class } => {
                write!(f, "Target class [{class}] does not exist")?;
            }
            NotFoundReason::NotInstantiable { class } => {
                write!(f, "Target [{class}] is not instantiable")?;
            }
            NotFoundReason::UnresolvableDependency {
                class,
                parameter,
                dependency,
                cause,
            } => {
                write!(
                    f,
                    "Unresolvable dependency resolving [{dependency} ${parameter}] in class {class}"
                )?;
                write!(f, "\n  Caused by: {cause}")?;
            }
            NotFoundReason::UnresolvableParameter { class, parameter } => {
                write!(
                    f,
                    "Unresolvable dependency resolving parameter ${parameter} in class {class}"
                )?;
            }
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        match &self.reason {
            NotFoundReason::UnknownClass { class } => write!(
                f,
                "\n  Hint: register a class descriptor for {} or bind it explicitly",
                class.short_name()
            ),
            NotFoundReason::NotInstantiable { class } => write!(
                f,
                "\n  Hint: bind {} to a concrete implementation",
                class.short_name()
            ),
            NotFoundReason::UnresolvableDependency { .. } => Ok(()),
            NotFoundReason::UnresolvableParameter { .. } => write!(
                f,
                "\n  Hint: supply the value with make_with() or declare a default"
            ),
        }
    }
}

/// Error when a circular dependency is detected.
///
/// `chain` is in push order and ends with the abstract that was rejected.
#[derive(Debug)]
pub struct CircularDependencyError {
    pub chain: Vec<Identifier>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  ")?;
        write!(f, "{}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: break the cycle with a closure binding or a contextual override"
        )
    }
}

/// Convenient Result type for Rabita operations.
pub type Result<T> = std::result::Result<T, RabitaError>;
