//! Service providers: groups of related registrations.
//!
//! A provider registers through the [`Registrar`] trait rather than the
//! container itself, so providers can be tested against a recording
//! registrar.
//!
//! # Examples
//! ```rust,ignore
//! struct MailProvider;
//!
//! impl ServiceProvider for MailProvider {
//!     fn register(&self, registrar: &mut dyn Registrar) {
//!         registrar.register_binding("App\\Transport".into(), Concrete::from("App\\SmtpTransport"), Scope::Singleton);
//!         registrar.register_alias("App\\Transport".into(), "mail.transport".into());
//!     }
//! }
//!
//! container.register_provider(&MailProvider);
//! ```

use crate::binding::Concrete;
use crate::instance::Instance;
use crate::key::Identifier;
use crate::scope::Scope;

/// A module of related bindings.
pub trait ServiceProvider: Send + Sync {
    fn register(&self, registrar: &mut dyn Registrar);

    /// Name used in log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The registration surface handed to providers.
pub trait Registrar {
    fn register_binding(&mut self, abstract_id: Identifier, concrete: Concrete, scope: Scope);

    fn register_instance(&mut self, abstract_id: Identifier, value: Instance);

    /// Makes `alias` resolve as `abstract_id`.
    fn register_alias(&mut self, abstract_id: Identifier, alias: Identifier);

    fn register_tag(&mut self, abstracts: Vec<Identifier>, tag: Identifier);

    /// When `requester` needs `dependency`, build `implementation` instead.
    fn register_contextual(&mut self, requester: Identifier, dependency: Identifier, implementation: Concrete);
}
