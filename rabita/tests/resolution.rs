use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rabita::prelude::*;

struct Clock;

struct Database {
    dsn: String,
}

struct UserRepo {
    db: Arc<Database>,
}

struct UserService {
    repo: Arc<UserRepo>,
    clock: Arc<Clock>,
}

trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
}

struct EmailNotifier;
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }
}

struct SmsNotifier;
impl Notifier for SmsNotifier {
    fn channel(&self) -> &'static str {
        "sms"
    }
}

struct Alerts {
    notifier: Arc<dyn Notifier>,
}

struct Digest {
    notifier: Arc<dyn Notifier>,
}

fn notifier(args: &Arguments<'_>, index: usize) -> std::result::Result<Arc<dyn Notifier>, BoxError> {
    let instance = args.instance(index).ok_or("notifier missing")?;
    if let Some(email) = instance.downcast::<EmailNotifier>() {
        let email: Arc<dyn Notifier> = email;
        return Ok(email);
    }
    let sms: Arc<dyn Notifier> = args.get::<SmsNotifier>(index)?;
    Ok(sms)
}

fn catalog() -> Arc<ClassCatalog> {
    Arc::new(
        ClassCatalog::new()
            .with(ClassDescriptor::class("App\\Clock").instantiate_with(|| Instance::new(Clock)))
            .with(
                ClassDescriptor::class("App\\Database")
                    .instantiate_with(|| Instance::new(Database { dsn: "sqlite::memory:".into() })),
            )
            .with(
                ClassDescriptor::class("App\\UserRepo")
                    .param(ParamDescriptor::class("db", "App\\Database"))
                    .constructor(|args| Ok(Instance::new(UserRepo { db: args.get(0)? }))),
            )
            .with(
                ClassDescriptor::class("App\\UserService")
                    .param(ParamDescriptor::class("repo", "App\\UserRepo"))
                    .param(ParamDescriptor::class("clock", "App\\Clock"))
                    .constructor(|args| {
                        Ok(Instance::new(UserService {
                            repo: args.get(0)?,
                            clock: args.get(1)?,
                        }))
                    }),
            )
            .with(ClassDescriptor::interface("App\\Notifier"))
            .with(ClassDescriptor::class("App\\EmailNotifier").instantiate_with(|| Instance::new(EmailNotifier)))
            .with(ClassDescriptor::class("App\\SmsNotifier").instantiate_with(|| Instance::new(SmsNotifier)))
            .with(
                ClassDescriptor::class("App\\Alerts")
                    .param(ParamDescriptor::class("notifier", "App\\Notifier"))
                    .constructor(|args| Ok(Instance::new(Alerts { notifier: notifier(&args, 0)? }))),
            )
            .with(
                ClassDescriptor::class("App\\Digest")
                    .param(ParamDescriptor::class("notifier", "App\\Notifier"))
                    .constructor(|args| Ok(Instance::new(Digest { notifier: notifier(&args, 0)? }))),
            )
            .with(
                ClassDescriptor::class("A")
                    .param(ParamDescriptor::class("b", "B"))
                    .constructor(|_| Ok(Instance::new(()))),
            )
            .with(
                ClassDescriptor::class("B")
                    .param(ParamDescriptor::class("a", "A"))
                    .constructor(|_| Ok(Instance::new(()))),
            )
            .with(
                ClassDescriptor::class("Ouroboros")
                    .param(ParamDescriptor::class("tail", "Ouroboros"))
                    .constructor(|_| Ok(Instance::new(()))),
            ),
    )
}

fn container() -> Container {
    Container::with_classes(catalog())
}

#[test]
fn singleton_returns_same_instance() {
    let mut c = container();
    c.singleton("App\\Clock", "App\\Clock");

    let first = c.make("App\\Clock").unwrap();
    for _ in 0..3 {
        assert!(c.make("App\\Clock").unwrap().ptr_eq(&first));
    }
}

#[test]
fn unbound_class_without_constructor_is_autowired() {
    let mut c = container();
    let clock = c.make("App\\Clock").unwrap();
    assert!(clock.is::<Clock>());
    assert!(!c.resolved("App\\Clock"));
}

#[test]
fn transient_returns_distinct_instances() {
    let mut c = container();
    c.transient("App\\UserRepo", "App\\UserRepo");

    let a = c.make("App\\UserRepo").unwrap();
    let b = c.make("App\\UserRepo").unwrap();
    assert!(!a.ptr_eq(&b));
}

#[test]
fn direct_cycle_lists_chain_in_order() {
    let mut c = container();
    let err = c.make("A").unwrap_err();

    assert!(err.is_circular(), "got: {err}");
    assert!(err.to_string().contains("A → B → A"), "got: {err}");
}

#[test]
fn self_cycle_fails_on_first_attempt() {
    let mut c = container();
    let err = c.make("Ouroboros").unwrap_err();
    assert!(err.is_circular());
    assert!(err.to_string().contains("Ouroboros → Ouroboros"));

    // Context is fully unwound, so the next attempt fails the same way.
    assert!(c.make("Ouroboros").unwrap_err().is_circular());
}

#[test]
fn alias_round_trip() {
    let mut c = container();
    c.singleton("App\\Database", "App\\Database");
    c.alias("App\\Database", "db");

    let via_alias = c.make("db").unwrap();
    let direct = c.make("App\\Database").unwrap();
    assert!(via_alias.ptr_eq(&direct));
}

#[test]
fn contextual_override_only_for_requester() {
    let mut c = container();
    c.bind("App\\Notifier", "App\\EmailNotifier", Scope::Transient);
    c.when("App\\Alerts").needs("App\\Notifier").give("App\\SmsNotifier");

    let alerts: Arc<Alerts> = c.get("App\\Alerts").unwrap();
    assert_eq!(alerts.notifier.channel(), "sms");

    let digest: Arc<Digest> = c.get("App\\Digest").unwrap();
    assert_eq!(digest.notifier.channel(), "email");

    assert!(c.make("App\\Notifier").unwrap().is::<EmailNotifier>());
}

#[test]
fn contextual_override_without_default_binding() {
    let mut c = container();
    c.when("App\\Alerts").needs("App\\Notifier").give("App\\SmsNotifier");

    let alerts: Arc<Alerts> = c.get("App\\Alerts").unwrap();
    assert_eq!(alerts.notifier.channel(), "sms");

    // Interfaces are not instantiable without a binding.
    assert!(c.make("App\\Notifier").unwrap_err().is_not_found());
}

#[test]
fn forget_instance_clears_both_caches() {
    let mut c = container();
    c.singleton("App\\Database", "App\\Database");

    let first = c.make("App\\Database").unwrap();
    assert!(c.resolved("App\\Database"));

    c.forget_instance("App\\Database");
    assert!(!c.resolved("App\\Database"));

    let second = c.make("App\\Database").unwrap();
    assert!(!first.ptr_eq(&second));
}

#[test]
fn compiled_factory_matches_autowiring() {
    let mut c = container();
    c.singleton("App\\Database", "App\\Database");
    c.singleton("App\\Clock", "App\\Clock");
    c.transient("App\\UserService", "App\\UserService");

    let autowired: Arc<UserService> = c.get("App\\UserService").unwrap();
    assert_eq!(c.compile(), 3);
    let compiled: Arc<UserService> = c.get("App\\UserService").unwrap();

    assert!(!Arc::ptr_eq(&autowired, &compiled));
    assert!(Arc::ptr_eq(&autowired.repo.db, &compiled.repo.db));
    assert!(Arc::ptr_eq(&autowired.clock, &compiled.clock));
    assert_eq!(compiled.repo.db.dsn, "sqlite::memory:");
}

#[test]
fn make_with_bypasses_compiled_factory() {
    let mut c = container();
    c.transient("App\\UserRepo", "App\\UserRepo");
    c.compile();

    let db = Arc::new(Database { dsn: "postgres://replica".into() });
    let params = Parameters::new().with("db", Instance::from_arc(db.clone()));
    let repo = c.make_with("App\\UserRepo", &params).unwrap();

    assert!(Arc::ptr_eq(&repo.downcast::<UserRepo>().unwrap().db, &db));
}

#[test]
fn flush_restores_defaults() {
    let mut c = container();
    c.singleton("App\\Notifier", "App\\EmailNotifier");
    c.alias("App\\Notifier", "notifier");
    c.tag(["App\\Clock"], "infra");
    c.make("notifier").unwrap();

    c.flush();
    for name in ["App\\Notifier", "notifier"] {
        assert!(!c.has(name));
        assert!(!c.bound(name));
        assert!(!c.resolved(name));
    }
    assert!(c.tagged("infra").unwrap().is_empty());
    assert!(c.make("App\\Notifier").unwrap_err().is_not_found());

    // Plain classes keep autowiring.
    assert!(c.make("App\\Clock").unwrap().is::<Clock>());

    c.flush();
    assert!(c.bindings().is_empty());
}

#[test]
fn singleton_closure_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut c = container();
    c.singleton("counter", {
        let calls = calls.clone();
        Concrete::closure(move |_, _| Ok(Instance::new(calls.fetch_add(1, Ordering::SeqCst))))
    });

    for _ in 0..5 {
        c.make("counter").unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn deep_failure_unwinds_cleanly() {
    let mut c = container();
    c.singleton("App\\Database", "App\\Missing");

    let err = c.make("App\\UserService").unwrap_err();
    assert!(err.is_not_found(), "got: {err}");

    // Nothing half-built is cached.
    assert!(!c.resolved("App\\Database"));
    c.singleton("App\\Database", "App\\Database");
    assert!(c.make("App\\UserService").is_ok());
}

#[test]
fn provider_registration() {
    struct NotificationProvider;

    impl ServiceProvider for NotificationProvider {
        fn register(&self, registrar: &mut dyn Registrar) {
            registrar.register_binding("App\\Notifier".into(), Concrete::from("App\\EmailNotifier"), Scope::Singleton);
            registrar.register_tag(vec!["App\\Notifier".into(), "App\\SmsNotifier".into()], "notifiers".into());
        }
    }

    let mut c = container();
    c.register_provider(&NotificationProvider);

    let all = c.tagged("notifiers").unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].is::<EmailNotifier>());
    assert!(all[1].is::<SmsNotifier>());
    assert!(c.resolved("App\\Notifier"));
}

mod registered {
    use super::*;

    struct Heartbeat;

    inventory::submit! {
        ClassRegistration::new(|| {
            ClassDescriptor::class("it\\Heartbeat").instantiate_with(|| Instance::new(Heartbeat))
        })
    }

    #[test]
    fn global_catalog_sees_inventory() {
        let mut c = Container::new();
        assert!(c.make("it\\Heartbeat").unwrap().is::<Heartbeat>());
    }
}
