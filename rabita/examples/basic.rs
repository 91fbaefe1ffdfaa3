//! Basic example of the Rabita container.
//!
//! Run with `RUST_LOG=rabita_container=trace` to watch resolution.

use std::sync::Arc;

use rabita::prelude::*;
use tracing_subscriber::EnvFilter;

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct UserRepository {
    db: Arc<Database>,
}

struct UserService {
    repo: Arc<UserRepository>,
    retries: usize,
}

fn logger(args: &Arguments<'_>, index: usize) -> std::result::Result<Arc<dyn Logger>, BoxError> {
    let logger: Arc<dyn Logger> = args.get::<ConsoleLogger>(index)?;
    Ok(logger)
}

fn catalog() -> ClassCatalog {
    ClassCatalog::new()
        .with(ClassDescriptor::interface("App\\Logger"))
        .with(ClassDescriptor::class("App\\ConsoleLogger").instantiate_with(|| Instance::new(ConsoleLogger)))
        .with(
            ClassDescriptor::class("App\\Database")
                .param(ParamDescriptor::class("config", "App\\Config"))
                .param(ParamDescriptor::class("logger", "App\\Logger"))
                .constructor(|args| {
                    let config: Arc<Config> = args.get(0)?;
                    Ok(Instance::new(Database {
                        url: config.database_url.clone(),
                        logger: logger(&args, 1)?,
                    }))
                }),
        )
        .with(
            ClassDescriptor::class("App\\UserRepository")
                .param(ParamDescriptor::class("db", "App\\Database"))
                .constructor(|args| Ok(Instance::new(UserRepository { db: args.get(0)? }))),
        )
        .with(
            ClassDescriptor::class("App\\UserService")
                .param(ParamDescriptor::class("repo", "App\\UserRepository"))
                .param(ParamDescriptor::builtin("retries", "int").with_default())
                .constructor(|args| {
                    Ok(Instance::new(UserService {
                        repo: args.get(0)?,
                        retries: if args.is_supplied(1) { *args.get::<usize>(1)? } else { 3 },
                    }))
                }),
        )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rabita_container=debug")))
        .init();

    let mut container = Container::builder()
        .classes(Arc::new(catalog()))
        .build();

    container
        .instance(
            "App\\Config",
            Instance::new(Config {
                database_url: "postgres://localhost/myapp".to_string(),
            }),
        )
        .singleton("App\\Logger", "App\\ConsoleLogger")
        .singleton("App\\Database", "App\\Database")
        .alias("App\\UserService", "users");

    println!("{container:?}");

    let service: Arc<UserService> = container.get("users")?;
    println!("{} (retries={})", service.repo.db.query("SELECT * FROM users WHERE id = 42"), service.retries);

    let custom = container.make_with("users", &Parameters::new().with("retries", Instance::new(5usize)))?;
    if let Some(custom) = custom.downcast::<UserService>() {
        println!("custom retries={}", custom.retries);
    }

    let compiled = container.compile();
    println!("Compiled {compiled} factories");
    let again: Arc<UserService> = container.get("users")?;
    println!("Database shared: {}", Arc::ptr_eq(&again.repo.db, &service.repo.db));

    for binding in container.bindings() {
        println!("  {} -> {} [{}]", binding.abstract_name, binding.concrete, binding.scope);
    }

    Ok(())
}
