use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rabita::prelude::*;
use rabita::snapshot::{FileSnapshotStore, InstanceCodec};

#[derive(Debug, PartialEq)]
struct Config {
    name: String,
}

#[derive(Default)]
struct ConfigCodec {
    decoded: AtomicUsize,
}

impl InstanceCodec for ConfigCodec {
    fn encode(&self, _key: &Identifier, instance: &Instance) -> Option<Vec<u8>> {
        let config = instance.downcast_ref::<Config>()?;
        Some(config.name.clone().into_bytes())
    }

    fn decode(&self, _key: &Identifier, bytes: &[u8]) -> Option<Instance> {
        self.decoded.fetch_add(1, Ordering::SeqCst);
        let name = String::from_utf8(bytes.to_vec()).ok()?;
        Some(Instance::new(Config { name }))
    }
}

fn catalog(built: Arc<AtomicUsize>) -> Arc<ClassCatalog> {
    Arc::new(ClassCatalog::new().with(ClassDescriptor::class("App\\Config").constructor(move |_| {
        built.fetch_add(1, Ordering::SeqCst);
        Ok(Instance::new(Config { name: "built".into() }))
    })))
}

fn container(settings: &ContainerSettings, built: Arc<AtomicUsize>, codec: Arc<ConfigCodec>) -> Container {
    Container::builder()
        .settings(settings.clone())
        .classes(catalog(built))
        .snapshot(Arc::new(FileSnapshotStore::from_settings(settings)), codec)
        .build()
}

#[test]
fn file_snapshot_restores_singletons_across_containers() {
    let dir = tempfile::tempdir().unwrap();
    let settings: ContainerSettings =
        serde_json::from_value(serde_json::json!({ "snapshot_dir": dir.path() })).unwrap();
    let built = Arc::new(AtomicUsize::new(0));
    let codec = Arc::new(ConfigCodec::default());

    let mut first = container(&settings, built.clone(), codec.clone());
    first.singleton("App\\Config", "App\\Config");
    first.make("App\\Config").unwrap();
    assert_eq!(first.save_snapshot().unwrap(), 1);

    let location = first.snapshot_location().unwrap();
    assert!(location.starts_with(&dir.path().display().to_string()));
    assert!(std::path::Path::new(&location).exists());

    let mut second = container(&settings, built.clone(), codec.clone());
    second.singleton("App\\Config", "App\\Config");
    let config: Arc<Config> = second.get("App\\Config").unwrap();

    assert_eq!(config.name, "built");
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(codec.decoded.load(Ordering::SeqCst), 1);
    assert!(!second.is_snapshot_dirty());

    second.clear_snapshot().unwrap();
    assert!(!std::path::Path::new(&location).exists());
}

#[test]
fn auto_load_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ContainerSettings {
        auto_load_snapshot: false,
        snapshot_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let built = Arc::new(AtomicUsize::new(0));
    let codec = Arc::new(ConfigCodec::default());

    let mut first = container(&settings, built.clone(), codec.clone());
    first.singleton("App\\Config", "App\\Config");
    first.make("App\\Config").unwrap();
    first.save_snapshot().unwrap();

    let mut second = container(&settings, built.clone(), codec.clone());
    second.singleton("App\\Config", "App\\Config");
    second.make("App\\Config").unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert_eq!(codec.decoded.load(Ordering::SeqCst), 0);

    // An explicit load still works once the cached copy is gone.
    second.forget_instance("App\\Config");
    assert_eq!(second.load_snapshot().unwrap(), 1);
    assert!(second.resolved("App\\Config"));
}

#[test]
fn corrupt_snapshot_is_reported_and_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ContainerSettings {
        snapshot_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let built = Arc::new(AtomicUsize::new(0));
    let codec = Arc::new(ConfigCodec::default());

    let mut c = container(&settings, built.clone(), codec);
    c.singleton("App\\Config", "App\\Config");
    std::fs::write(c.snapshot_location().unwrap(), b"garbage").unwrap();

    assert!(c.load_snapshot().is_err());
    assert!(c.make("App\\Config").is_ok());
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn settings_round_trip_through_json() {
    let settings = ContainerSettings {
        fast_lookup_groups: 8,
        max_alias_depth: 4,
        ..Default::default()
    };

    let json = serde_json::to_string(&settings).unwrap();
    let back: ContainerSettings = serde_json::from_str(&json).unwrap();
    assert_eq!(back, settings);

    let mut c = Container::builder().settings(back).build();
    c.alias("a", "b").alias("b", "c").alias("c", "d").alias("d", "e").alias("e", "f");
    assert_eq!(c.settings().max_alias_depth, 4);
    assert!(c.is_alias("f"));
}

#[test]
fn bindings_export_serializes() {
    let mut c = Container::with_classes(catalog(Arc::new(AtomicUsize::new(0))));
    c.singleton("App\\Config", "App\\Config");
    c.make("App\\Config").unwrap();

    let json = serde_json::to_value(c.bindings()).unwrap();
    assert_eq!(json[0]["abstract"], "App\\Config");
    assert_eq!(json[0]["scope"], "singleton");
    assert_eq!(json[0]["resolved"], true);
}
