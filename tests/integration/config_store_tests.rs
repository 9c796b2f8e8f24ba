//! Configuration store behaviour through the public port.

use corvid::adapters::nvs::NvsAdapter;
use corvid::app::ports::{ConfigError, ConfigPort, StoragePort};
use corvid::config::{self, BirdConfig, ConfigRecord, Mode};
use corvid::schedule::hm;

use crate::mock_hw::MemStore;

#[test]
fn fresh_store_yields_defaults() {
    let store = MemStore::new();
    assert_eq!(store.load(), BirdConfig::default());
}

#[test]
fn setup_record_is_parsed_and_saved() {
    let mut store = MemStore::new();
    let record = ConfigRecord {
        earliest: "22:00".into(),
        latest: "02:00".into(),
        interval: "45".into(),
        mode: Mode::Random,
        ..Default::default()
    };
    let saved = config::save_record_to(&mut store, &record).unwrap();

    assert_eq!(saved.interval_minutes, Some(45));
    let loaded = store.load();
    assert_eq!(loaded, saved);
    assert!(loaded.window().contains(hm(1, 0)));
    assert!(!loaded.window().contains(hm(12, 0)));
}

#[test]
fn rejected_record_keeps_previous() {
    let mut store = MemStore::with_config(&BirdConfig {
        volume: 0.3,
        ..Default::default()
    });
    let record = ConfigRecord {
        latest: "25:00".into(),
        ..Default::default()
    };

    let err = config::save_record_to(&mut store, &record).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { field: "latest", .. }));
    assert!((store.load().volume - 0.3).abs() < f32::EPSILON);
}

#[test]
fn empty_window_is_rejected() {
    let mut store = MemStore::new();
    let cfg = BirdConfig {
        earliest: hm(8, 0),
        latest: hm(8, 0),
        ..Default::default()
    };
    assert!(store.save(&cfg).is_err());
    assert!(!store.exists(config::CONFIG_NAMESPACE, config::CONFIG_KEY));
}

#[test]
fn garbage_record_loads_defaults() {
    let mut store = MemStore::new();
    store
        .write(config::CONFIG_NAMESPACE, config::CONFIG_KEY, b"\xff\x00not json")
        .unwrap();
    assert_eq!(store.load(), BirdConfig::default());
}

#[test]
fn sim_nvs_matches_memory_store() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut mem = MemStore::new();
    let cfg = BirdConfig {
        interval_minutes: Some(90),
        dark_flash_count: 4,
        ..Default::default()
    };
    nvs.save(&cfg).unwrap();
    mem.save(&cfg).unwrap();

    assert_eq!(nvs.load(), mem.load());
    assert_eq!(
        mem.raw(config::CONFIG_NAMESPACE, config::CONFIG_KEY).map(<[u8]>::len),
        Some(serde_json::to_vec(&cfg.to_record()).unwrap().len())
    );
}
