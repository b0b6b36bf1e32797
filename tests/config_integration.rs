//! Config persistence tests

use livetune_rs::{
    config::{TuneConfig, CONFIG_FILE},
    frame::AcquirePolicy,
};
use tempfile::TempDir;

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join(CONFIG_FILE);

    let mut config = TuneConfig::default();
    config.frame_queue.capacity = 3;
    config.frame_queue.acquire_policy = AcquirePolicy::Timeout { timeout_ms: 25 };
    config.pipeline.iterations = 12;
    config.save(&path).unwrap();

    let loaded = TuneConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_or_default_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = TuneConfig::load_or_default(dir.path().join("absent.toml"));
    assert_eq!(config, TuneConfig::default());
}

#[test]
fn test_load_or_default_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(&path, "[frame_queue]\ncapacity = 0\n").unwrap();

    assert!(TuneConfig::load(&path).is_err());
    assert_eq!(TuneConfig::load_or_default(&path), TuneConfig::default());
}
