//! Cache manager + checksum tracker integration tests
//!
//! `cargo test -p toolsmith-foundation --test cache_invalidation -- --nocapture`

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use toolsmith_foundation::{
    CacheConfig, CacheKey, CacheManager, ChecksumTracker, NamespaceInvalidator,
    NS_GIT_OPERATIONS, NS_GO_MODULES, NS_SMART_SUGGESTIONS, NS_TEST_RESULTS,
};

/// Rewrite a file and push its mtime forward so the change is visible even
/// on filesystems with coarse timestamp granularity.
fn rewrite_with_new_mtime(path: &Path, content: &str) {
    std::fs::write(path, content).expect("write file");
    let file = std::fs::File::options()
        .write(true)
        .open(path)
        .expect("open file");
    file.set_modified(SystemTime::now() + Duration::from_secs(2))
        .expect("set mtime");
}

#[tokio::test]
async fn test_go_modules_lru_and_ttl_lifecycle() {
    let config = CacheConfig::from_json_str(
        r#"{"namespaces": {"goModules": {"maxEntries": 2, "ttlMs": 1000}}}"#,
    )
    .expect("config should parse");
    let cache = CacheManager::with_config(config).expect("config should validate");

    cache.set(NS_GO_MODULES, "a", &1).unwrap();
    cache.set(NS_GO_MODULES, "b", &2).unwrap();

    // Reading "a" makes it most recently used
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "a").unwrap(), Some(1));

    // Capacity is 2, so inserting "c" evicts "b"
    cache.set(NS_GO_MODULES, "c", &3).unwrap();
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "b").unwrap(), None);
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "a").unwrap(), Some(1));
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "c").unwrap(), Some(3));

    let stats = cache.stats(NS_GO_MODULES).expect("namespace is configured");
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.evictions, 1);

    // Both survivors outlive their TTL
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "a").unwrap(), None);
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "c").unwrap(), None);
}

#[tokio::test]
async fn test_file_change_invalidates_registered_namespaces() {
    let dir = tempfile::tempdir().expect("tempdir");
    let go_mod = dir.path().join("go.mod");
    std::fs::write(&go_mod, "module example.com/app\n\ngo 1.22\n").expect("write go.mod");

    let config = CacheConfig::default();
    let tracker = ChecksumTracker::new(config.checksum_tracking.clone());
    let cache = Arc::new(CacheManager::with_config(config).expect("default config is valid"));

    // go.mod governs module metadata and any test results derived from it
    let invalidator = Arc::new(NamespaceInvalidator::new(
        Arc::clone(&cache),
        vec![NS_GO_MODULES.to_string(), NS_TEST_RESULTS.to_string()],
    ));
    tracker.track(&go_mod, Some(invalidator)).await;

    cache
        .set(NS_GO_MODULES, "list", &vec!["cobra", "viper"])
        .unwrap();
    cache.set(NS_TEST_RESULTS, "unit", &"ok").unwrap();
    cache.set(NS_GIT_OPERATIONS, "status", &"clean").unwrap();

    // An unchanged file leaves the cache alone
    let report = tracker.check_all().await;
    assert!(!report.skipped);
    assert_eq!(report.files_checked, 1);
    assert!(report.changed.is_empty());
    assert_eq!(
        cache.get::<Vec<String>>(NS_GO_MODULES, "list").unwrap(),
        Some(vec!["cobra".to_string(), "viper".to_string()])
    );

    rewrite_with_new_mtime(
        &go_mod,
        "module example.com/app\n\ngo 1.22\n\nrequire github.com/spf13/cobra v1.8.0\n",
    );

    let report = tracker.check_all().await;
    assert_eq!(report.changed, vec![go_mod.clone()]);
    assert_eq!(report.callback_errors, 0);

    // Namespaces registered against go.mod are emptied, others keep data
    assert_eq!(cache.get::<Vec<String>>(NS_GO_MODULES, "list").unwrap(), None);
    assert_eq!(cache.get::<String>(NS_TEST_RESULTS, "unit").unwrap(), None);
    assert_eq!(
        cache.get::<String>(NS_GIT_OPERATIONS, "status").unwrap(),
        Some("clean".to_string())
    );

    // The new content is now the baseline
    let report = tracker.check_all().await;
    assert!(report.changed.is_empty());
}

#[test]
fn test_cache_trusts_caller_built_keys() {
    let cache = CacheManager::new();

    // Two lint runs that differ only in an option the key builder skips
    let args_quick = serde_json::json!({"path": "./pkg", "fix": false});
    let args_fix = serde_json::json!({"path": "./pkg", "fix": true});

    let key_for = |args: &serde_json::Value| {
        let mut key = CacheKey::new();
        key.push_str("lint");
        key.push_str(args["path"].as_str().unwrap());
        key.finalize()
    };

    let quick_key = key_for(&args_quick);
    let fix_key = key_for(&args_fix);
    assert_eq!(quick_key, fix_key);

    cache
        .set(NS_SMART_SUGGESTIONS, &quick_key, &"no issues")
        .unwrap();

    // The second run hits the first run's entry; the store compares key
    // strings only and never sees the arguments behind them
    let cached: Option<String> = cache.get(NS_SMART_SUGGESTIONS, &fix_key).unwrap();
    assert_eq!(cached, Some("no issues".to_string()));

    // Folding the full argument object into the key separates the two runs
    let mut complete = CacheKey::new();
    complete.push_str("lint");
    complete.push_json(&args_fix);
    assert_ne!(complete.finalize(), quick_key);
}

#[test]
fn test_disabled_from_config() {
    let config = CacheConfig::from_json_str(r#"{"enabled": false}"#).expect("config should parse");
    let cache = CacheManager::with_config(config).expect("config should validate");

    assert!(!cache.is_enabled());
    cache.set(NS_GO_MODULES, "k", &1).unwrap();
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "k").unwrap(), None);

    // The write above was dropped, not buffered
    cache.set_enabled(true);
    assert_eq!(cache.get::<i64>(NS_GO_MODULES, "k").unwrap(), None);
}
