use std::fs;
use std::path::PathBuf;

use kumiki_core::cache::{
    CacheError, FileStore, TemplateCache, TemplateStore, POPULAR_COMBOS,
};
use kumiki_core::template::{generate, now_ms, GenerationConfig, PuzzleTemplate};

fn slugs(list: &[&str]) -> Vec<String> {
    list.iter().map(|slug| slug.to_string()).collect()
}

fn config_for(unique: u32, copies: u32) -> GenerationConfig {
    GenerationConfig {
        unique_shapes: unique,
        copies_per_shape: copies,
        total_pieces: unique * copies,
        ..GenerationConfig::default()
    }
}

fn small_template(selection: &[&str], seed: u32) -> PuzzleTemplate {
    let selection = slugs(selection);
    generate(&selection, &config_for(selection.len() as u32, 2), seed).expect("generation")
}

struct TempDir(PathBuf);

impl TempDir {
    fn new(label: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "kumiki-test-{label}-{}-{}",
            std::process::id(),
            now_ms()
        ));
        let _ = fs::remove_dir_all(&dir);
        TempDir(dir)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn second_request_is_a_hit_with_identical_layout() {
    let mut cache = TemplateCache::in_memory();
    let config = config_for(4, 3);
    let first = cache
        .get_or_create(&slugs(&["fox", "cat", "owl", "fish"]), &config, 11)
        .unwrap();
    // Different slug order and a different seed: the id matches, so the
    // cached layout comes back untouched.
    let second = cache
        .get_or_create(&slugs(&["fish", "owl", "fox", "cat"]), &config, 99)
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.pieces, second.pieces);

    let stats = cache.stats();
    assert_eq!(stats.total_templates, 1);
    assert_eq!(stats.total_pieces, 12);
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.miss_count, 1);
    assert!((stats.hit_rate() - 0.5).abs() < f32::EPSILON);
}

#[test]
fn failed_generation_leaves_no_entry() {
    let mut cache = TemplateCache::in_memory();
    let selection = slugs(&["fox", "cat", "owl"]);
    // Config expects four shapes; the selection carries three.
    let err = cache
        .get_or_create(&selection, &config_for(4, 3), 5)
        .unwrap_err();
    assert!(matches!(err, CacheError::Generation(_)));
    assert!(!cache.has(&selection));
    let stats = cache.stats();
    assert_eq!(stats.total_templates, 0);
    assert_eq!(stats.miss_count, 1);
}

#[test]
fn delete_and_clear_remove_entries() {
    let mut cache = TemplateCache::in_memory();
    let a = slugs(&["fox", "cat"]);
    let b = slugs(&["owl", "fish"]);
    cache.get_or_create(&a, &config_for(2, 2), 1).unwrap();
    cache.get_or_create(&b, &config_for(2, 2), 2).unwrap();
    assert!(cache.delete(&a));
    assert!(!cache.delete(&a));
    assert!(cache.has(&b));
    cache.clear();
    assert!(!cache.has(&b));
    assert_eq!(cache.stats().total_templates, 0);
}

#[test]
fn warm_populates_popular_combos_once() {
    let mut cache = TemplateCache::in_memory();
    let base = GenerationConfig {
        copies_per_shape: 2,
        ..GenerationConfig::default()
    };
    assert_eq!(cache.warm(&base, 3).unwrap(), POPULAR_COMBOS.len());
    for combo in POPULAR_COMBOS {
        assert!(cache.has(&slugs(combo)));
    }
    assert_eq!(cache.warm(&base, 3).unwrap(), 0);
}

#[test]
fn file_store_survives_reopen() {
    let tmp = TempDir::new("reopen");
    let template = small_template(&["fox", "cat"], 21);

    let mut store = FileStore::open(&tmp.0).unwrap();
    store.set(template.clone()).unwrap();
    drop(store);

    let store = FileStore::open(&tmp.0).unwrap();
    assert_eq!(store.len(), 1);
    let loaded = store.get(&template.id).expect("record survives");
    assert_eq!(loaded, template);
}

#[test]
fn file_store_evicts_oldest_when_over_quota() {
    let tmp = TempDir::new("evict");
    let older = small_template(&["fox", "cat"], 1);
    let mut newer = small_template(&["owl", "fish"], 2);
    // Creation order decides eviction; make it unambiguous.
    newer.created_at_ms = older.created_at_ms + 1;

    let sizing = TempDir::new("evict-sizing");
    let mut probe = FileStore::open(&sizing.0).unwrap();
    probe.set(older.clone()).unwrap();
    probe.set(newer.clone()).unwrap();
    let older_bytes = fs::metadata(sizing.0.join(format!("{}.bin", older.id)))
        .unwrap()
        .len();
    let newer_bytes = fs::metadata(sizing.0.join(format!("{}.bin", newer.id)))
        .unwrap()
        .len();

    // Fits either record alone but not both.
    let quota = older_bytes + newer_bytes - 1;
    let mut store = FileStore::open_with_quota(&tmp.0, quota).unwrap();
    store.set(older.clone()).unwrap();
    store.set(newer.clone()).unwrap();

    assert!(!store.has(&older.id));
    assert!(store.has(&newer.id));
    assert!(!tmp.0.join(format!("{}.bin", older.id)).exists());
}

#[test]
fn file_store_rejects_record_larger_than_quota() {
    let tmp = TempDir::new("tiny-quota");
    let template = small_template(&["fox", "cat"], 7);
    let mut store = FileStore::open_with_quota(&tmp.0, 16).unwrap();
    let err = store.set(template.clone()).unwrap_err();
    assert!(matches!(err, CacheError::QuotaExceeded { .. }));
    assert!(!store.has(&template.id));
    assert!(!tmp.0.join(format!("{}.bin", template.id)).exists());
}

#[test]
fn stale_index_version_starts_empty() {
    let tmp = TempDir::new("stale-index");
    fs::create_dir_all(&tmp.0).unwrap();
    fs::write(tmp.0.join("index.bin"), b"not an index record").unwrap();
    let store = FileStore::open(&tmp.0).unwrap();
    assert!(store.is_empty());
}
