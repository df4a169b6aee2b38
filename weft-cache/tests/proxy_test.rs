//! Proxy cache staleness, reuse, and orphan handling.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use weft_cache::{ProxyCache, ProxyGenerator, StubGenerator};
use weft_core::errors::CacheError;
use weft_core::metadata::{DeclEntry, MetadataStore};
use weft_core::types::{DeclKind, Declaration, Marker, WeaveSet};

/// Generator wrapper that counts invocations.
struct CountingGenerator {
    inner: StubGenerator,
    calls: Arc<AtomicUsize>,
}

impl ProxyGenerator for CountingGenerator {
    fn generate(&self, entry: &DeclEntry, aspects: &[String]) -> Result<String, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate(entry, aspects)
    }
}

fn decl(name: &str, mtime_ms: i64) -> Declaration {
    Declaration {
        name: name.to_string(),
        kind: DeclKind::Type,
        file: PathBuf::from("app/a.src"),
        mtime_ms,
    }
}

fn store_with(name: &str, mtime_ms: i64) -> MetadataStore {
    let mut store = MetadataStore::new();
    store.record(decl(name, mtime_ms), vec![Marker::new("Loggable")]);
    store
}

fn weave_of(target: &str, aspects: &[&str]) -> WeaveSet {
    let mut weave = WeaveSet::new();
    for aspect in aspects {
        weave.add(target, aspect);
    }
    weave
}

fn counting_cache(dir: &std::path::Path) -> (ProxyCache, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = ProxyCache::new(
        dir,
        Box::new(CountingGenerator {
            inner: StubGenerator,
            calls: Arc::clone(&calls),
        }),
    );
    (cache, calls)
}

#[test]
fn fresh_artifact_is_reused_without_regeneration() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, calls) = counting_cache(dir.path());
    let store = store_with("App\\Foo", 1_000);
    let weave = weave_of("App\\Foo", &["App\\Aspect\\Log"]);

    let first = cache.materialize(&weave, &store).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(first["App\\Foo"].exists());

    let second = cache.materialize(&weave, &store).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "unchanged source must not regenerate");
    assert_eq!(first, second);
}

#[test]
fn newer_source_mtime_triggers_regeneration() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, calls) = counting_cache(dir.path());
    let weave = weave_of("App\\Foo", &["App\\Aspect\\Log"]);

    cache.materialize(&weave, &store_with("App\\Foo", 1_000)).unwrap();
    cache.materialize(&weave, &store_with("App\\Foo", 2_000)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn deleted_artifact_is_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, calls) = counting_cache(dir.path());
    let store = store_with("App\\Foo", 1_000);
    let weave = weave_of("App\\Foo", &["App\\Aspect\\Log"]);

    let paths = cache.materialize(&weave, &store).unwrap();
    std::fs::remove_file(&paths["App\\Foo"]).unwrap();

    cache.materialize(&weave, &store).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(paths["App\\Foo"].exists());
}

#[test]
fn dropping_out_of_the_weave_set_removes_record_and_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, _) = counting_cache(dir.path());
    let store = store_with("App\\Foo", 1_000);

    let paths = cache
        .materialize(&weave_of("App\\Foo", &["App\\Aspect\\Log"]), &store)
        .unwrap();
    let artifact = paths["App\\Foo"].clone();
    assert!(artifact.exists());

    let out = cache.materialize(&WeaveSet::new(), &store).unwrap();
    assert!(out.is_empty());
    assert!(!artifact.exists(), "orphan artifact must be deleted");
    assert!(cache.records().is_empty());
}

#[test]
fn unresolved_weave_target_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, calls) = counting_cache(dir.path());
    let weave = weave_of("App\\Ghost", &["App\\Aspect\\Log"]);

    let out = cache.materialize(&weave, &MetadataStore::new()).unwrap();
    assert!(out.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn aspect_to_targets_maps_each_aspect_to_its_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let (mut cache, _) = counting_cache(dir.path());
    let mut store = store_with("App\\Foo", 1_000);
    store.record(decl("App\\Bar", 1_000), vec![]);

    let mut weave = WeaveSet::new();
    weave.add("App\\Foo", "App\\Aspect\\Log");
    weave.add("App\\Foo", "App\\Aspect\\Cache");
    weave.add("App\\Bar", "App\\Aspect\\Log");

    let paths = cache.materialize(&weave, &store).unwrap();
    let by_aspect = cache.aspect_to_targets(&weave);

    assert_eq!(by_aspect["App\\Aspect\\Log"].len(), 2);
    assert_eq!(by_aspect["App\\Aspect\\Cache"].len(), 1);
    assert_eq!(by_aspect["App\\Aspect\\Log"]["App\\Foo"], paths["App\\Foo"]);
}
