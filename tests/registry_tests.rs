//! Source registry and settings persistence tests

mod common;

use common::pdf_file;
use sheetrefs::references::{
    lookup_source, JsonSourceRegistry, MemorySourceRegistry, RegistryBackendSetting,
    ResolverSettings, SourceRef, SourceRegistry, SqliteSourceRegistry,
};

#[test]
fn test_json_registry_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("source_refs.json");

    {
        let mut registry = JsonSourceRegistry::open(&path).expect("open new registry");
        assert!(registry.entries().unwrap().is_empty());
        registry
            .put(SourceRef::new("B", "/books/basic.pdf"))
            .unwrap();
        registry
            .put(SourceRef::new("M", "/books/magic.pdf").with_page_offset(2))
            .unwrap();
    }

    let registry = JsonSourceRegistry::open(&path).expect("reopen registry");
    let entries = registry.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], SourceRef::new("B", "/books/basic.pdf"));
    assert_eq!(
        entries[1],
        SourceRef::new("M", "/books/magic.pdf").with_page_offset(2)
    );
}

#[test]
fn test_json_registry_remove_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source_refs.json");

    let mut registry = JsonSourceRegistry::open(&path).unwrap();
    registry.put(SourceRef::new("B", "/books/basic.pdf")).unwrap();
    assert!(registry.remove("B").unwrap());
    assert!(!registry.remove("B").unwrap());

    let reopened = JsonSourceRegistry::open(&path).unwrap();
    assert!(reopened.get("B").unwrap().is_none());
}

#[test]
fn test_json_registry_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source_refs.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = JsonSourceRegistry::open(&path).unwrap_err();
    assert!(err.contains("Failed to parse source registry"));
}

#[test]
fn test_sqlite_registry_put_replaces_and_lists_in_order() {
    let mut registry = SqliteSourceRegistry::open_in_memory().expect("open in-memory db");

    registry.put(SourceRef::new("M", "/books/magic.pdf")).unwrap();
    registry.put(SourceRef::new("B", "/books/basic3e.pdf")).unwrap();
    registry
        .put(SourceRef::new("B", "/books/basic4e.pdf").with_page_offset(-1))
        .unwrap();

    let b = registry.get("B").unwrap().expect("B registered");
    assert_eq!(b.path, std::path::PathBuf::from("/books/basic4e.pdf"));
    assert_eq!(b.page_offset, -1);

    let ids: Vec<String> = registry
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["B", "M"]);

    assert!(registry.remove("M").unwrap());
    assert!(registry.get("M").unwrap().is_none());
}

#[test]
fn test_sqlite_registry_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source_refs.db");

    {
        let mut registry = SqliteSourceRegistry::open(&path).unwrap();
        registry.put(SourceRef::new("CI", "/books/campaigns.pdf")).unwrap();
    }

    let registry = SqliteSourceRegistry::open(&path).unwrap();
    assert_eq!(
        registry.get("CI").unwrap(),
        Some(SourceRef::new("CI", "/books/campaigns.pdf"))
    );
}

#[test]
fn test_lookup_requires_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let basic = pdf_file(dir.path(), "basic.pdf");

    let mut registry = MemorySourceRegistry::new();
    registry.put(SourceRef::new("B", &basic)).unwrap();
    registry
        .put(SourceRef::new("G", dir.path().join("gone.pdf")))
        .unwrap();

    assert!(lookup_source(&registry, "B", true).is_some());
    assert!(lookup_source(&registry, "G", true).is_none());
    assert!(lookup_source(&registry, "G", false).is_some());
    assert!(lookup_source(&registry, "Z", false).is_none());
}

#[test]
fn test_prefixes_are_case_sensitive() {
    let mut registry = MemorySourceRegistry::new();
    registry.put(SourceRef::new("B", "/books/basic.pdf")).unwrap();
    assert!(lookup_source(&registry, "b", false).is_none());
}

#[test]
fn test_settings_round_trip_and_open_registry() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("settings.json");

    let missing = ResolverSettings::load_from(&settings_path).unwrap();
    assert_eq!(missing, ResolverSettings::default());

    let settings = ResolverSettings {
        registry_backend: RegistryBackendSetting::Sqlite,
        registry_path: Some(dir.path().join("refs.db")),
        require_existing_files: false,
        viewer_command: vec!["zathura".to_string(), "{path}".to_string()],
        ..Default::default()
    };
    settings.save_to(&settings_path).unwrap();

    let loaded = ResolverSettings::load_from(&settings_path).unwrap();
    assert_eq!(loaded, settings);

    let mut registry = loaded.open_registry().expect("open sqlite registry");
    registry.put(SourceRef::new("B", "/books/basic.pdf")).unwrap();
    assert!(dir.path().join("refs.db").exists());
}
