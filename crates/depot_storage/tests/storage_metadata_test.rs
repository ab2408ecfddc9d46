//! Tests for the metadata index.

use chrono::{Duration, Utc};
use depot_core::{Category, ExpiryUpdate, FileRecord, FileUpdate};
use depot_storage::{Lookup, MetadataStore};
use std::sync::Arc;
use tempfile::TempDir;

fn record(id: &str, checksum: &str) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        checksum: checksum.to_string(),
        original_name: format!("{}.txt", id),
        stored_name: format!("file-{}.txt", id),
        mime_type: "text/plain".to_string(),
        category: Category::Documents,
        size: 5,
        tags: vec![],
        width: None,
        height: None,
        thumbnail: false,
        uploaded_at: Utc::now(),
        expires_at: None,
        downloads: 0,
        is_public: true,
        path: format!("/tmp/documents/file-{}.txt", id).into(),
        public_url: format!("/uploads/documents/file-{}.txt", id),
    }
}

#[tokio::test]
async fn test_open_missing_index_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = MetadataStore::open(temp_dir.path().join("meta").join("index.json"))
        .await
        .unwrap();

    assert!(store.is_empty().await);
    assert!(store.enumerate().await.is_empty());
}

#[tokio::test]
async fn test_restart_reconstructs_state() {
    let temp_dir = TempDir::new().unwrap();
    let index_path = temp_dir.path().join("index.json");

    {
        let store = MetadataStore::open(&index_path).await.unwrap();
        store.put(record("aaaa", "c1")).await.unwrap();
        store.put(record("bbbb", "c2")).await.unwrap();
        store.record_download("aaaa").await.unwrap();
        store.delete("bbbb").await.unwrap();
    }

    let reopened = MetadataStore::open(&index_path).await.unwrap();
    assert_eq!(reopened.len().await, 1);

    let restored = reopened.get("aaaa").await.unwrap();
    assert_eq!(restored.downloads, 1);
    assert_eq!(reopened.find_by_checksum("c1").await.unwrap().id, "aaaa");
    assert!(reopened.find_by_checksum("c2").await.is_none());
}

#[tokio::test]
async fn test_write_through_on_every_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let index_path = temp_dir.path().join("index.json");
    let store = MetadataStore::open(&index_path).await.unwrap();

    store.put(record("aaaa", "c1")).await.unwrap();
    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&index_path).unwrap()).unwrap();
    assert_eq!(on_disk["aaaa"]["checksum"], "c1");
    assert_eq!(on_disk["aaaa"]["isPublic"], true);

    let update = FileUpdate {
        is_public: Some(false),
        tags: Some(vec!["x".to_string()]),
        expires: None,
    };
    store.update("aaaa", &update).await.unwrap();
    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&index_path).unwrap()).unwrap();
    assert_eq!(on_disk["aaaa"]["isPublic"], false);
    assert_eq!(on_disk["aaaa"]["tags"][0], "x");
}

#[tokio::test]
async fn test_corrupt_index_fails_to_open() {
    let temp_dir = TempDir::new().unwrap();
    let index_path = temp_dir.path().join("index.json");
    std::fs::write(&index_path, b"{ not json").unwrap();

    assert!(MetadataStore::open(&index_path).await.is_err());
}

#[tokio::test]
async fn test_concurrent_downloads_are_not_lost() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(
        MetadataStore::open(temp_dir.path().join("index.json"))
            .await
            .unwrap(),
    );
    store.put(record("aaaa", "c1")).await.unwrap();

    let tasks = (0..20).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.record_download("aaaa").await.unwrap() })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(store.get("aaaa").await.unwrap().downloads, 20);
}

#[tokio::test]
async fn test_expired_records_are_invisible() {
    let temp_dir = TempDir::new().unwrap();
    let store = MetadataStore::open(temp_dir.path().join("index.json"))
        .await
        .unwrap();

    let mut stale = record("aaaa", "c1");
    stale.expires_at = Some(Utc::now() - Duration::seconds(1));
    store.put(stale).await.unwrap();
    store.put(record("bbbb", "c2")).await.unwrap();

    assert!(store.get("aaaa").await.is_none());
    assert!(store.find_by_checksum("c1").await.is_none());
    assert!(matches!(store.lookup("aaaa").await, Lookup::Expired(_)));
    assert!(matches!(store.lookup("bbbb").await, Lookup::Live(_)));
    assert_eq!(store.lookup("cccc").await, Lookup::Missing);
    assert!(store.contains_id("aaaa").await);

    let live: Vec<_> = store.enumerate().await.into_iter().map(|r| r.id).collect();
    assert_eq!(live, vec!["bbbb".to_string()]);
    assert_eq!(store.expired().await.len(), 1);

    assert!(store.record_download("aaaa").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_clears_expiry() {
    let temp_dir = TempDir::new().unwrap();
    let store = MetadataStore::open(temp_dir.path().join("index.json"))
        .await
        .unwrap();

    let mut soon = record("aaaa", "c1");
    soon.expires_at = Some(Utc::now() + Duration::hours(1));
    store.put(soon).await.unwrap();

    let update = FileUpdate {
        expires: Some(ExpiryUpdate::Clear),
        ..Default::default()
    };
    let updated = store.update("aaaa", &update).await.unwrap();
    assert_eq!(updated.expires_at, None);
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = MetadataStore::open(temp_dir.path().join("index.json"))
        .await
        .unwrap();

    let err = store.delete("nope").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(store.update("nope", &FileUpdate::default()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_checksum_index_follows_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let store = MetadataStore::open(temp_dir.path().join("index.json"))
        .await
        .unwrap();

    store.put(record("aaaa", "c1")).await.unwrap();
    store.put(record("aaaa", "c9")).await.unwrap();

    assert!(store.find_by_checksum("c1").await.is_none());
    assert_eq!(store.find_by_checksum("c9").await.unwrap().id, "aaaa");
}
