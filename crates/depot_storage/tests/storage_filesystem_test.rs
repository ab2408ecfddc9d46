//! Tests for filesystem blob storage.

use depot_core::Category;
use depot_error::{DepotErrorKind, ErrorCategory, StorageErrorKind};
use depot_storage::{BlobStorage, FileSystemStorage, write_atomic};
use tempfile::TempDir;

#[tokio::test]
async fn test_store_and_retrieve() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let path = storage.path_for(Category::Images, "photo-0123456789abcdef.png");
    storage.store(&path, b"Hello, world!").await.unwrap();

    assert!(path.starts_with(temp_dir.path().join("images")));
    assert_eq!(storage.retrieve(&path).await.unwrap(), b"Hello, world!");
    assert!(storage.exists(&path).await.unwrap());
}

#[tokio::test]
async fn test_store_replaces_existing() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let path = storage.path_for(Category::Documents, "notes-1.txt");
    storage.store(&path, b"first").await.unwrap();
    storage.store(&path, b"second").await.unwrap();

    assert_eq!(storage.retrieve(&path).await.unwrap(), b"second");

    // No temp files left behind
    let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_delete() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let path = storage.path_for(Category::Audio, "song-2.mp3");
    storage.store(&path, b"la la").await.unwrap();
    storage.delete(&path).await.unwrap();

    assert!(!storage.exists(&path).await.unwrap());

    let err = storage.delete(&path).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        DepotErrorKind::Storage(e) if matches!(e.kind, StorageErrorKind::NotFound(_))
    ));
}

#[tokio::test]
async fn test_retrieve_missing() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let path = storage.path_for(Category::Others, "nothing-here.bin");
    let err = storage.retrieve(&path).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::StorageIo);
}

#[tokio::test]
async fn test_paths_outside_base_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path().join("uploads")).unwrap();

    let escaping = storage.base_path().join("images").join("..").join("..").join("x");
    let err = storage.store(&escaping, b"x").await.unwrap_err();
    assert!(matches!(
        err.kind(),
        DepotErrorKind::Storage(e) if matches!(e.kind, StorageErrorKind::InvalidPath(_))
    ));

    let outside = temp_dir.path().join("elsewhere.txt");
    assert!(storage.retrieve(&outside).await.is_err());
}

#[tokio::test]
async fn test_write_atomic_creates_parents() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("a").join("b").join("c.json");

    write_atomic(&path, b"{}").await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"{}");
}
