//! Test utilities for Depot service tests.
//!
//! This module provides fixtures and a harness that keeps handles to the
//! service's components so tests can inspect and manipulate them directly.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use depot::{DepotConfig, ExpiryUpdate, FileService, FileUpdate};
use depot_cache::ArtifactCache;
use depot_storage::{FileSystemStorage, MetadataStore};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

pub mod flaky_storage;

pub use flaky_storage::FlakyStorage;

/// A service plus direct handles to what it owns.
pub struct Harness {
    pub service: FileService,
    pub store: Arc<MetadataStore>,
    pub blobs: Arc<FlakyStorage>,
    pub cache: Arc<ArtifactCache>,
}

/// Service with every store under `dir`, built from its parts.
pub async fn harness(dir: &TempDir) -> Harness {
    harness_with(DepotConfig::rooted_at(dir.path())).await
}

/// Like [`harness`], for a configuration the test adjusted.
pub async fn harness_with(config: DepotConfig) -> Harness {
    let blobs = Arc::new(FlakyStorage::new(
        FileSystemStorage::new(config.storage().upload_root()).expect("Failed to open storage"),
    ));
    let store = Arc::new(
        MetadataStore::open(config.storage().index_path())
            .await
            .expect("Failed to open index"),
    );
    let cache =
        Arc::new(ArtifactCache::new(config.storage().cache_root()).expect("Failed to open cache"));
    let service = FileService::with_components(
        config,
        Arc::clone(&store),
        blobs.clone(),
        Arc::clone(&cache),
    );
    Harness {
        service,
        store,
        blobs,
        cache,
    }
}

/// Service opened from configuration, the way the binary does it.
pub async fn service(dir: &TempDir) -> FileService {
    FileService::new(DepotConfig::rooted_at(dir.path()))
        .await
        .expect("Failed to open service")
}

/// Move a record's expiry into the past, bypassing service validation.
pub async fn expire(store: &MetadataStore, id: &str) {
    let update = FileUpdate {
        expires: Some(ExpiryUpdate::At(Utc::now() - Duration::seconds(5))),
        ..Default::default()
    };
    store.update(id, &update).await.expect("Failed to expire record");
}

/// PNG with a gradient so encoders cannot collapse it to nothing.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out.into_inner()
}

/// Number of regular files below `dir`, recursively.
pub fn file_count(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .map(|e| e.expect("Failed to read entry").path())
        .map(|p| if p.is_dir() { file_count(&p) } else { 1 })
        .sum()
}
