//! Read, update, delete, expiry and listing tests.

mod test_utils;

use chrono::{Duration, Utc};
use depot::{
    Access, Category, CategoryFilter, ErrorCategory, ExpiryUpdate, FileUpdate, ListQuery,
    SortKey, SortOrder, UploadOptions, UploadRequest,
};
use depot_core::TransformDescriptor;
use std::sync::Arc;
use tempfile::TempDir;
use test_utils::{expire, file_count, harness, png, service};

async fn upload(h: &test_utils::Harness, content: &str, name: &str) -> String {
    h.service
        .upload(UploadRequest::new(content.as_bytes().to_vec(), name))
        .await
        .unwrap()
        .record
        .id
}

#[tokio::test]
async fn test_read_content_counts_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = upload(&h, "hello world", "hello.txt").await;

    let first = h.service.read_content(&id, Access::anonymous()).await.unwrap();
    let second = h.service.read_content(&id, Access::anonymous()).await.unwrap();

    assert_eq!(first.bytes, b"hello world");
    assert_eq!(first.mime_type, "text/plain");
    assert_eq!(first.record.downloads, 1);
    assert_eq!(second.record.downloads, 2);
    assert_eq!(h.service.get(&id, Access::anonymous()).await.unwrap().downloads, 2);
}

#[tokio::test]
async fn test_concurrent_downloads_are_all_counted() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = upload(&h, "popular", "popular.txt").await;
    let service = Arc::new(h.service);

    let tasks = (0..16).map(|_| {
        let service = Arc::clone(&service);
        let id = id.clone();
        tokio::spawn(async move { service.read_content(&id, Access::anonymous()).await.unwrap() })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(service.get(&id, Access::admin()).await.unwrap().downloads, 16);
}

#[tokio::test]
async fn test_private_records_need_authentication() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let private = h
        .service
        .upload(
            UploadRequest::new(b"secret".to_vec(), "secret.txt")
                .with_options(UploadOptions::default().with_is_public(false)),
        )
        .await
        .unwrap()
        .record
        .id;
    upload(&h, "open", "open.txt").await;

    let err = h.service.get(&private, Access::anonymous()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AccessDenied);
    let err = h
        .service
        .read_content(&private, Access::anonymous())
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AccessDenied);
    assert!(h.service.get(&private, Access::authenticated()).await.is_ok());

    let anonymous = h.service.list(Access::anonymous(), &ListQuery::default()).await;
    assert_eq!(anonymous.total, 1);
    assert!(anonymous.items.iter().all(|r| r.is_public));
    let authenticated = h
        .service
        .list(Access::authenticated(), &ListQuery::default())
        .await;
    assert_eq!(authenticated.total, 2);
}

#[tokio::test]
async fn test_expired_records_are_invisible_and_evicted() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = upload(&h, "short lived", "temp.txt").await;
    let path = h.store.get(&id).await.unwrap().path;
    expire(&h.store, &id).await;

    let listed = h.service.list(Access::admin(), &ListQuery::default()).await;
    assert_eq!(listed.total, 0);
    assert_eq!(h.service.stats().await.total_files, 0);

    let err = h
        .service
        .read_content(&id, Access::admin())
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);

    // the failed read evicted the record and its object
    assert!(h.store.all_records().await.is_empty());
    assert!(!path.exists());
    let err = h.service.get(&id, Access::admin()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_future_expiry_stays_visible() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let record = h
        .service
        .upload(
            UploadRequest::new(b"still fresh".to_vec(), "fresh.txt")
                .with_options(UploadOptions::default().with_expires_in(3600)),
        )
        .await
        .unwrap()
        .record;
    let expires_at = record.expires_at.unwrap();
    assert!(expires_at > Utc::now() + Duration::minutes(59));

    let fetched = h.service.get(&record.id, Access::anonymous()).await.unwrap();
    assert_eq!(fetched.expires_at, Some(expires_at));

    let listed = h.service.list(Access::anonymous(), &ListQuery::default()).await;
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, record.id);

    let content = h
        .service
        .read_content(&record.id, Access::anonymous())
        .await
        .unwrap();
    assert_eq!(content.bytes, b"still fresh");

    assert_eq!(h.service.sweep(Access::admin()).await.unwrap(), 0);
    assert!(record.path.exists());
}

#[tokio::test]
async fn test_reupload_after_expiry_creates_fresh_record() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let old = h
        .service
        .upload(UploadRequest::new(b"same bytes".to_vec(), "first.txt"))
        .await
        .unwrap()
        .record;
    expire(&h.store, &old.id).await;

    let fresh = h
        .service
        .upload(UploadRequest::new(b"same bytes".to_vec(), "again.txt"))
        .await
        .unwrap();

    assert!(!fresh.deduplicated);
    assert_ne!(fresh.record.id, old.id);
    assert_eq!(fresh.record.checksum, old.checksum);
    assert_eq!(fresh.record.original_name, "again.txt");
    assert_ne!(fresh.record.path, old.path);
    // the expired record stays on file until it is swept
    assert_eq!(h.store.all_records().await.len(), 2);

    assert_eq!(h.service.sweep(Access::admin()).await.unwrap(), 1);
    assert!(!old.path.exists());
    assert!(fresh.record.path.exists());

    let again = h
        .service
        .upload(UploadRequest::new(b"same bytes".to_vec(), "third.txt"))
        .await
        .unwrap();
    assert!(again.deduplicated);
    assert_eq!(again.record.id, fresh.record.id);
}

#[tokio::test]
async fn test_sweep_removes_expired_records() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let keep = upload(&h, "keep", "keep.txt").await;
    for i in 0..3 {
        let id = upload(&h, &format!("stale {}", i), "stale.txt").await;
        expire(&h.store, &id).await;
    }

    let err = h.service.sweep(Access::authenticated()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AccessDenied);
    assert_eq!(h.store.all_records().await.len(), 4);

    assert_eq!(h.service.sweep(Access::admin()).await.unwrap(), 3);
    assert_eq!(h.service.sweep(Access::admin()).await.unwrap(), 0);

    let remaining = h.store.all_records().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
    assert_eq!(file_count(&temp_dir.path().join("uploads")), 1);
}

#[tokio::test]
async fn test_concurrent_sweeps_remove_each_record_once() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    for i in 0..6 {
        let id = upload(&h, &format!("stale {}", i), "stale.txt").await;
        expire(&h.store, &id).await;
    }
    let service = Arc::new(h.service);

    let tasks = (0..3).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.sweep(Access::admin()).await.unwrap() })
    });
    let removed: usize = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .sum();

    assert_eq!(removed, 6);
    assert!(h.store.all_records().await.is_empty());
}

#[tokio::test]
async fn test_delete_removes_object_and_every_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let record = h
        .service
        .upload(UploadRequest::new(png(64, 48), "pic.png"))
        .await
        .unwrap()
        .record;
    h.service
        .transform(&record.id, Access::anonymous(), Some("avatar"), &[])
        .await
        .unwrap();
    h.service
        .transform(&record.id, Access::anonymous(), None, &[("w", "10")])
        .await
        .unwrap();
    assert_eq!(h.cache.count(&record.id).await.unwrap(), 3);

    let report = h.service.delete(&record.id).await.unwrap();

    assert!(report.is_clean());
    assert!(report.object_removed);
    assert_eq!(report.artifacts_purged, 3);
    assert!(!record.path.exists());
    assert_eq!(h.cache.count(&record.id).await.unwrap(), 0);
    let err = h.service.get(&record.id, Access::admin()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    let err = h.service.delete(&record.id).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_delete_during_transform_leaves_no_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let record = h
        .service
        .upload(
            UploadRequest::new(png(1500, 1500), "large.png")
                .with_options(UploadOptions::default().with_thumbnail(false)),
        )
        .await
        .unwrap()
        .record;
    let service = Arc::new(h.service);

    let transforming = {
        let service = Arc::clone(&service);
        let id = record.id.clone();
        tokio::spawn(async move {
            service
                .transform(&id, Access::admin(), None, &[("blur", "40"), ("f", "png")])
                .await
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;

    let report = service.delete(&record.id).await.unwrap();
    let transformed = transforming.await.unwrap();

    assert_eq!(h.cache.count(&record.id).await.unwrap(), 0);
    assert!(h.store.all_records().await.is_empty());
    assert!(!record.path.exists());
    match transformed {
        // rendered before the delete: the purge waited for it
        Ok(output) => {
            assert!(!output.cache_hit);
            assert_eq!(report.artifacts_purged, 1);
        }
        // started after the object was gone
        Err(e) => assert!(matches!(
            e.category(),
            ErrorCategory::NotFound | ErrorCategory::StorageIo
        )),
    }
}

#[tokio::test]
async fn test_delete_reports_object_failure_but_drops_record() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = upload(&h, "stuck", "stuck.txt").await;
    h.blobs.fail_deletes(true);

    let report = h.service.delete(&id).await.unwrap();

    assert!(!report.object_removed);
    assert!(report.object_error.is_some());
    assert!(!report.is_clean());
    assert!(h.store.get(&id).await.is_none());
    assert_eq!(file_count(&temp_dir.path().join("uploads")), 1);
    assert_eq!(h.service.verify().await.len(), 0);
}

#[tokio::test]
async fn test_update_changes_mutable_fields() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(
            UploadRequest::new(b"notes".to_vec(), "notes.txt")
                .with_options(UploadOptions::default().with_expires_in(60)),
        )
        .await
        .unwrap()
        .record
        .id;

    let updated = h
        .service
        .update(
            &id,
            FileUpdate {
                is_public: Some(false),
                tags: Some(vec!["work".to_string(), " work ".to_string()]),
                expires: Some(ExpiryUpdate::Clear),
            },
        )
        .await
        .unwrap();

    assert!(!updated.is_public);
    assert_eq!(updated.tags, vec!["work"]);
    assert_eq!(updated.expires_at, None);
    assert_eq!(h.store.get(&id).await.unwrap(), updated);

    let later = Utc::now() + Duration::hours(1);
    let updated = h
        .service
        .update(
            &id,
            FileUpdate {
                expires: Some(ExpiryUpdate::At(later)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.expires_at, Some(later));
    assert!(!updated.is_public);
}

#[tokio::test]
async fn test_update_rejects_past_expiry_and_unknown_ids() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = upload(&h, "notes", "notes.txt").await;

    let err = h
        .service
        .update(
            &id,
            FileUpdate {
                expires: Some(ExpiryUpdate::At(Utc::now() - Duration::minutes(1))),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(h.store.get(&id).await.unwrap().expires_at, None);

    let err = h
        .service
        .update("ffffffffffffffff", FileUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_list_filters_sorts_and_pages() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    h.service
        .upload(UploadRequest::new(png(4, 4), "cat.png"))
        .await
        .unwrap();
    for i in 0..5 {
        upload(&h, &"x".repeat(i + 1), &format!("doc{}.txt", i)).await;
    }

    let query = ListQuery::default()
        .with_category(CategoryFilter::Only(Category::Documents))
        .with_sort_by(SortKey::Size)
        .with_sort_order(SortOrder::Asc)
        .with_limit(2)
        .with_page(2);
    let page = h.service.list(Access::anonymous(), &query).await;

    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    let sizes: Vec<u64> = page.items.iter().map(|r| r.size).collect();
    assert_eq!(sizes, vec![3, 4]);

    let huge = h
        .service
        .list(Access::anonymous(), &ListQuery::default().with_limit(10_000))
        .await;
    assert_eq!(huge.limit, 100);
    assert_eq!(huge.total, 6);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let id = {
        let service = service(&temp_dir).await;
        let id = service
            .upload(UploadRequest::new(b"durable".to_vec(), "durable.txt"))
            .await
            .unwrap()
            .record
            .id;
        service.read_content(&id, Access::anonymous()).await.unwrap();
        id
    };

    let reopened = service(&temp_dir).await;
    let content = reopened.read_content(&id, Access::anonymous()).await.unwrap();

    assert_eq!(content.bytes, b"durable");
    assert_eq!(content.record.downloads, 2);
    let duplicate = reopened
        .upload(UploadRequest::new(b"durable".to_vec(), "again.txt"))
        .await
        .unwrap();
    assert!(duplicate.deduplicated);
    assert_eq!(duplicate.record.id, id);
}

#[tokio::test]
async fn test_stats_and_verify() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let image = h
        .service
        .upload(UploadRequest::new(png(8, 8), "a.png"))
        .await
        .unwrap()
        .record;
    let doc = upload(&h, "12345", "b.txt").await;
    h.service.read_content(&doc, Access::anonymous()).await.unwrap();

    let stats = h.service.stats().await;
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_bytes, image.size + 5);
    assert_eq!(stats.total_downloads, 1);
    assert_eq!(stats.by_category[&Category::Images].files, 1);
    assert_eq!(stats.by_category[&Category::Documents].bytes, 5);
    assert!(!stats.by_category.contains_key(&Category::Videos));

    assert!(h.service.verify().await.is_empty());
    std::fs::remove_file(&image.path).unwrap();
    let missing = h.service.verify().await;
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].id, image.id);
    // verification never mutates
    assert_eq!(h.store.len().await, 2);
}

#[tokio::test]
async fn test_transform_cache_key_is_per_descriptor() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(
            UploadRequest::new(png(32, 32), "sq.png")
                .with_options(UploadOptions::default().with_thumbnail(false)),
        )
        .await
        .unwrap()
        .record
        .id;

    let descriptor = TransformDescriptor {
        width: Some(16),
        ..Default::default()
    };
    assert!(
        !h.cache
            .contains(&id, &descriptor, depot::OutputFormat::Png)
            .await
    );
    h.service
        .transform(&id, Access::anonymous(), None, &[("w", "16")])
        .await
        .unwrap();
    assert!(
        h.cache
            .contains(&id, &descriptor, depot::OutputFormat::Png)
            .await
    );
}
