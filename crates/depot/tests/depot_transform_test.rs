//! On-demand transform tests.

mod test_utils;

use depot::{Access, DepotConfig, ErrorCategory, ThumbnailConfig, UploadOptions, UploadRequest};
use tempfile::TempDir;
use test_utils::{harness, harness_with, png};

fn dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn test_preset_is_cached_after_first_request() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(UploadRequest::new(png(300, 200), "landscape.png"))
        .await
        .unwrap()
        .record
        .id;

    let first = h
        .service
        .transform(&id, Access::anonymous(), Some("avatar"), &[])
        .await
        .unwrap();
    let second = h
        .service
        .transform(&id, Access::anonymous(), Some("avatar"), &[])
        .await
        .unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert!(!first.passthrough);
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.content_type, "image/png");
    assert_eq!(dimensions(&first.bytes), (128, 128));
}

#[tokio::test]
async fn test_upload_thumbnail_is_reused() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let record = h
        .service
        .upload(UploadRequest::new(png(400, 300), "photo.png"))
        .await
        .unwrap()
        .record;
    assert!(record.thumbnail);

    let thumbnail = h
        .service
        .transform(&record.id, Access::anonymous(), Some("thumbnail"), &[])
        .await
        .unwrap();

    assert!(thumbnail.cache_hit);
    assert_eq!(thumbnail.content_type, "image/jpeg");
    assert_eq!(dimensions(&thumbnail.bytes), (200, 200));
    assert_eq!(h.cache.count(&record.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_thumbnail_preset_follows_configured_size() {
    let temp_dir = TempDir::new().unwrap();
    let config =
        DepotConfig::rooted_at(temp_dir.path()).with_thumbnail(ThumbnailConfig::new(64, 70));
    let h = harness_with(config).await;
    let record = h
        .service
        .upload(UploadRequest::new(png(400, 300), "photo.png"))
        .await
        .unwrap()
        .record;

    let thumbnail = h
        .service
        .transform(&record.id, Access::anonymous(), Some("Thumbnail"), &[])
        .await
        .unwrap();

    assert!(thumbnail.cache_hit);
    assert_eq!(dimensions(&thumbnail.bytes), (64, 64));
    assert_eq!(h.cache.count(&record.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_explicit_parameters() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(UploadRequest::new(png(200, 100), "wide.png"))
        .await
        .unwrap()
        .record
        .id;

    let resized = h
        .service
        .transform(
            &id,
            Access::anonymous(),
            None,
            &[("w", "50"), ("format", "webp"), ("grayscale", "true")],
        )
        .await
        .unwrap();

    assert_eq!(resized.content_type, "image/webp");
    assert_eq!(dimensions(&resized.bytes), (50, 25));
}

#[tokio::test]
async fn test_preset_wins_over_parameters() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(UploadRequest::new(png(300, 300), "square.png"))
        .await
        .unwrap()
        .record
        .id;

    let result = h
        .service
        .transform(&id, Access::anonymous(), Some("avatar"), &[("w", "10"), ("w", "oops")])
        .await
        .unwrap();

    assert_eq!(dimensions(&result.bytes), (128, 128));
}

#[tokio::test]
async fn test_request_errors() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(UploadRequest::new(png(20, 20), "tiny.png"))
        .await
        .unwrap()
        .record
        .id;

    let err = h
        .service
        .transform(&id, Access::anonymous(), Some("poster"), &[])
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);

    let err = h
        .service
        .transform(&id, Access::anonymous(), None, &[("w", "abc")])
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);

    let err = h
        .service
        .transform("0000000000000000", Access::anonymous(), Some("small"), &[])
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_non_images_pass_through() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(UploadRequest::new(b"plain text".to_vec(), "readme.txt"))
        .await
        .unwrap()
        .record
        .id;

    let result = h
        .service
        .transform(&id, Access::anonymous(), Some("avatar"), &[])
        .await
        .unwrap();

    assert!(result.passthrough);
    assert!(!result.cache_hit);
    assert_eq!(result.bytes, b"plain text");
    assert_eq!(result.content_type, "text/plain");
    assert_eq!(h.cache.count(&id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_svg_passes_through() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#.to_vec();
    let outcome = h
        .service
        .upload(UploadRequest::new(svg.clone(), "logo.svg"))
        .await
        .unwrap();
    assert!(!outcome.record.thumbnail);

    let result = h
        .service
        .transform(&outcome.record.id, Access::anonymous(), Some("small"), &[])
        .await
        .unwrap();

    assert!(result.passthrough);
    assert_eq!(result.bytes, svg);
    assert_eq!(result.content_type, "image/svg+xml");
}

#[tokio::test]
async fn test_private_image_needs_authentication() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(
            UploadRequest::new(png(20, 20), "private.png")
                .with_options(UploadOptions::default().with_is_public(false)),
        )
        .await
        .unwrap()
        .record
        .id;

    let err = h
        .service
        .transform(&id, Access::anonymous(), Some("small"), &[])
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AccessDenied);

    assert!(
        h.service
            .transform(&id, Access::authenticated(), Some("small"), &[])
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_corrupt_image_fails_without_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let h = harness(&temp_dir).await;
    let id = h
        .service
        .upload(UploadRequest::new(b"not pixels".to_vec(), "fake.png"))
        .await
        .unwrap()
        .record
        .id;

    let err = h
        .service
        .transform(&id, Access::anonymous(), Some("small"), &[])
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::TransformFailed);
    assert_eq!(err.public_message(), "Image transformation failed");
    assert_eq!(h.cache.count(&id).await.unwrap(), 0);
}
