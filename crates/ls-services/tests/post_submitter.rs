mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ls_core::{AppError, Identity, ImageUpload, MockMediaStore, MockPostRepo};
use ls_services::{CancelToken, FeedEvent, FeedEvents, PostSubmitter, SubmitSettings, MAX_IMAGE_BYTES};
use support::{Fixture, MemoryMedia, MemoryPosts};

fn strict_submitter() -> PostSubmitter {
    // Mocks without expectations panic on any call.
    PostSubmitter::new(
        Arc::new(MockPostRepo::new()),
        Arc::new(MockMediaStore::new()),
        FeedEvents::new(),
        SubmitSettings::default(),
    )
}

fn memory_submitter(fx: &Fixture, events: FeedEvents) -> PostSubmitter {
    PostSubmitter::new(
        fx.posts.clone(),
        fx.media.clone(),
        events,
        SubmitSettings::default(),
    )
}

#[tokio::test]
async fn test_empty_post_rejected_without_network() {
    let submitter = strict_submitter();
    let err = submitter
        .submit(&Identity::new("u1"), "", None, &CancelToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(ref msg) if msg == "empty post"));
}

#[tokio::test]
async fn test_whitespace_only_post_rejected() {
    let submitter = strict_submitter();
    let err = submitter
        .submit(&Identity::new("u1"), "  \n\t ", None, &CancelToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_oversized_image_rejected_before_upload() {
    let submitter = strict_submitter();
    let image = ImageUpload::new("big.png", vec![0u8; MAX_IMAGE_BYTES + 1]);
    let err = submitter
        .submit(&Identity::new("u1"), "look", Some(image), &CancelToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(ref msg) if msg == "image too large"));
}

#[tokio::test]
async fn test_image_of_exactly_five_mib_is_accepted() {
    let fx = Fixture::new(&[]);
    let submitter = memory_submitter(&fx, FeedEvents::new());
    let image = ImageUpload::new("exact.png", vec![0u8; 5 * 1024 * 1024]);

    let post = submitter
        .submit(&Identity::new("u1"), "", Some(image), &CancelToken::never())
        .await
        .unwrap();

    let uploads = fx.media.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bucket, "post-images");
    assert!(uploads[0].key.starts_with("u1/"));
    assert!(uploads[0].key.ends_with(".png"));
    assert_eq!(uploads[0].content_type, "image/png");
    assert_eq!(uploads[0].len, MAX_IMAGE_BYTES);

    assert_eq!(post.content, "");
    assert_eq!(
        post.image_url.as_deref(),
        Some(format!("https://cdn.test/post-images/{}", uploads[0].key).as_str())
    );
}

#[tokio::test]
async fn test_unknown_extension_uploads_as_octet_stream() {
    let fx = Fixture::new(&[]);
    let submitter = memory_submitter(&fx, FeedEvents::new());
    let image = ImageUpload::new("scan", vec![1u8; 16]);

    submitter
        .submit(&Identity::new("u2"), "raw", Some(image), &CancelToken::never())
        .await
        .unwrap();

    let uploads = fx.media.uploads();
    assert!(uploads[0].key.ends_with(".scan"));
    assert_eq!(uploads[0].content_type, "application/octet-stream");
}

#[tokio::test]
async fn test_text_is_trimmed_and_feed_marked_dirty() {
    let fx = Fixture::new(&[]);
    let events = FeedEvents::new();
    let mut rx = events.subscribe();
    let submitter = memory_submitter(&fx, events);

    let post = submitter
        .submit(&Identity::new("u1"), "  Hello  \n", None, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(post.content, "Hello");
    assert_eq!(post.image_url, None);
    assert!(fx.media.uploads().is_empty());
    assert_eq!(rx.try_recv().unwrap(), FeedEvent::Dirty);
}

#[tokio::test]
async fn test_upload_failure_skips_insert() {
    let mut media = MockMediaStore::new();
    media
        .expect_upload()
        .times(1)
        .returning(|_, _, _, _| Err(anyhow::anyhow!("bucket not found")));
    let submitter = PostSubmitter::new(
        Arc::new(MockPostRepo::new()),
        Arc::new(media),
        FeedEvents::new(),
        SubmitSettings::default(),
    );

    let err = submitter
        .submit(
            &Identity::new("u1"),
            "pic",
            Some(ImageUpload::new("a.jpg", vec![1u8])),
            &CancelToken::never(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UploadError(_)));
}

#[tokio::test]
async fn test_insert_failure_after_upload_leaves_object() {
    let posts = Arc::new(MemoryPosts::default());
    posts.fail_insert.store(true, Ordering::SeqCst);
    let media = Arc::new(MemoryMedia::default());
    let events = FeedEvents::new();
    let mut rx = events.subscribe();
    let submitter =
        PostSubmitter::new(posts.clone(), media.clone(), events, SubmitSettings::default());

    let err = submitter
        .submit(
            &Identity::new("u1"),
            "pic",
            Some(ImageUpload::new("a.jpg", vec![1u8])),
            &CancelToken::never(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsertError(_)));
    assert_eq!(media.uploads().len(), 1);
    assert_eq!(posts.len(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_custom_limit_and_bucket() {
    let fx = Fixture::new(&[]);
    let submitter = PostSubmitter::new(
        fx.posts.clone(),
        fx.media.clone(),
        FeedEvents::new(),
        SubmitSettings {
            bucket: "avatars".to_string(),
            max_image_bytes: 10,
        },
    );

    let err = submitter
        .submit(
            &Identity::new("u1"),
            "",
            Some(ImageUpload::new("a.gif", vec![0u8; 11])),
            &CancelToken::never(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    submitter
        .submit(
            &Identity::new("u1"),
            "",
            Some(ImageUpload::new("a.gif", vec![0u8; 10])),
            &CancelToken::never(),
        )
        .await
        .unwrap();
    assert_eq!(fx.media.uploads()[0].bucket, "avatars");
}
