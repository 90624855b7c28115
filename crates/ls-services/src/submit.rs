//! # Post Submitter
//!
//! Validates a draft, uploads its image (if any) and inserts the post.
//! A successful submission publishes `FeedEvent::Dirty`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ls_core::{AppError, Identity, ImageUpload, MediaStore, NewPost, Post, PostRepo, Result};
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::events::{FeedEvent, FeedEvents};

/// Largest accepted image, inclusive.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Object store bucket holding post images.
pub const DEFAULT_BUCKET: &str = "post-images";

#[derive(Debug, Clone)]
pub struct SubmitSettings {
    pub bucket: String,
    pub max_image_bytes: usize,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

pub struct PostSubmitter {
    posts: Arc<dyn PostRepo>,
    media: Arc<dyn MediaStore>,
    events: FeedEvents,
    settings: SubmitSettings,
}

impl PostSubmitter {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        media: Arc<dyn MediaStore>,
        events: FeedEvents,
        settings: SubmitSettings,
    ) -> Self {
        Self {
            posts,
            media,
            events,
            settings,
        }
    }

    /// Checks a draft without touching the network.
    pub fn validate(&self, text: &str, image: Option<&ImageUpload>) -> Result<()> {
        if text.trim().is_empty() && image.is_none() {
            return Err(AppError::ValidationError("empty post".to_string()));
        }
        if let Some(image) = image {
            if image.len() > self.settings.max_image_bytes {
                return Err(AppError::ValidationError("image too large".to_string()));
            }
        }
        Ok(())
    }

    /// Creates a post on behalf of `author`.
    ///
    /// If the upload succeeds but the insert fails, the uploaded object is
    /// left in the store without a referencing post.
    pub async fn submit(
        &self,
        author: &Identity,
        text: &str,
        image: Option<ImageUpload>,
        cancel: &CancelToken,
    ) -> Result<Post> {
        self.validate(text, image.as_ref())?;

        let uploaded = match image {
            Some(image) => Some(self.upload_image(author, image, cancel).await?),
            None => None,
        };

        let new_post = NewPost {
            user_id: author.clone(),
            content: text.trim().to_string(),
            image_url: uploaded.as_ref().map(|(_, url)| url.clone()),
        };

        let inserted = cancel
            .run(async {
                self.posts
                    .create_post(new_post)
                    .await
                    .map_err(|e| AppError::InsertError(e.to_string()))
            })
            .await;

        let post = match inserted {
            Ok(post) => post,
            Err(e) => {
                if let Some((key, _)) = &uploaded {
                    warn!(%key, bucket = %self.settings.bucket, "post insert failed after upload; object orphaned");
                }
                return Err(e);
            }
        };

        info!(post_id = %post.id, %author, has_image = post.image_url.is_some(), "post created");
        self.events.publish(FeedEvent::Dirty);
        Ok(post)
    }

    /// Uploads the image and returns its object key and public URL.
    async fn upload_image(
        &self,
        author: &Identity,
        image: ImageUpload,
        cancel: &CancelToken,
    ) -> Result<(String, String)> {
        let key = object_key(author, &image, Utc::now());
        let content_type = mime_guess::from_path(&image.file_name).first_or_octet_stream();
        let bucket = self.settings.bucket.as_str();

        cancel
            .run(async {
                self.media
                    .upload(bucket, &key, image.bytes, content_type.essence_str())
                    .await
                    .map_err(|e| AppError::UploadError(e.to_string()))
            })
            .await?;

        let url = self.media.public_url(bucket, &key);
        Ok((key, url))
    }
}

/// `<identity>/<unix-millis>.<ext>`, partitioned per submitting identity.
pub fn object_key(author: &Identity, image: &ImageUpload, now: DateTime<Utc>) -> String {
    format!("{}/{}.{}", author, now.timestamp_millis(), image.extension())
}
