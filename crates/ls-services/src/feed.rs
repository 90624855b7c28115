//! # Feed Assembler
//!
//! Loads every post newest-first and joins each one to its author.

use std::sync::Arc;

use futures_util::future::join_all;
use ls_core::{AppError, FeedEntry, PostRepo, Profile, Result};
use tracing::{debug, error, warn};

use crate::cancel::CancelToken;
use crate::profile::ProfileResolver;

#[derive(Clone)]
pub struct FeedAssembler {
    posts: Arc<dyn PostRepo>,
    resolver: ProfileResolver,
}

impl FeedAssembler {
    pub fn new(posts: Arc<dyn PostRepo>, resolver: ProfileResolver) -> Self {
        Self { posts, resolver }
    }

    /// Re-fetches the whole feed.
    ///
    /// Author lookups run concurrently and are recombined positionally. An
    /// author that cannot be resolved is shown as "Unknown User" instead of
    /// failing the load.
    pub async fn load_feed(&self, cancel: &CancelToken) -> Result<Vec<FeedEntry>> {
        let mut posts = cancel
            .run(async {
                self.posts.list_posts().await.map_err(|e| {
                    error!(error = %e, "failed to fetch posts");
                    AppError::FetchError(e.to_string())
                })
            })
            .await?;

        // Stable, so the store's tie-break survives.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let authors = join_all(
            posts
                .iter()
                .map(|post| self.resolver.resolve(&post.user_id, cancel)),
        )
        .await;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let entries: Vec<FeedEntry> = posts
            .into_iter()
            .zip(authors)
            .map(|(post, author)| {
                let author = author.unwrap_or_else(|e| {
                    if !e.is_not_found() {
                        warn!(post_id = %post.id, error = %e, "author lookup failed");
                    }
                    Profile::placeholder(post.user_id.clone())
                });
                FeedEntry { post, author }
            })
            .collect();

        debug!(count = entries.len(), "feed assembled");
        Ok(entries)
    }
}
