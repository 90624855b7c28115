//! Relational API: `PostRepo` and `ProfileRepo` over `/rest/v1`.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ls_core::models::{Identity, NewPost, Post, Profile};
use ls_core::traits::{PostRepo, ProfileRepo};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{ensure_success, RestBackend};

const POST_COLUMNS: &str = "id,user_id,content,image_url,created_at";
const PROFILE_COLUMNS: &str = "id,full_name,avatar_url";

#[derive(Debug, Deserialize)]
struct PostRow {
    id: Uuid,
    user_id: String,
    content: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            user_id: Identity::new(row.user_id),
            content: row.content.unwrap_or_default(),
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: String,
    full_name: String,
    avatar_url: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: Identity::new(row.id),
            full_name: row.full_name,
            avatar_url: row.avatar_url,
        }
    }
}

#[async_trait]
impl PostRepo for RestBackend {
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let request = self
            .http
            .get(self.url("/rest/v1/posts"))
            .query(&[("select", POST_COLUMNS), ("order", "created_at.desc")]);
        let response = ensure_success(self.authorized(request)?.send().await?).await?;
        let rows: Vec<PostRow> = response.json().await.context("malformed posts response")?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let request = self
            .http
            .post(self.url("/rest/v1/posts"))
            .query(&[("select", POST_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(&json!({
                "user_id": post.user_id,
                "content": post.content,
                "image_url": post.image_url,
            }));
        let response = ensure_success(self.authorized(request)?.send().await?).await?;
        let mut rows: Vec<PostRow> = response.json().await.context("malformed insert response")?;
        rows.pop()
            .map(Post::from)
            .context("insert returned no rows")
    }
}

#[async_trait]
impl ProfileRepo for RestBackend {
    async fn get_profile(&self, id: &Identity) -> anyhow::Result<Option<Profile>> {
        let filter = format!("eq.{id}");
        let request = self
            .http
            .get(self.url("/rest/v1/profiles"))
            .query(&[("select", PROFILE_COLUMNS), ("id", filter.as_str())]);
        let response = ensure_success(self.authorized(request)?.send().await?).await?;
        let mut rows: Vec<ProfileRow> =
            response.json().await.context("malformed profiles response")?;
        Ok(rows.pop().map(Profile::from))
    }

    /// Upserts, since hosted projects usually create the row from a sign-up
    /// trigger already.
    async fn create_profile(&self, profile: Profile) -> anyhow::Result<()> {
        let request = self
            .http
            .post(self.url("/rest/v1/profiles"))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&json!({
                "id": profile.id,
                "full_name": profile.full_name,
                "avatar_url": profile.avatar_url,
            }));
        ensure_success(self.authorized(request)?.send().await?).await?;
        Ok(())
    }
}
