//! # ls-db-sqlite Implementation
//!
//! Implements `PostRepo`, `ProfileRepo` and `AccountRepo` on SQLite, mapping
//! the relational model back to the `ls-core` domain models.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ls_core::models::{Account, Identity, NewPost, Post, Profile};
use ls_core::traits::{AccountRepo, PostRepo, ProfileRepo};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

/// `seq` preserves insertion order for the newest-first tie-break.
const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS accounts (
        email          TEXT PRIMARY KEY NOT NULL,
        identity       TEXT NOT NULL UNIQUE,
        password_hash  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        id          TEXT PRIMARY KEY NOT NULL,
        full_name   TEXT NOT NULL CHECK (length(full_name) > 0),
        avatar_url  TEXT
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        seq         INTEGER PRIMARY KEY AUTOINCREMENT,
        id          BLOB NOT NULL UNIQUE,
        user_id     TEXT NOT NULL,
        content     TEXT NOT NULL DEFAULT '',
        image_url   TEXT,
        created_at  INTEGER NOT NULL,
        CHECK (content <> '' OR image_url IS NOT NULL)
    )",
    "CREATE INDEX IF NOT EXISTS posts_by_recency ON posts (created_at DESC, seq DESC)",
];

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Connects and creates the tables if needed.
    ///
    /// In-memory databases are per connection, so they get a single pooled
    /// connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options
            .connect(url)
            .await
            .with_context(|| format!("failed to open sqlite database {url}"))?;

        let repo = Self { pool };
        repo.migrate().await?;
        info!(%url, "sqlite store ready");
        Ok(repo)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn timestamp_from_micros(micros: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .with_context(|| format!("created_at out of range: {micros}"))
}

fn post_from_row(row: &SqliteRow) -> anyhow::Result<Post> {
    Ok(Post {
        id: row.try_get::<Uuid, _>("id")?,
        user_id: Identity::new(row.try_get::<String, _>("user_id")?),
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        created_at: timestamp_from_micros(row.try_get("created_at")?)?,
    })
}

#[async_trait]
impl PostRepo for SqliteRepo {
    /// Newest first; rows with equal timestamps come back most recently
    /// inserted first.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, user_id, content, image_url, created_at FROM posts ORDER BY created_at DESC, seq DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    /// Inserts a post, assigning a v7 id and a timestamp that never goes
    /// backwards relative to earlier rows, even if the wall clock does.
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let mut tx = self.pool.begin().await?;

        let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(created_at) FROM posts")
            .fetch_one(&mut *tx)
            .await?;
        let now = Utc::now().timestamp_micros();
        let created_at = latest.map_or(now, |latest| latest.max(now));
        let id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO posts (id, user_id, content, image_url, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(post.user_id.as_str())
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(post_id = %id, "post inserted");

        Ok(Post {
            id,
            user_id: post.user_id,
            content: post.content,
            image_url: post.image_url,
            created_at: timestamp_from_micros(created_at)?,
        })
    }
}

#[async_trait]
impl ProfileRepo for SqliteRepo {
    async fn get_profile(&self, id: &Identity) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query("SELECT id, full_name, avatar_url FROM profiles WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Profile {
                id: Identity::new(row.try_get::<String, _>("id")?),
                full_name: row.try_get("full_name")?,
                avatar_url: row.try_get("avatar_url")?,
            })
        })
        .transpose()
    }

    async fn create_profile(&self, profile: Profile) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO profiles (id, full_name, avatar_url) VALUES (?, ?, ?)")
            .bind(profile.id.as_str())
            .bind(&profile.full_name)
            .bind(&profile.avatar_url)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to create profile {}", profile.id))?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepo for SqliteRepo {
    async fn find_account(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query("SELECT email, identity, password_hash FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Account {
                email: row.try_get("email")?,
                identity: Identity::new(row.try_get::<String, _>("identity")?),
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
    }

    async fn create_account(&self, account: Account) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO accounts (email, identity, password_hash) VALUES (?, ?, ?)")
            .bind(&account.email)
            .bind(account.identity.as_str())
            .bind(&account.password_hash)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to create account {}", account.identity))?;
        Ok(())
    }
}
