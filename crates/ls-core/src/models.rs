//! # Domain Models
//!
//! These structs represent the core entities of LinkSpace.
//! Posts use UUID v7 for time-ordered, globally unique identification.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when a post's author has no profile row.
pub const PLACEHOLDER_NAME: &str = "Unknown User";

/// Opaque user reference issued by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An authenticated session as reported by the `SessionProvider`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub email: Option<String>,
}

/// Display metadata, one per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Primary key, equal to the owning identity
    pub id: Identity,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Stand-in for an author whose profile could not be resolved.
    pub fn placeholder(id: Identity) -> Self {
        Self {
            id,
            full_name: PLACEHOLDER_NAME.to_string(),
            avatar_url: None,
        }
    }
}

/// Local password account. Hosted backends keep these server-side.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// Lowercased, unique
    pub email: String,
    pub identity: Identity,
    /// PHC-format Argon2 hash
    pub password_hash: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("identity", &self.identity)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// An immutable feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Identity,
    /// Trimmed text; empty when the post is image-only
    pub content: String,
    /// Public URL issued by the MediaStore
    pub image_url: Option<String>,
    /// Ordering key, non-decreasing with insertion order
    pub created_at: DateTime<Utc>,
}

/// Validated insert payload. Id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub user_id: Identity,
    pub content: String,
    pub image_url: Option<String>,
}

/// A post joined to its author's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub post: Post,
    pub author: Profile,
}

/// An image picked for upload alongside a post.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name, used for the extension and content type
    pub file_name: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Everything after the last `.`, or the whole name when there is none.
    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or(&self.file_name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
