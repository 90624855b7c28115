//! # Core Traits (Ports)
//!
//! Any backend plugin must implement these traits to be used by the client.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;

use crate::models::{Account, Identity, NewPost, Post, Profile, Session};

#[cfg(feature = "testing")]
use mockall::automock;

/// Read/insert contract for the `posts` table.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// All posts, newest first. Ties keep the most recently inserted first.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;

    /// Inserts the post and returns it with its generated id and timestamp.
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post>;
}

/// Lookup contract for the `profiles` table.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, id: &Identity) -> anyhow::Result<Option<Profile>>;

    /// Used at sign-up; hosted backends usually do this with a trigger.
    async fn create_profile(&self, profile: Profile) -> anyhow::Result<()>;
}

/// Credential storage for the in-process session provider.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Looks up an account by its normalized email.
    async fn find_account(&self, email: &str) -> anyhow::Result<Option<Account>>;

    /// Fails if the email is already registered.
    async fn create_account(&self, account: Account) -> anyhow::Result<()>;
}

/// Object storage contract for post images.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> anyhow::Result<()>;

    /// Publicly resolvable URL for an uploaded object.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Identity provider contract.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> anyhow::Result<Option<Session>>;

    /// Starts a subscription that first yields the current state and then
    /// every transition.
    fn subscribe(&self) -> SessionSubscription;

    async fn sign_out(&self) -> anyhow::Result<()>;
}

/// Handle returned by `SessionProvider::subscribe`. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
    primed: bool,
}

impl SessionSubscription {
    pub fn new(rx: watch::Receiver<Option<Session>>) -> Self {
        Self { rx, primed: false }
    }

    /// Waits for the next session state. The first call returns the state at
    /// subscription time; later calls wait for a change. Returns `None` once
    /// the provider is gone.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }
}
