//! In-memory port implementations shared by the service tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use ls_core::{
    AppError, Identity, MediaStore, NewPost, Post, PostRepo, Profile, ProfileRepo, Session,
    SessionProvider, SessionSubscription,
};
use ls_services::{Backend, FeedView, SubmitSettings, ViewOutcome, ViewState};
use tokio::sync::{watch, Notify};
use uuid::Uuid;

pub struct FakeSession {
    tx: watch::Sender<Option<Session>>,
}

impl FakeSession {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn sign_in(&self, id: &str) {
        self.tx.send_replace(Some(Session {
            identity: Identity::new(id),
            email: Some(format!("{id}@example.com")),
        }));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }
}

#[async_trait]
impl SessionProvider for FakeSession {
    async fn current_session(&self) -> anyhow::Result<Option<Session>> {
        Ok(self.tx.borrow().clone())
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.tx.subscribe())
    }

    async fn sign_out(&self) -> anyhow::Result<()> {
        self.clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPosts {
    posts: Mutex<Vec<Post>>,
    pub list_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_insert: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryPosts {
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Makes every later `list_posts` call wait until the returned gate is
    /// notified.
    pub fn hold_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn len(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl PostRepo for MemoryPosts {
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset");
        }
        let mut posts = self.posts.lock().unwrap().clone();
        posts.reverse();
        Ok(posts)
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        if self.fail_insert.load(Ordering::SeqCst) {
            anyhow::bail!("permission denied for table posts");
        }
        let mut posts = self.posts.lock().unwrap();
        let now = Utc::now();
        let created_at = posts.last().map_or(now, |last| last.created_at.max(now));
        let post = Post {
            id: Uuid::now_v7(),
            user_id: post.user_id,
            content: post.content,
            image_url: post.image_url,
            created_at,
        };
        posts.push(post.clone());
        Ok(post)
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    profiles: Mutex<HashMap<Identity, Profile>>,
    pub get_calls: AtomicUsize,
}

impl MemoryProfiles {
    pub fn with(names: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (id, name) in names {
            store.profiles.lock().unwrap().insert(
                Identity::new(*id),
                Profile {
                    id: Identity::new(*id),
                    full_name: name.to_string(),
                    avatar_url: None,
                },
            );
        }
        store
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileRepo for MemoryProfiles {
    async fn get_profile(&self, id: &Identity) -> anyhow::Result<Option<Profile>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.profiles.lock().unwrap().get(id).cloned())
    }

    async fn create_profile(&self, profile: Profile) -> anyhow::Result<()> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub len: usize,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryMedia {
    pub uploads: Mutex<Vec<Upload>>,
}

impl MemoryMedia {
    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for MemoryMedia {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> anyhow::Result<()> {
        self.uploads.lock().unwrap().push(Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            len: data.len(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://cdn.test/{bucket}/{key}")
    }
}

pub struct Fixture {
    pub session: Arc<FakeSession>,
    pub posts: Arc<MemoryPosts>,
    pub profiles: Arc<MemoryProfiles>,
    pub media: Arc<MemoryMedia>,
}

impl Fixture {
    pub fn new(profiles: &[(&str, &str)]) -> Self {
        Self {
            session: Arc::new(FakeSession::new()),
            posts: Arc::new(MemoryPosts::default()),
            profiles: Arc::new(MemoryProfiles::with(profiles)),
            media: Arc::new(MemoryMedia::default()),
        }
    }

    pub fn backend(&self) -> Backend {
        Backend {
            session: self.session.clone(),
            profiles: self.profiles.clone(),
            posts: self.posts.clone(),
            media: self.media.clone(),
        }
    }

    pub fn view(&self) -> FeedView {
        FeedView::mount(&self.backend(), SubmitSettings::default())
    }
}

/// Pumps view events until `done` holds for the last outcome, failing the
/// test if that takes longer than a second.
pub async fn drive_until<F>(view: &mut FeedView, mut done: F) -> ViewOutcome
where
    F: FnMut(ViewOutcome, ViewState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let event = view.next_event().await.expect("view closed");
            let outcome = match view.handle(event).await {
                Ok(outcome) => outcome,
                Err(e) => panic!("unexpected view error: {e}"),
            };
            if done(outcome, view.state()) {
                return outcome;
            }
        }
    })
    .await
    .expect("view did not settle")
}

/// Pumps the view until it reaches `Ready`.
pub async fn until_ready(view: &mut FeedView) {
    drive_until(view, |_, state| state == ViewState::Ready).await;
}

/// Pumps view events until one is handled with an error.
pub async fn next_error(view: &mut FeedView) -> AppError {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let event = view.next_event().await.expect("view closed");
            if let Err(e) = view.handle(event).await {
                return e;
            }
        }
    })
    .await
    .expect("view did not fail")
}

/// Lets spawned tasks run and asserts the view has nothing queued.
pub async fn assert_quiet(view: &mut FeedView) {
    let next = tokio::time::timeout(Duration::from_millis(50), view.next_event()).await;
    assert!(next.is_err(), "unexpected view event: {next:?}");
}
