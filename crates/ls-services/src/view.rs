//! # Feed View
//!
//! Orchestrates session → profile → feed for one signed-in screen.
//!
//! The view is event driven: `next_event` waits for a session change, a feed
//! event or the result of a background load, and `handle` applies it. Loads run
//! on spawned tasks holding a `CancelToken`; they are cancelled when the
//! session clears or the view is dropped, and stale results are discarded.

use std::sync::Arc;

use ls_core::{
    AppError, FeedEntry, Identity, ImageUpload, Post, Profile, Result, Session, SessionProvider,
    SessionSubscription,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::cancel::CancelHandle;
use crate::events::{FeedEvent, FeedEvents};
use crate::feed::FeedAssembler;
use crate::profile::ProfileResolver;
use crate::submit::{PostSubmitter, SubmitSettings};
use crate::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Unauthenticated,
    Loading,
    Ready,
}

/// What the caller should do after `handle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// A background load was started.
    Loading,
    /// Profile and feed are up to date; redraw.
    Rendered,
    /// The signed-in identity has no profile yet; keep showing the spinner.
    Pending,
    /// Nothing changed.
    Unchanged,
    /// The session is gone; leave the feed.
    NavigateToLogin,
}

#[derive(Debug)]
pub enum ViewEvent {
    SessionChanged(Option<Session>),
    Feed(FeedEvent),
    Loaded(Box<LoadResult>),
}

/// Result of a background load, delivered through `next_event`.
#[derive(Debug)]
pub struct LoadResult {
    generation: u64,
    profile: Option<Result<Profile>>,
    feed: Result<Vec<FeedEntry>>,
}

pub struct FeedView {
    session: Arc<dyn SessionProvider>,
    resolver: ProfileResolver,
    assembler: FeedAssembler,
    submitter: PostSubmitter,
    events: FeedEvents,
    subscription: Option<SessionSubscription>,
    feed_rx: broadcast::Receiver<FeedEvent>,
    loads_tx: mpsc::UnboundedSender<LoadResult>,
    loads_rx: mpsc::UnboundedReceiver<LoadResult>,
    cancel: CancelHandle,
    generation: u64,
    state: ViewState,
    current: Option<Session>,
    profile: Option<Profile>,
    feed: Vec<FeedEntry>,
}

impl FeedView {
    /// Builds the view and subscribes to session changes. The first
    /// `next_event` reports the session state at mount time.
    pub fn mount(backend: &Backend, settings: SubmitSettings) -> Self {
        let events = FeedEvents::new();
        let resolver = ProfileResolver::new(backend.profiles.clone());
        let assembler = FeedAssembler::new(backend.posts.clone(), resolver.clone());
        let submitter = PostSubmitter::new(
            backend.posts.clone(),
            backend.media.clone(),
            events.clone(),
            settings,
        );
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();

        Self {
            session: backend.session.clone(),
            resolver,
            assembler,
            submitter,
            feed_rx: events.subscribe(),
            events,
            subscription: Some(backend.session.subscribe()),
            loads_tx,
            loads_rx,
            cancel: CancelHandle::new(),
            generation: 0,
            state: ViewState::Unauthenticated,
            current: None,
            profile: None,
            feed: Vec::new(),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn feed(&self) -> &[FeedEntry] {
        &self.feed
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Bus the view listens on; publishing `Dirty` forces a reload.
    pub fn events(&self) -> &FeedEvents {
        &self.events
    }

    /// Waits for the next thing the view must react to. Returns `None` once
    /// the session provider is gone.
    pub async fn next_event(&mut self) -> Option<ViewEvent> {
        let subscription = self.subscription.as_mut()?;
        tokio::select! {
            load = self.loads_rx.recv() => load.map(|load| ViewEvent::Loaded(Box::new(load))),
            session = subscription.next() => session.map(ViewEvent::SessionChanged),
            feed = self.feed_rx.recv() => match feed {
                Ok(event) => Some(ViewEvent::Feed(event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "feed events lagged");
                    Some(ViewEvent::Feed(FeedEvent::Dirty))
                }
                Err(broadcast::error::RecvError::Closed) => None,
            },
        }
    }

    pub async fn handle(&mut self, event: ViewEvent) -> Result<ViewOutcome> {
        match event {
            ViewEvent::SessionChanged(Some(session)) => Ok(self.on_session(session)),
            ViewEvent::SessionChanged(None) => Ok(self.on_signed_out()),
            ViewEvent::Feed(FeedEvent::Dirty) => Ok(self.on_feed_dirty()),
            ViewEvent::Loaded(load) => self.on_loaded(*load),
        }
    }

    /// Submits a post as the signed-in user. The feed refreshes through the
    /// `Dirty` event the submitter publishes.
    pub async fn submit_post(&self, text: &str, image: Option<ImageUpload>) -> Result<Post> {
        let identity = self.signed_in()?.clone();
        self.submitter
            .submit(&identity, text, image, &self.cancel.token())
            .await
    }

    /// Asks the provider to end the session. The view leaves the feed when the
    /// resulting session change arrives.
    pub async fn sign_out(&self) -> Result<()> {
        self.session
            .sign_out()
            .await
            .map_err(|e| AppError::AuthError(e.to_string()))
    }

    /// Cancels in-flight loads and drops the session subscription.
    pub fn teardown(mut self) {
        self.cancel.cancel();
        self.subscription = None;
        debug!("feed view torn down");
    }

    fn signed_in(&self) -> Result<&Identity> {
        self.current
            .as_ref()
            .map(|session| &session.identity)
            .ok_or_else(|| AppError::AuthError("not signed in".to_string()))
    }

    fn on_session(&mut self, session: Session) -> ViewOutcome {
        if self.state != ViewState::Unauthenticated
            && self.current.as_ref().map(|s| &s.identity) == Some(&session.identity)
        {
            return ViewOutcome::Unchanged;
        }

        info!(identity = %session.identity, "session started");
        let identity = session.identity.clone();
        self.current = Some(session);
        self.profile = None;
        self.feed.clear();
        self.state = ViewState::Loading;
        self.start_load(identity, true);
        ViewOutcome::Loading
    }

    fn on_signed_out(&mut self) -> ViewOutcome {
        if self.state != ViewState::Unauthenticated {
            info!("session cleared; leaving feed");
        }
        self.cancel.cancel();
        self.cancel = CancelHandle::new();
        self.generation += 1;
        self.state = ViewState::Unauthenticated;
        self.current = None;
        self.profile = None;
        self.feed.clear();
        ViewOutcome::NavigateToLogin
    }

    fn on_feed_dirty(&mut self) -> ViewOutcome {
        if self.state != ViewState::Ready {
            debug!(state = ?self.state, "ignoring feed event");
            return ViewOutcome::Unchanged;
        }
        match self.current.as_ref().map(|s| s.identity.clone()) {
            Some(identity) => {
                self.start_load(identity, false);
                ViewOutcome::Loading
            }
            None => ViewOutcome::Unchanged,
        }
    }

    fn on_loaded(&mut self, load: LoadResult) -> Result<ViewOutcome> {
        if load.generation != self.generation || self.state == ViewState::Unauthenticated {
            debug!(generation = load.generation, "discarding stale load");
            return Ok(ViewOutcome::Unchanged);
        }

        let feed = match load.feed {
            Ok(feed) => {
                self.feed = feed;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "feed load failed; keeping previous feed");
                Err(e)
            }
        };

        if let Some(profile) = load.profile {
            match profile {
                Ok(profile) => self.profile = Some(profile),
                Err(e) if e.is_not_found() => {
                    warn!("signed-in user has no profile yet");
                    return feed.map(|_| ViewOutcome::Pending);
                }
                Err(e) => return Err(e),
            }
        }

        if self.profile.is_none() {
            return feed.map(|_| ViewOutcome::Pending);
        }
        // The profile alone is enough to show the feed; a failed fetch leaves
        // the previous (possibly empty) one and later `Dirty` events retry.
        self.state = ViewState::Ready;
        feed.map(|_| ViewOutcome::Rendered)
    }

    fn start_load(&mut self, identity: Identity, with_profile: bool) {
        self.generation += 1;
        let generation = self.generation;
        let token = self.cancel.token();
        let resolver = self.resolver.clone();
        let assembler = self.assembler.clone();
        let tx = self.loads_tx.clone();

        tokio::spawn(async move {
            let (profile, feed) = if with_profile {
                let (profile, feed) = tokio::join!(
                    resolver.resolve(&identity, &token),
                    assembler.load_feed(&token)
                );
                (Some(profile), feed)
            } else {
                (None, assembler.load_feed(&token).await)
            };

            if token.is_cancelled() {
                debug!(generation, "load cancelled");
                return;
            }
            let _ = tx.send(LoadResult {
                generation,
                profile,
                feed,
            });
        });
    }
}
