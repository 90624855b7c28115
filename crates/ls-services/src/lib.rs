//! # ls-services
//!
//! The feed workflow built on the `ls-core` ports: profile resolution, post
//! submission, feed assembly and the view that orchestrates them.

pub mod cancel;
pub mod events;
pub mod feed;
pub mod profile;
pub mod submit;
pub mod view;

use std::sync::Arc;

use ls_core::{MediaStore, PostRepo, ProfileRepo, SessionProvider};

pub use cancel::{CancelHandle, CancelToken};
pub use events::{FeedEvent, FeedEvents};
pub use feed::FeedAssembler;
pub use profile::ProfileResolver;
pub use submit::{PostSubmitter, SubmitSettings, DEFAULT_BUCKET, MAX_IMAGE_BYTES};
pub use view::{FeedView, ViewEvent, ViewOutcome, ViewState};

/// The set of port implementations a client runs against.
#[derive(Clone)]
pub struct Backend {
    pub session: Arc<dyn SessionProvider>,
    pub profiles: Arc<dyn ProfileRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub media: Arc<dyn MediaStore>,
}
