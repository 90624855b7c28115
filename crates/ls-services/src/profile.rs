//! Profile lookups for a single identity.

use std::sync::Arc;

use ls_core::{AppError, Identity, Profile, ProfileRepo, Result};
use tracing::debug;

use crate::cancel::CancelToken;

#[derive(Clone)]
pub struct ProfileResolver {
    profiles: Arc<dyn ProfileRepo>,
}

impl ProfileResolver {
    pub fn new(profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { profiles }
    }

    /// Fetches the display profile for `identity`.
    ///
    /// Returns `AppError::NotFound` when no profile row exists; callers treat
    /// that as "not loaded yet" rather than a hard failure.
    pub async fn resolve(&self, identity: &Identity, cancel: &CancelToken) -> Result<Profile> {
        cancel
            .run(async {
                match self.profiles.get_profile(identity).await {
                    Ok(Some(profile)) => Ok(profile),
                    Ok(None) => {
                        debug!(%identity, "no profile row");
                        Err(AppError::NotFound("Profile".to_string(), identity.to_string()))
                    }
                    Err(e) => Err(AppError::FetchError(e.to_string())),
                }
            })
            .await
    }
}
