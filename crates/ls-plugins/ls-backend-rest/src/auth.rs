//! Identity API: `SessionProvider` plus sign-up and password sign-in.

use anyhow::{bail, Context};
use async_trait::async_trait;
use ls_core::models::{Identity, Session};
use ls_core::traits::{SessionProvider, SessionSubscription};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{ensure_success, RestBackend};

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// Token grant body; sign-up returns the bare user when confirmation is
/// pending.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
    id: Option<String>,
    email: Option<String>,
}

impl RestBackend {
    /// Registers an account. Returns the session when the backend signs the
    /// new user in right away, `None` when email confirmation is required.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> anyhow::Result<Option<Session>> {
        let request = self.http.post(self.url("/auth/v1/signup")).json(&json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name },
        }));
        let response = ensure_success(self.authorized(request)?.send().await?).await?;
        let body: AuthResponse = response.json().await.context("malformed sign-up response")?;

        match body.access_token {
            Some(token) => self.start_session(token, body.user).map(Some),
            None => {
                info!(user = ?body.id, email = ?body.email, "sign-up pending confirmation");
                Ok(None)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        let request = self
            .http
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = ensure_success(self.authorized(request)?.send().await?).await?;
        let body: AuthResponse = response.json().await.context("malformed token response")?;

        match body.access_token {
            Some(token) => self.start_session(token, body.user),
            None => bail!("token response without access_token"),
        }
    }

    fn start_session(&self, token: String, user: Option<AuthUser>) -> anyhow::Result<Session> {
        let user = user.context("token response without user")?;
        self.set_access_token(Some(SecretString::from(token)))?;
        let session = Session {
            identity: Identity::new(user.id),
            email: user.email,
        };
        self.session.send_replace(Some(session.clone()));
        info!(identity = %session.identity, "signed in");
        Ok(session)
    }
}

#[async_trait]
impl SessionProvider for RestBackend {
    async fn current_session(&self) -> anyhow::Result<Option<Session>> {
        Ok(self.session.borrow().clone())
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.session.subscribe())
    }

    /// Revokes the token server-side, then clears the local session. On
    /// failure the session is kept.
    async fn sign_out(&self) -> anyhow::Result<()> {
        if self.session.borrow().is_none() {
            return Ok(());
        }
        let request = self.http.post(self.url("/auth/v1/logout"));
        let response = self.authorized(request)?.send().await;
        match response {
            Ok(response) => {
                ensure_success(response).await?;
            }
            Err(e) => {
                warn!(error = %e, "logout request failed");
                return Err(e.into());
            }
        }

        self.set_access_token(None)?;
        self.session.send_replace(None);
        info!("signed out");
        Ok(())
    }
}
